//! Error values crossing the crate boundary.
//!
//! The interesting information in a failed compile is the diagnostics that
//! were already streamed to the terminal; these types only signal *that*
//! a stage failed, so the driver can stop and report the summary line.

use thiserror::Error;

/// The tokenizer hit a path that cannot produce a valid token. One or more
/// error diagnostics were already rendered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("lexing failed")]
pub struct LexError;

/// The parser hit its first unrecoverable syntax error and unwound. The
/// diagnostic was already rendered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("parsing aborted")]
pub struct FatalParseError;

/// Any failure of the front-end pipeline, for callers that run the stages
/// together.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("tokenizer error: {0}")]
    Lex(#[from] LexError),

    #[error("parser error: {0}")]
    Parse(#[from] FatalParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
