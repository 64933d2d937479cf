//! Front-end for the esc programming language.
//!
//! This library implements the front-end core of the esc compiler. Given a
//! string of esc source, it produces either an expression tree or a set of
//! human-readable diagnostics pinned to source locations.
//!
//!
//! # API
//!
//! Operation            | Result               | Input
//! ---------------------|----------------------|---------------------------
//! Tokenization         | [`Vec<Token>`]       | [`tokenize()`]
//! Parse an expression  | [`Expr`]             | [`parse_expression()`]
//! Lex + lint + parse   | [`Expr`]             | [`parse_source()`]
//!
//! [`Vec<Token>`]: tokenize::Token
//! [`Expr`]: ast::Expr
//! [`SourceFile`]: source::SourceFile
//! [`Span`]: source::Span
//!
//! Diagnostics stream to the terminal as they are produced; the result
//! types only say whether a stage failed. The [`SourceFile`] must outlive
//! everything lexed or parsed from it, because tokens and expression nodes
//! carry non-owning [`Span`]s into its text.
//!
//! # Examples
//!
//! Parse `1 + 2 * 3`:
//!
//! ```
//! use esc_parser::diagnostics::Diagnostics;
//! use esc_parser::source::SourceFile;
//! use esc_parser::{parse_source, Options};
//!
//! let src = SourceFile::new("demo.esc", "1 + 2 * 3");
//! let mut diag = Diagnostics::new();
//! let expr = parse_source(&src, &Options::default(), &mut diag).unwrap();
//!
//! assert_eq!(expr.to_string(), "bin($int(1) Plus bin($int(2) Star $int(3)))");
//! ```

pub mod ast;
pub mod diagnostics;
mod error;
pub mod parse;
pub mod registry;
pub mod source;
pub mod tokenize;

#[cfg(test)]
mod tests;

//==========================================================
// API
//==========================================================

use crate::ast::Expr;
use crate::diagnostics::Diagnostics;
use crate::source::SourceFile;
use crate::tokenize::{hex_case_lint, Language, Token};

pub use crate::error::{CompileError, FatalParseError, LexError};
pub use crate::parse::parse_expression;
pub use crate::tokenize::tokenize;

//-------------
// Options
//-------------

/// Front-end configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// The keyword language; English unless someone is having fun.
    pub language: Language,
}

impl Options {
    pub fn language(self, language: Language) -> Self {
        Options { language }
    }
}

//======================================
// Functions
//======================================

/// Run the whole front-end over one source file: tokenize, lint, parse.
///
/// Diagnostics (including the hex-case lint between lexing and parsing)
/// go to `diag`; the first failing stage short-circuits.
pub fn parse_source<'i>(
    src: &'i SourceFile,
    opts: &Options,
    diag: &mut Diagnostics,
) -> Result<Expr<'i>, CompileError> {
    let tokens: Vec<Token<'i>> = tokenize(src, opts, diag)?;
    hex_case_lint(&tokens, diag);
    let expr = parse_expression(src, tokens, diag)?;
    Ok(expr)
}
