//! The esc scanner.
//!
//! Consumes a source string and yields tokens with exact source spans,
//! decoded payloads, and optional type-hint suffixes. Recoverable problems
//! (a bad numeric type hint, an over-wide literal) are reported and
//! scanning continues; paths that cannot yield a valid token (an unclosed
//! comment or text literal, an unrecognized character) report and return
//! [`LexError`].

use std::cmp::min;

use smallvec::SmallVec;

use crate::diagnostics::{ordinal, Diagnostics};
use crate::error::LexError;
use crate::source::{SourceFile, Span};
use crate::Options;

use super::{Language, Token, TokenKind, TokenValue, TypeHint, NUMERIC_HINT_NAMES};

const INT_HINT_NOTE: &str =
    "a valid type would be one of u8, i8, u16, i16, u32, i32, u64, i64, u128, i128";
const FLOAT_HINT_NOTE: &str = "a valid type would be one of f32, f64";

/// Tokenize a whole source file.
pub fn tokenize<'i>(
    src: &'i SourceFile,
    opts: &Options,
    diag: &mut Diagnostics,
) -> Result<Vec<Token<'i>>, LexError> {
    Tokenizer::new(src, opts.language, diag).generate_tokens()
}

/// The result of scanning one `_hint` suffix.
enum Hint {
    /// No underscore followed the literal.
    Absent,
    /// A bare `_` with no hint letters; already reported.
    Trailing,
    Named(String),
}

/// The result of decoding one escape sequence inside a text literal.
enum Escape {
    Literal(char),
    /// The escape was invalid and already reported; expands to nothing.
    Skip,
    /// The escape was not recognized at all; the caller reports it.
    Unknown,
}

pub struct Tokenizer<'i, 'd> {
    src: &'i SourceFile,
    language: Language,
    diag: &'d mut Diagnostics,
    /// Byte offset of the next unconsumed character.
    pos: usize,
}

impl<'i, 'd> Tokenizer<'i, 'd> {
    pub fn new(src: &'i SourceFile, language: Language, diag: &'d mut Diagnostics) -> Self {
        Tokenizer {
            src,
            language,
            diag,
            pos: 0,
        }
    }

    fn source_text(&self) -> &'i str {
        let src = self.src;
        &src.text
    }

    fn rest(&self) -> &'i str {
        &self.source_text()[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// The span from `start` up to the current position.
    fn span_from(&self, start: usize) -> Span<'i> {
        Span::new(self.src, start, self.pos)
    }

    /// The span of the single character at `at` (zero-width at EOF).
    fn char_span(&self, at: usize) -> Span<'i> {
        let len = self.source_text()[at..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        Span::new(self.src, at, at + len)
    }

    pub fn generate_tokens(mut self) -> Result<Vec<Token<'i>>, LexError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                ' ' | '\n' | '\r' | '\t' => {
                    self.bump();
                }
                '/' if self.peek_second() == Some('/') => {
                    self.eat_while(|c| c != '\n');
                }
                '/' if self.peek_second() == Some('*') => self.block_comment(start)?,
                '-' if self.peek_second() == Some('>') => {
                    self.bump();
                    self.bump();
                    tokens.push(Token::new(TokenKind::Arrow, self.span_from(start)));
                }
                '0' if self.peek_second() == Some('x') => {
                    tokens.push(self.radix_literal(start, 16));
                }
                '0' if self.peek_second() == Some('o') => {
                    tokens.push(self.radix_literal(start, 8));
                }
                '0' if self.peek_second() == Some('b') => {
                    tokens.push(self.radix_literal(start, 2));
                }
                '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                    tokens.push(self.leading_dot_float(start));
                }
                '0'..='9' => tokens.push(self.decimal_literal(start)),
                // Boolean literals are matched before the identifier path,
                // by bare lookahead.
                't' if self.rest().starts_with("true") => {
                    self.pos += "true".len();
                    let mut token = Token::new(TokenKind::Boolean, self.span_from(start));
                    token.value = Some(TokenValue::Bool(true));
                    tokens.push(token);
                }
                'f' if self.rest().starts_with("false") => {
                    self.pos += "false".len();
                    let mut token = Token::new(TokenKind::Boolean, self.span_from(start));
                    token.value = Some(TokenValue::Bool(false));
                    tokens.push(token);
                }
                'A'..='Z' | 'a'..='z' | '_' => tokens.push(self.ident_or_keyword(start)),
                '(' | ')' | '[' | ']' | '{' | '}' | ';' | ':' | ',' | '.' => {
                    self.bump();
                    let kind = match c {
                        '(' => TokenKind::OpenParen,
                        ')' => TokenKind::CloseParen,
                        '[' => TokenKind::OpenSquare,
                        ']' => TokenKind::CloseSquare,
                        '{' => TokenKind::OpenCurly,
                        '}' => TokenKind::CloseCurly,
                        ';' => TokenKind::Semicolon,
                        ':' => TokenKind::Colon,
                        ',' => TokenKind::Comma,
                        _ => TokenKind::Dot,
                    };
                    tokens.push(Token::new(kind, self.span_from(start)));
                }
                '!' => tokens.push(self.one_or_equal(start, TokenKind::Bang, TokenKind::BangEqual)),
                '/' => {
                    tokens.push(self.one_or_equal(start, TokenKind::Slash, TokenKind::SlashEqual))
                }
                '+' => {
                    tokens.push(self.one_or_equal(start, TokenKind::Plus, TokenKind::PlusEqual))
                }
                '-' => {
                    tokens.push(self.one_or_equal(start, TokenKind::Minus, TokenKind::MinusEqual))
                }
                '=' => {
                    tokens.push(self.one_or_equal(start, TokenKind::Equal, TokenKind::EqualEqual))
                }
                '<' => {
                    tokens.push(self.one_or_equal(start, TokenKind::Less, TokenKind::LessEqual))
                }
                '>' => tokens.push(self.one_or_equal(
                    start,
                    TokenKind::Greater,
                    TokenKind::GreaterEqual,
                )),
                '*' => tokens.push(self.star(start)),
                '\'' => tokens.push(self.text_literal(start)?),
                _ => {
                    let span = self.char_span(self.pos);
                    self.diag
                        .error(&format!("Unrecognized character '{c}'"), &[(span, "")]);
                    return Err(LexError);
                }
            }
        }
        Ok(tokens)
    }

    /// A nestable `/* … */` comment. Every still-open `/*` offset is kept
    /// so the EOF diagnostic can point at each one, outermost first.
    fn block_comment(&mut self, start: usize) -> Result<(), LexError> {
        self.bump();
        self.bump();
        let mut openers: SmallVec<[usize; 4]> = SmallVec::new();
        openers.push(start);
        loop {
            match (self.peek(), self.peek_second()) {
                (Some('*'), Some('/')) => {
                    self.bump();
                    self.bump();
                    openers.pop();
                    if openers.is_empty() {
                        return Ok(());
                    }
                }
                (Some('/'), Some('*')) => {
                    let opener = self.pos;
                    self.bump();
                    self.bump();
                    openers.push(opener);
                }
                (Some(_), Some(_)) => {
                    self.bump();
                }
                _ => {
                    let depth = openers.len();
                    let notes: SmallVec<[String; 4]> = (1..=depth)
                        .map(|nth| format!("{} unclosed comment started here", ordinal(nth)))
                        .collect();
                    let annotations: SmallVec<[(Span<'_>, &str); 4]> = openers
                        .iter()
                        .zip(notes.iter())
                        .map(|(&off, note)| (Span::new(self.src, off, off + 2), note.as_str()))
                        .collect();
                    self.diag.error(
                        &format!(
                            "encountered EOF while in a multiline comment ({depth} unclosed comment{})",
                            if depth > 1 { "s" } else { "" }
                        ),
                        &annotations,
                    );
                    return Err(LexError);
                }
            }
        }
    }

    /// A `0x`/`0o`/`0b` integer literal, with its optional type hint.
    fn radix_literal(&mut self, start: usize, radix: u32) -> Token<'i> {
        self.bump();
        self.bump();
        let digits_start = self.pos;
        self.eat_while(|c| c.is_digit(radix));
        let digits = &self.source_text()[digits_start..self.pos];
        let value = if digits.is_empty() {
            let what = match radix {
                16 => "an hexadecimal",
                8 => "an octal",
                _ => "a binary",
            };
            self.diag.error(
                &format!("{what} literal must contain at least one digit"),
                &[(Span::new(self.src, start, start + 2), "")],
            );
            0
        } else {
            self.parse_int(digits, radix, start)
        };
        let type_hint = self.numeric_type_hint(false);
        let mut token = Token::new(TokenKind::Integer, self.span_from(start));
        token.value = Some(TokenValue::Int(value));
        token.type_hint = type_hint;
        token
    }

    /// A decimal literal: `[0-9]+`, optionally followed by `.` and more
    /// digits (making it a float), then an optional type hint. The dot is
    /// consumed even when no digits follow it; `42.` is a float.
    fn decimal_literal(&mut self, start: usize) -> Token<'i> {
        self.eat_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        let text = &self.source_text()[start..self.pos];
        let (kind, value) = if is_float {
            (TokenKind::Float, TokenValue::Float(parse_f64(text)))
        } else {
            (
                TokenKind::Integer,
                TokenValue::Int(self.parse_int(text, 10, start)),
            )
        };
        let type_hint = self.numeric_type_hint(is_float);
        let mut token = Token::new(kind, self.span_from(start));
        token.value = Some(value);
        token.type_hint = type_hint;
        token
    }

    /// `.5` style: lexed as a float, with an error suggesting the `0`.
    fn leading_dot_float(&mut self, start: usize) -> Token<'i> {
        self.bump();
        self.eat_while(|c| c.is_ascii_digit());
        let digits_end = self.pos;
        let rewritten = format!("0{}", &self.source_text()[start..digits_end]);
        let value = parse_f64(&rewritten);
        let type_hint = self.numeric_type_hint(true);
        let note = format!("help: add a `0` before it: {rewritten}");
        self.diag.error(
            "a float literal must have an integer part",
            &[(Span::new(self.src, start, digits_end), note.as_str())],
        );
        let mut token = Token::new(TokenKind::Float, self.span_from(start));
        token.value = Some(TokenValue::Float(value));
        token.type_hint = type_hint;
        token
    }

    fn parse_int(&mut self, digits: &str, radix: u32, start: usize) -> u128 {
        match u128::from_str_radix(digits, radix) {
            Ok(value) => value,
            Err(_) => {
                self.diag.error(
                    "integer literal is too large",
                    &[(self.span_from(start), "the widest integer type is 128 bits")],
                );
                0
            }
        }
    }

    /// An identifier or reserved word; ASCII only, Unicode identifiers
    /// will be added... later.
    fn ident_or_keyword(&mut self, start: usize) -> Token<'i> {
        self.bump();
        self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = &self.source_text()[start..self.pos];
        match self.language.keywords().get(text) {
            Some(&kind) => Token::new(kind, self.span_from(start)),
            None => {
                let mut token = Token::new(TokenKind::Ident, self.span_from(start));
                token.value = Some(TokenValue::Ident(text.to_string()));
                token
            }
        }
    }

    /// One of `! / + - = < >`, doubling with a trailing `=`.
    fn one_or_equal(&mut self, start: usize, bare: TokenKind, with_eq: TokenKind) -> Token<'i> {
        self.bump();
        let kind = if self.peek() == Some('=') {
            self.bump();
            with_eq
        } else {
            bare
        };
        Token::new(kind, self.span_from(start))
    }

    /// `*`, `**`, `*=`, or `**=`.
    fn star(&mut self, start: usize) -> Token<'i> {
        self.bump();
        let doubled = if self.peek() == Some('*') {
            self.bump();
            true
        } else {
            false
        };
        let with_eq = if self.peek() == Some('=') {
            self.bump();
            true
        } else {
            false
        };
        let kind = match (doubled, with_eq) {
            (true, true) => TokenKind::StarStarEqual,
            (true, false) => TokenKind::StarStar,
            (false, true) => TokenKind::StarEqual,
            (false, false) => TokenKind::Star,
        };
        Token::new(kind, self.span_from(start))
    }

    /// A `'…'` text literal with escapes, then an optional `_char` or
    /// `_string` hint.
    fn text_literal(&mut self, start: usize) -> Result<Token<'i>, LexError> {
        self.bump();
        let mut contents = String::new();
        loop {
            match self.peek() {
                None => {
                    self.diag.error(
                        "encountered EOF while reading a text literal",
                        &[(
                            Span::new(self.src, start, start + 1),
                            "string was started here",
                        )],
                    );
                    return Err(LexError);
                }
                Some('\'') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    let esc_start = self.pos;
                    match self.read_escape() {
                        Escape::Literal(c) => contents.push(c),
                        Escape::Skip => {}
                        Escape::Unknown => {
                            self.diag.error(
                                "invalid escape sequence",
                                &[(self.span_from(esc_start), "")],
                            );
                        }
                    }
                }
                Some(c) => {
                    self.bump();
                    contents.push(c);
                }
            }
        }

        let hint_start = self.pos;
        let type_hint = match self.scan_type_hint() {
            Hint::Absent | Hint::Trailing => None,
            Hint::Named(hint) => match hint.as_str() {
                "char" => {
                    if contents.chars().count() != 1 {
                        self.diag.error(
                            "text literals tagged as char must be exactly 1 character long",
                            &[(self.span_from(start), "")],
                        );
                        return Err(LexError);
                    }
                    Some(TypeHint::Char)
                }
                "string" => Some(TypeHint::Str),
                _ => {
                    self.diag.error(
                        &format!("`_{hint}` is not a valid type hint for a text literal"),
                        &[(self.span_from(hint_start), "")],
                    );
                    return Err(LexError);
                }
            },
        };

        let mut token = Token::new(TokenKind::Text, self.span_from(start));
        token.value = Some(TokenValue::Text(contents));
        token.type_hint = type_hint;
        Ok(token)
    }

    fn read_escape(&mut self) -> Escape {
        self.bump();
        match self.bump() {
            Some('n') => Escape::Literal('\n'),
            Some('t') => Escape::Literal('\t'),
            Some('r') => Escape::Literal('\r'),
            Some('\\') => Escape::Literal('\\'),
            Some('\'') => Escape::Literal('\''),
            Some('0') => Escape::Literal('\0'),
            Some('u') => self.unicode_escape(),
            _ => Escape::Unknown,
        }
    }

    /// `\u{…}`: one to six hex digits naming a code point. The `\u` itself
    /// is already consumed.
    fn unicode_escape(&mut self) -> Escape {
        let esc_start = self.pos - 2;
        if self.peek() != Some('{') {
            let span = self.char_span(self.pos);
            self.diag.error("\\u must be followed by a {", &[(span, "")]);
            return Escape::Unknown;
        }
        self.bump();
        let digits_start = self.pos;
        loop {
            match self.peek() {
                // Let the enclosing text-literal loop report the EOF.
                None => return Escape::Skip,
                Some('}') => break,
                Some(c) if c.is_ascii_hexdigit() => {
                    self.bump();
                }
                Some(c) => {
                    let message = if c == '\'' {
                        "Unclosed Unicode escape"
                    } else {
                        "Non-hexadecimal character in Unicode escape"
                    };
                    let span = self.char_span(self.pos);
                    self.diag.error(message, &[(span, "")]);
                    return Escape::Skip;
                }
            }
        }
        let digits = &self.source_text()[digits_start..self.pos];
        self.bump();
        if digits.is_empty() {
            self.diag
                .error("Empty Unicode escape", &[(self.span_from(esc_start), "")]);
            return Escape::Skip;
        }
        if digits.len() > 6 {
            self.diag.error(
                "Unicode escapes have a maximum of 6 hexadecimal digits",
                &[(self.span_from(esc_start), "")],
            );
            return Escape::Skip;
        }
        let code = u32::from_str_radix(digits, 16).unwrap_or(0);
        match char::from_u32(code) {
            Some(c) => Escape::Literal(c),
            None => {
                self.diag.error(
                    "invalid Unicode code point",
                    &[(self.span_from(esc_start), "")],
                );
                Escape::Skip
            }
        }
    }

    /// Scan an optional `_hint` suffix: a maximal run of lowercase ASCII
    /// letters and digits after the underscore.
    fn scan_type_hint(&mut self) -> Hint {
        if self.peek() != Some('_') {
            return Hint::Absent;
        }
        let underscore = self.pos;
        self.bump();
        let start = self.pos;
        self.eat_while(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if self.pos == start {
            self.diag.error(
                "a trailing underscore is not a valid type hint",
                &[(Span::new(self.src, underscore, underscore + 1), "")],
            );
            return Hint::Trailing;
        }
        Hint::Named(self.source_text()[start..self.pos].to_string())
    }

    /// Scan and validate the type hint after a numeric literal. Bad hints
    /// are reported and dropped; the literal itself stays valid.
    fn numeric_type_hint(&mut self, is_float: bool) -> Option<TypeHint> {
        let hint_start = self.pos;
        let hint = match self.scan_type_hint() {
            Hint::Absent | Hint::Trailing => return None,
            Hint::Named(hint) => hint,
        };
        let span = self.span_from(hint_start);
        match TypeHint::from_name(&hint) {
            Some(th) if th.is_int() => {
                if is_float {
                    self.diag.error(
                        "int type hints are invalid for float literals",
                        &[(span, FLOAT_HINT_NOTE)],
                    );
                    None
                } else {
                    Some(th)
                }
            }
            Some(th) if th.is_float() => {
                if is_float {
                    Some(th)
                } else {
                    self.diag.error(
                        "float type hints are invalid for int literals",
                        &[(span, INT_HINT_NOTE)],
                    );
                    None
                }
            }
            _ => {
                self.invalid_numeric_hint(&hint, span);
                None
            }
        }
    }

    fn invalid_numeric_hint(&mut self, hint: &str, span: Span<'i>) {
        let head = hint.chars().next();
        let widths = &hint[min(1, hint.len())..];
        if matches!(head, Some('u' | 'i' | 'f')) && widths.chars().all(|c| c.is_ascii_digit()) {
            let family = if head == Some('f') { "float" } else { "integer" };
            let valid = if head == Some('f') {
                "32 and 64"
            } else {
                "8, 16, 32, 64 and 128"
            };
            let note = format!("valid widths for {family}s are {valid}");
            self.diag.error(
                &format!("invalid width {widths} for {family} literal"),
                &[(span, note.as_str())],
            );
        } else {
            let note = closest_hint(hint).unwrap_or_default();
            self.diag.error(
                &format!("invalid type hint for number literal: `_{hint}`"),
                &[(span, note.as_str())],
            );
        }
    }
}

/// Decimal-digit sources always parse; overflow saturates to infinity
/// inside `f64::from_str` itself.
fn parse_f64(text: &str) -> f64 {
    text.parse::<f64>().unwrap_or(f64::INFINITY)
}

/// The closest accepted numeric hint, when it is close enough to be a
/// plausible typo.
fn closest_hint(hint: &str) -> Option<String> {
    let (best, dist) = NUMERIC_HINT_NAMES
        .iter()
        .map(|cand| (cand, edit_distance::edit_distance(hint, cand)))
        .min_by_key(|(_, dist)| *dist)?;
    (dist <= 2).then(|| format!("help: did you mean `_{best}`?"))
}
