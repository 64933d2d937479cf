//! The Pratt expression parser.
//!
//! Dispatch is by token kind: a prefix handler for tokens that can start an
//! expression, an infix handler plus binding power for operators. There is
//! no postfix dispatch yet. The parsing loop keeps folding infix operators
//! into the left-hand side while their precedence is strictly above the
//! current floor, which nests equal precedence leftward.
//!
//! The parser does not recover: the first syntax error renders its
//! diagnostic and unwinds with [`FatalParseError`].

mod precedence;

pub use precedence::Precedence;

use crate::ast::Expr;
use crate::diagnostics::{ice, Diagnostics};
use crate::error::FatalParseError;
use crate::source::{SourceFile, Span};
use crate::tokenize::{Token, TokenKind, TokenValue};

/// Parse one expression covering the meaningful prefix of `tokens`.
pub fn parse_expression<'i>(
    src: &'i SourceFile,
    tokens: Vec<Token<'i>>,
    diag: &mut Diagnostics,
) -> Result<Expr<'i>, FatalParseError> {
    Parser::new(src, tokens, diag).parse()
}

/// True for the kinds that have a prefix handler, i.e. can start an
/// expression.
pub(crate) fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Integer
            | TokenKind::Float
            | TokenKind::Text
            | TokenKind::Boolean
            | TokenKind::Ident
            | TokenKind::OpenParen
            | TokenKind::OpenCurly
            | TokenKind::Bang
            | TokenKind::Minus
            | TokenKind::If
            | TokenKind::Loop
            | TokenKind::Break
    )
}

/// The infix binding power of a kind; `LOWEST` for non-infix kinds, which
/// stops the parsing loop.
fn infix_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Semicolon => Precedence::SEMICOLON,
        TokenKind::EqualEqual
        | TokenKind::BangEqual
        | TokenKind::Less
        | TokenKind::LessEqual
        | TokenKind::Greater
        | TokenKind::GreaterEqual => Precedence::COMPARISON,
        TokenKind::Plus | TokenKind::Minus => Precedence::ADDITIVE,
        TokenKind::Star | TokenKind::Slash | TokenKind::StarStar => Precedence::MULTIPLICATIVE,
        TokenKind::OpenParen | TokenKind::Dot => Precedence::CALL,
        _ => Precedence::LOWEST,
    }
}

pub struct Parser<'i, 'd> {
    tokens: Vec<Token<'i>>,
    cursor: usize,
    diag: &'d mut Diagnostics,
}

impl<'i, 'd> Parser<'i, 'd> {
    /// Build a parser over a token list. An `EndOfFile` sentinel is
    /// appended, spanning zero bytes at the end of the last token (or of
    /// the file, when there are no tokens).
    pub fn new(src: &'i SourceFile, mut tokens: Vec<Token<'i>>, diag: &'d mut Diagnostics) -> Self {
        let eof_span = tokens
            .last()
            .map(|t| t.span.collapsed_to_end())
            .unwrap_or_else(|| src.end_span());
        tokens.push(Token::new(TokenKind::EndOfFile, eof_span));
        Parser {
            tokens,
            cursor: 0,
            diag,
        }
    }

    pub fn parse(mut self) -> Result<Expr<'i>, FatalParseError> {
        self.expression(Precedence::LOWEST)
    }

    fn next(&mut self) -> Token<'i> {
        let idx = self.cursor.min(self.tokens.len() - 1);
        self.cursor = (self.cursor + 1).min(self.tokens.len());
        self.tokens[idx].clone()
    }

    fn peek(&self) -> &Token<'i> {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    /// Rewind by one token; only ever used to re-classify the current
    /// token as "no prefix handler".
    fn back(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Consume the next token, requiring `kind`. `<ET>` and `<AT>` in the
    /// message are replaced with the expected and actual kind names.
    fn expect(
        &mut self,
        kind: TokenKind,
        message: &str,
        note: &str,
    ) -> Result<Token<'i>, FatalParseError> {
        let token = self.next();
        if token.kind != kind {
            let message = message
                .replace("<ET>", &kind.describe())
                .replace("<AT>", &token.kind.describe());
            self.diag.error(&message, &[(token.span, note)]);
            return Err(FatalParseError);
        }
        Ok(token)
    }

    fn internal_error(&mut self, what: &str, span: Span<'i>) -> FatalParseError {
        self.diag.error(&ice(what), &[(span, "")]);
        FatalParseError
    }

    fn expression(&mut self, floor: Precedence) -> Result<Expr<'i>, FatalParseError> {
        let token = self.next();
        let mut left = self.prefix(token)?;
        while floor < infix_precedence(self.peek().kind) {
            let token = self.next();
            left = self.infix(left, token)?;
        }
        Ok(left)
    }

    fn prefix(&mut self, token: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        match token.kind {
            TokenKind::Integer | TokenKind::Float | TokenKind::Text | TokenKind::Boolean => {
                self.literal(token)
            }
            TokenKind::Ident => self.identifier(token),
            TokenKind::OpenParen => self.parenthesized(),
            TokenKind::OpenCurly => self.block(token),
            TokenKind::Bang | TokenKind::Minus => self.unary(token),
            TokenKind::If => self.if_expression(token),
            TokenKind::Loop => self.loop_expression(token),
            TokenKind::Break => self.break_expression(token),
            _ => {
                self.back();
                self.expect(TokenKind::Eee, "expected an expression, got <AT>", "")?;
                // Eee is never lexed, so the expect above always fails.
                Err(FatalParseError)
            }
        }
    }

    fn infix(&mut self, left: Expr<'i>, token: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        match token.kind {
            TokenKind::OpenParen => self.call(left, token),
            TokenKind::Dot => self.property(left),
            _ => self.binary(left, token),
        }
    }

    fn literal(&mut self, token: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        match (token.kind, token.value.clone()) {
            (TokenKind::Float, Some(TokenValue::Float(value))) => {
                // `42.foo` lexes the float `42.`; the user meant a method
                // call on the integer.
                if token.span.content().ends_with('.') && self.peek().kind == TokenKind::Ident {
                    return self.integer_method_call(token, value);
                }
                Ok(Expr::Float {
                    value,
                    type_hint: token.type_hint,
                    span: token.span,
                })
            }
            (TokenKind::Integer, Some(TokenValue::Int(value))) => Ok(Expr::Int {
                value,
                type_hint: token.type_hint,
                span: token.span,
            }),
            (TokenKind::Text, Some(TokenValue::Text(value))) => Ok(Expr::Text {
                value,
                type_hint: token.type_hint,
                span: token.span,
            }),
            (TokenKind::Boolean, Some(TokenValue::Bool(value))) => Ok(Expr::Bool {
                value,
                span: token.span,
            }),
            _ => Err(self.internal_error("literal token without a payload", token.span)),
        }
    }

    fn integer_method_call(
        &mut self,
        token: Token<'i>,
        value: f64,
    ) -> Result<Expr<'i>, FatalParseError> {
        self.diag.error(
            "wrap integers in parentheses when calling methods upon them",
            &[(token.span, "")],
        );
        let name_token = self.next();
        let name = match name_token.value {
            Some(TokenValue::Ident(name)) => name,
            _ => return Err(self.internal_error("identifier token without a name", name_token.span)),
        };
        let span = Span::merge([token.span, name_token.span]);
        let object = Expr::Int {
            value: value as u128,
            type_hint: None,
            span: token.span,
        };
        Ok(Expr::Property {
            object: Box::new(object),
            name,
            span,
        })
    }

    fn identifier(&mut self, token: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        match token.value {
            Some(TokenValue::Ident(name)) => Ok(Expr::Ident {
                name,
                span: token.span,
            }),
            _ => Err(self.internal_error("identifier token without a name", token.span)),
        }
    }

    fn parenthesized(&mut self) -> Result<Expr<'i>, FatalParseError> {
        let expr = self.expression(Precedence::LOWEST)?;
        self.expect(
            TokenKind::CloseParen,
            "expected a closing parenthesis, got <AT>",
            "",
        )?;
        Ok(expr)
    }

    fn block(&mut self, open: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        let inner = self.expression(Precedence::LOWEST)?;
        let close = self.expect(TokenKind::CloseCurly, "expected <ET>, got <AT>", "")?;
        Ok(Expr::Block {
            span: Span::merge([open.span, close.span]),
            inner: Box::new(inner),
        })
    }

    fn unary(&mut self, operator: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        let operand = self.expression(Precedence::UNARY)?;
        let span = Span::merge([operator.span, operand.source_span()]);
        Ok(Expr::Unary {
            operator,
            operand: Box::new(operand),
            span,
        })
    }

    fn binary(&mut self, left: Expr<'i>, operator: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        let right = self.expression(infix_precedence(operator.kind))?;
        let span = Span::merge([left.source_span(), operator.span, right.source_span()]);
        Ok(Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        })
    }

    /// `(` as an infix operator: a call. Arguments are comma-separated; a
    /// trailing comma is accepted.
    fn call(&mut self, callee: Expr<'i>, _open: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        let mut args = Vec::new();
        let close = loop {
            if self.peek().kind == TokenKind::CloseParen {
                break self.next();
            }
            args.push(self.expression(Precedence::LOWEST)?);
            if self.peek().kind == TokenKind::Comma {
                self.next();
                continue;
            }
            break self.expect(
                TokenKind::CloseParen,
                "expected <ET>, got <AT>",
                "arguments must be separated by commas",
            )?;
        };
        let span = Span::merge([callee.source_span(), close.span]);
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            span,
        })
    }

    /// `.` as an infix operator: property access.
    fn property(&mut self, object: Expr<'i>) -> Result<Expr<'i>, FatalParseError> {
        let name_token = self.expect(TokenKind::Ident, "expected <ET> after '.', got <AT>", "")?;
        let name = match name_token.value {
            Some(TokenValue::Ident(name)) => name,
            _ => return Err(self.internal_error("identifier token without a name", name_token.span)),
        };
        let span = Span::merge([object.source_span(), name_token.span]);
        Ok(Expr::Property {
            object: Box::new(object),
            name,
            span,
        })
    }

    /// `if cond { … } else if cond { … } … else { … }`.
    fn if_expression(&mut self, if_token: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        let condition = self.expression(Precedence::LOWEST)?;
        let then_branch = self.braced_block()?;
        let mut else_ifs = Vec::new();
        let mut else_branch = None;
        while self.peek().kind == TokenKind::Else {
            self.next();
            if self.peek().kind == TokenKind::If {
                self.next();
                let cond = self.expression(Precedence::LOWEST)?;
                let body = self.braced_block()?;
                else_ifs.push((cond, body));
            } else {
                else_branch = Some(self.braced_block()?);
                break;
            }
        }
        let mut span = Span::merge([if_token.span, then_branch.source_span()]);
        if let Some((_, body)) = else_ifs.last() {
            span = Span::merge([span, body.source_span()]);
        }
        if let Some(branch) = &else_branch {
            span = Span::merge([span, branch.source_span()]);
        }
        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_ifs,
            else_branch: else_branch.map(Box::new),
            span,
        })
    }

    /// `loop { … }`; the body is optional.
    fn loop_expression(&mut self, loop_token: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        self.expect(TokenKind::OpenCurly, "expected <ET>, got <AT>", "")?;
        let body = if starts_expression(self.peek().kind) {
            Some(self.expression(Precedence::LOWEST)?)
        } else {
            None
        };
        let close = self.expect(TokenKind::CloseCurly, "expected <ET>, got <AT>", "")?;
        Ok(Expr::Loop {
            body: body.map(Box::new),
            span: Span::merge([loop_token.span, close.span]),
        })
    }

    /// `break`, optionally carrying a value.
    fn break_expression(&mut self, break_token: Token<'i>) -> Result<Expr<'i>, FatalParseError> {
        let value = if starts_expression(self.peek().kind) {
            Some(self.expression(Precedence::BREAK_OPERAND)?)
        } else {
            None
        };
        let span = match &value {
            Some(value) => Span::merge([break_token.span, value.source_span()]),
            None => break_token.span,
        };
        Ok(Expr::Break {
            value: value.map(Box::new),
            span,
        })
    }

    fn braced_block(&mut self) -> Result<Expr<'i>, FatalParseError> {
        let open = self.expect(TokenKind::OpenCurly, "expected <ET>, got <AT>", "")?;
        self.block(open)
    }
}
