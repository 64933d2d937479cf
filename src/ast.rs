//! The expression tree.
//!
//! One tagged variant covers every expression form; each node carries the
//! span of its full source extent. Nodes are built bottom-up by the parser
//! and never mutated afterwards.

use std::fmt;

use colored::Colorize;

use crate::source::Span;
use crate::tokenize::{Token, TypeHint};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'i> {
    Int {
        value: u128,
        type_hint: Option<TypeHint>,
        span: Span<'i>,
    },
    Float {
        value: f64,
        type_hint: Option<TypeHint>,
        span: Span<'i>,
    },
    Text {
        value: String,
        type_hint: Option<TypeHint>,
        span: Span<'i>,
    },
    Bool {
        value: bool,
        span: Span<'i>,
    },
    Ident {
        name: String,
        span: Span<'i>,
    },
    Binary {
        left: Box<Expr<'i>>,
        operator: Token<'i>,
        right: Box<Expr<'i>>,
        span: Span<'i>,
    },
    Unary {
        operator: Token<'i>,
        operand: Box<Expr<'i>>,
        span: Span<'i>,
    },
    /// A `{ … }` grouping.
    Block {
        inner: Box<Expr<'i>>,
        span: Span<'i>,
    },
    Call {
        callee: Box<Expr<'i>>,
        args: Vec<Expr<'i>>,
        span: Span<'i>,
    },
    Property {
        object: Box<Expr<'i>>,
        name: String,
        span: Span<'i>,
    },
    If {
        condition: Box<Expr<'i>>,
        then_branch: Box<Expr<'i>>,
        else_ifs: Vec<(Expr<'i>, Expr<'i>)>,
        else_branch: Option<Box<Expr<'i>>>,
        span: Span<'i>,
    },
    Loop {
        body: Option<Box<Expr<'i>>>,
        span: Span<'i>,
    },
    Break {
        value: Option<Box<Expr<'i>>>,
        span: Span<'i>,
    },
}

impl<'i> Expr<'i> {
    /// The span covering this expression's full source extent.
    pub fn source_span(&self) -> Span<'i> {
        match self {
            Expr::Int { span, .. }
            | Expr::Float { span, .. }
            | Expr::Text { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Block { span, .. }
            | Expr::Call { span, .. }
            | Expr::Property { span, .. }
            | Expr::If { span, .. }
            | Expr::Loop { span, .. }
            | Expr::Break { span, .. } => *span,
        }
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<&Expr<'i>> {
        match self {
            Expr::Int { .. }
            | Expr::Float { .. }
            | Expr::Text { .. }
            | Expr::Bool { .. }
            | Expr::Ident { .. } => Vec::new(),
            Expr::Binary { left, right, .. } => vec![left, right],
            Expr::Unary { operand, .. } => vec![operand],
            Expr::Block { inner, .. } => vec![inner],
            Expr::Call { callee, args, .. } => {
                let mut out: Vec<&Expr<'i>> = vec![callee];
                out.extend(args.iter());
                out
            }
            Expr::Property { object, .. } => vec![object],
            Expr::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
                ..
            } => {
                let mut out: Vec<&Expr<'i>> = vec![condition, then_branch];
                for (cond, body) in else_ifs {
                    out.push(cond);
                    out.push(body);
                }
                if let Some(branch) = else_branch {
                    out.push(branch);
                }
                out
            }
            Expr::Loop { body, .. } => body.iter().map(|b| &**b).collect(),
            Expr::Break { value, .. } => value.iter().map(|v| &**v).collect(),
        }
    }

    /// Multi-line structural formatter: one node per line, two-space
    /// indentation, operators shown by their surface text.
    pub fn lispfmt(&self) -> String {
        let mut out = String::new();
        self.lispfmt_into(&mut out, 0);
        out
    }

    fn lispfmt_into(&self, out: &mut String, indentation: usize) {
        let idt = |n: usize| "  ".repeat(n);
        match self {
            Expr::Int { value, .. } => {
                line(out, &idt(indentation), &value.to_string().cyan().to_string());
            }
            Expr::Float { value, .. } => {
                line(out, &idt(indentation), &value.to_string().cyan().to_string());
            }
            Expr::Bool { value, .. } => {
                line(out, &idt(indentation), &value.to_string().cyan().to_string());
            }
            Expr::Text { value, .. } => {
                line(out, &idt(indentation), &format!("{value:?}").green().to_string());
            }
            Expr::Ident { name, .. } => {
                line(out, &idt(indentation), &name.yellow().to_string());
            }
            Expr::Block { inner, .. } => {
                line(out, &idt(indentation), "{");
                inner.lispfmt_into(out, indentation + 1);
                line(out, &idt(indentation), "}");
            }
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => {
                line(out, &idt(indentation), &format!("({}", operator.kind.literal()));
                left.lispfmt_into(out, indentation + 1);
                right.lispfmt_into(out, indentation + 1);
                line(out, &idt(indentation), ")");
            }
            Expr::Unary {
                operator, operand, ..
            } => {
                line(out, &idt(indentation), &format!("({}", operator.kind.literal()));
                operand.lispfmt_into(out, indentation + 1);
                line(out, &idt(indentation), ")");
            }
            Expr::Call { callee, args, .. } => {
                line(out, &idt(indentation), "(call");
                callee.lispfmt_into(out, indentation + 1);
                for arg in args {
                    arg.lispfmt_into(out, indentation + 1);
                }
                line(out, &idt(indentation), ")");
            }
            Expr::Property { object, name, .. } => {
                line(out, &idt(indentation), "(.");
                object.lispfmt_into(out, indentation + 1);
                line(out, &idt(indentation + 1), &name.yellow().to_string());
                line(out, &idt(indentation), ")");
            }
            Expr::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
                ..
            } => {
                line(out, &idt(indentation), "(if");
                condition.lispfmt_into(out, indentation + 1);
                then_branch.lispfmt_into(out, indentation + 1);
                for (cond, body) in else_ifs {
                    line(out, &idt(indentation + 1), "(else-if");
                    cond.lispfmt_into(out, indentation + 2);
                    body.lispfmt_into(out, indentation + 2);
                    line(out, &idt(indentation + 1), ")");
                }
                if let Some(branch) = else_branch {
                    line(out, &idt(indentation + 1), "(else");
                    branch.lispfmt_into(out, indentation + 2);
                    line(out, &idt(indentation + 1), ")");
                }
                line(out, &idt(indentation), ")");
            }
            Expr::Loop { body, .. } => {
                line(out, &idt(indentation), "(loop");
                if let Some(body) = body {
                    body.lispfmt_into(out, indentation + 1);
                }
                line(out, &idt(indentation), ")");
            }
            Expr::Break { value, .. } => {
                line(out, &idt(indentation), "(break");
                if let Some(value) = value {
                    value.lispfmt_into(out, indentation + 1);
                }
                line(out, &idt(indentation), ")");
            }
        }
    }
}

fn line(out: &mut String, indent: &str, text: &str) {
    out.push_str(indent);
    out.push_str(text);
    out.push('\n');
}

/// Compact single-line repr, used by tests and the driver's success
/// output: `bin($int(1) Plus $int(2))`, `prop($id(a) b)`, …
impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int { value, .. } => write!(f, "$int({value})"),
            Expr::Float { value, .. } => write!(f, "$float({value})"),
            Expr::Text { value, .. } => write!(f, "$string({value})"),
            Expr::Bool { value, .. } => write!(f, "$bool({value})"),
            Expr::Ident { name, .. } => write!(f, "$id({name})"),
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => write!(f, "bin({left} {:?} {right})", operator.kind),
            Expr::Unary {
                operator, operand, ..
            } => write!(f, "unary({:?} {operand})", operator.kind),
            Expr::Block { inner, .. } => write!(f, "{{{inner}}}"),
            Expr::Call { callee, args, .. } => {
                write!(f, "call({callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Expr::Property { object, name, .. } => write!(f, "prop({object} {name})"),
            Expr::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
                ..
            } => {
                write!(f, "if({condition} {then_branch}")?;
                for (cond, body) in else_ifs {
                    write!(f, " elif({cond} {body})")?;
                }
                if let Some(branch) = else_branch {
                    write!(f, " else({branch})")?;
                }
                write!(f, ")")
            }
            Expr::Loop { body, .. } => match body {
                Some(body) => write!(f, "loop({body})"),
                None => write!(f, "loop()"),
            },
            Expr::Break { value, .. } => match value {
                Some(value) => write!(f, "break({value})"),
                None => write!(f, "break()"),
            },
        }
    }
}
