//! Binding powers for the Pratt parser. Higher binds tighter.

/// An infix/prefix binding power. The parser's loop consumes an operator
/// only while the operator's precedence is *strictly* above the current
/// floor, which makes every binary operator left-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precedence(pub u8);

impl Precedence {
    /// The floor a full expression is parsed at.
    pub const LOWEST: Precedence = Precedence(0);
    /// `;` sequencing.
    pub const SEMICOLON: Precedence = Precedence(1);
    /// The floor for a `break` operand, so a trailing `;` terminates the
    /// break instead of being swallowed by it.
    pub const BREAK_OPERAND: Precedence = Precedence(5);
    /// Reserved for the logical operators.
    pub const LOGICAL: Precedence = Precedence(10);
    /// `== != < <= > >=`.
    pub const COMPARISON: Precedence = Precedence(15);
    /// `+ -`.
    pub const ADDITIVE: Precedence = Precedence(20);
    /// `* / **`.
    pub const MULTIPLICATIVE: Precedence = Precedence(30);
    /// Prefix `!` and `-`.
    pub const UNARY: Precedence = Precedence(40);
    /// Call `(` and property `.`.
    pub const CALL: Precedence = Precedence(50);
}
