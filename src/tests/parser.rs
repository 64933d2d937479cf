use pretty_assertions::assert_eq;

use crate::ast::Expr;
use crate::diagnostics::Diagnostics;
use crate::parse::parse_expression;
use crate::source::SourceFile;
use crate::tokenize::{tokenize, TypeHint};
use crate::Options;

fn plain() {
    colored::control::set_override(false);
}

/// Lex and parse, expecting a clean run, and return the compact repr.
fn repr_of(text: &str) -> String {
    let src = SourceFile::new("p.esc", text);
    let mut diag = Diagnostics::buffered();
    let tokens = tokenize(&src, &Options::default(), &mut diag).expect("lexing should succeed");
    let expr = parse_expression(&src, tokens, &mut diag).expect("parsing should succeed");
    assert_eq!(
        diag.error_count(),
        0,
        "unexpected diagnostics: {}",
        diag.take_output()
    );
    expr.to_string()
}

/// Lex and parse a source that is expected to fail; return the rendered
/// diagnostics.
fn parse_failure(text: &str) -> String {
    let src = SourceFile::new("p.esc", text);
    let mut diag = Diagnostics::buffered();
    let tokens = tokenize(&src, &Options::default(), &mut diag).expect("lexing should succeed");
    let result = parse_expression(&src, tokens, &mut diag);
    assert!(result.is_err(), "expected a parse failure for {text:?}");
    diag.take_output()
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    plain();
    assert_eq!(
        repr_of("1 + 2 * 3"),
        "bin($int(1) Plus bin($int(2) Star $int(3)))"
    );
    assert_eq!(
        repr_of("1 * 2 + 3"),
        "bin(bin($int(1) Star $int(2)) Plus $int(3))"
    );
}

#[test]
fn binary_operators_are_left_associative() {
    plain();
    assert_eq!(
        repr_of("1 - 2 - 3"),
        "bin(bin($int(1) Minus $int(2)) Minus $int(3))"
    );
    assert_eq!(
        repr_of("2 ** 3 ** 4"),
        "bin(bin($int(2) StarStar $int(3)) StarStar $int(4))"
    );
}

#[test]
fn comparisons_share_one_bucket_and_chain() {
    plain();
    assert_eq!(
        repr_of("1 < 2 < 3"),
        "bin(bin($int(1) Less $int(2)) Less $int(3))"
    );
    assert_eq!(
        repr_of("1 + 2 == 3"),
        "bin(bin($int(1) Plus $int(2)) EqualEqual $int(3))"
    );
}

#[test]
fn semicolon_sequences_at_the_lowest_precedence() {
    plain();
    assert_eq!(repr_of("1; 2"), "bin($int(1) Semicolon $int(2))");
    assert_eq!(
        repr_of("1 + 2; 3"),
        "bin(bin($int(1) Plus $int(2)) Semicolon $int(3))"
    );
}

#[test]
fn parentheses_group_without_a_node() {
    plain();
    assert_eq!(
        repr_of("(1 + 2) * 3"),
        "bin(bin($int(1) Plus $int(2)) Star $int(3))"
    );
}

#[test]
fn braces_make_a_block_node() {
    plain();
    assert_eq!(repr_of("{ 1 }"), "{$int(1)}");
    assert_eq!(repr_of("{ 1 + 2 }"), "{bin($int(1) Plus $int(2))}");
}

#[test]
fn prefix_operators_bind_tighter_than_binary() {
    plain();
    assert_eq!(repr_of("!true"), "unary(Bang $bool(true))");
    assert_eq!(
        repr_of("-1 + 2"),
        "bin(unary(Minus $int(1)) Plus $int(2))"
    );
    assert_eq!(
        repr_of("-2 ** 3"),
        "bin(unary(Minus $int(2)) StarStar $int(3))"
    );
}

#[test]
fn calls_take_comma_separated_arguments() {
    plain();
    // A trailing comma is fine.
    assert_eq!(repr_of("f(1, 2,)"), "call($id(f) $int(1) $int(2))");
    assert_eq!(repr_of("f()"), "call($id(f))");
    assert_eq!(
        repr_of("f(g(1))(2)"),
        "call(call($id(f) call($id(g) $int(1))) $int(2))"
    );
}

#[test]
fn property_access_chains_leftward() {
    plain();
    assert_eq!(repr_of("a.b"), "prop($id(a) b)");
    assert_eq!(repr_of("a.b.c"), "prop(prop($id(a) b) c)");
    assert_eq!(repr_of("a.b(1)"), "call(prop($id(a) b) $int(1))");
}

#[test]
fn if_else_if_else_chains() {
    plain();
    assert_eq!(
        repr_of("if a { 1 } else if b { 2 } else { 3 }"),
        "if($id(a) {$int(1)} elif($id(b) {$int(2)}) else({$int(3)}))"
    );
    assert_eq!(repr_of("if a { 1 }"), "if($id(a) {$int(1)})");
    assert_eq!(
        repr_of("if a { 1 } else { 2 }"),
        "if($id(a) {$int(1)} else({$int(2)}))"
    );
}

#[test]
fn loops_have_an_optional_body() {
    plain();
    assert_eq!(repr_of("loop { }"), "loop()");
    assert_eq!(repr_of("loop { 1 }"), "loop($int(1))");
}

#[test]
fn break_stops_before_a_semicolon() {
    plain();
    assert_eq!(repr_of("loop { break }"), "loop(break())");
    assert_eq!(
        repr_of("loop { break 1; 2 }"),
        "loop(bin(break($int(1)) Semicolon $int(2)))"
    );
    assert_eq!(repr_of("loop { break 1 + 2 }"), "loop(break(bin($int(1) Plus $int(2))))");
}

#[test]
fn float_dot_method_call_is_corrected() {
    plain();
    let src = SourceFile::new("p.esc", "42.foo");
    let mut diag = Diagnostics::buffered();
    let tokens = tokenize(&src, &Options::default(), &mut diag).expect("lexing should succeed");
    let expr = parse_expression(&src, tokens, &mut diag).expect("parsing continues");
    assert_eq!(diag.error_count(), 1);
    assert!(diag
        .take_output()
        .contains("wrap integers in parentheses when calling methods upon them"));
    assert_eq!(expr.to_string(), "prop($int(42) foo)");
}

#[test]
fn literal_type_hints_reach_the_ast() {
    plain();
    let src = SourceFile::new("p.esc", "1_u8");
    let mut diag = Diagnostics::buffered();
    let tokens = tokenize(&src, &Options::default(), &mut diag).expect("lexing should succeed");
    let expr = parse_expression(&src, tokens, &mut diag).expect("parsing should succeed");
    assert!(
        matches!(
            expr,
            Expr::Int {
                value: 1,
                type_hint: Some(TypeHint::U8),
                ..
            }
        ),
        "{expr:?}"
    );
}

#[test]
fn missing_prefix_reports_expected_expression() {
    plain();
    let output = parse_failure("+ 1");
    assert!(output.contains("expected an expression, got '+'"), "{output}");

    let output = parse_failure("");
    assert!(output.contains("expected an expression, got EOF"), "{output}");
}

#[test]
fn unclosed_groups_report_at_eof() {
    plain();
    let output = parse_failure("(1");
    assert!(
        output.contains("expected a closing parenthesis, got EOF"),
        "{output}"
    );

    let output = parse_failure("{ 1");
    assert!(output.contains("expected '}', got EOF"), "{output}");
}

#[test]
fn property_access_requires_an_identifier() {
    plain();
    let output = parse_failure("a.1");
    assert!(
        output.contains("expected an identifier after '.', got an integer literal"),
        "{output}"
    );
}

#[test]
fn expression_spans_enclose_their_children() {
    plain();
    fn assert_encloses(expr: &Expr<'_>) {
        let span = expr.source_span();
        for child in expr.children() {
            let child_span = child.source_span();
            assert!(
                span.start <= child_span.start && child_span.end <= span.end,
                "{child:?} escapes {expr:?}"
            );
            assert_encloses(child);
        }
    }

    let src = SourceFile::new("p.esc", "if a { 1 + 2 } else { f(3, -4) }; loop { break 5 }");
    let mut diag = Diagnostics::buffered();
    let tokens = tokenize(&src, &Options::default(), &mut diag).expect("lexing should succeed");
    let expr = parse_expression(&src, tokens, &mut diag).expect("parsing should succeed");
    assert_encloses(&expr);
    assert_eq!(expr.source_span().content(), src.text);
}

#[test]
fn lispfmt_reflects_precedence_structure() {
    plain();
    let src = SourceFile::new("p.esc", "1 + 2 * 3");
    let mut diag = Diagnostics::buffered();
    let tokens = tokenize(&src, &Options::default(), &mut diag).expect("lexing should succeed");
    let expr = parse_expression(&src, tokens, &mut diag).expect("parsing should succeed");
    assert_eq!(
        expr.lispfmt(),
        "(+\n  1\n  (*\n    2\n    3\n  )\n)\n"
    );
}
