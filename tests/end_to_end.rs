//! End-to-end pipeline tests: source text through tokens, parse tree, and AST
//!
//! Multi-line inputs, error positions, and property-based checks of the
//! structural invariants the pipeline promises: terminal spans equal token
//! counts, pruning is idempotent, and operand runs lower left-associative.

use minicc::c_grammar::{c_front, compile, FrontError};
use minicc::lexer::tokenize;
use minicc::tree::{prune, ParseNode};
use proptest::prelude::*;
use rstest::rstest;

#[test]
fn multi_line_program_compiles_with_correct_positions() {
    let source = "\
int main() {
    int total = 0;
    while (total < 10) {
        total += 1;
    }
    return total;
}
";
    let tokens = tokenize(source).unwrap();
    let brace = tokens.last().unwrap();
    assert_eq!((brace.line, brace.column), (7, 1));

    let ast = compile(source).unwrap();
    assert_eq!(
        ast.to_sexpr(),
        "(<program> (<compound statement> \
         (while (< id: total 10) (<compound statement> (+= id: total 1))) \
         (return id: total)))"
    );
}

#[test]
fn comments_and_preprocessor_lines_are_invisible_to_the_parser() {
    let source = "\
#include <stdio.h>
// entry point
int main() {
    /* nothing yet */
    return 0;
}
";
    let ast = compile(source).unwrap();
    assert_eq!(ast.to_sexpr(), "(<program> (<compound statement> (return 0)))");
}

#[test]
fn syntax_error_reports_line_and_column_of_the_furthest_token() {
    let source = "\
int main() {
    return 1 +
        + ;
}
";
    // '+' parses as a unary operator, so the dead end is the ';' where an
    // operand was required
    let err = compile(source).unwrap_err();
    match err {
        FrontError::Syntax(err) => {
            assert_eq!(err.found.as_deref(), Some(";"));
            assert_eq!((err.line, err.column), (3, 11));
        }
        other => panic!("expected a syntax error, got {other}"),
    }
}

#[test]
fn lex_error_wins_over_parsing() {
    let err = compile("int main() { return `x; }").unwrap_err();
    assert!(matches!(err, FrontError::Lex(_)));
}

#[rstest]
#[case::no_parameters("int f() { return 0; }")]
#[case::one_parameter("int f(int a) { return a; }")]
#[case::three_parameters("int f(int a, char b, int *c) { return a; }")]
#[case::pointer_return_values("int *f(int a) { return a; }")]
fn parameter_lists_of_any_length_parse(#[case] source: &str) {
    compile(source).unwrap();
}

fn count_rule(node: &ParseNode, rule: &str) -> usize {
    let own = usize::from(node.rule() == Some(rule));
    own + node
        .children()
        .iter()
        .map(|child| count_rule(child, rule))
        .sum::<usize>()
}

#[rstest]
#[case::zero("int f() { }", 0, 0)]
#[case::one("int f(int a) { }", 1, 0)]
#[case::three("int f(int a, int b, int c) { }", 3, 2)]
fn parameter_repetitions_yield_sibling_tail_nodes(
    #[case] source: &str,
    #[case] declarations: usize,
    #[case] tails: usize,
) {
    let tokens = tokenize(source).unwrap();
    let tree = c_front().parse(&tokens).unwrap();
    assert_eq!(count_rule(&tree, "parameter_declaration"), declarations);
    assert_eq!(count_rule(&tree, "parameter_tail"), tails);
    assert_eq!(tree.terminal_count(), tokens.len());
}

#[rstest]
#[case::empty_program("")]
#[case::declaration_only("int x;")]
#[case::initialized_declaration("int x = 1 + 2;")]
#[case::two_functions("void a() { } void b() { }")]
fn top_level_shapes_parse(#[case] source: &str) {
    compile(source).unwrap();
}

#[rstest]
#[case::missing_semicolon("int main() { return 0 }")]
#[case::unbalanced_brace("int main() { return 0;")]
#[case::stray_top_level_statement("return 0;")]
#[case::keyword_as_identifier("int while;")]
fn malformed_programs_are_syntax_errors(#[case] source: &str) {
    let err = compile(source).unwrap_err();
    assert!(matches!(err, FrontError::Syntax(_)));
}

fn small_literal() -> impl Strategy<Value = u32> {
    0u32..1000
}

proptest! {
    #[test]
    fn additive_runs_lower_left_associative(operands in prop::collection::vec(small_literal(), 1..8)) {
        let joined = operands
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" + ");
        let source = format!("int f() {{ return {joined}; }}");
        let ast = compile(&source).unwrap();

        let mut expected = operands[0].to_string();
        for operand in &operands[1..] {
            expected = format!("(+ {expected} {operand})");
        }
        prop_assert_eq!(
            ast.to_sexpr(),
            format!("(<program> (<compound statement> (return {expected})))")
        );
    }

    #[test]
    fn parse_trees_span_exactly_the_input_tokens(operands in prop::collection::vec(small_literal(), 1..6)) {
        let joined = operands
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" * ");
        let source = format!("int f() {{ return {joined}; }}");
        let tokens = tokenize(&source).unwrap();
        let tree = c_front().parse(&tokens).unwrap();
        prop_assert_eq!(tree.terminal_count(), tokens.len());
    }

    #[test]
    fn pruning_is_idempotent_on_real_parse_trees(count in 0usize..4) {
        let body = "x = x + 1; ".repeat(count);
        let source = format!("void f() {{ {body}}}");
        let tokens = tokenize(&source).unwrap();
        let tree = c_front().parse(&tokens).unwrap();
        let mut repruned = tree.clone();
        prune(&mut repruned);
        prop_assert_eq!(repruned, tree);
    }
}
