//! Integration tests for parse-tree lowering through the built-in C grammar
//!
//! Each test compiles a snippet and asserts the exact AST shape via the
//! compact s-expression rendering, so operator precedence, associativity,
//! and statement structure are all visible in one string.

use minicc::c_grammar::compile;

fn body_sexpr(source: &str) -> String {
    let ast = compile(source).unwrap();
    // peel off <program> and the function's <compound statement>
    assert_eq!(ast.name, "<program>");
    assert_eq!(ast.children.len(), 1);
    let body = &ast.children[0];
    assert_eq!(body.name, "<compound statement>");
    assert_eq!(body.children.len(), 1);
    body.children[0].to_sexpr()
}

#[test]
fn precedence_ladder_orders_all_ten_levels() {
    let sexpr = body_sexpr("int f() { return a || b && c | d ^ e & f == g < h << i + j * k; }");
    assert_eq!(
        sexpr,
        "(return (|| id: a (&& id: b (| id: c (^ id: d (& id: e (== id: f (< id: g (<< id: h (+ id: i (* id: j id: k))))))))))"
            .to_owned()
            + ")"
    );
}

#[test]
fn equal_precedence_chains_are_left_associative() {
    assert_eq!(
        body_sexpr("int f() { return 10 / 5 / 2; }"),
        "(return (/ (/ 10 5) 2))"
    );
    assert_eq!(
        body_sexpr("int f() { return a - b + c; }"),
        "(return (+ (- id: a id: b) id: c))"
    );
}

#[test]
fn unary_operators_nest_right_to_left() {
    assert_eq!(
        body_sexpr("int f() { return - ! x; }"),
        "(return (- (! id: x)))"
    );
    assert_eq!(
        body_sexpr("int f() { return * p + 1; }"),
        "(return (+ (* id: p) 1))"
    );
}

#[test]
fn prefix_and_postfix_increments_lower_to_operator_nodes() {
    assert_eq!(body_sexpr("void f() { ++ x; }"), "(++ id: x)");
    assert_eq!(body_sexpr("void f() { x ++; }"), "(++ id: x)");
}

#[test]
fn compound_assignment_keeps_operator_text() {
    assert_eq!(
        body_sexpr("void f() { x += y * 2; }"),
        "(+= id: x (* id: y 2))"
    );
}

#[test]
fn comma_expression_becomes_a_sequence_node() {
    assert_eq!(
        body_sexpr("void f() { a = 1, b = 2; }"),
        "(<expression sequence> (= id: a 1) (= id: b 2))"
    );
}

#[test]
fn if_without_else_has_two_children() {
    assert_eq!(
        body_sexpr("void f() { if (x < 10) x = 0; }"),
        "(if (< id: x 10) (= id: x 0))"
    );
}

#[test]
fn dangling_else_binds_to_the_nearest_if() {
    assert_eq!(
        body_sexpr("void f() { if (a) if (b) x = 1; else x = 2; }"),
        "(if id: a (if id: b (= id: x 1) (= id: x 2)))"
    );
}

#[test]
fn while_lowers_condition_then_body() {
    assert_eq!(
        body_sexpr("void f() { while (i < n) i += 1; }"),
        "(while (< id: i id: n) (+= id: i 1))"
    );
}

#[test]
fn nested_blocks_stay_nested() {
    assert_eq!(
        body_sexpr("void f() { { x = 1; } }"),
        "(<compound statement> (= id: x 1))"
    );
}

#[test]
fn empty_statements_vanish() {
    let ast = compile("void f() { ; ; }").unwrap();
    assert_eq!(ast.to_sexpr(), "(<program> <compound statement>)");
}

#[test]
fn declarations_and_signatures_leave_no_ast() {
    // pointer declarators, initializers, and parameters all lower away
    let ast = compile("int g(int a, char *b) { int *p = x; return 0; }").unwrap();
    assert_eq!(
        ast.to_sexpr(),
        "(<program> (<compound statement> (return 0)))"
    );
}

#[test]
fn return_without_value_is_a_leaf() {
    assert_eq!(body_sexpr("void f() { return; }"), "return");
}

#[test]
fn break_and_continue_lower_to_leaves() {
    assert_eq!(
        body_sexpr("void f() { while (1) break; }"),
        "(while 1 break)"
    );
    assert_eq!(
        body_sexpr("void f() { while (1) continue; }"),
        "(while 1 continue)"
    );
}
