//! The built-in C front end: grammar, lowering table, and the combined
//! source-to-AST pipeline.
//!
//! The grammar covers a small C subset: function definitions, declarations
//! with an optional pointer star and initializer, compound/selection/
//! iteration/jump statements, and the full binary operator precedence ladder
//! down through primary expressions. Precedence and associativity are
//! encoded structurally: each precedence level is a `head { tail }` rule
//! whose tails name the next-tighter level, and lowering rebuilds the
//! left-associative spine.
//!
//! Grammar and lowering table are built once, on first use, behind
//! [`c_front`]. Construction cross-checks the two (every rule lowered,
//! no stale entries), so an inconsistency is a startup failure rather than
//! a latent parse-time one.

use crate::ast::AstNode;
use crate::engine::{self, SyntaxError};
use crate::grammar::{Grammar, GrammarBuilder, GrammarError, RuleId, Sequence, Symbol};
use crate::lexer::{tokenize, LexError};
use crate::lower::{
    absent, binary_expression, binary_tail, malformed, passthrough, LowerError, LowerFn,
    LoweringTable,
};
use crate::token::{Token, TokenKind};
use crate::tree::{prune, ParseNode};
use once_cell::sync::Lazy;
use std::fmt;

/// Any front-end failure: lexing, parsing, or lowering.
#[derive(Debug)]
pub enum FrontError {
    Lex(LexError),
    Syntax(SyntaxError),
    Lower(LowerError),
}

impl fmt::Display for FrontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontError::Lex(err) => err.fmt(f),
            FrontError::Syntax(err) => err.fmt(f),
            FrontError::Lower(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for FrontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrontError::Lex(err) => Some(err),
            FrontError::Syntax(err) => Some(err),
            FrontError::Lower(err) => Some(err),
        }
    }
}

impl From<LexError> for FrontError {
    fn from(err: LexError) -> Self {
        FrontError::Lex(err)
    }
}

impl From<SyntaxError> for FrontError {
    fn from(err: SyntaxError) -> Self {
        FrontError::Syntax(err)
    }
}

impl From<LowerError> for FrontError {
    fn from(err: LowerError) -> Self {
        FrontError::Lower(err)
    }
}

/// The assembled front end: grammar, entry rule, and lowering table.
pub struct CFront {
    grammar: Grammar,
    program: RuleId,
    lowering: LoweringTable,
}

#[derive(Debug)]
enum BuildError {
    Grammar(GrammarError),
    Lower(LowerError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Grammar(err) => err.fmt(f),
            BuildError::Lower(err) => err.fmt(f),
        }
    }
}

static C_FRONT: Lazy<CFront> = Lazy::new(|| match CFront::build() {
    Ok(front) => front,
    Err(err) => panic!("built-in C grammar is inconsistent: {err}"),
});

/// The process-wide C front end. Built on first use.
pub fn c_front() -> &'static CFront {
    &C_FRONT
}

impl CFront {
    fn build() -> Result<Self, BuildError> {
        let (grammar, program) = build_grammar().map_err(BuildError::Grammar)?;
        let lowering =
            LoweringTable::build(&grammar, lowering_entries()).map_err(BuildError::Lower)?;
        Ok(CFront {
            grammar,
            program,
            lowering,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parse a whole token sequence into a pruned parse tree.
    pub fn parse(&self, tokens: &[Token]) -> Result<ParseNode, SyntaxError> {
        let mut tree = engine::parse(&self.grammar, self.program, tokens)?;
        prune(&mut tree);
        Ok(tree)
    }

    /// Lower a pruned parse tree into its AST.
    pub fn lower(&self, tree: &ParseNode) -> Result<AstNode, LowerError> {
        self.lowering.lower_required(tree)
    }
}

/// Run the whole pipeline on one source text.
pub fn compile(source: &str) -> Result<AstNode, FrontError> {
    let tokens = tokenize(source)?;
    let front = c_front();
    let tree = front.parse(&tokens)?;
    Ok(front.lower(&tree)?)
}

fn build_grammar() -> Result<(Grammar, RuleId), GrammarError> {
    let mut b = GrammarBuilder::new();

    let program = b.declare("program");
    let top_level_decl = b.declare("top_level_decl");
    let function_definition = b.declare("function_definition");
    let parameter_list = b.declare("parameter_list");
    let parameter_tail = b.declare("parameter_tail");
    let parameter_declaration = b.declare("parameter_declaration");
    let declaration = b.declare("declaration");
    let init_declarator = b.declare("init_declarator");
    let declarator = b.declare("declarator");
    let type_specifier = b.declare("type_specifier");
    let compound_statement = b.declare("compound_statement");
    let block_item = b.declare("block_item");
    let statement = b.declare("statement");
    let expression_statement = b.declare("expression_statement");
    let selection_statement = b.declare("selection_statement");
    let else_clause = b.declare("else_clause");
    let iteration_statement = b.declare("iteration_statement");
    let jump_statement = b.declare("jump_statement");
    let expression = b.declare("expression");
    let expression_tail = b.declare("expression_tail");
    let assignment_expression = b.declare("assignment_expression");
    let assignment_op = b.declare("assignment_op");
    let logical_or_expression = b.declare("logical_or_expression");
    let logical_or_tail = b.declare("logical_or_tail");
    let logical_and_expression = b.declare("logical_and_expression");
    let logical_and_tail = b.declare("logical_and_tail");
    let or_expression = b.declare("or_expression");
    let or_tail = b.declare("or_tail");
    let xor_expression = b.declare("xor_expression");
    let xor_tail = b.declare("xor_tail");
    let and_expression = b.declare("and_expression");
    let and_tail = b.declare("and_tail");
    let equality_expression = b.declare("equality_expression");
    let equality_tail = b.declare("equality_tail");
    let relational_expression = b.declare("relational_expression");
    let relational_tail = b.declare("relational_tail");
    let shift_expression = b.declare("shift_expression");
    let shift_tail = b.declare("shift_tail");
    let additive_expression = b.declare("additive_expression");
    let additive_tail = b.declare("additive_tail");
    let multiplicative_expression = b.declare("multiplicative_expression");
    let multiplicative_tail = b.declare("multiplicative_tail");
    let unary_expression = b.declare("unary_expression");
    let unary_op = b.declare("unary_op");
    let postfix_expression = b.declare("postfix_expression");
    let postfix_op = b.declare("postfix_op");
    let primary_expression = b.declare("primary_expression");

    b.define(
        program,
        vec![Sequence::repetition(vec![Symbol::rule(top_level_decl)])],
    );
    b.define(
        top_level_decl,
        vec![
            Sequence::of(vec![Symbol::rule(function_definition)]),
            Sequence::of(vec![Symbol::rule(declaration)]),
        ],
    );
    b.define(
        function_definition,
        vec![Sequence::of(vec![
            Symbol::rule(type_specifier),
            Symbol::rule(declarator),
            Symbol::lit("("),
            Symbol::opt(vec![Symbol::rule(parameter_list)]),
            Symbol::lit(")"),
            Symbol::rule(compound_statement),
        ])],
    );
    b.define(
        parameter_list,
        vec![Sequence::of(vec![
            Symbol::rule(parameter_declaration),
            Symbol::many(vec![Symbol::rule(parameter_tail)]),
        ])],
    );
    b.define(
        parameter_tail,
        vec![Sequence::of(vec![
            Symbol::lit(","),
            Symbol::rule(parameter_declaration),
        ])],
    );
    b.define(
        parameter_declaration,
        vec![Sequence::of(vec![
            Symbol::rule(type_specifier),
            Symbol::rule(declarator),
        ])],
    );
    b.define(
        declaration,
        vec![Sequence::of(vec![
            Symbol::rule(type_specifier),
            Symbol::rule(init_declarator),
            Symbol::lit(";"),
        ])],
    );
    b.define(
        init_declarator,
        vec![Sequence::of(vec![
            Symbol::rule(declarator),
            Symbol::opt(vec![Symbol::lit("="), Symbol::rule(assignment_expression)]),
        ])],
    );
    b.define(
        declarator,
        vec![Sequence::of(vec![
            Symbol::opt(vec![Symbol::lit("*")]),
            Symbol::kind(TokenKind::Identifier),
        ])],
    );
    b.define(
        type_specifier,
        literal_alternatives(&["int", "char", "void", "float", "double"]),
    );
    b.define(
        compound_statement,
        vec![Sequence::of(vec![
            Symbol::lit("{"),
            Symbol::many(vec![Symbol::rule(block_item)]),
            Symbol::lit("}"),
        ])],
    );
    b.define(
        block_item,
        vec![
            Sequence::of(vec![Symbol::rule(statement)]),
            Sequence::of(vec![Symbol::rule(declaration)]),
        ],
    );
    b.define(
        statement,
        vec![
            Sequence::of(vec![Symbol::rule(compound_statement)]),
            Sequence::of(vec![Symbol::rule(expression_statement)]),
            Sequence::of(vec![Symbol::rule(selection_statement)]),
            Sequence::of(vec![Symbol::rule(iteration_statement)]),
            Sequence::of(vec![Symbol::rule(jump_statement)]),
        ],
    );
    b.define(
        expression_statement,
        vec![
            Sequence::of(vec![Symbol::rule(expression), Symbol::lit(";")]),
            Sequence::of(vec![Symbol::lit(";")]),
        ],
    );
    b.define(
        selection_statement,
        vec![Sequence::of(vec![
            Symbol::lit("if"),
            Symbol::lit("("),
            Symbol::rule(expression),
            Symbol::lit(")"),
            Symbol::rule(statement),
            Symbol::opt(vec![Symbol::rule(else_clause)]),
        ])],
    );
    b.define(
        else_clause,
        vec![Sequence::of(vec![
            Symbol::lit("else"),
            Symbol::rule(statement),
        ])],
    );
    b.define(
        iteration_statement,
        vec![Sequence::of(vec![
            Symbol::lit("while"),
            Symbol::lit("("),
            Symbol::rule(expression),
            Symbol::lit(")"),
            Symbol::rule(statement),
        ])],
    );
    b.define(
        jump_statement,
        vec![
            Sequence::of(vec![
                Symbol::lit("return"),
                Symbol::opt(vec![Symbol::rule(expression)]),
                Symbol::lit(";"),
            ]),
            Sequence::of(vec![Symbol::lit("break"), Symbol::lit(";")]),
            Sequence::of(vec![Symbol::lit("continue"), Symbol::lit(";")]),
        ],
    );
    b.define(
        expression,
        vec![Sequence::of(vec![
            Symbol::rule(assignment_expression),
            Symbol::many(vec![Symbol::rule(expression_tail)]),
        ])],
    );
    b.define(
        expression_tail,
        vec![Sequence::of(vec![
            Symbol::lit(","),
            Symbol::rule(assignment_expression),
        ])],
    );
    b.define(
        assignment_expression,
        vec![
            Sequence::of(vec![
                Symbol::rule(unary_expression),
                Symbol::rule(assignment_op),
                Symbol::rule(assignment_expression),
            ]),
            Sequence::of(vec![Symbol::rule(logical_or_expression)]),
        ],
    );
    b.define(
        assignment_op,
        literal_alternatives(&["=", "+=", "-=", "*=", "/=", "%=", "&=", "^=", "|="]),
    );

    ladder(&mut b, logical_or_expression, logical_or_tail, logical_and_expression, &["||"]);
    ladder(&mut b, logical_and_expression, logical_and_tail, or_expression, &["&&"]);
    ladder(&mut b, or_expression, or_tail, xor_expression, &["|"]);
    ladder(&mut b, xor_expression, xor_tail, and_expression, &["^"]);
    ladder(&mut b, and_expression, and_tail, equality_expression, &["&"]);
    ladder(&mut b, equality_expression, equality_tail, relational_expression, &["==", "!="]);
    ladder(&mut b, relational_expression, relational_tail, shift_expression, &["<", ">", "<=", ">="]);
    ladder(&mut b, shift_expression, shift_tail, additive_expression, &["<<", ">>"]);
    ladder(&mut b, additive_expression, additive_tail, multiplicative_expression, &["+", "-"]);
    ladder(&mut b, multiplicative_expression, multiplicative_tail, unary_expression, &["*", "/", "%"]);

    b.define(
        unary_expression,
        vec![
            Sequence::of(vec![
                Symbol::rule(unary_op),
                Symbol::rule(unary_expression),
            ]),
            Sequence::of(vec![Symbol::rule(postfix_expression)]),
        ],
    );
    b.define(
        unary_op,
        literal_alternatives(&["+", "-", "!", "~", "*", "&", "++", "--"]),
    );
    b.define(
        postfix_expression,
        vec![Sequence::of(vec![
            Symbol::rule(primary_expression),
            Symbol::opt(vec![Symbol::rule(postfix_op)]),
        ])],
    );
    b.define(postfix_op, literal_alternatives(&["++", "--"]));
    b.define(
        primary_expression,
        vec![
            Sequence::of(vec![Symbol::kind(TokenKind::Identifier)]),
            Sequence::of(vec![Symbol::kind(TokenKind::Literal)]),
            Sequence::of(vec![
                Symbol::lit("("),
                Symbol::rule(expression),
                Symbol::lit(")"),
            ]),
        ],
    );

    Ok((b.build()?, program))
}

/// One alternative per literal; for keyword and operator choice rules.
fn literal_alternatives(texts: &[&'static str]) -> Vec<Sequence> {
    texts
        .iter()
        .map(|text| Sequence::of(vec![Symbol::lit(text)]))
        .collect()
}

/// One precedence level: `expr := operand { tail }` with one tail
/// alternative per operator at this level.
fn ladder(
    b: &mut GrammarBuilder,
    expr: RuleId,
    tail: RuleId,
    operand: RuleId,
    operators: &[&'static str],
) {
    b.define(
        expr,
        vec![Sequence::of(vec![
            Symbol::rule(operand),
            Symbol::many(vec![Symbol::rule(tail)]),
        ])],
    );
    b.define(
        tail,
        operators
            .iter()
            .map(|op| Sequence::of(vec![Symbol::lit(op), Symbol::rule(operand)]))
            .collect(),
    );
}

fn lowering_entries() -> Vec<(&'static str, LowerFn)> {
    vec![
        ("program", lower_program as LowerFn),
        ("top_level_decl", passthrough),
        ("function_definition", lower_function_definition),
        ("parameter_list", absent),
        ("parameter_tail", absent),
        ("parameter_declaration", absent),
        ("declaration", absent),
        ("init_declarator", absent),
        ("declarator", absent),
        ("type_specifier", absent),
        ("compound_statement", lower_compound_statement),
        ("block_item", passthrough),
        ("statement", passthrough),
        ("expression_statement", lower_expression_statement),
        ("selection_statement", lower_selection_statement),
        ("else_clause", lower_else_clause),
        ("iteration_statement", lower_iteration_statement),
        ("jump_statement", lower_jump_statement),
        ("expression", lower_expression),
        ("expression_tail", lower_expression_tail),
        ("assignment_expression", lower_assignment_expression),
        ("assignment_op", absent),
        ("logical_or_expression", binary_expression),
        ("logical_or_tail", binary_tail),
        ("logical_and_expression", binary_expression),
        ("logical_and_tail", binary_tail),
        ("or_expression", binary_expression),
        ("or_tail", binary_tail),
        ("xor_expression", binary_expression),
        ("xor_tail", binary_tail),
        ("and_expression", binary_expression),
        ("and_tail", binary_tail),
        ("equality_expression", binary_expression),
        ("equality_tail", binary_tail),
        ("relational_expression", binary_expression),
        ("relational_tail", binary_tail),
        ("shift_expression", binary_expression),
        ("shift_tail", binary_tail),
        ("additive_expression", binary_expression),
        ("additive_tail", binary_tail),
        ("multiplicative_expression", binary_expression),
        ("multiplicative_tail", binary_tail),
        ("unary_expression", lower_unary_expression),
        ("unary_op", absent),
        ("postfix_expression", lower_postfix_expression),
        ("postfix_op", absent),
        ("primary_expression", lower_primary_expression),
    ]
}

fn lower_program(table: &LoweringTable, node: &ParseNode) -> Result<Option<AstNode>, LowerError> {
    let mut decls = Vec::new();
    for child in node.children() {
        if let Some(lowered) = table.lower(child)? {
            decls.push(lowered);
        }
    }
    Ok(Some(AstNode::with_children("<program>", decls)))
}

/// A function definition lowers to its body; the signature carries no
/// runtime behavior at this stage.
fn lower_function_definition(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    let body = node
        .children()
        .last()
        .ok_or_else(|| malformed(node, "a function body"))?;
    table.lower(body)
}

fn lower_compound_statement(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    let mut items = Vec::new();
    for child in node.children() {
        // skip the brace terminals
        if child.rule().is_none() {
            continue;
        }
        if let Some(lowered) = table.lower(child)? {
            items.push(lowered);
        }
    }
    Ok(Some(AstNode::with_children("<compound statement>", items)))
}

fn lower_expression_statement(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        // the empty statement
        [semi] if semi.rule().is_none() => Ok(None),
        [expr, _semi] => table.lower(expr),
        _ => Err(malformed(node, "an expression and ';', or a bare ';'")),
    }
}

fn lower_selection_statement(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    let (condition, then_stmt, else_clause) = match node.children() {
        [_if, _lp, condition, _rp, then_stmt] => (condition, then_stmt, None),
        [_if, _lp, condition, _rp, then_stmt, else_clause] => {
            (condition, then_stmt, Some(else_clause))
        }
        _ => return Err(malformed(node, "'if' '(' expression ')' statement")),
    };
    let mut children = vec![table.lower_required(condition)?];
    if let Some(then_branch) = table.lower(then_stmt)? {
        children.push(then_branch);
    }
    if let Some(clause) = else_clause {
        if let Some(else_branch) = table.lower(clause)? {
            children.push(else_branch);
        }
    }
    Ok(Some(AstNode::with_children("if", children)))
}

fn lower_else_clause(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [_else, stmt] => table.lower(stmt),
        _ => Err(malformed(node, "'else' statement")),
    }
}

fn lower_iteration_statement(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [_while, _lp, condition, _rp, body] => {
            let mut children = vec![table.lower_required(condition)?];
            if let Some(body) = table.lower(body)? {
                children.push(body);
            }
            Ok(Some(AstNode::with_children("while", children)))
        }
        _ => Err(malformed(node, "'while' '(' expression ')' statement")),
    }
}

fn lower_jump_statement(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    let children = node.children();
    let keyword = children
        .first()
        .and_then(ParseNode::token)
        .ok_or_else(|| malformed(node, "a jump keyword"))?;
    let mut out = Vec::new();
    for child in &children[1..] {
        if child.rule().is_none() {
            continue;
        }
        if let Some(lowered) = table.lower(child)? {
            out.push(lowered);
        }
    }
    Ok(Some(AstNode::with_children(keyword.text.clone(), out)))
}

fn lower_expression(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [] => Err(malformed(node, "at least one assignment expression")),
        [single] => table.lower(single),
        many => {
            let mut parts = Vec::new();
            for child in many {
                if let Some(lowered) = table.lower(child)? {
                    parts.push(lowered);
                }
            }
            Ok(Some(AstNode::with_children("<expression sequence>", parts)))
        }
    }
}

fn lower_expression_tail(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [_comma, value] => table.lower(value),
        _ => Err(malformed(node, "',' and an assignment expression")),
    }
}

fn lower_assignment_expression(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [single] => table.lower(single),
        [target, op, value] => {
            let text = operator_text(op)
                .ok_or_else(|| malformed(node, "an assignment operator"))?
                .to_owned();
            let target = table.lower_required(target)?;
            let value = table.lower_required(value)?;
            Ok(Some(AstNode::with_children(text, vec![target, value])))
        }
        _ => Err(malformed(node, "an assignment or a conditional expression")),
    }
}

fn lower_unary_expression(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [single] => table.lower(single),
        [op, operand] => {
            let text = operator_text(op)
                .ok_or_else(|| malformed(node, "a unary operator"))?
                .to_owned();
            let operand = table.lower_required(operand)?;
            Ok(Some(AstNode::with_children(text, vec![operand])))
        }
        _ => Err(malformed(node, "an operator and an operand")),
    }
}

fn lower_postfix_expression(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [single] => table.lower(single),
        [primary, op] => {
            let text = operator_text(op)
                .ok_or_else(|| malformed(node, "a postfix operator"))?
                .to_owned();
            let operand = table.lower_required(primary)?;
            Ok(Some(AstNode::with_children(text, vec![operand])))
        }
        _ => Err(malformed(node, "at most one postfix operator")),
    }
}

fn lower_primary_expression(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [leaf] => match leaf.token() {
            Some(token) if token.kind == TokenKind::Identifier => {
                Ok(Some(AstNode::leaf(format!("id: {}", token.text))))
            }
            Some(token) => Ok(Some(AstNode::leaf(token.text.clone()))),
            None => Err(malformed(node, "an identifier or a literal")),
        },
        [_lp, expr, _rp] => table.lower(expr),
        _ => Err(malformed(node, "a leaf or a parenthesized expression")),
    }
}

/// The single terminal inside a one-token operator rule like `assignment_op`.
fn operator_text(node: &ParseNode) -> Option<&str> {
    node.children()
        .first()
        .and_then(ParseNode::token)
        .map(|token| token.text.as_str())
}
