//! Parse-tree lowering: rule-name dispatch into AST builders.
//!
//! Every grammar rule maps to one lowering function. The mapping is a closed
//! table validated against the grammar when the table is built, so a rule
//! added to the grammar without a lowering entry (or a stale entry naming a
//! removed rule) fails at construction, not in the middle of lowering some
//! unlucky input.
//!
//! Lowering functions return `Ok(None)` for rules with no AST counterpart
//! (punctuation-only rules, declarations that carry no runtime behavior);
//! containers drop those absences rather than holding placeholder children.

use crate::ast::AstNode;
use crate::grammar::Grammar;
use crate::tree::ParseNode;
use std::collections::HashMap;
use std::fmt;

/// A lowering function for one rule. The node passed in is always a pruned
/// nonterminal labeled with that rule's name.
pub type LowerFn = fn(&LoweringTable, &ParseNode) -> Result<Option<AstNode>, LowerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
    /// A parse-tree node names a rule the table has no entry for. Reaching
    /// this after a successful build means the tree came from a different
    /// grammar.
    UnmappedRule(&'static str),
    /// Table construction found a rule without an entry, or an entry without
    /// a rule.
    IncompleteTable {
        missing: Vec<&'static str>,
        stale: Vec<&'static str>,
    },
    /// A node's pruned shape does not match what the rule's lowering expects.
    Malformed {
        rule: &'static str,
        expected: &'static str,
    },
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LowerError::UnmappedRule(rule) => {
                write!(f, "no lowering entry for rule '{}'", rule)
            }
            LowerError::IncompleteTable { missing, stale } => {
                write!(
                    f,
                    "lowering table does not cover the grammar (missing: [{}], stale: [{}])",
                    missing.join(", "),
                    stale.join(", ")
                )
            }
            LowerError::Malformed { rule, expected } => {
                write!(f, "malformed '{}' node, expected {}", rule, expected)
            }
        }
    }
}

impl std::error::Error for LowerError {}

/// The closed rule-name to lowering-function map.
#[derive(Debug)]
pub struct LoweringTable {
    entries: HashMap<&'static str, LowerFn>,
}

impl LoweringTable {
    /// Build the table, checking it against the grammar: every rule must
    /// have exactly one entry and every entry must name a grammar rule.
    pub fn build(
        grammar: &Grammar,
        entries: Vec<(&'static str, LowerFn)>,
    ) -> Result<Self, LowerError> {
        let map: HashMap<&'static str, LowerFn> = entries.into_iter().collect();
        let missing: Vec<&'static str> = grammar
            .rule_names()
            .filter(|name| !map.contains_key(name))
            .collect();
        let known: Vec<&'static str> = grammar.rule_names().collect();
        let stale: Vec<&'static str> = map
            .keys()
            .copied()
            .filter(|name| !known.contains(name))
            .collect();
        if !missing.is_empty() || !stale.is_empty() {
            return Err(LowerError::IncompleteTable { missing, stale });
        }
        Ok(LoweringTable { entries: map })
    }

    /// Lower one pruned parse-tree node by its rule name.
    pub fn lower(&self, node: &ParseNode) -> Result<Option<AstNode>, LowerError> {
        let rule = node.rule().ok_or(LowerError::Malformed {
            rule: "<terminal>",
            expected: "a nonterminal node",
        })?;
        let entry = self.entries.get(rule).ok_or(LowerError::UnmappedRule(rule))?;
        entry(self, node)
    }

    /// Like [`lower`](Self::lower) but treats an absent result as malformed.
    /// For positions where the grammar guarantees a value-producing child.
    pub fn lower_required(&self, node: &ParseNode) -> Result<AstNode, LowerError> {
        self.lower(node)?.ok_or(LowerError::Malformed {
            rule: node.rule().unwrap_or("<terminal>"),
            expected: "a value-producing subtree",
        })
    }
}

/// Lower the node's single meaningful child; the standard entry for
/// precedence-ladder rules that matched without their tail and for wrapper
/// rules like `statement`.
pub fn passthrough(table: &LoweringTable, node: &ParseNode) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [child] => table.lower(child),
        _ => Err(malformed(node, "exactly one child")),
    }
}

/// No AST counterpart; the parent decides what to do with the node's tokens.
pub fn absent(_table: &LoweringTable, _node: &ParseNode) -> Result<Option<AstNode>, LowerError> {
    Ok(None)
}

/// Lower a flat `operand tail tail ...` node into a left-associative
/// operator spine.
///
/// The repetition leaves the operand run flat; associativity is rebuilt here
/// by recursing from the last tail. Each tail lowers to an operator node
/// holding its own right operand, and the lowered prefix is inserted as the
/// left operand, so `a + b - c` becomes `(- (+ a b) c)`.
pub fn binary_expression(
    table: &LoweringTable,
    node: &ParseNode,
) -> Result<Option<AstNode>, LowerError> {
    lower_operand_run(table, node, node.children())
}

fn lower_operand_run(
    table: &LoweringTable,
    node: &ParseNode,
    children: &[ParseNode],
) -> Result<Option<AstNode>, LowerError> {
    let (last, prefix) = children
        .split_last()
        .ok_or_else(|| malformed(node, "at least one child"))?;
    if prefix.is_empty() {
        return table.lower(last);
    }
    let mut operator = table.lower_required(last)?;
    let left = match lower_operand_run(table, node, prefix)? {
        Some(left) => left,
        None => return Err(malformed(node, "a value-producing operand")),
    };
    operator.children.insert(0, left);
    Ok(Some(operator))
}

/// Lower an `operator operand` tail into an operator node holding only its
/// right operand; [`binary_expression`] supplies the left one.
pub fn binary_tail(table: &LoweringTable, node: &ParseNode) -> Result<Option<AstNode>, LowerError> {
    match node.children() {
        [op, operand] => {
            let text = op
                .token()
                .ok_or_else(|| malformed(node, "an operator terminal"))?
                .text
                .clone();
            let lowered = table.lower_required(operand)?;
            Ok(Some(AstNode::with_children(text, vec![lowered])))
        }
        _ => Err(malformed(node, "an operator and an operand")),
    }
}

pub(crate) fn malformed(node: &ParseNode, expected: &'static str) -> LowerError {
    LowerError::Malformed {
        rule: node.rule().unwrap_or("<terminal>"),
        expected,
    }
}
