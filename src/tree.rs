//! Parse tree nodes and the epsilon-pruning pass.
//!
//!     The matching engine produces a raw tree of nonterminals (labeled with
//!     rule names) over terminals (one token each, or an epsilon placeholder
//!     wrapping no token). Every node knows how many terminal leaves it spans;
//!     the engine relies on that count to advance its token cursor without
//!     re-scanning, so the count is computed once at construction and never
//!     mutated.
//!
//!     Epsilon placeholders exist only so the engine can represent "this
//!     optional/repeated part matched nothing" uniformly. [`prune`] removes
//!     them before lowering; consumers of a pruned tree never see an empty
//!     subtree.

use crate::token::Token;
use std::fmt;

/// One parse-tree node: an internal rule match or a leaf token.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseNode {
    Nonterminal {
        rule: &'static str,
        children: Vec<ParseNode>,
        terminals: usize,
    },
    /// A matched token, or `None` for an epsilon (zero-token) leaf.
    Terminal(Option<Token>),
}

impl ParseNode {
    /// Build a nonterminal over its children, deriving the terminal span.
    pub fn nonterminal(rule: &'static str, children: Vec<ParseNode>) -> Self {
        let terminals = children.iter().map(ParseNode::terminal_count).sum();
        ParseNode::Nonterminal {
            rule,
            children,
            terminals,
        }
    }

    pub fn terminal(token: Token) -> Self {
        ParseNode::Terminal(Some(token))
    }

    /// The epsilon leaf: spans zero tokens.
    pub fn epsilon() -> Self {
        ParseNode::Terminal(None)
    }

    /// Number of input tokens this subtree consumed.
    pub fn terminal_count(&self) -> usize {
        match self {
            ParseNode::Nonterminal { terminals, .. } => *terminals,
            ParseNode::Terminal(Some(_)) => 1,
            ParseNode::Terminal(None) => 0,
        }
    }

    pub fn rule(&self) -> Option<&'static str> {
        match self {
            ParseNode::Nonterminal { rule, .. } => Some(rule),
            ParseNode::Terminal(_) => None,
        }
    }

    pub fn children(&self) -> &[ParseNode] {
        match self {
            ParseNode::Nonterminal { children, .. } => children,
            ParseNode::Terminal(_) => &[],
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            ParseNode::Terminal(token) => token.as_ref(),
            ParseNode::Nonterminal { .. } => None,
        }
    }

    fn name(&self) -> String {
        match self {
            ParseNode::Nonterminal { rule, .. } => format!("<{}>", rule),
            ParseNode::Terminal(Some(token)) => token.text.clone(),
            ParseNode::Terminal(None) => String::new(),
        }
    }

    /// Debug dump: one node per line, depth shown as a `|` prefix per level.
    /// Not a machine-readable format.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push('|');
        }
        out.push_str(&self.name());
        out.push('\n');
        for child in self.children() {
            child.dump_into(out, depth + 1);
        }
    }
}

impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dump())
    }
}

/// Remove every zero-terminal child (epsilon placeholders and nonterminals
/// that derived only epsilon), recursively. Terminal-count bookkeeping is
/// already final and is not touched. Idempotent.
pub fn prune(node: &mut ParseNode) {
    if let ParseNode::Nonterminal { children, .. } = node {
        children.retain(|child| child.terminal_count() > 0);
        for child in children {
            prune(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn tok(text: &str) -> Token {
        Token::new(text, TokenKind::Identifier, 1, 1)
    }

    #[test]
    fn terminal_count_sums_over_children() {
        let tree = ParseNode::nonterminal(
            "pair",
            vec![
                ParseNode::terminal(tok("a")),
                ParseNode::epsilon(),
                ParseNode::nonterminal("inner", vec![ParseNode::terminal(tok("b"))]),
            ],
        );
        assert_eq!(tree.terminal_count(), 2);
    }

    #[test]
    fn prune_removes_epsilon_leaves_and_empty_subtrees() {
        let mut tree = ParseNode::nonterminal(
            "outer",
            vec![
                ParseNode::terminal(tok("a")),
                ParseNode::epsilon(),
                ParseNode::nonterminal("hollow", vec![ParseNode::epsilon()]),
                ParseNode::nonterminal(
                    "inner",
                    vec![ParseNode::epsilon(), ParseNode::terminal(tok("b"))],
                ),
            ],
        );
        prune(&mut tree);
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[1].children().len(), 1);
        // counts are finalized at construction and unchanged by pruning
        assert_eq!(tree.terminal_count(), 2);
    }

    #[test]
    fn prune_is_idempotent() {
        let mut tree = ParseNode::nonterminal(
            "outer",
            vec![
                ParseNode::epsilon(),
                ParseNode::nonterminal("inner", vec![ParseNode::terminal(tok("x"))]),
            ],
        );
        prune(&mut tree);
        let once = tree.clone();
        prune(&mut tree);
        assert_eq!(tree, once);
    }

    #[test]
    fn dump_uses_pipe_depth_prefixes() {
        let tree = ParseNode::nonterminal(
            "binary",
            vec![
                ParseNode::terminal(tok("1")),
                ParseNode::terminal(tok("-")),
                ParseNode::terminal(tok("2")),
            ],
        );
        assert_eq!(tree.dump(), "<binary>\n|1\n|-\n|2\n");
    }
}
