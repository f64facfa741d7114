//! Abstract syntax tree: the lowered, semantics-ready form of a parse.
//!
//! An AST node is just a name and children. Operator nodes carry the operator
//! text as their name with operands as children; identifier leaves are
//! prefixed `id: ` so they cannot collide with literal text; structural
//! containers use bracketed names like `<compound statement>`.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AstNode {
    pub name: String,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        AstNode {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<AstNode>) -> Self {
        AstNode {
            name: name.into(),
            children,
        }
    }

    /// Indented dump, one node per line, depth marked with `|` bars.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push('|');
        }
        out.push_str(&self.name);
        out.push('\n');
        for child in &self.children {
            child.dump_into(out, depth + 1);
        }
    }

    /// Compact single-line rendering, handy in assertions:
    /// `(- (+ a b) c)` for `a + b - c`.
    pub fn to_sexpr(&self) -> String {
        if self.children.is_empty() {
            self.name.clone()
        } else {
            let inner: Vec<String> = self.children.iter().map(AstNode::to_sexpr).collect();
            format!("({} {})", self.name, inner.join(" "))
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_marks_depth_with_bars() {
        let tree = AstNode::with_children(
            "-",
            vec![
                AstNode::with_children("+", vec![AstNode::leaf("id: a"), AstNode::leaf("id: b")]),
                AstNode::leaf("id: c"),
            ],
        );
        assert_eq!(tree.dump(), "-\n|+\n||id: a\n||id: b\n|id: c\n");
    }

    #[test]
    fn sexpr_parenthesizes_interior_nodes_only() {
        let tree = AstNode::with_children(
            "-",
            vec![
                AstNode::with_children("+", vec![AstNode::leaf("id: a"), AstNode::leaf("id: b")]),
                AstNode::leaf("id: c"),
            ],
        );
        assert_eq!(tree.to_sexpr(), "(- (+ id: a id: b) id: c)");
        assert_eq!(AstNode::leaf("42").to_sexpr(), "42");
    }
}
