//! Grammar model: the vocabulary the matching engine is driven by.
//!
//!     A grammar is a plain value built by the host program, not a file
//!     format. Rules hold ordered alternative sequences; sequences hold
//!     ordered grammar symbols; symbols either consume one token (by kind or
//!     by exact text) or delegate to another rule or to a nested, unnamed
//!     sequence. Optional and repeated sub-sequences are sequence flavors,
//!     not separate symbol kinds, so they can nest rule references freely.
//!
//!     Rules are mutually referential, so construction happens in two phases:
//!     declare a named rule (getting back a [`RuleId`] that other rules can
//!     already reference), then define its alternatives. [`GrammarBuilder::build`]
//!     checks that every declared rule was defined exactly once with at least
//!     one alternative; a grammar is only usable after that check passes.
//!
//!     Left recursion is deliberately unsupported: a rule that (directly or
//!     indirectly) tries to match itself before consuming a token will recurse
//!     without terminating. Grammar authors phrase such constructs as
//!     right-recursive tail repetitions instead.

use crate::token::TokenKind;
use std::fmt;

/// Handle to a declared rule. Only obtainable from [`GrammarBuilder::declare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) usize);

/// One positional element of a sequence.
///
/// The variant set is closed on purpose: the matcher matches it exhaustively,
/// so adding a symbol kind without teaching the engine about it cannot
/// compile.
#[derive(Debug, Clone)]
pub enum Symbol {
    /// Delegate to another rule's alternatives.
    Rule(RuleId),
    /// A nested, unnamed sequence (how optional/repeated groups are embedded).
    Inline(Sequence),
    /// Match any one token of this kind.
    Kind(TokenKind),
    /// Match one token whose exact surface text equals this literal.
    Literal(&'static str),
}

impl Symbol {
    pub fn rule(id: RuleId) -> Self {
        Symbol::Rule(id)
    }

    pub fn kind(kind: TokenKind) -> Self {
        Symbol::Kind(kind)
    }

    pub fn lit(text: &'static str) -> Self {
        Symbol::Literal(text)
    }

    /// Zero-or-one occurrence of the given symbols.
    pub fn opt(symbols: Vec<Symbol>) -> Self {
        Symbol::Inline(Sequence::optional(symbols))
    }

    /// Zero-or-more occurrences of the given symbols.
    pub fn many(symbols: Vec<Symbol>) -> Self {
        Symbol::Inline(Sequence::repetition(symbols))
    }
}

/// Matching discipline of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// Every symbol must match, in order.
    Plain,
    /// Zero or one full match of the symbols.
    Optional,
    /// Zero or more full matches of the symbols, each consuming at least one
    /// token.
    Repetition,
}

/// An ordered list of grammar symbols: one alternative right-hand side of a
/// rule (a "reduction"). The empty plain sequence is the epsilon derivation.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub(crate) kind: SequenceKind,
    pub(crate) symbols: Vec<Symbol>,
}

impl Sequence {
    pub fn of(symbols: Vec<Symbol>) -> Self {
        Sequence {
            kind: SequenceKind::Plain,
            symbols,
        }
    }

    /// The epsilon derivation: matches zero tokens.
    pub fn empty() -> Self {
        Sequence::of(Vec::new())
    }

    pub fn optional(symbols: Vec<Symbol>) -> Self {
        Sequence {
            kind: SequenceKind::Optional,
            symbols,
        }
    }

    pub fn repetition(symbols: Vec<Symbol>) -> Self {
        Sequence {
            kind: SequenceKind::Repetition,
            symbols,
        }
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

#[derive(Debug)]
struct RuleData {
    name: &'static str,
    alternatives: Vec<Sequence>,
}

/// A fully wired grammar: every rule declared, defined, and validated.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<RuleData>,
}

impl Grammar {
    pub fn rule_name(&self, id: RuleId) -> &'static str {
        self.rules[id.0].name
    }

    pub(crate) fn alternatives(&self, id: RuleId) -> &[Sequence] {
        &self.rules[id.0].alternatives
    }

    /// Names of all rules, in declaration order. Used to validate that
    /// companion tables (e.g. a lowering registry) cover the whole grammar.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Errors raised while wiring a grammar. These are programmer errors: a
/// grammar that fails to build is unusable, there is no partial recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A rule was declared but never given alternatives.
    UndefinedRule(&'static str),
    /// A rule was defined with an empty alternative list.
    NoAlternatives(&'static str),
    /// A rule was defined twice.
    Redefined(&'static str),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UndefinedRule(name) => {
                write!(f, "rule '{}' was declared but never defined", name)
            }
            GrammarError::NoAlternatives(name) => {
                write!(f, "rule '{}' was defined with no alternatives", name)
            }
            GrammarError::Redefined(name) => write!(f, "rule '{}' was defined twice", name),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Two-phase grammar construction: declare first, define later, so sequences
/// can reference rules whose alternatives do not exist yet.
pub struct GrammarBuilder {
    rules: Vec<(&'static str, Option<Vec<Sequence>>)>,
    errors: Vec<GrammarError>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder {
            rules: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Allocate a named rule with no alternatives yet.
    pub fn declare(&mut self, name: &'static str) -> RuleId {
        self.rules.push((name, None));
        RuleId(self.rules.len() - 1)
    }

    /// Assign a rule its ordered alternatives. Declaration order of the
    /// alternatives is the grammar's disambiguation policy.
    pub fn define(&mut self, id: RuleId, alternatives: Vec<Sequence>) {
        let (name, slot) = &mut self.rules[id.0];
        let name = *name;
        if slot.is_some() {
            self.errors.push(GrammarError::Redefined(name));
            return;
        }
        if alternatives.is_empty() {
            self.errors.push(GrammarError::NoAlternatives(name));
            return;
        }
        *slot = Some(alternatives);
    }

    /// Validate and seal the grammar.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        let mut rules = Vec::with_capacity(self.rules.len());
        for (name, alternatives) in self.rules {
            match alternatives {
                Some(alternatives) => rules.push(RuleData { name, alternatives }),
                None => return Err(GrammarError::UndefinedRule(name)),
            }
        }
        Ok(Grammar { rules })
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        GrammarBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_then_define_supports_mutual_recursion() {
        let mut builder = GrammarBuilder::new();
        let expr = builder.declare("expr");
        let group = builder.declare("group");
        // group is referenced before it is defined
        builder.define(
            expr,
            vec![
                Sequence::of(vec![Symbol::rule(group)]),
                Sequence::of(vec![Symbol::kind(TokenKind::Literal)]),
            ],
        );
        builder.define(
            group,
            vec![Sequence::of(vec![
                Symbol::lit("("),
                Symbol::rule(expr),
                Symbol::lit(")"),
            ])],
        );
        let grammar = builder.build().unwrap();
        assert_eq!(grammar.rule_count(), 2);
        assert_eq!(grammar.rule_name(expr), "expr");
    }

    #[test]
    fn grammar_is_debug_printable() {
        let mut builder = GrammarBuilder::new();
        let rule = builder.declare("rule");
        builder.define(rule, vec![Sequence::of(vec![Symbol::lit("x")])]);
        let grammar = builder.build().unwrap();
        assert!(format!("{:?}", grammar).contains("rule"));
    }

    #[test]
    fn undefined_rule_fails_build() {
        let mut builder = GrammarBuilder::new();
        let _orphan = builder.declare("orphan");
        assert_eq!(
            builder.build().unwrap_err(),
            GrammarError::UndefinedRule("orphan")
        );
    }

    #[test]
    fn empty_alternative_list_is_rejected() {
        let mut builder = GrammarBuilder::new();
        let rule = builder.declare("rule");
        builder.define(rule, vec![]);
        assert_eq!(
            builder.build().unwrap_err(),
            GrammarError::NoAlternatives("rule")
        );
    }

    #[test]
    fn double_definition_is_rejected() {
        let mut builder = GrammarBuilder::new();
        let rule = builder.declare("rule");
        builder.define(rule, vec![Sequence::empty()]);
        builder.define(rule, vec![Sequence::empty()]);
        assert_eq!(builder.build().unwrap_err(), GrammarError::Redefined("rule"));
    }
}
