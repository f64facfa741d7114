//! Matching engine: backtracking derivation producers over a grammar.
//!
//! This module implements the computational heart of the front end:
//! 1. A sequence matcher that enumerates every derivation of a sequence
//!    against a prefix of the input, one per resumption
//! 2. A rule matcher that drives the sequence matcher across a rule's
//!    alternatives in declaration order and wraps results in nonterminals
//! 3. A top-level `parse` that accepts the first derivation consuming the
//!    entire token sequence
//!
//! Producers are plain values: calling [`SequenceMatcher::next_derivation`]
//! either yields one more admissible derivation or signals exhaustion.
//! Backtracking state is an explicit stack of choice points (symbol index,
//! token cursor, matched-node count, suspended sub-producer) rather than
//! call-stack recursion, so the live suspended state is bounded by the number
//! of still-open alternatives along the current path. A producer that is
//! dropped mid-enumeration holds no external resources and needs no cleanup.
//!
//! A failed alternative is silent control flow here, never an error. The only
//! error the engine raises is [`SyntaxError`] from [`parse`], which reports
//! the furthest token position any explored branch reached. That position is
//! tracked as a side channel ([`MatchContext`]) across the whole search
//! because the backtracking order visits branches in grammar order, not
//! furthest-first.

use crate::grammar::{Grammar, RuleId, Sequence, SequenceKind, Symbol};
use crate::token::Token;
use crate::tree::ParseNode;
use std::fmt;

/// One complete way a sequence or rule matched a prefix of the input.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub nodes: Vec<ParseNode>,
    pub consumed: usize,
}

impl Derivation {
    /// The zero-token derivation: a single epsilon placeholder.
    fn epsilon() -> Self {
        Derivation {
            nodes: vec![ParseNode::epsilon()],
            consumed: 0,
        }
    }
}

/// Search-wide side channel: the furthest token offset any branch reached.
#[derive(Debug, Default)]
pub struct MatchContext {
    furthest: usize,
}

impl MatchContext {
    pub fn new() -> Self {
        MatchContext::default()
    }

    pub fn furthest(&self) -> usize {
        self.furthest
    }

    fn note(&mut self, offset: usize) {
        self.furthest = self.furthest.max(offset);
    }
}

/// Raised by [`parse`] when no derivation of the top rule consumes the whole
/// input. Points at the furthest token reached across all explored branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    /// Surface text of the offending token; `None` when the input ended
    /// before the grammar was satisfied.
    pub found: Option<String>,
}

impl SyntaxError {
    fn at(tokens: &[Token], furthest: usize) -> Self {
        match tokens.get(furthest) {
            Some(token) => SyntaxError {
                line: token.line,
                column: token.column,
                found: Some(token.text.clone()),
            },
            None => {
                let (line, column) = tokens
                    .last()
                    .map(|token| (token.line, token.column + token.text.len() as u32))
                    .unwrap_or((1, 1));
                SyntaxError {
                    line,
                    column,
                    found: None,
                }
            }
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.found {
            Some(text) => write!(
                f,
                "invalid syntax at {}:{}, near '{}'",
                self.line, self.column, text
            ),
            None => write!(
                f,
                "invalid syntax at {}:{}, unexpected end of input",
                self.line, self.column
            ),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Parse the whole token sequence under `top`.
///
/// Derivations of the top rule are advanced until one consumes every input
/// token; partial derivations (a repetition-based program rule stopping
/// early) are rejected and the search resumed.
pub fn parse(grammar: &Grammar, top: RuleId, tokens: &[Token]) -> Result<ParseNode, SyntaxError> {
    let mut ctx = MatchContext::new();
    let mut matcher = RuleMatcher::new(grammar, top, tokens, 0);
    while let Some(mut derivation) = matcher.next_derivation(&mut ctx) {
        if derivation.consumed == tokens.len() {
            if let Some(node) = derivation.nodes.pop() {
                return Ok(node);
            }
        }
        ctx.note(derivation.consumed);
    }
    Err(SyntaxError::at(tokens, ctx.furthest()))
}

/// Enumerates derivations of one rule: each alternative sequence in
/// declaration order, each of its derivations wrapped in a nonterminal.
/// Re-entrant: resuming after a yield continues with the next derivation,
/// crossing into later alternatives as earlier ones are exhausted.
pub struct RuleMatcher<'g, 't> {
    grammar: &'g Grammar,
    id: RuleId,
    tokens: &'t [Token],
    at: usize,
    alternative: usize,
    current: Option<SequenceMatcher<'g, 't>>,
}

impl<'g, 't> RuleMatcher<'g, 't> {
    pub fn new(grammar: &'g Grammar, id: RuleId, tokens: &'t [Token], at: usize) -> Self {
        RuleMatcher {
            grammar,
            id,
            tokens,
            at,
            alternative: 0,
            current: None,
        }
    }

    pub fn next_derivation(&mut self, ctx: &mut MatchContext) -> Option<Derivation> {
        loop {
            let matcher = match self.current.as_mut() {
                Some(matcher) => matcher,
                None => {
                    let grammar = self.grammar;
                    let sequence = grammar.alternatives(self.id).get(self.alternative)?;
                    self.current
                        .insert(SequenceMatcher::new(grammar, sequence, self.tokens, self.at))
                }
            };
            match matcher.next_derivation(ctx) {
                Some(derivation) => {
                    let node =
                        ParseNode::nonterminal(self.grammar.rule_name(self.id), derivation.nodes);
                    debug_assert_eq!(node.terminal_count(), derivation.consumed);
                    return Some(Derivation {
                        nodes: vec![node],
                        consumed: derivation.consumed,
                    });
                }
                None => {
                    self.current = None;
                    self.alternative += 1;
                }
            }
        }
    }
}

/// Enumerates derivations of one sequence against `tokens[at..]`.
///
/// Derivation order is deterministic: symbols left to right, each symbol's
/// sub-derivations exhausted in the sub-producer's own order before the next
/// symbol advances. Dropping the matcher mid-enumeration is fine; a fresh
/// matcher always starts over.
pub struct SequenceMatcher<'g, 't> {
    inner: SeqInner<'g, 't>,
}

enum SeqInner<'g, 't> {
    Plain(PlainMatcher<'g, 't>),
    Optional(OptionalMatcher<'g, 't>),
    Repetition(RepetitionMatcher<'g, 't>),
}

impl<'g, 't> SequenceMatcher<'g, 't> {
    pub fn new(grammar: &'g Grammar, sequence: &'g Sequence, tokens: &'t [Token], at: usize) -> Self {
        let inner = match sequence.kind() {
            SequenceKind::Plain => {
                SeqInner::Plain(PlainMatcher::new(grammar, sequence.symbols(), tokens, at))
            }
            SequenceKind::Optional => SeqInner::Optional(OptionalMatcher {
                inner: PlainMatcher::new(grammar, sequence.symbols(), tokens, at),
                inner_done: false,
                done: false,
            }),
            SequenceKind::Repetition => SeqInner::Repetition(RepetitionMatcher {
                grammar,
                symbols: sequence.symbols(),
                tokens,
                at,
                frames: Vec::new(),
                nodes: Vec::new(),
                consumed: 0,
                done: false,
            }),
        };
        SequenceMatcher { inner }
    }

    /// Yield one more derivation, or `None` once every alternative along
    /// every choice point has been exhausted.
    pub fn next_derivation(&mut self, ctx: &mut MatchContext) -> Option<Derivation> {
        match &mut self.inner {
            SeqInner::Plain(matcher) => matcher.next_derivation(ctx),
            SeqInner::Optional(matcher) => matcher.next_derivation(ctx),
            SeqInner::Repetition(matcher) => matcher.next_derivation(ctx),
        }
    }
}

/// A suspended sub-producer for a rule-reference or inline-sequence symbol.
enum SubMatcher<'g, 't> {
    Rule(RuleMatcher<'g, 't>),
    Inline(Box<SequenceMatcher<'g, 't>>),
}

impl<'g, 't> SubMatcher<'g, 't> {
    fn next_derivation(&mut self, ctx: &mut MatchContext) -> Option<Derivation> {
        match self {
            SubMatcher::Rule(matcher) => matcher.next_derivation(ctx),
            SubMatcher::Inline(matcher) => matcher.next_derivation(ctx),
        }
    }
}

/// Saved state for backtracking: where we were when a sub-producer was
/// entered, plus the sub-producer itself so it can be resumed for its next
/// alternative.
struct ChoicePoint<'g, 't> {
    symbol: usize,
    consumed: usize,
    matched_len: usize,
    sub: SubMatcher<'g, 't>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Resume,
    Done,
}

/// The every-symbol-must-match discipline; the core of the engine.
struct PlainMatcher<'g, 't> {
    grammar: &'g Grammar,
    symbols: &'g [Symbol],
    tokens: &'t [Token],
    /// Absolute offset in `tokens` where this sequence starts.
    at: usize,
    /// Symbol cursor.
    i: usize,
    /// Tokens consumed so far, relative to `at`.
    consumed: usize,
    matched: Vec<ParseNode>,
    points: Vec<ChoicePoint<'g, 't>>,
    phase: Phase,
}

impl<'g, 't> PlainMatcher<'g, 't> {
    fn new(grammar: &'g Grammar, symbols: &'g [Symbol], tokens: &'t [Token], at: usize) -> Self {
        PlainMatcher {
            grammar,
            symbols,
            tokens,
            at,
            i: 0,
            consumed: 0,
            matched: Vec::new(),
            points: Vec::new(),
            phase: Phase::Start,
        }
    }

    fn next_derivation(&mut self, ctx: &mut MatchContext) -> Option<Derivation> {
        match self.phase {
            Phase::Done => None,
            Phase::Start => {
                self.phase = Phase::Resume;
                if self.symbols.is_empty() {
                    // the empty sequence is the epsilon derivation
                    self.phase = Phase::Done;
                    return Some(Derivation::epsilon());
                }
                if self.advance(ctx) {
                    Some(self.snapshot())
                } else {
                    self.phase = Phase::Done;
                    None
                }
            }
            Phase::Resume => {
                // treat the previous yield as a failure and search on
                if self.backtrack(ctx) && self.advance(ctx) {
                    Some(self.snapshot())
                } else {
                    self.phase = Phase::Done;
                    None
                }
            }
        }
    }

    fn snapshot(&self) -> Derivation {
        Derivation {
            nodes: self.matched.clone(),
            consumed: self.consumed,
        }
    }

    /// Run the symbol cursor to the end of the sequence, backtracking through
    /// choice points on every failure. True if a complete derivation is
    /// staged; false only when the whole search space is exhausted.
    fn advance(&mut self, ctx: &mut MatchContext) -> bool {
        let symbols = self.symbols;
        while self.i < symbols.len() {
            let abs = self.at + self.consumed;
            let stepped = match &symbols[self.i] {
                Symbol::Kind(kind) => self.step_token(ctx, abs, |token| token.kind == *kind),
                Symbol::Literal(text) => self.step_token(ctx, abs, |token| token.text == *text),
                Symbol::Rule(id) => {
                    let sub = SubMatcher::Rule(RuleMatcher::new(self.grammar, *id, self.tokens, abs));
                    self.step_sub(sub, ctx)
                }
                Symbol::Inline(sequence) => {
                    let sub = SubMatcher::Inline(Box::new(SequenceMatcher::new(
                        self.grammar,
                        sequence,
                        self.tokens,
                        abs,
                    )));
                    self.step_sub(sub, ctx)
                }
            };
            if !stepped && !self.backtrack(ctx) {
                return false;
            }
        }
        true
    }

    /// Try to match one terminal symbol at `abs`. Running past the end of the
    /// input is a per-branch failure, not an error.
    fn step_token(
        &mut self,
        ctx: &mut MatchContext,
        abs: usize,
        accepts: impl Fn(&Token) -> bool,
    ) -> bool {
        match self.tokens.get(abs) {
            Some(token) if accepts(token) => {
                self.matched.push(ParseNode::terminal(token.clone()));
                self.consumed += 1;
                self.i += 1;
                true
            }
            _ => {
                ctx.note(abs);
                false
            }
        }
    }

    /// Pull the first derivation out of a fresh sub-producer; on success the
    /// sub-producer is parked as a choice point for later resumption.
    fn step_sub(&mut self, mut sub: SubMatcher<'g, 't>, ctx: &mut MatchContext) -> bool {
        match sub.next_derivation(ctx) {
            Some(derivation) => {
                self.points.push(ChoicePoint {
                    symbol: self.i,
                    consumed: self.consumed,
                    matched_len: self.matched.len(),
                    sub,
                });
                self.matched.extend(derivation.nodes);
                self.consumed += derivation.consumed;
                self.i += 1;
                true
            }
            None => false,
        }
    }

    /// Resume the most recent choice point that still has an alternative:
    /// truncate the match list to its recorded length, restore the token
    /// cursor, and ask its sub-producer for the next derivation. Choice
    /// points with nothing left are popped. False when the stack runs dry.
    fn backtrack(&mut self, ctx: &mut MatchContext) -> bool {
        while let Some(point) = self.points.last_mut() {
            self.matched.truncate(point.matched_len);
            self.consumed = point.consumed;
            match point.sub.next_derivation(ctx) {
                Some(derivation) => {
                    self.i = point.symbol + 1;
                    self.matched.extend(derivation.nodes);
                    self.consumed += derivation.consumed;
                    return true;
                }
                None => {
                    self.points.pop();
                }
            }
        }
        false
    }
}

/// Zero-or-one: every derivation of the inner sequence first, then exactly
/// one epsilon derivation. Never yields zero derivations.
struct OptionalMatcher<'g, 't> {
    inner: PlainMatcher<'g, 't>,
    inner_done: bool,
    done: bool,
}

impl<'g, 't> OptionalMatcher<'g, 't> {
    fn next_derivation(&mut self, ctx: &mut MatchContext) -> Option<Derivation> {
        if self.done {
            return None;
        }
        if !self.inner_done {
            if let Some(derivation) = self.inner.next_derivation(ctx) {
                return Some(derivation);
            }
            self.inner_done = true;
        }
        self.done = true;
        Some(Derivation::epsilon())
    }
}

/// Saved state for one repetition instance.
struct Frame<'g, 't> {
    sub: PlainMatcher<'g, 't>,
    nodes_len: usize,
    consumed_at: usize,
}

/// Zero-or-more: re-matches the inner sequence against successive remaining
/// input, yielding the cumulative match list after every successful
/// repetition so callers can settle for fewer repetitions than the maximum.
/// Resumption first tries to extend with one more repetition, then revisits
/// existing repetitions most-recent-first; the zero-repetition epsilon
/// derivation comes last, after the non-empty search space is exhausted.
struct RepetitionMatcher<'g, 't> {
    grammar: &'g Grammar,
    symbols: &'g [Symbol],
    tokens: &'t [Token],
    at: usize,
    frames: Vec<Frame<'g, 't>>,
    nodes: Vec<ParseNode>,
    consumed: usize,
    done: bool,
}

impl<'g, 't> RepetitionMatcher<'g, 't> {
    fn next_derivation(&mut self, ctx: &mut MatchContext) -> Option<Derivation> {
        if self.done {
            return None;
        }
        if self.try_extend(ctx) {
            return Some(self.snapshot());
        }
        while let Some(frame) = self.frames.last_mut() {
            self.nodes.truncate(frame.nodes_len);
            self.consumed = frame.consumed_at;
            match frame.sub.next_derivation(ctx) {
                Some(derivation) => {
                    assert!(
                        derivation.consumed > 0,
                        "repetition matched zero tokens; the grammar cannot terminate"
                    );
                    self.nodes.extend(derivation.nodes);
                    self.consumed += derivation.consumed;
                    return Some(self.snapshot());
                }
                None => {
                    self.frames.pop();
                }
            }
        }
        self.done = true;
        Some(Derivation::epsilon())
    }

    /// Stack one more repetition instance on top of the current run.
    fn try_extend(&mut self, ctx: &mut MatchContext) -> bool {
        let mut sub = PlainMatcher::new(self.grammar, self.symbols, self.tokens, self.at + self.consumed);
        match sub.next_derivation(ctx) {
            Some(derivation) => {
                assert!(
                    derivation.consumed > 0,
                    "repetition matched zero tokens; the grammar cannot terminate"
                );
                self.frames.push(Frame {
                    sub,
                    nodes_len: self.nodes.len(),
                    consumed_at: self.consumed,
                });
                self.nodes.extend(derivation.nodes);
                self.consumed += derivation.consumed;
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Derivation {
        Derivation {
            nodes: self.nodes.clone(),
            consumed: self.consumed,
        }
    }
}
