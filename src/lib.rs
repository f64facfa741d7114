//! # minicc
//!
//! The front end of a small C compiler: a hand-written tokenizer, a
//! grammar-driven backtracking parser, and a lowering pass from parse trees
//! to abstract syntax trees.
//!
//! The pieces compose as a pipeline:
//!
//! 1. [`lexer::tokenize`] turns source text into positioned [`token::Token`]s
//! 2. [`engine::parse`] derives a [`tree::ParseNode`] under a
//!    [`grammar::Grammar`], or reports the furthest point of failure
//! 3. [`tree::prune`] drops epsilon placeholders
//! 4. a [`lower::LoweringTable`] maps the pruned tree to an [`ast::AstNode`]
//!
//! The grammar and engine are generic over any context-free grammar built
//! with [`grammar::GrammarBuilder`]; [`c_grammar`] supplies the built-in C
//! subset and the one-call [`c_grammar::compile`] pipeline.

pub mod ast;
pub mod c_grammar;
pub mod engine;
pub mod grammar;
pub mod lexer;
pub mod lower;
pub mod token;
pub mod tree;
