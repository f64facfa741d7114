//! Core token types shared across the lexer, the matching engine, and tooling.
//!
//!     Other modules need to understand how to use tokens, but not how the
//!     tokenizer itself works, so the data model lives here on its own.
//!
//!     A token is an immutable triple of surface text, a kind classification,
//!     and a source position. The matching engine never looks past this
//!     surface: terminal-class symbols compare against [`TokenKind`], terminal
//!     literals compare against the exact text. Positions are 1-based and are
//!     carried along purely for diagnostics.

use serde::Serialize;
use std::fmt;

/// The four token classifications the grammar can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Operator,
    Keyword,
    Literal,
    Identifier,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Operator => "operator",
            TokenKind::Keyword => "keyword",
            TokenKind::Literal => "literal",
            TokenKind::Identifier => "identifier",
        };
        write!(f, "{}", name)
    }
}

/// Reserved words. Control-flow keywords plus the type names the grammar
/// matches by text; anything else word-shaped is an identifier.
pub const KEYWORDS: &[&str] = &[
    "if", "else", "return", "switch", "case", "while", "break", "continue", "int", "char", "void",
    "float", "double",
];

/// One lexed token: surface text, kind, and 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, line: u32, column: u32) -> Self {
        Token {
            text: text.into(),
            kind,
            line,
            column,
        }
    }

    /// True if this word is one of the reserved [`KEYWORDS`].
    pub fn is_keyword(word: &str) -> bool {
        KEYWORDS.contains(&word)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_contain_control_flow_and_types() {
        assert!(Token::is_keyword("while"));
        assert!(Token::is_keyword("int"));
        assert!(!Token::is_keyword("main"));
    }

    #[test]
    fn token_displays_its_surface_text() {
        let tok = Token::new("++", TokenKind::Operator, 3, 7);
        assert_eq!(tok.to_string(), "++");
        assert_eq!(tok.line, 3);
        assert_eq!(tok.column, 7);
    }
}
