//! Implementation of the C tokenizer
//!
//! This module turns source text into the ordered token sequence the matching
//! engine consumes. The actual recognition is handled entirely by logos; this
//! module only classifies word-shaped matches into keywords vs. identifiers
//! and attaches 1-based line/column positions.
//!
//! Whitespace, line comments, block comments, and preprocessor lines are
//! skipped during lexing rather than tokenized, so the parser never has to
//! reason about them.

use crate::token::{Token, TokenKind};
use logos::Logos;
use std::fmt;

/// Raw lexer alphabet. Integer literals allow a single tick separator between
/// digit groups; strings and chars allow simple backslash escapes.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
#[logos(skip r"#[^\n]*")]
enum RawToken {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Word,

    #[regex(r"[0-9]('?[0-9])*")]
    #[regex(r"0[xX]'?[0-9a-fA-F]('?[0-9a-fA-F])*")]
    #[regex(r"0[bB]'?[01]('?[01])*")]
    #[regex(r"0[oO]'?[0-7]('?[0-7])*")]
    #[regex(r"[0-9]('?[0-9])*\.([0-9]('?[0-9])*)?")]
    #[regex(r"\.[0-9]('?[0-9])*")]
    #[regex(r"'([^'\\\n]|\\[^\n])'")]
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    Literal,

    #[token("!=")]
    #[token("==")]
    #[token("<=")]
    #[token(">=")]
    #[token("&&")]
    #[token("||")]
    #[token("++")]
    #[token("--")]
    #[token("<<")]
    #[token(">>")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("+=")]
    #[token("-=")]
    #[token("&=")]
    #[token("^=")]
    #[token("|=")]
    #[token(";")]
    #[token(":")]
    #[token("?")]
    #[token("+")]
    #[token("-")]
    #[token("%")]
    #[token("~")]
    #[token("/")]
    #[token("*")]
    #[token("<")]
    #[token(">")]
    #[token("=")]
    #[token("!")]
    #[token("&")]
    #[token("|")]
    #[token("[")]
    #[token("]")]
    #[token("^")]
    #[token("(")]
    #[token(")")]
    #[token(",")]
    #[token("{")]
    #[token("}")]
    #[token(".")]
    #[token("\\")]
    Operator,
}

/// Error raised when the source contains a fragment no token rule accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: u32,
    pub column: u32,
    pub fragment: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized input '{}' at {}:{}",
            self.fragment, self.line, self.column
        )
    }
}

impl std::error::Error for LexError {}

/// Tokenize C source into the token sequence the matching engine consumes.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let positions = PositionIndex::new(source);
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line, column) = positions.locate(span.start);
        match result {
            Ok(raw) => {
                let text = lexer.slice();
                let kind = classify(raw, text);
                tokens.push(Token::new(text, kind, line, column));
            }
            Err(()) => {
                return Err(LexError {
                    line,
                    column,
                    fragment: lexer.slice().to_string(),
                })
            }
        }
    }

    Ok(tokens)
}

fn classify(raw: RawToken, text: &str) -> TokenKind {
    match raw {
        RawToken::Word => {
            if Token::is_keyword(text) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            }
        }
        RawToken::Literal => TokenKind::Literal,
        RawToken::Operator => TokenKind::Operator,
    }
}

/// Byte-offset to line/column translation, computed once per source.
struct PositionIndex {
    line_starts: Vec<usize>,
}

impl PositionIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        PositionIndex { line_starts }
    }

    /// 1-based (line, column) of a byte offset.
    fn locate(&self, offset: usize) -> (u32, u32) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let column = offset - self.line_starts[line - 1] + 1;
        (line as u32, column as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn classifies_the_four_kinds() {
        assert_eq!(
            kinds("while x 42 +"),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Literal,
                TokenKind::Operator
            ]
        );
    }

    #[test]
    fn two_char_operators_win_over_one_char() {
        assert_eq!(texts("a<=b"), vec!["a", "<=", "b"]);
        assert_eq!(texts("i++"), vec!["i", "++"]);
        assert_eq!(texts("a< =b"), vec!["a", "<", "=", "b"]);
    }

    #[test]
    fn skips_comments_and_preprocessor_lines() {
        let source = "#include <stdio.h>\nint x; // trailing\n/* block\ncomment */ y";
        assert_eq!(texts(source), vec!["int", "x", ";", "y"]);
    }

    #[test]
    fn literal_shapes() {
        assert_eq!(
            texts("0x1F 0b101 3.14 .5 'a' \"hi\\n\" 1'000"),
            vec!["0x1F", "0b101", "3.14", ".5", "'a'", "\"hi\\n\"", "1'000"]
        );
        assert!(kinds("0x1F").iter().all(|k| *k == TokenKind::Literal));
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("int x;\n  y = 1;").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
        let y = tokens.iter().find(|t| t.text == "y").unwrap();
        assert_eq!((y.line, y.column), (2, 3));
    }

    #[test]
    fn rejects_stray_bytes() {
        let err = tokenize("int x @").unwrap_err();
        assert_eq!(err.fragment, "@");
        assert_eq!((err.line, err.column), (1, 7));
    }
}
