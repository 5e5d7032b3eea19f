//! Token extraction from animation definition strings

use crate::diagnostic::Diagnostic;
use std::fmt;

/// Characters a definition may contain (besides space).
pub const DEFINITION_ALPHABET: &str = "0123456789,-()";

/// Kind of a definition token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Comma,
    Hyphen,
    OpenParen,
    CloseParen,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Number => "NUMBER",
            TokenKind::Comma => "COMMA",
            TokenKind::Hyphen => "HYPHEN",
            TokenKind::OpenParen => "OPEN_PAREN",
            TokenKind::CloseParen => "CLOSE_PAREN",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexed token. `value` is only meaningful for [`TokenKind::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: i64,
    /// Character offset of the token's first character
    pub position: usize,
}

impl Token {
    pub fn number(value: i64, position: usize) -> Self {
        Self {
            kind: TokenKind::Number,
            value,
            position,
        }
    }

    pub fn punct(kind: TokenKind, position: usize) -> Self {
        Self {
            kind,
            value: -1,
            position,
        }
    }
}

/// Splits a definition into tokens.
///
/// Runs of digits become one number token. Spaces are skipped. Any character
/// outside the definition alphabet produces a diagnostic and no token, and
/// scanning carries on.
///
/// # Examples
///
/// ```
/// use atlasdef::tokenizer::{tokenize, TokenKind};
///
/// let (tokens, diagnostics) = tokenize("12,3-4(5)");
/// assert_eq!(tokens.len(), 8);
/// assert_eq!(tokens[0].kind, TokenKind::Number);
/// assert_eq!(tokens[0].value, 12);
/// assert!(diagnostics.is_empty());
///
/// let (tokens, diagnostics) = tokenize("1x");
/// assert_eq!(tokens.len(), 1);
/// assert_eq!(diagnostics.len(), 1);
/// ```
pub fn tokenize(definition: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut diagnostics = Vec::new();
    let mut in_number = false;

    for (i, c) in definition.chars().enumerate() {
        if let Some(digit) = c.to_digit(10) {
            let digit = i64::from(digit);
            match tokens.last_mut() {
                Some(last) if in_number => {
                    last.value = last.value.saturating_mul(10).saturating_add(digit);
                }
                _ => tokens.push(Token::number(digit, i)),
            }
            in_number = true;
            continue;
        }

        in_number = false;
        match c {
            ' ' => {}
            ',' => tokens.push(Token::punct(TokenKind::Comma, i)),
            '-' => tokens.push(Token::punct(TokenKind::Hyphen, i)),
            '(' => tokens.push(Token::punct(TokenKind::OpenParen, i)),
            ')' => tokens.push(Token::punct(TokenKind::CloseParen, i)),
            other => diagnostics.push(Diagnostic::bad_character(
                DEFINITION_ALPHABET,
                other,
                definition,
                i,
            )),
        }
    }

    (tokens, diagnostics)
}
