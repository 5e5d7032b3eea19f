//! Parsing for animation definitions and atlas metadata
//!
//! Definitions are parsed by a small state machine over the token stream.
//! Malformed tokens are reported and skipped; the machine stays in its state
//! and waits for a valid continuation.
//!
//! Atlas metadata is parsed as JSON5, which also accepts plain JSON.

use crate::diagnostic::Diagnostic;
use crate::models::{AtlasMetadata, RangeSpec};
use crate::tokenizer::{tokenize, Token, TokenKind};
use thiserror::Error;

/// Error type for metadata that cannot be read.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid atlas metadata: {message}")]
pub struct MetadataError {
    pub message: String,
}

/// Parse atlas metadata text.
pub fn parse_metadata(text: &str) -> Result<AtlasMetadata, MetadataError> {
    json5::from_str(text).map_err(|e| MetadataError {
        message: e.to_string(),
    })
}

/// Result of parsing a definition string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub specs: Vec<RangeSpec>,
    /// Lexer and syntax diagnostics, in source order
    pub diagnostics: Vec<Diagnostic>,
}

/// Parser state. Each `*In` state waits for a number, each `*Out` state for
/// the punctuation that may follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartFrameIn,
    StartFrameOut,
    EndFrameIn,
    EndFrameOut,
    DurationIn,
    DurationOut,
    NextOrDone,
}

impl State {
    /// Human-readable set of tokens accepted in this state.
    fn expected(self) -> &'static str {
        match self {
            State::StartFrameIn | State::EndFrameIn | State::DurationIn => "number",
            State::StartFrameOut => r#"",", "-", "(""#,
            State::EndFrameOut => r#"",", "(""#,
            State::DurationOut => r#"")""#,
            State::NextOrDone => r#"",""#,
        }
    }

    /// Apply one token. Returns the next state, or `None` if the token is not
    /// accepted here.
    fn step(self, token: &Token, specs: &mut Vec<RangeSpec>) -> Option<State> {
        use TokenKind::*;

        let next = match (self, token.kind) {
            (State::StartFrameIn, Number) => {
                specs.push(RangeSpec::single(token.value));
                State::StartFrameOut
            }
            (State::StartFrameOut, Comma) => State::StartFrameIn,
            (State::StartFrameOut, Hyphen) => State::EndFrameIn,
            (State::StartFrameOut, OpenParen) => State::DurationIn,
            (State::EndFrameIn, Number) => {
                specs.last_mut()?.end_frame = token.value;
                State::EndFrameOut
            }
            (State::EndFrameOut, Comma) => State::StartFrameIn,
            (State::EndFrameOut, OpenParen) => State::DurationIn,
            (State::DurationIn, Number) => {
                specs.last_mut()?.duration = token.value;
                State::DurationOut
            }
            (State::DurationOut, CloseParen) => State::NextOrDone,
            (State::NextOrDone, Comma) => State::StartFrameIn,
            _ => return None,
        };
        Some(next)
    }
}

/// Parse a definition such as `0-3(2),7` into range specs.
///
/// A definition that ends mid-clause keeps whatever specs were already
/// started; no error is raised for the truncation.
///
/// # Examples
///
/// ```
/// use atlasdef::models::RangeSpec;
/// use atlasdef::parser::parse_definition;
///
/// let result = parse_definition("0-3(2),7");
/// assert_eq!(result.specs, vec![RangeSpec::new(0, 3, 2), RangeSpec::single(7)]);
/// assert!(result.diagnostics.is_empty());
/// ```
pub fn parse_definition(definition: &str) -> ParseResult {
    let (tokens, mut diagnostics) = tokenize(definition);
    let mut specs = Vec::new();
    let mut state = State::StartFrameIn;

    for token in &tokens {
        match state.step(token, &mut specs) {
            Some(next) => state = next,
            None => diagnostics.push(Diagnostic::syntax_error(
                state.expected(),
                token.kind.as_str(),
                definition,
                token.position,
            )),
        }
    }

    diagnostics.sort_by_key(|d| d.span.as_ref().map(|s| s.offset));
    ParseResult { specs, diagnostics }
}
