//! Non-fatal diagnostics and the sinks that receive them
//!
//! Lexing, parsing, expansion and page queries never abort on bad input. They
//! report a [`Diagnostic`] and keep going with best-effort output. Callers
//! decide where diagnostics go by passing a [`DiagnosticSink`].

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A character outside the definition alphabet
    BadCharacter,
    /// A token that is not valid in the parser's current state
    SyntaxError,
    /// A frame index outside the list it selects from
    FrameOutOfBounds,
    /// An index pair with at least one bound outside the frame list
    RangeOutOfBounds,
    /// A group name that the page does not know
    UnknownGroup,
    /// A clause that would expand past the sequence length limit
    SequenceTooLong,
}

/// Location of a diagnostic inside the text that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    /// The full original text
    pub source: String,
    /// Character offset into `source`
    pub offset: usize,
}

/// A single non-fatal report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            span: None,
        }
    }

    /// Attach the original text and offset.
    pub fn with_span(mut self, source: &str, offset: usize) -> Self {
        self.span = Some(Span {
            source: source.to_string(),
            offset,
        });
        self
    }

    /// Unexpected character while lexing a definition.
    pub fn bad_character(expected: &str, found: char, source: &str, offset: usize) -> Self {
        Self::new(
            Severity::Error,
            DiagnosticKind::BadCharacter,
            format!(
                "Unexpected character while processing animation definition: expected {}, got {}.",
                expected, found
            ),
        )
        .with_span(source, offset)
    }

    /// Token that does not fit the parser state.
    pub fn syntax_error(expected: &str, found: &str, source: &str, offset: usize) -> Self {
        Self::new(
            Severity::Error,
            DiagnosticKind::SyntaxError,
            format!(
                "Syntax error while processing animation definition: expected {}, got {}.",
                expected, found
            ),
        )
        .with_span(source, offset)
    }

    pub fn frame_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            Severity::Error,
            DiagnosticKind::FrameOutOfBounds,
            format!(
                "Attempting to access frame index {}, but it does not exist ({} frames).",
                index, len
            ),
        )
    }

    pub fn range_out_of_bounds(start: i64, end: i64, len: usize) -> Self {
        Self::new(
            Severity::Error,
            DiagnosticKind::RangeOutOfBounds,
            format!(
                "Frame range [{}, {}] is out of bounds ({} frames).",
                start, end, len
            ),
        )
    }

    pub fn sequence_too_long(start: i64, end: i64, duration: i64, limit: usize) -> Self {
        Self::new(
            Severity::Error,
            DiagnosticKind::SequenceTooLong,
            format!(
                "Frame range [{}, {}] with duration {} expands past the limit of {} frames; skipped.",
                start, end, duration, limit
            ),
        )
    }

    pub fn unknown_group(name: &str) -> Self {
        Self::new(
            Severity::Warning,
            DiagnosticKind::UnknownGroup,
            format!("Group '{}' does not exist in page.", name),
        )
    }

    /// Render the message followed by the source line and a caret under the offset.
    ///
    /// ```
    /// use atlasdef::diagnostic::Diagnostic;
    ///
    /// let d = Diagnostic::bad_character("0123456789,-()", 'x', "0-x", 2);
    /// assert!(d.render().ends_with("0-x\n  ^"));
    /// ```
    pub fn render(&self) -> String {
        match &self.span {
            Some(span) => format!(
                "{}\n{}\n{}^",
                self.message,
                span.source,
                " ".repeat(span.offset)
            ),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{} (at offset {})", self.message, span.offset),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Receiver for non-fatal diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("{}", diagnostic.render()),
            Severity::Error => log::error!("{}", diagnostic.render()),
        }
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Keeps every diagnostic in memory, in report order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything collected so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        let mut guard = self
            .diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *guard)
    }

    pub fn len(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(diagnostic);
    }
}
