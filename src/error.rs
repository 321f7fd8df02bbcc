//! Error channel shared by every reader.
//!
//! Readers never abort on bad input. Each problem is handed to an
//! [`ErrorHandler`] together with the full source, the offending span, a
//! message and a [`Severity`]; the handler decides what to do with it. The
//! crate's [`Error`] type is used for value extraction and for the `try_*`
//! entry points that turn collected diagnostics into a `Result`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::arena::{NodeKind, Span};
use crate::constants::CONTEXT_LINES;
use crate::text::source_map::SourceCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// An owned record of one reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}: {}",
            self.severity, self.location.line, self.location.column, self.message
        )
    }
}

/// Receives every warning and error a reader produces.
///
/// Implementations may do anything, including panicking to turn a problem
/// into a hard failure.
pub trait ErrorHandler {
    fn report(&mut self, source: &str, span: Span, message: &str, severity: Severity);
}

impl<F> ErrorHandler for F
where
    F: FnMut(&str, Span, &str, Severity),
{
    fn report(&mut self, source: &str, span: Span, message: &str, severity: Severity) {
        self(source, span, message, severity)
    }
}

/// Logs each problem through the `log` facade with the surrounding source
/// lines. Used by the entry points that take no handler.
#[derive(Debug, Clone, Default)]
pub struct LogErrorHandler {
    cache: SourceCache,
}

impl LogErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorHandler for LogErrorHandler {
    fn report(&mut self, source: &str, span: Span, message: &str, severity: Severity) {
        let level = match severity {
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        };
        if !log::log_enabled!(level) {
            return;
        }
        let location = self.cache.location(source, span.start);
        log::log!(
            level,
            "deserialization {severity} at {}:{}: {message}",
            location.line,
            location.column
        );
        for line in self.cache.map(source).context(span, CONTEXT_LINES) {
            log::log!(level, "  {line}");
        }
    }
}

/// Collects diagnostics instead of acting on them.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    cache: SourceCache,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Error)
    }
}

impl ErrorHandler for DiagnosticCollector {
    fn report(&mut self, source: &str, span: Span, message: &str, severity: Severity) {
        let location = self.cache.location(source, span.start);
        self.diagnostics.push(Diagnostic {
            severity,
            span,
            location,
            message: message.to_string(),
        });
    }
}

/// Forwards to another handler while counting errors.
pub(crate) struct CountingHandler<'h> {
    inner: &'h mut dyn ErrorHandler,
    errors: usize,
}

impl<'h> CountingHandler<'h> {
    pub(crate) fn new(inner: &'h mut dyn ErrorHandler) -> Self {
        Self { inner, errors: 0 }
    }

    pub(crate) fn errors(&self) -> usize {
        self.errors
    }
}

impl ErrorHandler for CountingHandler<'_> {
    fn report(&mut self, source: &str, span: Span, message: &str, severity: Severity) {
        if severity == Severity::Error {
            self.errors += 1;
        }
        self.inner.report(source, span, message, severity);
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("expected '{expected}' node, found '{found}'")]
    KindMismatch { expected: NodeKind, found: NodeKind },

    #[error("invalid number `{token}` for {target}")]
    InvalidNumber { token: String, target: &'static str },

    #[error("`{token}` is not a valid JSON number")]
    MalformedNumber { token: String },

    #[error("unknown escape sequence `\\{escape}` at byte {offset} of the string token")]
    UnknownEscape { escape: char, offset: usize },

    #[error("string token `{token}` is not enclosed in quotes")]
    Unquoted { token: String },

    #[error("input rejected with {} error(s){}", count_errors(.0), first_error(.0))]
    Rejected(Vec<Diagnostic>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Diagnostics carried by [`Error::Rejected`].
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Rejected(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

fn count_errors(diagnostics: &[Diagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .count()
}

fn first_error(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .find(|diagnostic| diagnostic.severity == Severity::Error)
        .map(|diagnostic| format!(", first: {diagnostic}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_collector_records_location() {
        let mut collector = DiagnosticCollector::new();
        collector.report("ab\ncd", Span::new(4, 5), "bad", Severity::Error);
        collector.report("ab\ncd", Span::new(0, 1), "meh", Severity::Warning);
        let diagnostics = collector.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].location.line, 2);
        assert_eq!(diagnostics[0].location.column, 2);
        assert_eq!(diagnostics[0].to_string(), "error at 2:2: bad");
        assert!(collector.has_errors());
        assert_eq!(collector.warnings().count(), 1);
    }

    #[rstest::rstest]
    fn test_collector_locations_across_sources() {
        let mut collector = DiagnosticCollector::new();
        collector.report("a\nbc", Span::new(3, 4), "x", Severity::Warning);
        collector.report("abc", Span::new(2, 3), "y", Severity::Warning);
        collector.report("a\nbc", Span::new(0, 1), "z", Severity::Warning);
        let found: Vec<(usize, usize)> = collector
            .diagnostics()
            .iter()
            .map(|d| (d.location.line, d.location.column))
            .collect();
        assert_eq!(found, vec![(2, 2), (1, 3), (1, 1)]);
    }

    #[rstest::rstest]
    fn test_closure_handler() {
        let mut seen = Vec::new();
        let mut handler = |_: &str, span: Span, message: &str, severity: Severity| {
            seen.push((span, message.to_string(), severity));
        };
        handler.report("x", Span::new(0, 1), "oops", Severity::Warning);
        assert_eq!(seen, vec![(Span::new(0, 1), "oops".to_string(), Severity::Warning)]);
    }

    #[rstest::rstest]
    fn test_counting_handler() {
        let mut collector = DiagnosticCollector::new();
        let mut counting = CountingHandler::new(&mut collector);
        counting.report("x", Span::new(0, 1), "a", Severity::Error);
        counting.report("x", Span::new(0, 1), "b", Severity::Warning);
        assert_eq!(counting.errors(), 1);
        assert_eq!(collector.diagnostics().len(), 2);
    }

    #[rstest::rstest]
    fn test_rejected_message() {
        let mut collector = DiagnosticCollector::new();
        collector.report("[", Span::new(1, 1), "unexpected end of data", Severity::Error);
        let err = Error::Rejected(collector.into_diagnostics());
        assert_eq!(
            err.to_string(),
            "input rejected with 1 error(s), first: error at 1:2: unexpected end of data"
        );
        assert_eq!(err.diagnostics().len(), 1);
    }
}
