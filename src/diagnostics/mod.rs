//! Diagnostics for the compiler: what went wrong, where, and how to render
//! it for the user.

mod files;
mod formatter;

use blake3::Hasher;
pub use files::{FileCache, FileId, LineCol, Snippet, SourceFile};
pub use formatter::{ColorMode, ErrorFormat, FormatOptions, format_diagnostics};
use std::fmt;

/// Byte range in a registered source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub file_id: FileId,
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(file_id: FileId, start: usize, end: usize) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }
}

/// Whether an entry fails the compilation or merely flags something.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

/// A second location a diagnostic points at, such as the first of two
/// conflicting declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedLocation {
    pub span: Span,
    pub message: String,
}

/// One problem (or observation) found during compilation.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code stamped by the sink that recorded this entry.
    pub code: Option<String>,
    pub message: String,
    pub span: Option<Span>,
    pub related: Vec<RelatedLocation>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn error(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(Severity::Error, message, span)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(Severity::Warning, message, span)
    }

    #[must_use]
    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push(RelatedLocation {
            span,
            message: message.into(),
        });
        self
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    fn new(severity: Severity, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            span,
            related: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Accumulates diagnostics for one compilation phase and stamps each entry
/// with a code derived from the phase namespace and the entry itself, so a
/// given problem keeps the same code from run to run.
#[derive(Debug)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    namespace: String,
}

impl DiagnosticSink {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            diagnostics: Vec::new(),
            namespace: namespace.into(),
        }
    }

    pub fn push(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.code.is_none() {
            diagnostic.code = Some(self.code_for(&diagnostic));
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn push_error(&mut self, message: impl Into<String>, span: Option<Span>) {
        self.push(Diagnostic::error(message, span));
    }

    pub fn push_warning(&mut self, message: impl Into<String>, span: Option<Span>) {
        self.push(Diagnostic::warning(message, span));
    }

    pub fn extend(&mut self, diagnostics: Vec<Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of error-severity entries accumulated so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity.is_error())
            .count()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn code_for(&self, diagnostic: &Diagnostic) -> String {
        let mut hasher = Hasher::new();
        hasher.update(self.namespace.as_bytes());
        hasher.update(diagnostic.severity.as_str().as_bytes());
        hasher.update(diagnostic.message.as_bytes());
        if let Some(span) = diagnostic.span {
            hasher.update(&span.start.to_le_bytes());
            hasher.update(&span.end.to_le_bytes());
        }
        let bytes = hasher.finalize();
        let tag = u16::from_le_bytes([bytes.as_bytes()[0], bytes.as_bytes()[1]]);
        format!("{}-{tag:04x}", self.namespace.to_ascii_uppercase())
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new("GEN")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code.as_deref() {
            Some(code) => write!(f, "{}[{code}]: {}", self.severity.as_str(), self.message),
            None => write!(f, "{}: {}", self.severity.as_str(), self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_counts_only_errors() {
        let mut sink = DiagnosticSink::new("TYPE");
        sink.push_error("unknown type Foo", None);
        sink.push_warning("import already satisfied", None);
        sink.push_error("unknown type Bar", None);
        assert_eq!(sink.error_count(), 2);
        assert_eq!(sink.into_vec().len(), 3);
    }

    #[test]
    fn codes_are_stable_across_runs_and_namespaced() {
        let span = Some(Span::new(FileId(0), 4, 5));
        let mut first = DiagnosticSink::new("parse");
        first.push_error("expected ';'", span);
        let mut second = DiagnosticSink::new("parse");
        second.push_error("expected ';'", span);
        let a = first.into_vec().remove(0);
        let b = second.into_vec().remove(0);
        assert_eq!(a.code, b.code);
        let code = a.code.expect("code assigned");
        assert!(code.starts_with("PARSE-"), "unexpected code {code}");
    }

    #[test]
    fn distinct_messages_get_distinct_codes() {
        let mut sink = DiagnosticSink::new("TYPE");
        sink.push_error("unknown type Foo", None);
        sink.push_error("unknown type Bar", None);
        let diagnostics = sink.into_vec();
        assert_ne!(diagnostics[0].code, diagnostics[1].code);
    }

    #[test]
    fn related_locations_accumulate() {
        let span = Span::new(FileId(0), 10, 14);
        let previous = Span::new(FileId(0), 2, 6);
        let diagnostic = Diagnostic::error("attempt to redefine method a", Some(span))
            .with_related(previous, "previously defined here");
        assert_eq!(diagnostic.related.len(), 1);
        assert_eq!(diagnostic.related[0].span, previous);
    }

    #[test]
    fn display_includes_code_when_stamped() {
        let mut sink = DiagnosticSink::new("drv");
        sink.push_error("duplicate method id", None);
        let stamped = sink.into_vec().remove(0);
        let rendered = stamped.to_string();
        assert!(rendered.starts_with("error[DRV-"), "got {rendered}");
        assert!(rendered.ends_with("]: duplicate method id"), "got {rendered}");

        let bare = Diagnostic::warning("import already satisfied", None);
        assert_eq!(bare.to_string(), "warning: import already satisfied");
    }
}
