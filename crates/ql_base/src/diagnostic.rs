//! The diagnostic channel shared by every compiler stage.
//!
//! Each pass receives a mutable [`Diagnostics`] sink and records
//! [`Diagnostic`]s into it; nothing is thrown across the pipeline. After each
//! stage the driver checks the sink and skips the remaining stages when it is
//! non-empty, while still returning whatever partial artifacts were built.
//!
//! A diagnostic carries a stable `code` (e.g. `"expected-identifier"`,
//! `"shadowing"`), a human-readable message, and the [`Span`] of the
//! offending source. [`Diagnostic::display_with_source`] renders the message
//! with the source line and a caret underline:
//!
//! ```text
//! error: shadowing of 'x'
//!
//!    2 | let x = 2;
//!      |     ^
//! ```

use crate::span::Span;
use crate::style::Style;
use std::fmt;

/// A recorded compiler error.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Stable machine-readable code, kebab-case.
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Location in source.
    pub span: Span,
}

impl Diagnostic {
    /// Creates a diagnostic with the given code, message, and location.
    pub fn new(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }

    /// Renders the diagnostic with the offending source line and a caret
    /// underline, colored for terminals.
    pub fn display_with_source(&self, source: &str) -> String {
        let (line_num, col) = self.span.line_col(source);
        let line_start = self.span.start + 1 - col;
        let line_end = source[line_start..]
            .find('\n')
            .map(|off| line_start + off)
            .unwrap_or(source.len());
        let line_content = &source[line_start..line_end];

        let len = self.span.len().max(1).min(line_end.saturating_sub(self.span.start).max(1));
        let underline = format!("{}{}", " ".repeat(col - 1), "^".repeat(len));

        format!(
            "{}: {}\n\n{} {} {}\n     {} {}",
            Style::bold_red("error"),
            self.message,
            Style::blue(&format!("{:4}", line_num)),
            Style::blue("|"),
            line_content,
            Style::blue("|"),
            Style::red(&underline),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] at {}..{}",
            self.message, self.code, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Ordered sink of diagnostics, threaded through the pipeline.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Records a diagnostic built from parts.
    pub fn report(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::new(code, message, span));
    }

    /// `true` if any diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The recorded diagnostics, in the order they were reported.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Iterates the recorded diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_starts_empty() {
        let sink = Diagnostics::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn report_preserves_order() {
        let mut sink = Diagnostics::new();
        sink.report("first", "first error", Span::new(0, 1));
        sink.report("second", "second error", Span::new(2, 3));
        let codes: Vec<&str> = sink.iter().map(|d| d.code).collect();
        assert_eq!(codes, ["first", "second"]);
    }

    #[test]
    fn display_includes_code_and_range() {
        let d = Diagnostic::new("shadowing", "shadowing of 'x'", Span::new(4, 5));
        let text = format!("{}", d);
        assert!(text.contains("shadowing of 'x'"));
        assert!(text.contains("[shadowing]"));
        assert!(text.contains("4..5"));
    }

    #[test]
    fn display_with_source_underlines_offending_text() {
        let source = "var x = 1;\nlet x = 2;";
        let d = Diagnostic::new("shadowing", "shadowing of 'x'", Span::new(15, 16));
        let rendered = d.display_with_source(source);
        assert!(rendered.contains("let x = 2;"), "{rendered}");
        assert!(rendered.contains('^'), "{rendered}");
        assert!(rendered.contains("\x1b["), "{rendered}");
    }

    #[test]
    fn display_with_source_handles_first_line() {
        let source = "lt x = 1;";
        let d = Diagnostic::new("expected-top-level-statement", "expected a top-level statement", Span::new(0, 2));
        let rendered = d.display_with_source(source);
        assert!(rendered.contains("lt x = 1;"));
        assert!(rendered.contains("^^"));
    }
}
