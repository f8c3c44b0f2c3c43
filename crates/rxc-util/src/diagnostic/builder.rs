//! Fluent construction of [`Diagnostic`]s.

use super::{Diagnostic, DiagnosticCode, Handler, Level};
use crate::span::Span;

/// Builder for a single diagnostic.
///
/// ```
/// use rxc_util::{DiagnosticBuilder, Handler, Span};
///
/// let handler = Handler::new();
/// DiagnosticBuilder::error("mismatched types")
///     .span(Span::new(10, 14))
///     .note("expected `i32`, found `bool`")
///     .emit(&handler);
/// ```
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    /// Start an error-level diagnostic.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxc_util::{DiagnosticBuilder, Span};
    /// use rxc_util::diagnostic::codes;
    ///
    /// let diag = DiagnosticBuilder::error("cannot find value `x` in this scope")
    ///     .code(codes::UNDEFINED_NAME)
    ///     .span(Span::new(4, 5))
    ///     .build();
    /// assert_eq!(diag.code, Some(codes::UNDEFINED_NAME));
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Error, message, Span::DUMMY),
        }
    }

    /// Start a warning-level diagnostic.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxc_util::{DiagnosticBuilder, Level};
    ///
    /// let diag = DiagnosticBuilder::warning("unreachable statement").build();
    /// assert_eq!(diag.level, Level::Warning);
    /// ```
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Warning, message, Span::DUMMY),
        }
    }

    /// Attach the stable diagnostic code.
    pub fn code(mut self, code: DiagnosticCode) -> Self {
        self.diagnostic.code = Some(code);
        self
    }

    /// Set the primary span.
    pub fn span(mut self, span: Span) -> Self {
        self.diagnostic.span = span;
        self
    }

    /// Add a labeled secondary span.
    pub fn secondary(mut self, span: Span, label: impl Into<String>) -> Self {
        self.diagnostic.secondary.push((span, label.into()));
        self
    }

    /// Append a note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    /// Finish without emitting.
    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }

    /// Finish and record into `handler`.
    pub fn emit(self, handler: &Handler) {
        handler.emit(self.diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::codes;

    #[test]
    fn test_error_builder() {
        let diag = DiagnosticBuilder::error("boom")
            .code(codes::TYPE_MISMATCH)
            .span(Span::new(1, 2))
            .note("a note")
            .build();
        assert_eq!(diag.level, Level::Error);
        assert_eq!(diag.code, Some(codes::TYPE_MISMATCH));
        assert_eq!(diag.span, Span::new(1, 2));
        assert_eq!(diag.notes, vec!["a note"]);
    }

    #[test]
    fn test_warning_builder() {
        let diag = DiagnosticBuilder::warning("careful").build();
        assert_eq!(diag.level, Level::Warning);
        assert!(diag.code.is_none());
    }

    #[test]
    fn test_secondary_spans() {
        let diag = DiagnosticBuilder::error("conflict")
            .span(Span::new(10, 12))
            .secondary(Span::new(2, 4), "first defined here")
            .build();
        assert_eq!(diag.secondary.len(), 1);
        assert_eq!(diag.secondary[0].1, "first defined here");
    }

    #[test]
    fn test_emit_records() {
        let handler = Handler::new();
        DiagnosticBuilder::error("x").emit(&handler);
        assert_eq!(handler.error_count(), 1);
    }
}
