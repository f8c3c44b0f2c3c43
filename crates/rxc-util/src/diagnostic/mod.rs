//! Diagnostic collection infrastructure.
//!
//! Analysis passes report problems by building a [`Diagnostic`] and emitting
//! it into a [`Handler`]. The handler only accumulates; rendering (colors,
//! source snippets, ...) is the host's job. The pipeline keeps running past
//! recoverable errors, so one compilation can surface many diagnostics.
//!
//! # Example
//!
//! ```
//! use rxc_util::{DiagnosticBuilder, Handler, Span};
//! use rxc_util::diagnostic::codes;
//!
//! let handler = Handler::new();
//! DiagnosticBuilder::error("cannot find value `x` in this scope")
//!     .code(codes::UNDEFINED_NAME)
//!     .span(Span::new(4, 5))
//!     .emit(&handler);
//!
//! assert!(handler.has_errors());
//! ```

mod builder;
pub mod codes;

pub use builder::DiagnosticBuilder;
pub use codes::DiagnosticCode;

use crate::span::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity.
///
/// # Examples
///
/// ```
/// use rxc_util::Level;
///
/// assert_eq!(format!("{}", Level::Error), "error");
/// assert_eq!(format!("{}", Level::Warning), "warning");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Prevents compilation from succeeding.
    Error,
    /// Reported but does not fail the compilation.
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => f.write_str("error"),
            Level::Warning => f.write_str("warning"),
        }
    }
}

/// A single reported problem.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity.
    pub level: Level,
    /// Stable machine-readable code.
    pub code: Option<DiagnosticCode>,
    /// Primary human-readable message.
    pub message: String,
    /// Primary location.
    pub span: Span,
    /// Additional locations with their own labels.
    pub secondary: Vec<(Span, String)>,
    /// Free-form notes appended after the message.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic with no code, notes, or secondary spans.
    ///
    /// Most callers go through [`DiagnosticBuilder`] instead, which attaches
    /// the code and extra context fluently.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxc_util::{Diagnostic, Level, Span};
    ///
    /// let diag = Diagnostic::new(Level::Error, "mismatched types", Span::new(4, 9));
    /// assert_eq!(diag.level, Level::Error);
    /// assert!(diag.code.is_none());
    /// ```
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            code: None,
            message: message.into(),
            span,
            secondary: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Accumulates diagnostics for one compilation.
///
/// Single-threaded by design (the analysis pipeline is sequential); interior
/// mutability lets every pass share one handler by shared reference.
///
/// # Examples
///
/// ```
/// use rxc_util::{Diagnostic, Handler, Level, Span};
///
/// let handler = Handler::new();
/// handler.emit(Diagnostic::new(Level::Error, "unexpected token", Span::DUMMY));
///
/// assert!(handler.has_errors());
/// assert_eq!(handler.error_count(), 1);
/// ```
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Record a diagnostic.
    ///
    /// Diagnostics are kept in emission order; the pipeline's deterministic
    /// traversal order is what makes diagnostic order reproducible.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// True when at least one error-level diagnostic was recorded.
    ///
    /// Warnings alone never fail a compilation.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxc_util::{Diagnostic, Handler, Level, Span};
    ///
    /// let handler = Handler::new();
    /// handler.emit(Diagnostic::new(Level::Warning, "unreachable", Span::DUMMY));
    /// assert!(!handler.has_errors());
    /// ```
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Snapshot of all recorded diagnostics, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drain the recorded diagnostics, leaving the handler empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
