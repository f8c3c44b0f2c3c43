//! Error classification for the analysis pipeline.
//!
//! Individual problems travel as diagnostics with stable codes; this module
//! groups those codes into coarse kinds (useful for hosts and tests that
//! assert on the *category* of a failure) and defines the error the
//! pipeline entry point returns when a compilation fails.

use rxc_util::DiagnosticCode;
use thiserror::Error;

/// Why [`analyze`](crate::analyze) did not produce a usable program.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// One or more diagnostics of error severity were emitted; the handler
    /// holds the details.
    #[error("analysis failed with {errors} error(s)")]
    Failed { errors: usize },
}

/// Coarse classification of a user-visible error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Name,
    Type,
    Const,
    Trait,
    ControlFlow,
    CircularDependency,
    Warning,
}

impl ErrorKind {
    /// The kind a diagnostic code belongs to.
    pub fn of(code: DiagnosticCode) -> ErrorKind {
        match code.code {
            3001..=3099 => ErrorKind::Name,
            3100..=3199 => ErrorKind::Type,
            3200..=3299 => ErrorKind::Const,
            3300..=3399 => ErrorKind::Trait,
            3400..=3499 => ErrorKind::ControlFlow,
            3500..=3599 => ErrorKind::CircularDependency,
            _ => ErrorKind::Warning,
        }
    }
}
