//! rxc-util - Foundation types for the rxc compiler.
//!
//! This crate provides the infrastructure every phase of the compiler builds
//! on:
//!
//! - [`Symbol`]: interned identifier strings with O(1) comparison
//! - [`Span`] / [`FileId`]: source location tracking for diagnostics
//! - [`Idx`] / [`IndexVec`]: typed indices into arena-style tables
//! - [`diagnostic`]: the error collector ([`Handler`]) and the fluent
//!   [`DiagnosticBuilder`] used by every analysis pass
//!
//! All of these are zero- or near-zero-cost: `Symbol` and the typed ids are
//! plain `u32` newtypes, and diagnostics are accumulated rather than
//! rendered (rendering belongs to the host).

pub mod diagnostic;
mod edge_cases;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;

// The hashers used throughout the compiler. FxHashMap for single-threaded
// tables on hot paths, re-exported so downstream crates agree on one choice.
pub use rustc_hash::{FxHashMap, FxHashSet};
