//! Interned identifier strings.
//!
//! A [`Symbol`] is a 4-byte handle to a string in the global interner.
//! Identifiers are compared constantly during name resolution, so equality
//! must be an integer comparison, not a string walk. The interner is
//! append-only and content-addressed; the same text always yields the same
//! handle for the lifetime of the process.
//!
//! # Example
//!
//! ```
//! use rxc_util::Symbol;
//!
//! let a = Symbol::intern("field");
//! let b = Symbol::intern("field");
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "field");
//! ```

mod interner;

pub use interner::InternerStats;

use interner::INTERNER;
use static_assertions::assert_eq_size;
use std::fmt;

/// A handle to an interned string.
///
/// Equality, hashing, and ordering all operate on the handle, making
/// `Symbol` suitable as a key in the compiler's hot-path maps.
///
/// # Size
///
/// `Symbol` is exactly 4 bytes, compared to 24 bytes plus a heap
/// allocation for `String`; the size is pinned by a compile-time
/// assertion.
///
/// # Examples
///
/// ```
/// use rxc_util::Symbol;
///
/// let a = Symbol::intern("value");
/// let b = Symbol::intern("value");
/// assert_eq!(a, b);
/// assert_ne!(a, Symbol::intern("other"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

assert_eq_size!(Symbol, u32);

impl Symbol {
    /// Intern `text`, returning its stable handle.
    ///
    /// The same text always yields the same handle; the first occurrence
    /// allocates, later occurrences are a hash lookup.
    ///
    /// # Thread Safety
    ///
    /// Safe to call from multiple threads concurrently; two threads racing
    /// to intern the same new text agree on one handle.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxc_util::Symbol;
    ///
    /// let name = Symbol::intern("main");
    /// assert_eq!(name.as_str(), "main");
    /// ```
    pub fn intern(text: &str) -> Symbol {
        Symbol(INTERNER.intern(text))
    }

    /// The text this symbol stands for.
    ///
    /// # Performance
    ///
    /// A read-locked table index; the returned `&'static str` can be held
    /// freely since interned strings live for the process.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxc_util::Symbol;
    ///
    /// assert_eq!(Symbol::intern("café").as_str(), "café");
    /// ```
    pub fn as_str(self) -> &'static str {
        INTERNER.resolve(self.0)
    }

    /// Raw handle value, for debugging and serialization.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Interner statistics (counts and hit rate), for profiling.
    pub fn stats() -> InternerStats {
        INTERNER.stats()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbols the compiler refers to by name.
///
/// These are interned on first use through the same path as every other
/// symbol; the constants here only spare call sites the string literal.
pub mod kw {
    use super::Symbol;

    /// `self` in a method receiver or path.
    pub fn self_lower() -> Symbol {
        Symbol::intern("self")
    }

    /// `Self` as the implementing type.
    pub fn self_upper() -> Symbol {
        Symbol::intern("Self")
    }

    /// The `main` entry function.
    pub fn main() -> Symbol {
        Symbol::intern("main")
    }
}
