//! Property tests for the symbol interner.

use quickcheck_macros::quickcheck;
use rxc_util::Symbol;

#[quickcheck]
fn prop_intern_round_trips(text: String) -> bool {
    Symbol::intern(&text).as_str() == text
}

#[quickcheck]
fn prop_intern_is_idempotent(text: String) -> bool {
    Symbol::intern(&text) == Symbol::intern(&text)
}

#[quickcheck]
fn prop_distinct_strings_distinct_symbols(a: String, b: String) -> bool {
    if a == b {
        return true;
    }
    Symbol::intern(&a) != Symbol::intern(&b)
}
