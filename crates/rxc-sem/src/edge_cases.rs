//! Edge case tests for rxc-sem
