//! Edge case tests for rxc-util
