//! rxc-ast - Syntax tree definitions for the rxc compiler.
//!
//! This crate is the input interface of the semantic analysis core: a parser
//! produces an [`Ast`], the analyzer consumes it read-only. Every node
//! carries a [`NodeId`](ast::NodeId) and a `Span`; the analyzer keeps both
//! as back-references for diagnostics but never mutates a node.
//!
//! The [`build`] module provides ergonomic constructors. The parser targets
//! them, and so do the analyzer's tests, which assemble programs directly
//! instead of going through source text.

pub mod ast;
pub mod build;

pub use ast::*;
