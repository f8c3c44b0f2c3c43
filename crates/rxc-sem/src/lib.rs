//! rxc-sem - Semantic analysis for the rxc compiler.
//!
//! This crate turns a parsed [`rxc_ast::Ast`] into a fully resolved,
//! type-checked HIR. The pipeline runs a fixed sequence of passes over one
//! shared, mutable [`Program`]:
//!
//! 1. **Lowering** ([`lower`]): a mechanical AST rewrite; every semantic
//!    slot starts unresolved.
//! 2. **Name resolution** ([`resolve`]): identifiers and paths bound to
//!    declarations; lexical scoping with a function *boundary* that hides
//!    local bindings from nested functions while keeping items visible.
//! 3. **Finalization** ([`finalize`]): type annotations and constants
//!    resolved on demand, with memoization and cycle detection.
//! 4. **Expression checking** ([`check`]): bidirectional type checking,
//!    place and mutability analysis, divergence tracking, method
//!    resolution.
//! 5. **Control-flow linking** ([`cflow`]): `break`/`continue`/`return`
//!    targets validated.
//! 6. **Trait validation** ([`traits`]): every trait impl provides each
//!    required item with a matching signature.
//!
//! Each pass advances the HIR's slot fields from their unresolved to their
//! resolved shape and never retracts; the invariants one pass establishes
//! are preconditions of the next. User-facing problems land in the shared
//! [`Handler`] and the pipeline keeps going past them; only internal
//! invariant violations abort (by panic).

pub mod builtin;
pub mod cflow;
pub mod check;
pub mod consts;
pub mod errors;
pub mod finalize;
pub mod hir;
pub mod lower;
pub mod print;
pub mod resolve;
pub mod scope;
pub mod traits;
pub mod ty;

mod edge_cases;

pub use errors::{AnalysisError, ErrorKind};
pub use hir::{ImplTable, Program};
pub use ty::{TypeId, TypeTable};

use builtin::Builtins;
use rxc_util::Handler;
use scope::ScopeTree;

/// Everything the analysis produced: the checked program plus the tables a
/// consumer (e.g. a code generator) reads alongside it.
#[derive(Debug)]
pub struct Analysis {
    pub program: Program,
    pub types: TypeTable,
    pub impls: ImplTable,
    pub builtins: Builtins,
}

impl Analysis {
    /// Fail the analysis if the handler saw any errors.
    pub fn into_result(self, handler: &Handler) -> Result<Analysis, AnalysisError> {
        if handler.has_errors() {
            Err(AnalysisError::Failed {
                errors: handler.error_count(),
            })
        } else {
            Ok(self)
        }
    }
}

/// Run the full pipeline over `ast`, accumulating diagnostics in
/// `handler`.
///
/// Always returns the (possibly partially erroneous) analysis so callers
/// can inspect the HIR alongside the diagnostics; use
/// [`Analysis::into_result`] when only a clean program is acceptable.
pub fn analyze(ast: &rxc_ast::Ast, handler: &Handler) -> Analysis {
    let mut program = lower::lower(ast);
    let mut types = TypeTable::new();
    let mut scopes = ScopeTree::new();
    let mut impls = ImplTable::new();
    let builtins = builtin::seed(&mut program, &mut types, &mut scopes, &mut impls);

    resolve::resolve(&mut program, &mut scopes, &types, handler);
    finalize::finalize(&mut program, &mut types, &scopes, &mut impls, handler);
    check::check(&mut program, &mut types, &impls, handler);
    cflow::validate(&program, handler);
    traits::validate(&program, &types, handler);

    Analysis {
        program,
        types,
        impls,
        builtins,
    }
}
