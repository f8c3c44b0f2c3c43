//! Trait implementation validation.
//!
//! Runs after finalization, when every signature type is an interned
//! `TypeId`: for each impl whose trait reference resolved, every item the
//! trait requires must be present with the same kind and the same resolved
//! signature. Signature equality is `TypeId` equality position by
//! position: arity, each parameter, the return type, and for methods the
//! shape of the `self` parameter.

use rxc_util::diagnostic::codes;
use rxc_util::{DiagnosticBuilder, Handler, Span, Symbol};

use crate::hir::*;
use crate::ty::TypeTable;

pub fn validate(program: &Program, types: &TypeTable, handler: &Handler) {
    let validator = Validator {
        program,
        types,
        handler,
    };

    // Impl collection: every impl whose trait slot resolved.
    for imp in program.impls.iter() {
        let Some(trait_ref) = &imp.trait_ref else {
            continue;
        };
        let Some(tid) = trait_ref.trait_id() else {
            continue;
        };
        validator.validate_impl(imp, tid);
    }
}

struct Validator<'a> {
    program: &'a Program,
    types: &'a TypeTable,
    handler: &'a Handler,
}

impl<'a> Validator<'a> {
    fn error(&self, code: rxc_util::DiagnosticCode, span: Span, message: String) {
        DiagnosticBuilder::error(message)
            .code(code)
            .span(span)
            .emit(self.handler);
    }

    fn validate_impl(&self, imp: &ImplDef, tid: TraitId) {
        let trait_def = &self.program.traits[tid];
        let trait_name = trait_def.name;

        for &required in &trait_def.items {
            let required_name = self.assoc_name(required);
            let Some(provided) = self.find_item(imp, required_name) else {
                self.error(
                    codes::MISSING_TRAIT_ITEM,
                    imp.span,
                    format!(
                        "not all items of trait `{trait_name}` are implemented: missing `{required_name}`"
                    ),
                );
                continue;
            };
            match (required, provided) {
                (AssocItem::Func(req), AssocItem::Func(prov)) => {
                    self.match_functions(required_name, req, prov);
                }
                (AssocItem::Const(req), AssocItem::Const(prov)) => {
                    let req_ty = self.program.consts[req].ty.ty();
                    let prov_ty = self.program.consts[prov].ty.ty();
                    if req_ty != prov_ty && !self.types.is_error(req_ty) && !self.types.is_error(prov_ty)
                    {
                        self.error(
                            codes::TRAIT_SIGNATURE_MISMATCH,
                            self.program.consts[prov].span,
                            format!(
                                "constant `{required_name}` has type `{}`, but the trait requires `{}`",
                                self.types.display(prov_ty, self.program),
                                self.types.display(req_ty, self.program)
                            ),
                        );
                    }
                }
                (_, provided_item) => {
                    let span = self.assoc_span(provided_item);
                    self.error(
                        codes::TRAIT_ITEM_KIND_MISMATCH,
                        span,
                        format!(
                            "item `{required_name}` is a different kind of item than the trait declares"
                        ),
                    );
                }
            }
        }
    }

    fn assoc_name(&self, item: AssocItem) -> Symbol {
        match item {
            AssocItem::Func(fid) => self.program.functions[fid].name,
            AssocItem::Const(cid) => self.program.consts[cid].name,
        }
    }

    fn assoc_span(&self, item: AssocItem) -> Span {
        match item {
            AssocItem::Func(fid) => self.program.functions[fid].span,
            AssocItem::Const(cid) => self.program.consts[cid].span,
        }
    }

    fn find_item(&self, imp: &ImplDef, name: Symbol) -> Option<AssocItem> {
        imp.items
            .iter()
            .copied()
            .find(|item| self.assoc_name(*item) == name)
    }

    fn match_functions(&self, name: Symbol, req: FuncId, prov: FuncId) {
        let req_fn = &self.program.functions[req];
        let prov_fn = &self.program.functions[prov];
        let span = prov_fn.span;

        match (req_fn.self_param, prov_fn.self_param) {
            (None, None) => {}
            (Some(a), Some(b)) => {
                if a != b {
                    self.error(
                        codes::TRAIT_SIGNATURE_MISMATCH,
                        span,
                        format!("method `{name}` declares its `self` parameter differently than the trait"),
                    );
                    return;
                }
            }
            (Some(_), None) => {
                self.error(
                    codes::TRAIT_SIGNATURE_MISMATCH,
                    span,
                    format!("`{name}` is a method in the trait, but a function in the impl"),
                );
                return;
            }
            (None, Some(_)) => {
                self.error(
                    codes::TRAIT_SIGNATURE_MISMATCH,
                    span,
                    format!("`{name}` is a function in the trait, but a method in the impl"),
                );
                return;
            }
        }

        if req_fn.params.len() != prov_fn.params.len() {
            self.error(
                codes::TRAIT_SIGNATURE_MISMATCH,
                span,
                format!(
                    "`{name}` takes {} parameter(s) in the impl, but the trait declares {}",
                    prov_fn.params.len(),
                    req_fn.params.len()
                ),
            );
            return;
        }

        for (position, (req_param, prov_param)) in
            req_fn.params.iter().zip(prov_fn.params.iter()).enumerate()
        {
            let req_ty = req_param.ty.ty();
            let prov_ty = prov_param.ty.ty();
            if req_ty != prov_ty && !self.types.is_error(req_ty) && !self.types.is_error(prov_ty) {
                self.error(
                    codes::TRAIT_SIGNATURE_MISMATCH,
                    span,
                    format!(
                        "parameter {} of `{name}` has type `{}`, but the trait requires `{}`",
                        position + 1,
                        self.types.display(prov_ty, self.program),
                        self.types.display(req_ty, self.program)
                    ),
                );
                return;
            }
        }

        let req_ret = req_fn.ret_ty.ty();
        let prov_ret = prov_fn.ret_ty.ty();
        if req_ret != prov_ret && !self.types.is_error(req_ret) && !self.types.is_error(prov_ret) {
            self.error(
                codes::TRAIT_SIGNATURE_MISMATCH,
                span,
                format!(
                    "`{name}` returns `{}`, but the trait requires `{}`",
                    self.types.display(prov_ret, self.program),
                    self.types.display(req_ret, self.program)
                ),
            );
        }
    }
}
