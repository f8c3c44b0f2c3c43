//! Type and constant finalization.
//!
//! Demand-driven resolution over the dependency graph formed by type
//! annotations and constants: a struct field may name another struct, an
//! array type carries a length that is a constant, a constant's initializer
//! may reference other constants. Every resolution is memoized in the slot
//! it fills, and a recursion guard keyed on slot identity turns cycles into
//! `CircularDependency` diagnostics instead of stack overflows.
//!
//! A struct named directly in another type is resolved through (its fields
//! must be finalizable, which is what makes `struct A { a: A }` a cycle);
//! a struct named *behind a reference* is not recursed into, since the
//! reference breaks the layout dependency.
//!
//! After this pass every reachable type annotation is a `TypeId`, every
//! constant with an initializer is `Resolved` or `Error`, and the impl
//! table maps every finalized impl target to its blocks.

use rxc_ast::{BinOp, PathSeg, UnOp};
use rxc_util::diagnostic::codes;
use rxc_util::{DiagnosticBuilder, DiagnosticCode, FxHashMap, FxHashSet, Handler, Span, Symbol};

use crate::consts::{self, ConstValue, EvalErrorKind, Sign};
use crate::hir::*;
use crate::scope::{ScopeTree, TypeDef};
use crate::ty::{Primitive, TypeTable};

/// Run finalization; fills the impl table for user impls as their self
/// types resolve.
pub fn finalize(
    program: &mut Program,
    types: &mut TypeTable,
    scopes: &ScopeTree,
    impl_table: &mut ImplTable,
    handler: &Handler,
) {
    let mut finalizer = Finalizer {
        program,
        types,
        scopes,
        handler,
        in_progress: FxHashSet::default(),
        finished_structs: FxHashSet::default(),
        const_memo: FxHashMap::default(),
    };

    for sid in finalizer.program.structs.indices().collect::<Vec<_>>() {
        let span = finalizer.program.structs[sid].span;
        finalizer.ensure_struct(sid, span);
    }
    for cid in finalizer.program.consts.indices().collect::<Vec<_>>() {
        finalizer.resolve_const(cid);
    }
    for iid in finalizer.program.impls.indices().collect::<Vec<_>>() {
        let span = finalizer.program.impls[iid].span;
        let already_resolved = finalizer.program.impls[iid].self_ty.is_resolved();
        let tid = finalizer.impl_self_ty(iid, span);
        // Builtin impls registered themselves at seeding time.
        if !already_resolved && !finalizer.types.is_error(tid) {
            impl_table.add(tid, iid);
        }
    }
    for fid in finalizer.program.functions.indices().collect::<Vec<_>>() {
        finalizer.finalize_fn(fid);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum GuardKey {
    Struct(StructId),
    Const(ConstId),
    Impl(ImplId),
}

struct Finalizer<'a> {
    program: &'a mut Program,
    types: &'a mut TypeTable,
    scopes: &'a ScopeTree,
    handler: &'a Handler,
    /// Resolutions currently on the stack; a re-entry is a cycle.
    in_progress: FxHashSet<GuardKey>,
    finished_structs: FxHashSet<StructId>,
    /// Per-expression memo; `Err` means the failure was already reported.
    const_memo: FxHashMap<ExprId, Result<ConstValue, ()>>,
}

impl<'a> Finalizer<'a> {
    fn error(&self, code: DiagnosticCode, span: Span, message: impl Into<String>) {
        DiagnosticBuilder::error(message)
            .code(code)
            .span(span)
            .emit(self.handler);
    }

    // ---- structs ----

    fn ensure_struct(&mut self, sid: StructId, span: Span) {
        if self.finished_structs.contains(&sid) {
            return;
        }
        if !self.in_progress.insert(GuardKey::Struct(sid)) {
            let name = self.program.structs[sid].name;
            self.error(
                codes::CIRCULAR_TYPE,
                span,
                format!("recursive type `{name}` has infinite size"),
            );
            return;
        }
        for i in 0..self.program.structs[sid].fields.len() {
            let slot = self.program.structs[sid].fields[i].ty.clone();
            let slot = self.resolve_slot(slot);
            self.program.structs[sid].fields[i].ty = slot;
        }
        self.in_progress.remove(&GuardKey::Struct(sid));
        self.finished_structs.insert(sid);
    }

    // ---- constants ----

    fn resolve_const(&mut self, cid: ConstId) {
        if !matches!(self.program.consts[cid].value, ValueState::Unresolved) {
            return;
        }
        let span = self.program.consts[cid].span;
        if !self.in_progress.insert(GuardKey::Const(cid)) {
            let name = self.program.consts[cid].name;
            self.error(
                codes::CIRCULAR_CONSTANT,
                span,
                format!("constant `{name}` references itself"),
            );
            self.program.consts[cid].value = ValueState::Error;
            return;
        }

        let slot = self.program.consts[cid].ty.clone();
        let slot = self.resolve_slot(slot);
        let ty = slot.ty();
        self.program.consts[cid].ty = slot;

        if let Some(init) = self.program.consts[cid].init {
            // Finalize cast targets and other annotation slots buried in
            // the initializer before evaluating it.
            self.finalize_body_slots(init);
            let hint = self.sign_of(ty);
            let state = match self.eval_expr(init, hint) {
                Ok(value) => ValueState::Resolved(value),
                Err(()) => ValueState::Error,
            };
            self.program.consts[cid].value = state;
        }
        // A bodiless trait const declaration keeps its unresolved state; it
        // is a signature, not a value.
        self.in_progress.remove(&GuardKey::Const(cid));
    }

    fn sign_of(&self, ty: crate::ty::TypeId) -> Option<Sign> {
        if self.types.is_unsigned_integer(ty) {
            Some(Sign::Unsigned)
        } else if self.types.is_signed_integer(ty) {
            Some(Sign::Signed)
        } else {
            None
        }
    }

    // ---- impls and functions ----

    fn impl_self_ty(&mut self, iid: ImplId, span: Span) -> crate::ty::TypeId {
        if let TypeSlot::Resolved(tid) = self.program.impls[iid].self_ty {
            return tid;
        }
        if !self.in_progress.insert(GuardKey::Impl(iid)) {
            self.error(
                codes::CIRCULAR_TYPE,
                span,
                "impl target type depends on itself",
            );
            return self.types.error();
        }
        let slot = self.program.impls[iid].self_ty.clone();
        let slot = self.resolve_slot(slot);
        let tid = slot.ty();
        self.program.impls[iid].self_ty = slot;
        self.in_progress.remove(&GuardKey::Impl(iid));
        tid
    }

    fn finalize_fn(&mut self, fid: FuncId) {
        for i in 0..self.program.functions[fid].params.len() {
            let slot = self.program.functions[fid].params[i].ty.clone();
            let slot = self.resolve_slot(slot);
            self.program.functions[fid].params[i].ty = slot;
        }
        let slot = self.program.functions[fid].ret_ty.clone();
        let slot = self.resolve_slot(slot);
        self.program.functions[fid].ret_ty = slot;

        let pats: Vec<Pat> = self
            .program
            .functions[fid]
            .params
            .iter()
            .map(|p| p.pat.clone())
            .collect();
        for pat in &pats {
            self.finalize_pattern_slots(pat);
        }
        if let Some(body) = self.program.functions[fid].body {
            self.finalize_body_slots(body);
        }
    }

    fn finalize_pattern_slots(&mut self, pat: &Pat) {
        match &pat.kind {
            PatKind::Literal { expr, .. } => self.finalize_body_slots(*expr),
            PatKind::Ref { inner, .. } => self.finalize_pattern_slots(inner),
            PatKind::Binding { .. } | PatKind::Wildcard | PatKind::Path(_) => {}
        }
    }

    /// Resolve the annotation slots reachable inside a body: cast targets
    /// and let annotations.
    fn finalize_body_slots(&mut self, id: ExprId) {
        let kind = std::mem::replace(&mut self.program.exprs[id].kind, ExprKind::Underscore);
        let kind = match kind {
            ExprKind::Cast { expr, target } => {
                let target = self.resolve_slot(target);
                self.finalize_body_slots(expr);
                ExprKind::Cast { expr, target }
            }
            ExprKind::Block { mut stmts, tail } => {
                for stmt in stmts.iter_mut() {
                    match stmt {
                        Stmt::Let(l) => {
                            if let Some(slot) = l.ty.take() {
                                l.ty = Some(self.resolve_slot(slot));
                            }
                            let init = l.init;
                            self.finalize_body_slots(init);
                        }
                        Stmt::Expr { expr, .. } => {
                            let expr = *expr;
                            self.finalize_body_slots(expr);
                        }
                        // Nested items are finalized through the arenas.
                        Stmt::Item(_) => {}
                    }
                }
                if let Some(tail) = tail {
                    self.finalize_body_slots(tail);
                }
                ExprKind::Block { stmts, tail }
            }
            ExprKind::FieldAccess { base, selector } => {
                self.finalize_body_slots(base);
                ExprKind::FieldAccess { base, selector }
            }
            ExprKind::Index { base, index } => {
                self.finalize_body_slots(base);
                self.finalize_body_slots(index);
                ExprKind::Index { base, index }
            }
            ExprKind::StructLiteral { target, fields } => {
                for field in &fields {
                    self.finalize_body_slots(field.value);
                }
                ExprKind::StructLiteral { target, fields }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in &elements {
                    self.finalize_body_slots(*element);
                }
                ExprKind::ArrayLiteral(elements)
            }
            ExprKind::ArrayRepeat { value, count } => {
                self.finalize_body_slots(value);
                self.finalize_body_slots(count);
                ExprKind::ArrayRepeat { value, count }
            }
            ExprKind::Unary { op, operand } => {
                self.finalize_body_slots(operand);
                ExprKind::Unary { op, operand }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.finalize_body_slots(lhs);
                self.finalize_body_slots(rhs);
                ExprKind::Binary { op, lhs, rhs }
            }
            ExprKind::Assign { lhs, rhs, op } => {
                self.finalize_body_slots(lhs);
                self.finalize_body_slots(rhs);
                ExprKind::Assign { lhs, rhs, op }
            }
            ExprKind::Call { callee, args } => {
                self.finalize_body_slots(callee);
                for arg in &args {
                    self.finalize_body_slots(*arg);
                }
                ExprKind::Call { callee, args }
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                resolved,
            } => {
                self.finalize_body_slots(receiver);
                for arg in &args {
                    self.finalize_body_slots(*arg);
                }
                ExprKind::MethodCall {
                    receiver,
                    method,
                    args,
                    resolved,
                }
            }
            ExprKind::If {
                cond,
                then_block,
                else_expr,
            } => {
                self.finalize_body_slots(cond);
                self.finalize_body_slots(then_block);
                if let Some(else_expr) = else_expr {
                    self.finalize_body_slots(else_expr);
                }
                ExprKind::If {
                    cond,
                    then_block,
                    else_expr,
                }
            }
            ExprKind::Loop { body } => {
                self.finalize_body_slots(body);
                ExprKind::Loop { body }
            }
            ExprKind::While { cond, body } => {
                self.finalize_body_slots(cond);
                self.finalize_body_slots(body);
                ExprKind::While { cond, body }
            }
            ExprKind::Break { value, target } => {
                if let Some(value) = value {
                    self.finalize_body_slots(value);
                }
                ExprKind::Break { value, target }
            }
            ExprKind::Return { value, target } => {
                if let Some(value) = value {
                    self.finalize_body_slots(value);
                }
                ExprKind::Return { value, target }
            }
            other @ (ExprKind::Literal(_)
            | ExprKind::Value(_)
            | ExprKind::Continue { .. }
            | ExprKind::Underscore) => other,
        };
        self.program.exprs[id].kind = kind;
    }

    // ---- type node resolution ----

    fn resolve_slot(&mut self, slot: TypeSlot) -> TypeSlot {
        match slot {
            TypeSlot::Resolved(_) => slot,
            TypeSlot::Unresolved { node, scope, span } => {
                let scope =
                    scope.unwrap_or_else(|| panic!("type slot at {span} was never anchored"));
                let tid = self.resolve_node(&node, scope, span, false);
                TypeSlot::Resolved(tid)
            }
        }
    }

    fn resolve_node(
        &mut self,
        node: &TyNode,
        scope: ScopeId,
        span: Span,
        indirect: bool,
    ) -> crate::ty::TypeId {
        match node {
            TyNode::Prim(p) => self.types.prim(Primitive::from_ast(*p)),
            TyNode::Unit => self.types.unit(),
            TyNode::Infer => {
                self.error(
                    codes::NOT_A_TYPE,
                    span,
                    "the type placeholder `_` is not allowed here",
                );
                self.types.error()
            }
            TyNode::Ref { inner, mutable } => {
                let pointee = self.resolve_node(inner, scope, span, true);
                self.types.mk_ref(pointee, *mutable)
            }
            TyNode::Array { element, length } => {
                let element = self.resolve_node(element, scope, span, indirect);
                match self.eval_expr(*length, Some(Sign::Unsigned)) {
                    Ok(value) => match value.as_length() {
                        Some(length) => self.types.mk_array(element, length),
                        None => {
                            let code = if value.is_integer() {
                                codes::NEGATIVE_LENGTH
                            } else {
                                codes::NOT_CONST
                            };
                            self.error(code, span, "array length must be a non-negative integer");
                            self.types.error()
                        }
                    },
                    Err(()) => self.types.error(),
                }
            }
            TyNode::Path(path) => self.resolve_path_type(path, scope, span, indirect),
        }
    }

    fn resolve_path_type(
        &mut self,
        path: &rxc_ast::Path,
        scope: ScopeId,
        span: Span,
        indirect: bool,
    ) -> crate::ty::TypeId {
        let def = match path.segments.as_slice() {
            [PathSeg::SelfType] => self.scopes.lookup_type_from(scope, Symbol::intern("Self")),
            [PathSeg::Ident(name)] => {
                let def = self.scopes.lookup_type_from(scope, *name);
                if def.is_none() {
                    self.error(
                        codes::UNDEFINED_NAME,
                        span,
                        format!("cannot find type `{name}` in this scope"),
                    );
                    return self.types.error();
                }
                def
            }
            _ => {
                self.error(codes::INVALID_PATH, span, "unsupported type path");
                return self.types.error();
            }
        };
        match def {
            Some(TypeDef::Struct(sid)) => {
                if !indirect {
                    self.ensure_struct(sid, span);
                }
                self.types.mk_struct(sid)
            }
            Some(TypeDef::Enum(eid)) => self.types.mk_enum(eid),
            Some(TypeDef::Prim(p)) => self.types.prim(Primitive::from_ast(p)),
            Some(TypeDef::Trait(tid)) => {
                let name = self.program.traits[tid].name;
                self.error(
                    codes::NOT_A_TYPE,
                    span,
                    format!("trait `{name}` is not a concrete type"),
                );
                self.types.error()
            }
            Some(TypeDef::SelfAlias(iid)) => self.impl_self_ty(iid, span),
            None => {
                self.error(
                    codes::SELF_OUTSIDE_IMPL,
                    span,
                    "`Self` is only available inside impl blocks",
                );
                self.types.error()
            }
        }
    }

    // ---- constant evaluation ----

    /// Evaluate a constant expression. Failures are reported at the
    /// offending node and surface as `Err(())` so callers stay silent.
    fn eval_expr(&mut self, id: ExprId, hint: Option<Sign>) -> Result<ConstValue, ()> {
        if let Some(memoized) = self.const_memo.get(&id) {
            return memoized.clone();
        }

        // Pull the small head of the node out so the walk below can borrow
        // `self` freely.
        enum Shape {
            Lit(rxc_ast::Lit),
            ConstUse(ConstId),
            Poisoned,
            Unary(UnOp, ExprId),
            Binary(BinOp, ExprId, ExprId),
            NotConst,
        }
        let span = self.program.exprs[id].span;
        let shape = match &self.program.exprs[id].kind {
            ExprKind::Literal(lit) => Shape::Lit(lit.clone()),
            ExprKind::Value(ValueSlot::Const(cid)) => Shape::ConstUse(*cid),
            ExprKind::Value(ValueSlot::Error) => Shape::Poisoned,
            ExprKind::Unary { op, operand } => Shape::Unary(*op, *operand),
            ExprKind::Binary { op, lhs, rhs } => Shape::Binary(*op, *lhs, *rhs),
            _ => Shape::NotConst,
        };

        let result = match shape {
            Shape::Lit(lit) => Ok(consts::literal_value(&lit, hint)),
            Shape::Poisoned => Err(()),
            Shape::ConstUse(cid) => {
                self.resolve_const(cid);
                match &self.program.consts[cid].value {
                    ValueState::Resolved(value) => Ok(value.clone()),
                    _ => Err(()),
                }
            }
            Shape::Unary(op, operand) => {
                let operand_hint = match op {
                    UnOp::Neg => Some(Sign::Signed),
                    _ => hint,
                };
                let value = self.eval_expr(operand, operand_hint)?;
                consts::apply_unop(op, &value).map_err(|kind| self.report_eval(kind, span))
            }
            Shape::Binary(op, lhs, rhs) => self.eval_binary(op, lhs, rhs, hint, span),
            Shape::NotConst => Err(self.report_eval(EvalErrorKind::NotConst, span)),
        };

        self.const_memo.insert(id, result.clone());
        result
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
        hint: Option<Sign>,
        span: Span,
    ) -> Result<ConstValue, ()> {
        if op.is_logical() {
            let lhs = self.eval_expr(lhs, None)?;
            match (op, &lhs) {
                (BinOp::And, ConstValue::Bool(false)) => return Ok(ConstValue::Bool(false)),
                (BinOp::Or, ConstValue::Bool(true)) => return Ok(ConstValue::Bool(true)),
                (_, ConstValue::Bool(_)) => {}
                _ => return Err(self.report_eval(EvalErrorKind::InvalidOperand, span)),
            }
            let rhs = self.eval_expr(rhs, None)?;
            return consts::apply_binop(op, &lhs, &rhs)
                .map_err(|kind| self.report_eval(kind, span));
        }
        let operand_hint = if op.is_comparison() { None } else { hint };
        let lhs = self.eval_expr(lhs, operand_hint)?;
        let rhs = self.eval_expr(rhs, operand_hint)?;
        consts::apply_binop(op, &lhs, &rhs).map_err(|kind| self.report_eval(kind, span))
    }

    fn report_eval(&self, kind: EvalErrorKind, span: Span) {
        let (code, message) = match kind {
            EvalErrorKind::NotConst => (
                codes::NOT_CONST,
                "expression is not valid in a constant".to_owned(),
            ),
            EvalErrorKind::DivisionByZero => (
                codes::DIVISION_BY_ZERO,
                "this constant expression divides by zero".to_owned(),
            ),
            EvalErrorKind::NegateUnsigned => (
                codes::NOT_CONST,
                "cannot negate an unsigned constant".to_owned(),
            ),
            EvalErrorKind::MixedSignedness => (
                codes::NOT_CONST,
                "mixed signed and unsigned operands in a constant expression".to_owned(),
            ),
            EvalErrorKind::InvalidOperand => (
                codes::NOT_CONST,
                "invalid operand types in a constant expression".to_owned(),
            ),
            // Already reported at the source.
            EvalErrorKind::Poisoned => return,
        };
        self.error(code, span, message);
    }
}
