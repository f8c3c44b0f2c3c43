//! The expression checker.
//!
//! One bidirectional recursive-descent pass per function body (and per
//! constant initializer). Every visited expression ends up with an
//! [`ExprInfo`]: its type (`Never` when it diverges), whether it is a
//! place, whether that place is mutable, and whether it diverges.
//!
//! An optional expected type flows downward: function arguments expect
//! their parameter types, assignment right-hand sides expect the left-hand
//! type, `return` expects the function's return type, and so on. Unsuffixed
//! integer literals carry the placeholder types `AnyInt`/`AnyUInt` until
//! the first context narrows them; whatever is still a placeholder when the
//! value is consumed defaults to `i32`/`u32` and the default is propagated
//! back down into the literal nodes.
//!
//! The checker also fixes the deferred name lookups that needed types:
//! field selectors become indices, struct-literal fields get their indices,
//! and method calls resolve against the impl table with the `T` / `&T` /
//! `&mut T` receiver chain. `break`/`continue`/`return` targets are linked
//! from the context stacks maintained here; the control-flow pass validates
//! them afterwards.

use rxc_ast::{BinOp, IntSuffix, Lit, UnOp};
use rxc_util::diagnostic::codes;
use rxc_util::{DiagnosticBuilder, DiagnosticCode, FxHashMap, Handler, Span};

use crate::consts::{self, Sign};
use crate::hir::*;
use crate::ty::{Type, TypeId, TypeTable};

/// Check every function body and constant initializer in the program.
pub fn check(program: &mut Program, types: &mut TypeTable, impls: &ImplTable, handler: &Handler) {
    let mut checker = Checker {
        program,
        types,
        impls,
        handler,
        current_fn: None,
        loop_stack: Vec::new(),
        loop_breaks: FxHashMap::default(),
    };
    let fids: Vec<FuncId> = checker.program.functions.indices().collect();
    for fid in fids {
        checker.check_function(fid);
    }
    let cids: Vec<ConstId> = checker.program.consts.indices().collect();
    for cid in cids {
        checker.check_const(cid);
    }
}

struct LoopCtx {
    /// The `Loop`/`While` expression this context belongs to.
    expr: ExprId,
    is_while: bool,
    /// Fixed by the first `break` seen for this loop.
    break_ty: Option<TypeId>,
    has_break: bool,
}

struct Checker<'a> {
    program: &'a mut Program,
    types: &'a mut TypeTable,
    impls: &'a ImplTable,
    handler: &'a Handler,
    current_fn: Option<FuncId>,
    loop_stack: Vec<LoopCtx>,
    /// Break-value expressions per loop, for retroactive literal
    /// defaulting when the loop's type is narrowed later.
    loop_breaks: FxHashMap<ExprId, Vec<ExprId>>,
}

impl<'a> Checker<'a> {
    fn error(&self, code: DiagnosticCode, span: Span, message: impl Into<String>) {
        DiagnosticBuilder::error(message)
            .code(code)
            .span(span)
            .emit(self.handler);
    }

    fn display(&self, ty: TypeId) -> String {
        self.types.display(ty, self.program)
    }

    // ---- entry points ----

    fn check_function(&mut self, fid: FuncId) {
        let Some(body) = self.program.functions[fid].body else {
            return;
        };
        self.current_fn = Some(fid);

        if let Some(self_local) = self.program.functions[fid].self_local {
            let ty = self.self_receiver_ty(fid);
            self.program.locals[self_local].ty = Some(ty);
        }

        let params: Vec<(Pat, TypeId)> = self
            .program
            .functions[fid]
            .params
            .iter()
            .map(|p| (p.pat.clone(), p.ty.ty()))
            .collect();
        for (pat, ty) in &params {
            self.bind_pattern(pat, *ty, "parameter");
        }

        let ret = self.program.functions[fid].ret_ty.ty();
        self.check_expr(body, Some(ret));

        debug_assert!(self.loop_stack.is_empty());
        self.current_fn = None;
    }

    fn check_const(&mut self, cid: ConstId) {
        let Some(init) = self.program.consts[cid].init else {
            return;
        };
        let expected = self.program.consts[cid].ty.ty();
        self.check_expr(init, Some(expected));
    }

    /// The type `self` has inside a method: the impl target, wrapped in a
    /// reference for `&self` / `&mut self`.
    fn self_receiver_ty(&mut self, fid: FuncId) -> TypeId {
        let f = &self.program.functions[fid];
        let Some(sp) = f.self_param else {
            return self.types.error();
        };
        let for_ty = match f.owner_impl {
            Some(iid) => self.program.impls[iid].self_ty.ty(),
            None => self.types.error(),
        };
        if sp.is_reference {
            self.types.mk_ref(for_ty, sp.mutable)
        } else {
            for_ty
        }
    }

    // ---- patterns ----

    /// Type a pattern's bindings against the matched type and reject
    /// refutable patterns (this language has no `match`, so patterns occur
    /// only where irrefutability is required).
    fn bind_pattern(&mut self, pat: &Pat, ty: TypeId, what: &str) {
        match &pat.kind {
            PatKind::Binding { local, by_ref } => {
                let bound = if *by_ref {
                    self.types.mk_ref(ty, false)
                } else {
                    ty
                };
                self.program.locals[*local].ty = Some(bound);
            }
            PatKind::Wildcard => {}
            PatKind::Ref { inner, mutable } => match *self.types.get(ty) {
                Type::Ref { pointee, mutable: m } => {
                    if *mutable && !m {
                        self.error(
                            codes::TYPE_MISMATCH,
                            pat.span,
                            format!(
                                "cannot match a `&mut` pattern against `{}`",
                                self.display(ty)
                            ),
                        );
                    }
                    let inner = inner.clone();
                    self.bind_pattern(&inner, pointee, what);
                }
                Type::Error => {}
                _ => {
                    self.error(
                        codes::TYPE_MISMATCH,
                        pat.span,
                        format!(
                            "expected a reference type for this pattern, found `{}`",
                            self.display(ty)
                        ),
                    );
                }
            },
            PatKind::Literal { expr, .. } => {
                let expr = *expr;
                self.check_expr(expr, None);
                self.error(
                    codes::REFUTABLE_PATTERN,
                    pat.span,
                    format!("refutable pattern in {what}"),
                );
            }
            PatKind::Path(_) => {
                self.error(
                    codes::REFUTABLE_PATTERN,
                    pat.span,
                    format!("refutable pattern in {what}"),
                );
            }
        }
    }

    // ---- core ----

    fn check_expr(&mut self, id: ExprId, expected: Option<TypeId>) -> TypeId {
        let span = self.program.exprs[id].span;
        let kind = std::mem::replace(&mut self.program.exprs[id].kind, ExprKind::Underscore);
        let (kind, mut info) = self.check_kind(kind, id, span, expected);
        self.program.exprs[id].kind = kind;

        if info.diverges {
            info.ty = self.types.never();
        }
        self.program.exprs[id].info = Some(info);
        if let Some(exp) = expected {
            let coerced = self.coerce(id, info.ty, exp, span);
            if let Some(slot) = &mut self.program.exprs[id].info {
                slot.ty = coerced;
            }
            return coerced;
        }
        info.ty
    }

    /// Default any remaining literal placeholder in an already-checked
    /// expression; used at consumption points with no stronger context.
    fn finalize_any(&mut self, id: ExprId) -> TypeId {
        let ty = self.program.exprs[id].info().ty;
        let defaulted = self.default_type(ty);
        if defaulted != ty {
            self.apply_int_default(id, defaulted);
        }
        defaulted
    }

    fn default_type(&mut self, ty: TypeId) -> TypeId {
        match *self.types.get(ty) {
            Type::Prim(crate::ty::Primitive::AnyInt) => self.types.i32(),
            Type::Prim(crate::ty::Primitive::AnyUInt) => self.types.u32(),
            Type::Array { element, length } => {
                let defaulted = self.default_type(element);
                if defaulted != element {
                    self.types.mk_array(defaulted, length)
                } else {
                    ty
                }
            }
            _ => ty,
        }
    }

    /// Rewrite the recorded type of `id` (and the subexpressions that share
    /// its placeholder) to `target`.
    fn apply_int_default(&mut self, id: ExprId, target: TypeId) {
        let Some(info) = self.program.exprs[id].info else {
            return;
        };
        if info.ty == target {
            return;
        }

        if self.types.is_any_integer(info.ty) && self.types.is_integer(target) {
            let children: Vec<ExprId> = match &self.program.exprs[id].kind {
                ExprKind::Unary { operand, .. } => vec![*operand],
                ExprKind::Binary { op, lhs, rhs } if !op.is_comparison() => vec![*lhs, *rhs],
                ExprKind::Block { tail, .. } => tail.iter().copied().collect(),
                ExprKind::If {
                    then_block,
                    else_expr,
                    ..
                } => std::iter::once(*then_block)
                    .chain(else_expr.iter().copied())
                    .collect(),
                ExprKind::Loop { .. } => self
                    .loop_breaks
                    .get(&id)
                    .map(|v| v.clone())
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            for child in children {
                self.apply_int_default(child, target);
            }
            if let Some(slot) = &mut self.program.exprs[id].info {
                slot.ty = target;
            }
            return;
        }

        // Arrays of placeholder integers narrow element-wise.
        let pair = (
            self.types.get(info.ty).clone(),
            self.types.get(target).clone(),
        );
        if let (
            Type::Array {
                element: from,
                length: n1,
            },
            Type::Array { element: to, length: n2 },
        ) = pair
        {
            if n1 == n2 && self.types.is_any_integer(from) {
                let children: Vec<ExprId> = match &self.program.exprs[id].kind {
                    ExprKind::ArrayLiteral(elements) => elements.clone(),
                    ExprKind::ArrayRepeat { value, .. } => vec![*value],
                    _ => Vec::new(),
                };
                for child in children {
                    self.apply_int_default(child, to);
                }
                if let Some(slot) = &mut self.program.exprs[id].info {
                    slot.ty = target;
                }
            }
        }
    }

    /// Make `actual` fit `expected`, narrowing literal placeholders and
    /// absorbing divergence; reports a mismatch otherwise. Returns the type
    /// the expression ends up with.
    fn coerce(&mut self, id: ExprId, actual: TypeId, expected: TypeId, span: Span) -> TypeId {
        if actual == expected {
            return actual;
        }
        if self.types.is_error(actual) || self.types.is_error(expected) {
            return if self.types.is_error(expected) {
                actual
            } else {
                expected
            };
        }
        // Divergence is assignable to anything.
        if self.types.is_never(actual) {
            return expected;
        }
        if self.types.is_any_integer(actual) {
            let compatible = if actual == self.types.any_uint() {
                self.types.is_unsigned_integer(expected)
            } else {
                self.types.is_integer(expected)
            };
            if compatible {
                self.apply_int_default(id, expected);
                return expected;
            }
        }
        // The context only asked for "some integer".
        if self.types.is_any_integer(expected) && self.types.is_integer(actual) {
            let fits = expected != self.types.any_uint() || self.types.is_unsigned_integer(actual);
            if fits {
                return actual;
            }
        }
        self.error(
            codes::TYPE_MISMATCH,
            span,
            format!(
                "mismatched types: expected `{}`, found `{}`",
                self.display(expected),
                self.display(actual)
            ),
        );
        expected
    }

    /// Unify the types of two sibling expressions (binary operands, if/else
    /// arms, break values), narrowing placeholders on either side.
    fn unify_pair(
        &mut self,
        lhs: ExprId,
        lhs_ty: TypeId,
        rhs: ExprId,
        rhs_ty: TypeId,
        span: Span,
    ) -> TypeId {
        if lhs_ty == rhs_ty {
            return lhs_ty;
        }
        if self.types.is_error(lhs_ty) || self.types.is_error(rhs_ty) {
            return self.types.error();
        }
        if self.types.is_never(lhs_ty) {
            return rhs_ty;
        }
        if self.types.is_never(rhs_ty) {
            return lhs_ty;
        }
        let l_any = self.types.is_any_integer(lhs_ty);
        let r_any = self.types.is_any_integer(rhs_ty);
        match (l_any, r_any) {
            (true, true) => {
                // AnyInt meets AnyUInt: unsigned is the narrower claim.
                let target = self.types.any_uint();
                self.apply_int_default(lhs, target);
                self.apply_int_default(rhs, target);
                target
            }
            (true, false) => {
                let compatible = if lhs_ty == self.types.any_uint() {
                    self.types.is_unsigned_integer(rhs_ty)
                } else {
                    self.types.is_integer(rhs_ty)
                };
                if compatible {
                    self.apply_int_default(lhs, rhs_ty);
                    return rhs_ty;
                }
                self.mismatch(lhs_ty, rhs_ty, span)
            }
            (false, true) => {
                let compatible = if rhs_ty == self.types.any_uint() {
                    self.types.is_unsigned_integer(lhs_ty)
                } else {
                    self.types.is_integer(lhs_ty)
                };
                if compatible {
                    self.apply_int_default(rhs, lhs_ty);
                    return lhs_ty;
                }
                self.mismatch(lhs_ty, rhs_ty, span)
            }
            (false, false) => self.mismatch(lhs_ty, rhs_ty, span),
        }
    }

    fn mismatch(&mut self, lhs_ty: TypeId, rhs_ty: TypeId, span: Span) -> TypeId {
        self.error(
            codes::TYPE_MISMATCH,
            span,
            format!(
                "mismatched types: expected `{}`, found `{}`",
                self.display(lhs_ty),
                self.display(rhs_ty)
            ),
        );
        self.types.error()
    }

    // ---- variants ----

    fn check_kind(
        &mut self,
        kind: ExprKind,
        id: ExprId,
        span: Span,
        expected: Option<TypeId>,
    ) -> (ExprKind, ExprInfo) {
        match kind {
            ExprKind::Literal(lit) => {
                let ty = self.literal_ty(&lit);
                (ExprKind::Literal(lit), ExprInfo::value(ty))
            }
            ExprKind::Value(slot) => {
                let info = self.check_value(&slot, span);
                (ExprKind::Value(slot), info)
            }
            ExprKind::FieldAccess { base, selector } => self.check_field(base, selector, span),
            ExprKind::Index { base, index } => self.check_index(base, index, span),
            ExprKind::StructLiteral { target, fields } => {
                self.check_struct_literal(target, fields, span)
            }
            ExprKind::ArrayLiteral(elements) => self.check_array_literal(elements, span, expected),
            ExprKind::ArrayRepeat { value, count } => {
                self.check_array_repeat(value, count, expected)
            }
            ExprKind::Unary { op, operand } => self.check_unary(op, operand, span),
            ExprKind::Binary { op, lhs, rhs } => self.check_binary(op, lhs, rhs, span),
            ExprKind::Assign { lhs, rhs, op } => self.check_assign(lhs, rhs, op, span),
            ExprKind::Cast { expr, target } => self.check_cast(expr, target, span),
            ExprKind::Call { callee, args } => self.check_call(callee, args, span),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                resolved,
            } => self.check_method_call(receiver, method, args, resolved, span),
            ExprKind::If {
                cond,
                then_block,
                else_expr,
            } => self.check_if(cond, then_block, else_expr, span, expected),
            ExprKind::Loop { body } => self.check_loop(body, id),
            ExprKind::While { cond, body } => self.check_while(cond, body, id),
            ExprKind::Break { value, target: _ } => self.check_break(value, span),
            ExprKind::Continue { target: _ } => {
                let target = self.loop_stack.last().map(|ctx| ctx.expr);
                let info = ExprInfo {
                    ty: self.types.never(),
                    is_place: false,
                    is_mutable_place: false,
                    diverges: true,
                };
                (ExprKind::Continue { target }, info)
            }
            ExprKind::Return { value, target: _ } => self.check_return(value, span),
            ExprKind::Block { stmts, tail } => self.check_block(stmts, tail, span, expected),
            ExprKind::Underscore => {
                self.error(
                    codes::INVALID_OPERAND,
                    span,
                    "`_` is only allowed on the left-hand side of an assignment",
                );
                (
                    ExprKind::Underscore,
                    ExprInfo::value(self.types.error()),
                )
            }
        }
    }

    fn literal_ty(&mut self, lit: &Lit) -> TypeId {
        match lit {
            Lit::Int { suffix, value } => match suffix {
                Some(IntSuffix::I32) => self.types.i32(),
                Some(IntSuffix::U32) => self.types.u32(),
                Some(IntSuffix::Isize) => self.types.isize_ty(),
                Some(IntSuffix::Usize) => self.types.usize_ty(),
                None => {
                    if *value <= i32::MAX as u64 {
                        self.types.any_int()
                    } else {
                        self.types.any_uint()
                    }
                }
            },
            Lit::Bool(_) => self.types.bool(),
            Lit::Char(_) => self.types.char(),
            // String literals are shared string slices.
            Lit::Str(_) => {
                let str_ty = self.types.str();
                self.types.mk_ref(str_ty, false)
            }
        }
    }

    fn check_value(&mut self, slot: &ValueSlot, span: Span) -> ExprInfo {
        match slot {
            ValueSlot::Local(local) => {
                let local = &self.program.locals[*local];
                ExprInfo {
                    ty: local.ty.unwrap_or(self.types.error()),
                    is_place: true,
                    is_mutable_place: local.mutable,
                    diverges: false,
                }
            }
            ValueSlot::Const(cid) => ExprInfo::value(self.program.consts[*cid].ty.ty()),
            // A bare function name only makes sense as a callee; the call
            // expression intercepts it before this runs.
            ValueSlot::Func(_) => {
                self.error(
                    codes::NOT_CALLABLE,
                    span,
                    "function items must be called; they are not first-class values",
                );
                ExprInfo::value(self.types.error())
            }
            ValueSlot::StructConst(sid) => ExprInfo::value(self.types.mk_struct(*sid)),
            ValueSlot::EnumVariant(eid, _) => ExprInfo::value(self.types.mk_enum(*eid)),
            ValueSlot::Error => ExprInfo::value(self.types.error()),
            ValueSlot::Unresolved(path) => {
                panic!("unresolved value path `{path:?}` reached the checker (at {span})")
            }
        }
    }

    /// Strip reference layers off a base expression for field/index access.
    /// Returns the underlying type and the place/mutability the access
    /// inherits: through references the place is the pointee and its
    /// mutability is the conjunction of the reference mutabilities.
    fn autoderef_base(&self, base: ExprId) -> (TypeId, bool, bool) {
        let info = self.program.exprs[base].info();
        let mut ty = info.ty;
        let mut through_ref = false;
        let mut chain_mutable = true;
        while let Type::Ref { pointee, mutable } = *self.types.get(ty) {
            through_ref = true;
            chain_mutable &= mutable;
            ty = pointee;
        }
        if through_ref {
            (ty, true, chain_mutable)
        } else {
            (ty, info.is_place, info.is_mutable_place)
        }
    }

    fn check_field(
        &mut self,
        base: ExprId,
        selector: FieldSelector,
        span: Span,
    ) -> (ExprKind, ExprInfo) {
        self.check_expr(base, None);
        let diverges = self.program.exprs[base].info().diverges;
        let (base_ty, is_place, is_mutable_place) = self.autoderef_base(base);

        let err = |checker: &mut Self, kind: ExprKind| {
            (kind, ExprInfo::value(checker.types.error()))
        };

        let name = match selector.name() {
            Some(name) => name,
            None => {
                // Already resolved; nothing to do (single-pass normally).
                let kind = ExprKind::FieldAccess { base, selector };
                return err(self, kind);
            }
        };

        if self.types.is_error(base_ty) {
            return err(self, ExprKind::FieldAccess { base, selector });
        }
        let Type::Struct(sid) = *self.types.get(base_ty) else {
            self.error(
                codes::UNKNOWN_FIELD,
                span,
                format!("no field `{name}` on type `{}`", self.display(base_ty)),
            );
            return err(self, ExprKind::FieldAccess { base, selector });
        };
        let Some(index) = self.program.structs[sid].field_index(name) else {
            self.error(
                codes::UNKNOWN_FIELD,
                span,
                format!("no field `{name}` on type `{}`", self.display(base_ty)),
            );
            return err(self, ExprKind::FieldAccess { base, selector });
        };
        let ty = self.program.structs[sid].fields[index].ty.ty();
        (
            ExprKind::FieldAccess {
                base,
                selector: FieldSelector::Index(index),
            },
            ExprInfo {
                ty,
                is_place,
                is_mutable_place,
                diverges,
            },
        )
    }

    fn check_index(&mut self, base: ExprId, index: ExprId, span: Span) -> (ExprKind, ExprInfo) {
        self.check_expr(base, None);
        let usize_ty = self.types.usize_ty();
        self.check_expr(index, Some(usize_ty));

        let diverges = self.program.exprs[base].info().diverges
            || self.program.exprs[index].info().diverges;
        let (base_ty, is_place, is_mutable_place) = self.autoderef_base(base);
        let kind = ExprKind::Index { base, index };

        if self.types.is_error(base_ty) {
            return (kind, ExprInfo::value(self.types.error()));
        }
        let Type::Array { element, .. } = *self.types.get(base_ty) else {
            self.error(
                codes::NOT_INDEXABLE,
                span,
                format!("type `{}` cannot be indexed", self.display(base_ty)),
            );
            return (kind, ExprInfo::value(self.types.error()));
        };
        (
            kind,
            ExprInfo {
                ty: element,
                is_place,
                is_mutable_place,
                diverges,
            },
        )
    }

    fn check_struct_literal(
        &mut self,
        target: StructTarget,
        mut fields: Vec<StructLitField>,
        span: Span,
    ) -> (ExprKind, ExprInfo) {
        let Some(sid) = target.struct_id() else {
            for field in &fields {
                self.check_expr(field.value, None);
            }
            let kind = ExprKind::StructLiteral { target, fields };
            return (kind, ExprInfo::value(self.types.error()));
        };

        let struct_name = self.program.structs[sid].name;
        let field_count = self.program.structs[sid].fields.len();
        let mut seen = vec![false; field_count];
        let mut diverges = false;

        for field in fields.iter_mut() {
            match self.program.structs[sid].field_index(field.name) {
                Some(index) => {
                    if seen[index] {
                        self.error(
                            codes::REPEATED_FIELD,
                            field.span,
                            format!("field `{}` specified more than once", field.name),
                        );
                    }
                    seen[index] = true;
                    field.index = Some(index);
                    let field_ty = self.program.structs[sid].fields[index].ty.ty();
                    self.check_expr(field.value, Some(field_ty));
                }
                None => {
                    self.error(
                        codes::UNKNOWN_FIELD,
                        field.span,
                        format!("struct `{struct_name}` has no field named `{}`", field.name),
                    );
                    self.check_expr(field.value, None);
                }
            }
            diverges |= self.program.exprs[field.value].info().diverges;
        }

        for (index, &seen) in seen.iter().enumerate() {
            if !seen {
                let field_name = self.program.structs[sid].fields[index].name;
                self.error(
                    codes::MISSING_FIELD,
                    span,
                    format!("missing field `{field_name}` in initializer of `{struct_name}`"),
                );
            }
        }

        let ty = self.types.mk_struct(sid);
        (
            ExprKind::StructLiteral { target, fields },
            ExprInfo {
                ty,
                is_place: false,
                is_mutable_place: false,
                diverges,
            },
        )
    }

    fn check_array_literal(
        &mut self,
        elements: Vec<ExprId>,
        span: Span,
        expected: Option<TypeId>,
    ) -> (ExprKind, ExprInfo) {
        let expected_element = expected.and_then(|exp| match *self.types.get(exp) {
            Type::Array { element, .. } => Some(element),
            _ => None,
        });

        let mut diverges = false;
        let element_ty = if let Some(element) = expected_element {
            for &e in &elements {
                self.check_expr(e, Some(element));
                diverges |= self.program.exprs[e].info().diverges;
            }
            element
        } else if elements.is_empty() {
            self.error(
                codes::TYPE_MISMATCH,
                span,
                "type annotations needed for an empty array literal",
            );
            self.types.error()
        } else {
            // The first element fixes the type for the rest.
            let mut current = self.check_expr(elements[0], None);
            diverges |= self.program.exprs[elements[0]].info().diverges;
            for &e in &elements[1..] {
                let ty = self.check_expr(e, Some(current));
                diverges |= self.program.exprs[e].info().diverges;
                if ty != current {
                    current = ty;
                }
            }
            // A later element may have narrowed the placeholder; pull the
            // earlier ones along.
            for &e in &elements {
                self.apply_int_default(e, current);
            }
            current
        };

        let ty = self.types.mk_array(element_ty, elements.len() as u64);
        (
            ExprKind::ArrayLiteral(elements),
            ExprInfo {
                ty,
                is_place: false,
                is_mutable_place: false,
                diverges,
            },
        )
    }

    fn check_array_repeat(
        &mut self,
        value: ExprId,
        count: ExprId,
        expected: Option<TypeId>,
    ) -> (ExprKind, ExprInfo) {
        let mut value_ty = self.check_expr(value, None);
        if let Some(exp) = expected {
            if let Type::Array { element, .. } = *self.types.get(exp) {
                let value_span = self.program.exprs[value].span;
                value_ty = self.coerce(value, value_ty, element, value_span);
            }
        }

        let usize_ty = self.types.usize_ty();
        self.check_expr(count, Some(usize_ty));
        let count_span = self.program.exprs[count].span;
        let length = match consts::eval_resolved(self.program, count, Some(Sign::Unsigned)) {
            Ok(value) => match value.as_length() {
                Some(n) => Some(n),
                None => {
                    self.error(
                        codes::NEGATIVE_LENGTH,
                        count_span,
                        "array length must be non-negative",
                    );
                    None
                }
            },
            Err(consts::EvalErrorKind::Poisoned) => None,
            Err(_) => {
                self.error(
                    codes::NOT_CONST,
                    count_span,
                    "array length must be a constant expression",
                );
                None
            }
        };

        let diverges = self.program.exprs[value].info().diverges
            || self.program.exprs[count].info().diverges;
        let ty = match length {
            Some(n) => self.types.mk_array(value_ty, n),
            None => self.types.error(),
        };
        (
            ExprKind::ArrayRepeat { value, count },
            ExprInfo {
                ty,
                is_place: false,
                is_mutable_place: false,
                diverges,
            },
        )
    }

    fn check_unary(&mut self, op: UnOp, operand: ExprId, span: Span) -> (ExprKind, ExprInfo) {
        let operand_ty = self.check_expr(operand, None);
        let operand_info = self.program.exprs[operand].info();
        let diverges = operand_info.diverges;
        let kind = ExprKind::Unary { op, operand };

        let info = match op {
            UnOp::Not => {
                if self.types.is_bool(operand_ty)
                    || self.types.is_integer(operand_ty)
                    || self.types.is_error(operand_ty)
                {
                    let mut info = ExprInfo::value(operand_ty);
                    info.diverges = diverges;
                    info
                } else {
                    self.error(
                        codes::INVALID_OPERAND,
                        span,
                        format!("cannot apply `!` to `{}`", self.display(operand_ty)),
                    );
                    ExprInfo::value(self.types.error())
                }
            }
            UnOp::Neg => {
                if self.types.is_signed_integer(operand_ty) || self.types.is_error(operand_ty) {
                    let mut info = ExprInfo::value(operand_ty);
                    info.diverges = diverges;
                    info
                } else {
                    self.error(
                        codes::INVALID_OPERAND,
                        span,
                        format!("cannot negate a value of type `{}`", self.display(operand_ty)),
                    );
                    ExprInfo::value(self.types.error())
                }
            }
            UnOp::Deref => match *self.types.get(operand_ty) {
                Type::Ref { pointee, mutable } => ExprInfo {
                    ty: pointee,
                    is_place: true,
                    is_mutable_place: mutable,
                    diverges,
                },
                Type::Error => ExprInfo::value(self.types.error()),
                _ => {
                    self.error(
                        codes::INVALID_OPERAND,
                        span,
                        format!(
                            "type `{}` cannot be dereferenced",
                            self.display(operand_ty)
                        ),
                    );
                    ExprInfo::value(self.types.error())
                }
            },
            UnOp::Ref | UnOp::RefMut => {
                let mutable = op == UnOp::RefMut;
                if !operand_info.is_place && !self.types.is_error(operand_ty) {
                    self.error(
                        codes::NOT_A_PLACE,
                        span,
                        "cannot take a reference to this expression",
                    );
                } else if mutable
                    && !operand_info.is_mutable_place
                    && !self.types.is_error(operand_ty)
                {
                    self.error(
                        codes::NOT_MUTABLE,
                        span,
                        "cannot borrow this expression as mutable",
                    );
                }
                let ty = self.types.mk_ref(operand_ty, mutable);
                let mut info = ExprInfo::value(ty);
                info.diverges = diverges;
                info
            }
        };
        (kind, info)
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
    ) -> (ExprKind, ExprInfo) {
        let kind = ExprKind::Binary { op, lhs, rhs };

        if op.is_logical() {
            let bool_ty = self.types.bool();
            self.check_expr(lhs, Some(bool_ty));
            self.check_expr(rhs, Some(bool_ty));
            // The right operand only runs conditionally; divergence comes
            // from the left alone.
            let diverges = self.program.exprs[lhs].info().diverges;
            let mut info = ExprInfo::value(bool_ty);
            info.diverges = diverges;
            return (kind, info);
        }

        let lhs_ty = self.check_expr(lhs, None);
        let rhs_ty = self.check_expr(rhs, None);
        let diverges =
            self.program.exprs[lhs].info().diverges || self.program.exprs[rhs].info().diverges;
        let unified = self.unify_pair(lhs, lhs_ty, rhs, rhs_ty, span);

        let result_ty = if op.is_comparison() {
            if !self.comparable(unified) && !self.types.is_error(unified) {
                self.error(
                    codes::INVALID_OPERAND,
                    span,
                    format!(
                        "values of type `{}` cannot be compared with `{}`",
                        self.display(unified),
                        op.symbol()
                    ),
                );
            }
            self.types.bool()
        } else {
            // Arithmetic, bitwise, and shift operators all demand matching
            // integer operands in this language.
            if !self.types.is_integer(unified) && !self.types.is_error(unified) {
                self.error(
                    codes::INVALID_OPERAND,
                    span,
                    format!(
                        "cannot apply `{}` to operands of type `{}`",
                        op.symbol(),
                        self.display(unified)
                    ),
                );
                self.types.error()
            } else {
                unified
            }
        };

        let mut info = ExprInfo::value(result_ty);
        info.diverges = diverges;
        (kind, info)
    }

    fn comparable(&self, ty: TypeId) -> bool {
        match self.types.get(ty) {
            Type::Prim(p) => {
                p.is_integer()
                    || matches!(
                        p,
                        crate::ty::Primitive::Bool
                            | crate::ty::Primitive::Char
                            | crate::ty::Primitive::Str
                    )
            }
            Type::Ref { pointee, .. } => self.comparable(*pointee),
            _ => false,
        }
    }

    fn check_assign(
        &mut self,
        lhs: ExprId,
        rhs: ExprId,
        op: Option<BinOp>,
        span: Span,
    ) -> (ExprKind, ExprInfo) {
        let kind = ExprKind::Assign { lhs, rhs, op };

        // `_ = expr` discards the value without constraints.
        if matches!(self.program.exprs[lhs].kind, ExprKind::Underscore) {
            self.check_expr(rhs, None);
            self.finalize_any(rhs);
            let rhs_info = self.program.exprs[rhs].info();
            self.program.exprs[lhs].info = Some(ExprInfo::value(rhs_info.ty));
            let mut info = ExprInfo::value(self.types.unit());
            info.diverges = rhs_info.diverges;
            return (kind, info);
        }

        let lhs_ty = self.check_expr(lhs, None);
        let lhs_info = self.program.exprs[lhs].info();
        if !lhs_info.is_place && !self.types.is_error(lhs_ty) {
            self.error(codes::NOT_A_PLACE, span, "invalid assignment target");
        } else if !lhs_info.is_mutable_place && !self.types.is_error(lhs_ty) {
            self.error(
                codes::NOT_MUTABLE,
                span,
                "cannot assign to an immutable place",
            );
        }

        self.check_expr(rhs, Some(lhs_ty));
        if let Some(op) = op {
            // Compound assignment shares the binary operator rules; every
            // compound operator here is integer-only.
            if !self.types.is_integer(lhs_ty) && !self.types.is_error(lhs_ty) {
                self.error(
                    codes::INVALID_OPERAND,
                    span,
                    format!(
                        "cannot apply `{}=` to a value of type `{}`",
                        op.symbol(),
                        self.display(lhs_ty)
                    ),
                );
            }
        }

        let diverges =
            self.program.exprs[lhs].info().diverges || self.program.exprs[rhs].info().diverges;
        let mut info = ExprInfo::value(self.types.unit());
        info.diverges = diverges;
        (kind, info)
    }

    fn check_cast(&mut self, expr: ExprId, target: TypeSlot, span: Span) -> (ExprKind, ExprInfo) {
        self.check_expr(expr, None);
        let src = self.finalize_any(expr);
        let dst = target.ty();
        let diverges = self.program.exprs[expr].info().diverges;

        if !self.castable(src, dst) {
            self.error(
                codes::INVALID_CAST,
                span,
                format!(
                    "cannot cast `{}` as `{}`",
                    self.display(src),
                    self.display(dst)
                ),
            );
        }

        let mut info = ExprInfo::value(dst);
        info.diverges = diverges;
        (ExprKind::Cast { expr, target }, info)
    }

    fn castable(&self, src: TypeId, dst: TypeId) -> bool {
        if self.types.is_error(src) || self.types.is_error(dst) {
            return true;
        }
        let char_ty = self.types.char();
        let int_src = self.types.is_integer(src);
        let int_dst = self.types.is_integer(dst);
        if int_src && int_dst {
            return true;
        }
        // char widens to the unsigned word types and back.
        if src == char_ty {
            return dst == self.types.u32() || dst == self.types.usize_ty() || dst == char_ty;
        }
        if dst == char_ty {
            return src == self.types.u32() || src == self.types.usize_ty();
        }
        false
    }

    fn check_call(&mut self, callee: ExprId, args: Vec<ExprId>, span: Span) -> (ExprKind, ExprInfo) {
        // A direct function reference is the one legal callee; intercept it
        // before generic value checking rejects it.
        let direct: Option<FuncId> = match &self.program.exprs[callee].kind {
            ExprKind::Value(ValueSlot::Func(fid)) => Some(*fid),
            _ => None,
        };

        let Some(fid) = direct else {
            let callee_ty = self.check_expr(callee, None);
            for &arg in &args {
                self.check_expr(arg, None);
                self.finalize_any(arg);
            }
            if !self.types.is_error(callee_ty) {
                self.error(codes::NOT_CALLABLE, span, "this expression is not callable");
            }
            let kind = ExprKind::Call { callee, args };
            return (kind, ExprInfo::value(self.types.error()));
        };

        // The callee node still needs info for totality; a function item
        // itself has no value type in this language.
        self.program.exprs[callee].info = Some(ExprInfo::value(self.types.unit()));

        let mut expected: Vec<TypeId> = Vec::new();
        if self.program.functions[fid].is_method() {
            // Receiver-less form: the receiver is the first argument.
            let receiver_ty = self.self_receiver_ty(fid);
            expected.push(receiver_ty);
        }
        for i in 0..self.program.functions[fid].params.len() {
            expected.push(self.program.functions[fid].params[i].ty.ty());
        }

        if args.len() != expected.len() {
            let name = self.program.functions[fid].name;
            self.error(
                codes::WRONG_ARG_COUNT,
                span,
                format!(
                    "`{name}` takes {} argument(s) but {} were supplied",
                    expected.len(),
                    args.len()
                ),
            );
        }

        let mut diverges = false;
        for (i, &arg) in args.iter().enumerate() {
            match expected.get(i) {
                Some(&ty) => {
                    self.check_expr(arg, Some(ty));
                }
                None => {
                    self.check_expr(arg, None);
                    self.finalize_any(arg);
                }
            }
            diverges |= self.program.exprs[arg].info().diverges;
        }

        let ret = self.program.functions[fid].ret_ty.ty();
        let mut info = ExprInfo::value(ret);
        info.diverges = diverges || self.types.is_never(ret);
        (ExprKind::Call { callee, args }, info)
    }

    fn check_method_call(
        &mut self,
        receiver: ExprId,
        method: rxc_util::Symbol,
        args: Vec<ExprId>,
        _resolved: Option<FuncId>,
        span: Span,
    ) -> (ExprKind, ExprInfo) {
        self.check_expr(receiver, None);
        // Literal receivers settle on their default before impl lookup.
        let receiver_ty = self.finalize_any(receiver);
        let receiver_info = self.program.exprs[receiver].info();

        let fail = |checker: &mut Self, args: Vec<ExprId>| {
            for &arg in &args {
                checker.check_expr(arg, None);
                checker.finalize_any(arg);
            }
            let kind = ExprKind::MethodCall {
                receiver,
                method,
                args,
                resolved: None,
            };
            (kind, ExprInfo::value(checker.types.error()))
        };

        if self.types.is_error(receiver_ty) {
            return fail(self, args);
        }

        // Autoderef chain: the candidate base type with the mutability the
        // receiver can provide through its reference layers.
        let mut base_ty = receiver_ty;
        let mut layers = 0usize;
        let mut chain_mutable = true;
        while let Type::Ref { pointee, mutable } = *self.types.get(base_ty) {
            layers += 1;
            chain_mutable &= mutable;
            base_ty = pointee;
        }

        let Some(fid) = self.lookup_method(base_ty, method) else {
            self.error(
                codes::METHOD_NOT_FOUND,
                span,
                format!(
                    "no method named `{method}` found for type `{}`",
                    self.display(base_ty)
                ),
            );
            return fail(self, args);
        };

        let sp = self.program.functions[fid]
            .self_param
            .expect("impl table only yields methods here");
        if sp.is_reference && sp.mutable {
            let mutable_ok = if layers == 0 {
                receiver_info.is_mutable_place
            } else {
                chain_mutable
            };
            if !mutable_ok {
                self.error(
                    codes::NOT_MUTABLE,
                    span,
                    format!("cannot borrow the receiver of `{method}` as mutable"),
                );
            }
        } else if !sp.is_reference && layers != 0 {
            self.error(
                codes::TYPE_MISMATCH,
                span,
                format!("method `{method}` takes `self` by value"),
            );
        }

        let expected: Vec<TypeId> = (0..self.program.functions[fid].params.len())
            .map(|i| self.program.functions[fid].params[i].ty.ty())
            .collect();
        if args.len() != expected.len() {
            self.error(
                codes::WRONG_ARG_COUNT,
                span,
                format!(
                    "`{method}` takes {} argument(s) but {} were supplied",
                    expected.len(),
                    args.len()
                ),
            );
        }

        let mut diverges = receiver_info.diverges;
        for (i, &arg) in args.iter().enumerate() {
            match expected.get(i) {
                Some(&ty) => {
                    self.check_expr(arg, Some(ty));
                }
                None => {
                    self.check_expr(arg, None);
                    self.finalize_any(arg);
                }
            }
            diverges |= self.program.exprs[arg].info().diverges;
        }

        let ret = self.program.functions[fid].ret_ty.ty();
        let mut info = ExprInfo::value(ret);
        info.diverges = diverges;
        (
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                resolved: Some(fid),
            },
            info,
        )
    }

    fn lookup_method(&self, base_ty: TypeId, name: rxc_util::Symbol) -> Option<FuncId> {
        for &iid in self.impls.impls_for(base_ty) {
            for item in &self.program.impls[iid].items {
                if let AssocItem::Func(fid) = *item {
                    let f = &self.program.functions[fid];
                    if f.name == name && f.is_method() {
                        return Some(fid);
                    }
                }
            }
        }
        None
    }

    fn check_if(
        &mut self,
        cond: ExprId,
        then_block: ExprId,
        else_expr: Option<ExprId>,
        span: Span,
        expected: Option<TypeId>,
    ) -> (ExprKind, ExprInfo) {
        let bool_ty = self.types.bool();
        self.check_expr(cond, Some(bool_ty));
        let cond_diverges = self.program.exprs[cond].info().diverges;

        let kind = ExprKind::If {
            cond,
            then_block,
            else_expr,
        };
        let (ty, diverges) = match else_expr {
            None => {
                // Without an else the then-branch must yield unit.
                let unit = self.types.unit();
                self.check_expr(then_block, Some(unit));
                (unit, cond_diverges)
            }
            Some(else_expr) => match expected {
                Some(exp) => {
                    self.check_expr(then_block, Some(exp));
                    self.check_expr(else_expr, Some(exp));
                    let diverges = cond_diverges
                        || (self.program.exprs[then_block].info().diverges
                            && self.program.exprs[else_expr].info().diverges);
                    (exp, diverges)
                }
                None => {
                    let then_ty = self.check_expr(then_block, None);
                    let else_ty = self.check_expr(else_expr, None);
                    let unified = self.unify_pair(then_block, then_ty, else_expr, else_ty, span);
                    let diverges = cond_diverges
                        || (self.program.exprs[then_block].info().diverges
                            && self.program.exprs[else_expr].info().diverges);
                    (unified, diverges)
                }
            },
        };

        let mut info = ExprInfo::value(ty);
        info.diverges = diverges;
        (kind, info)
    }

    fn check_loop(&mut self, body: ExprId, id: ExprId) -> (ExprKind, ExprInfo) {
        self.loop_stack.push(LoopCtx {
            expr: id,
            is_while: false,
            break_ty: None,
            has_break: false,
        });
        let unit = self.types.unit();
        self.check_expr(body, Some(unit));
        let ctx = self.loop_stack.pop().expect("loop context pushed above");

        let (ty, diverges) = if ctx.has_break {
            (ctx.break_ty.unwrap_or(unit), false)
        } else {
            // No break escapes the loop.
            (self.types.never(), true)
        };
        let mut info = ExprInfo::value(ty);
        info.diverges = diverges;
        (ExprKind::Loop { body }, info)
    }

    fn check_while(&mut self, cond: ExprId, body: ExprId, id: ExprId) -> (ExprKind, ExprInfo) {
        self.loop_stack.push(LoopCtx {
            expr: id,
            is_while: true,
            break_ty: None,
            has_break: false,
        });
        let bool_ty = self.types.bool();
        self.check_expr(cond, Some(bool_ty));
        let unit = self.types.unit();
        self.check_expr(body, Some(unit));
        self.loop_stack.pop();

        let diverges = self.program.exprs[cond].info().diverges;
        let mut info = ExprInfo::value(unit);
        info.diverges = diverges;
        (ExprKind::While { cond, body }, info)
    }

    fn check_break(&mut self, value: Option<ExprId>, span: Span) -> (ExprKind, ExprInfo) {
        let info = ExprInfo {
            ty: self.types.never(),
            is_place: false,
            is_mutable_place: false,
            diverges: true,
        };

        let Some(ctx_index) = self.loop_stack.len().checked_sub(1) else {
            // Outside any loop; the control-flow pass reports it.
            if let Some(value) = value {
                self.check_expr(value, None);
                self.finalize_any(value);
            }
            return (ExprKind::Break { value, target: None }, info);
        };

        let target = self.loop_stack[ctx_index].expr;
        let is_while = self.loop_stack[ctx_index].is_while;
        self.loop_stack[ctx_index].has_break = true;

        match value {
            Some(value_expr) => {
                if is_while {
                    self.error(
                        codes::TYPE_MISMATCH,
                        span,
                        "`break` with a value is not allowed inside a `while` loop",
                    );
                    self.check_expr(value_expr, None);
                    self.finalize_any(value_expr);
                } else {
                    let prior = self.loop_stack[ctx_index].break_ty;
                    let ty = self.check_expr(value_expr, prior);
                    match prior {
                        None => {
                            // The first break fixes the loop's type.
                            self.loop_stack[ctx_index].break_ty = Some(ty);
                        }
                        Some(prior_ty) if ty != prior_ty => {
                            // A later break narrowed a placeholder; pull
                            // the earlier break values along.
                            if let Some(values) = self.loop_breaks.get(&target).map(|v| v.clone())
                            {
                                for v in values {
                                    self.apply_int_default(v, ty);
                                }
                            }
                            self.loop_stack[ctx_index].break_ty = Some(ty);
                        }
                        Some(_) => {}
                    }
                    self.loop_breaks.entry(target).or_default().push(value_expr);
                }
            }
            None => {
                let unit = self.types.unit();
                match self.loop_stack[ctx_index].break_ty {
                    None => self.loop_stack[ctx_index].break_ty = Some(unit),
                    Some(prior) => {
                        if prior != unit
                            && !self.types.is_error(prior)
                            && !self.types.is_never(prior)
                        {
                            self.error(
                                codes::TYPE_MISMATCH,
                                span,
                                format!(
                                    "this `break` carries no value, but an earlier one gave the loop type `{}`",
                                    self.display(prior)
                                ),
                            );
                        }
                    }
                }
            }
        }

        (
            ExprKind::Break {
                value,
                target: Some(target),
            },
            info,
        )
    }

    fn check_return(&mut self, value: Option<ExprId>, span: Span) -> (ExprKind, ExprInfo) {
        let info = ExprInfo {
            ty: self.types.never(),
            is_place: false,
            is_mutable_place: false,
            diverges: true,
        };

        match self.current_fn {
            Some(fid) => {
                let ret = self.program.functions[fid].ret_ty.ty();
                match value {
                    Some(value_expr) => {
                        self.check_expr(value_expr, Some(ret));
                    }
                    None => {
                        let unit = self.types.unit();
                        if ret != unit && !self.types.is_error(ret) {
                            self.error(
                                codes::TYPE_MISMATCH,
                                span,
                                format!(
                                    "this function returns `{}`, but this `return` has no value",
                                    self.display(ret)
                                ),
                            );
                        }
                    }
                }
                (
                    ExprKind::Return {
                        value,
                        target: Some(fid),
                    },
                    info,
                )
            }
            None => {
                // Inside a constant initializer; the control-flow pass
                // reports the stray return.
                if let Some(value_expr) = value {
                    self.check_expr(value_expr, None);
                    self.finalize_any(value_expr);
                }
                (ExprKind::Return { value, target: None }, info)
            }
        }
    }

    fn check_block(
        &mut self,
        mut stmts: Vec<Stmt>,
        tail: Option<ExprId>,
        span: Span,
        expected: Option<TypeId>,
    ) -> (ExprKind, ExprInfo) {
        let mut diverged = false;
        let mut warned = false;

        for stmt in stmts.iter_mut() {
            if diverged && !warned {
                if let Some(stmt_span) = stmt_span(self.program, stmt) {
                    DiagnosticBuilder::warning("unreachable statement")
                        .code(codes::UNREACHABLE_STATEMENT)
                        .span(stmt_span)
                        .emit(self.handler);
                    warned = true;
                }
            }
            match stmt {
                Stmt::Let(l) => {
                    let annotation = l.ty.as_ref().map(|slot| slot.ty());
                    let init = l.init;
                    self.check_expr(init, annotation);
                    let bound_ty = match annotation {
                        Some(ty) => ty,
                        None => self.finalize_any(init),
                    };
                    let pat = l.pat.clone();
                    self.bind_pattern(&pat, bound_ty, "local binding");
                    diverged |= self.program.exprs[init].info().diverges;
                }
                Stmt::Expr { expr, .. } => {
                    let expr = *expr;
                    self.check_expr(expr, None);
                    self.finalize_any(expr);
                    diverged |= self.program.exprs[expr].info().diverges;
                }
                Stmt::Item(_) => {}
            }
        }

        let tail_ty = match tail {
            Some(tail_expr) => {
                if diverged && !warned {
                    let tail_span = self.program.exprs[tail_expr].span;
                    DiagnosticBuilder::warning("unreachable expression")
                        .code(codes::UNREACHABLE_STATEMENT)
                        .span(tail_span)
                        .emit(self.handler);
                }
                self.check_expr(tail_expr, expected)
            }
            None => self.types.unit(),
        };

        let (ty, diverges) = if diverged {
            (self.types.never(), true)
        } else {
            let tail_diverges = tail
                .map(|t| self.program.exprs[t].info().diverges)
                .unwrap_or(false);
            (tail_ty, tail_diverges)
        };

        // A tailless block in a value context still has to produce the
        // expected type.
        let ty = match (tail, expected) {
            (None, Some(exp)) if !diverges => self.coerce_plain(ty, exp, span),
            _ => ty,
        };

        let mut info = ExprInfo::value(ty);
        info.diverges = diverges;
        (ExprKind::Block { stmts, tail }, info)
    }

    /// Coercion without an expression node to narrow (used for empty
    /// blocks).
    fn coerce_plain(&mut self, actual: TypeId, expected: TypeId, span: Span) -> TypeId {
        if actual == expected
            || self.types.is_error(actual)
            || self.types.is_error(expected)
            || self.types.is_never(actual)
        {
            return expected;
        }
        self.error(
            codes::TYPE_MISMATCH,
            span,
            format!(
                "mismatched types: expected `{}`, found `{}`",
                self.display(expected),
                self.display(actual)
            ),
        );
        expected
    }
}

fn stmt_span(program: &Program, stmt: &Stmt) -> Option<Span> {
    match stmt {
        Stmt::Let(l) => Some(l.span),
        Stmt::Expr { expr, .. } => Some(program.exprs[*expr].span),
        Stmt::Item(_) => None,
    }
}
