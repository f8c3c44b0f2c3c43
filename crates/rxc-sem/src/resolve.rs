//! Name resolution.
//!
//! Two-phase traversal per scope: first *discovery* defines every item and
//! type of the scope (making forward references between items legal), then
//! *body resolution* walks each body, allocating bindings at their
//! declaration point and advancing every unresolved value path to its
//! definition.
//!
//! Type annotations are not resolved here; they are *anchored*: each
//! unresolved [`TypeSlot`] records the scope it appeared in so the
//! finalization pass can resolve its paths later. Array-length expressions
//! inside annotations are ordinary expressions and get their names resolved
//! now.
//!
//! Field names, method names, and struct-literal field names stay deferred;
//! they need the base type, which only the expression checker knows.

use rxc_ast as ast;
use rxc_ast::PathSeg;
use rxc_util::diagnostic::codes;
use rxc_util::{DiagnosticBuilder, DiagnosticCode, FxHashMap, Handler, Span, Symbol};

use crate::hir::*;
use crate::scope::{ScopeKind, ScopeTree, TypeDef, ValueDef};
use crate::ty::{Primitive, Type, TypeTable};

/// The semantic identity of an impl block's target, computed without
/// resolving types: enough to answer `A::item` paths during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImplKey {
    Prim(Primitive),
    Struct(StructId),
    Enum(EnumId),
}

/// Run name resolution over the whole program.
pub fn resolve(
    program: &mut Program,
    scopes: &mut ScopeTree,
    types: &TypeTable,
    handler: &Handler,
) {
    let mut resolver = Resolver {
        program,
        scopes,
        handler,
        assoc_index: FxHashMap::default(),
        impl_keys: FxHashMap::default(),
        current_impl: None,
    };
    resolver.register_builtin_impls(types);
    let roots = resolver.program.root_items.clone();
    resolver.discover_scope(&roots);
    resolver.resolve_items(&roots);
}

struct Resolver<'a> {
    program: &'a mut Program,
    scopes: &'a mut ScopeTree,
    handler: &'a Handler,
    /// Impl blocks indexed by target key, for associated-path lookup.
    assoc_index: FxHashMap<ImplKey, Vec<ImplId>>,
    impl_keys: FxHashMap<ImplId, ImplKey>,
    current_impl: Option<ImplId>,
}

impl<'a> Resolver<'a> {
    fn error(&self, code: DiagnosticCode, span: Span, message: impl Into<String>) {
        DiagnosticBuilder::error(message)
            .code(code)
            .span(span)
            .emit(self.handler);
    }

    /// Builtin impls arrive with their self types already resolved; key
    /// them off the interned type.
    fn register_builtin_impls(&mut self, types: &TypeTable) {
        for (iid, imp) in self.program.impls.iter_enumerated() {
            let TypeSlot::Resolved(tid) = imp.self_ty else {
                continue;
            };
            let key = match types.get(tid) {
                Type::Prim(p) => ImplKey::Prim(*p),
                Type::Struct(sid) => ImplKey::Struct(*sid),
                Type::Enum(eid) => ImplKey::Enum(*eid),
                _ => continue,
            };
            self.impl_keys.insert(iid, key);
            self.assoc_index.entry(key).or_default().push(iid);
        }
    }

    // ---- discovery ----

    /// Define every item of one scope, then key its impl blocks. Runs
    /// before any body in the scope is entered.
    fn discover_scope(&mut self, items: &[ItemRef]) {
        for item in items {
            match *item {
                ItemRef::Func(fid) => {
                    let (name, span) = {
                        let f = &self.program.functions[fid];
                        (f.name, f.span)
                    };
                    if !self.scopes.define_item(name, ValueDef::Func(fid)) {
                        self.duplicate(name, span);
                    }
                }
                ItemRef::Const(cid) => {
                    let (name, span) = {
                        let c = &self.program.consts[cid];
                        (c.name, c.span)
                    };
                    if !self.scopes.define_item(name, ValueDef::Const(cid)) {
                        self.duplicate(name, span);
                    }
                }
                ItemRef::Struct(sid) => {
                    let (name, span) = {
                        let s = &self.program.structs[sid];
                        (s.name, s.span)
                    };
                    if !self.scopes.define_type(name, TypeDef::Struct(sid)) {
                        self.duplicate(name, span);
                    }
                }
                ItemRef::Enum(eid) => {
                    let (name, span, variants) = {
                        let e = &self.program.enums[eid];
                        (e.name, e.span, e.variants.clone())
                    };
                    if !self.scopes.define_type(name, TypeDef::Enum(eid)) {
                        self.duplicate(name, span);
                    }
                    // Unit variants double as value-namespace constructors.
                    for (index, variant) in variants.into_iter().enumerate() {
                        if !self
                            .scopes
                            .define_item(variant, ValueDef::Variant(eid, index))
                        {
                            self.duplicate(variant, span);
                        }
                    }
                }
                ItemRef::Trait(tid) => {
                    let (name, span) = {
                        let t = &self.program.traits[tid];
                        (t.name, t.span)
                    };
                    if !self.scopes.define_type(name, TypeDef::Trait(tid)) {
                        self.duplicate(name, span);
                    }
                }
                ItemRef::Impl(_) => {}
            }
        }
        // With the scope's type names in place, impl targets can be keyed
        // regardless of item order.
        for item in items {
            if let ItemRef::Impl(iid) = *item {
                self.key_impl(iid);
            }
        }
    }

    fn duplicate(&self, name: Symbol, span: Span) {
        self.error(
            codes::DUPLICATE_DEFINITION,
            span,
            format!("the name `{name}` is defined multiple times in this scope"),
        );
    }

    fn key_impl(&mut self, iid: ImplId) {
        let (node, span) = match &self.program.impls[iid].self_ty {
            // Already keyed at registration (builtin).
            TypeSlot::Resolved(_) => return,
            TypeSlot::Unresolved { node, span, .. } => (node.clone(), *span),
        };
        let key = match &node {
            TyNode::Prim(p) => Some(ImplKey::Prim(Primitive::from_ast(*p))),
            TyNode::Path(path) => match path.as_single_ident() {
                Some(name) => match self.scopes.lookup_type(name) {
                    Some(TypeDef::Struct(sid)) => Some(ImplKey::Struct(sid)),
                    Some(TypeDef::Enum(eid)) => Some(ImplKey::Enum(eid)),
                    Some(TypeDef::Prim(p)) => Some(ImplKey::Prim(Primitive::from_ast(p))),
                    Some(TypeDef::Trait(_)) => {
                        self.error(
                            codes::NOT_A_TYPE,
                            span,
                            format!("`{name}` is a trait, not a concrete type"),
                        );
                        None
                    }
                    Some(TypeDef::SelfAlias(_)) => {
                        self.error(
                            codes::SELF_OUTSIDE_IMPL,
                            span,
                            "`Self` cannot be the target of an impl block",
                        );
                        None
                    }
                    None => {
                        self.error(
                            codes::UNDEFINED_NAME,
                            span,
                            format!("cannot find type `{name}` in this scope"),
                        );
                        None
                    }
                },
                None => {
                    self.error(codes::INVALID_PATH, span, "invalid impl target path");
                    None
                }
            },
            _ => {
                self.error(
                    codes::NOT_A_TYPE,
                    span,
                    "impl blocks must target a named type",
                );
                None
            }
        };
        if let Some(key) = key {
            self.impl_keys.insert(iid, key);
            self.assoc_index.entry(key).or_default().push(iid);
        }
    }

    // ---- item resolution ----

    fn resolve_items(&mut self, items: &[ItemRef]) {
        for item in items {
            match *item {
                ItemRef::Func(fid) => self.resolve_function(fid),
                ItemRef::Const(cid) => self.resolve_const_def(cid),
                ItemRef::Struct(sid) => self.resolve_struct_def(sid),
                ItemRef::Enum(_) => {}
                ItemRef::Trait(tid) => self.resolve_trait_def(tid),
                ItemRef::Impl(iid) => self.resolve_impl_def(iid),
            }
        }
    }

    fn resolve_struct_def(&mut self, sid: StructId) {
        let scope = self.scopes.current();
        let mut lengths = Vec::new();
        for i in 0..self.program.structs[sid].fields.len() {
            anchor(
                &mut self.program.structs[sid].fields[i].ty,
                scope,
                &mut lengths,
            );
        }
        for len in lengths {
            self.walk_expr(len);
        }
    }

    fn resolve_const_def(&mut self, cid: ConstId) {
        let scope = self.scopes.current();
        let mut lengths = Vec::new();
        anchor(&mut self.program.consts[cid].ty, scope, &mut lengths);
        for len in lengths {
            self.walk_expr(len);
        }
        if let Some(init) = self.program.consts[cid].init {
            self.walk_expr(init);
        }
    }

    fn resolve_trait_def(&mut self, tid: TraitId) {
        let items = self.program.traits[tid].items.clone();
        for item in items {
            match item {
                AssocItem::Func(fid) => self.resolve_function(fid),
                AssocItem::Const(cid) => self.resolve_const_def(cid),
            }
        }
    }

    fn resolve_impl_def(&mut self, iid: ImplId) {
        // Trait reference: a path, advanced to a trait id here.
        if let Some(TraitRef::Unresolved(path)) = self.program.impls[iid].trait_ref.clone() {
            let span = self.program.impls[iid].span;
            let resolved = match path.as_single_ident() {
                Some(name) => match self.scopes.lookup_type(name) {
                    Some(TypeDef::Trait(t)) => TraitRef::Resolved(t),
                    Some(_) => {
                        self.error(
                            codes::NOT_A_TYPE,
                            span,
                            format!("`{name}` is not a trait"),
                        );
                        TraitRef::Error
                    }
                    None => {
                        self.error(
                            codes::UNDEFINED_NAME,
                            span,
                            format!("cannot find trait `{name}` in this scope"),
                        );
                        TraitRef::Error
                    }
                },
                None => {
                    self.error(codes::INVALID_PATH, span, "invalid trait path");
                    TraitRef::Error
                }
            };
            self.program.impls[iid].trait_ref = Some(resolved);
        }

        self.scopes.enter(ScopeKind::Item);
        self.scopes
            .define_type(Symbol::intern("Self"), TypeDef::SelfAlias(iid));

        let scope = self.scopes.current();
        let mut lengths = Vec::new();
        anchor(&mut self.program.impls[iid].self_ty, scope, &mut lengths);
        for len in lengths {
            self.walk_expr(len);
        }

        let previous = self.current_impl.replace(iid);
        let items = self.program.impls[iid].items.clone();
        for item in items {
            match item {
                AssocItem::Func(fid) => self.resolve_function(fid),
                AssocItem::Const(cid) => self.resolve_const_def(cid),
            }
        }
        self.current_impl = previous;
        self.scopes.exit();
    }

    fn resolve_function(&mut self, fid: FuncId) {
        let scope = self.scopes.current();
        let mut lengths = Vec::new();
        for i in 0..self.program.functions[fid].params.len() {
            anchor(
                &mut self.program.functions[fid].params[i].ty,
                scope,
                &mut lengths,
            );
        }
        anchor(&mut self.program.functions[fid].ret_ty, scope, &mut lengths);
        for len in lengths {
            self.walk_expr(len);
        }

        self.scopes.enter(ScopeKind::Boundary);
        if let Some(self_local) = self.program.functions[fid].self_local {
            self.scopes
                .define_binding(Symbol::intern("self"), self_local);
        }
        let pats: Vec<Pat> = self
            .program
            .functions[fid]
            .params
            .iter()
            .map(|p| p.pat.clone())
            .collect();
        for pat in &pats {
            self.declare_pattern(pat);
        }
        if let Some(body) = self.program.functions[fid].body {
            self.walk_expr(body);
        }
        self.scopes.exit();
    }

    /// Introduce a pattern's bindings into the current scope.
    fn declare_pattern(&mut self, pat: &Pat) {
        match &pat.kind {
            PatKind::Binding { local, .. } => {
                let name = self.program.locals[*local].name;
                self.scopes.define_binding(name, *local);
            }
            PatKind::Ref { inner, .. } => self.declare_pattern(inner),
            PatKind::Literal { expr, .. } => self.walk_expr(*expr),
            PatKind::Wildcard | PatKind::Path(_) => {}
        }
    }

    // ---- expression walk ----

    fn walk_expr(&mut self, id: ExprId) {
        let span = self.program.exprs[id].span;
        let kind = std::mem::replace(&mut self.program.exprs[id].kind, ExprKind::Underscore);
        let kind = match kind {
            ExprKind::Value(ValueSlot::Unresolved(path)) => {
                ExprKind::Value(self.resolve_value_path(&path, span))
            }
            ExprKind::FieldAccess { base, selector } => {
                self.walk_expr(base);
                ExprKind::FieldAccess { base, selector }
            }
            ExprKind::Index { base, index } => {
                self.walk_expr(base);
                self.walk_expr(index);
                ExprKind::Index { base, index }
            }
            ExprKind::StructLiteral { target, fields } => {
                let target = match target {
                    StructTarget::Unresolved(path) => self.resolve_struct_target(&path, span),
                    resolved => resolved,
                };
                for field in &fields {
                    self.walk_expr(field.value);
                }
                ExprKind::StructLiteral { target, fields }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in &elements {
                    self.walk_expr(*element);
                }
                ExprKind::ArrayLiteral(elements)
            }
            ExprKind::ArrayRepeat { value, count } => {
                self.walk_expr(value);
                self.walk_expr(count);
                ExprKind::ArrayRepeat { value, count }
            }
            ExprKind::Unary { op, operand } => {
                self.walk_expr(operand);
                ExprKind::Unary { op, operand }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.walk_expr(lhs);
                self.walk_expr(rhs);
                ExprKind::Binary { op, lhs, rhs }
            }
            ExprKind::Assign { lhs, rhs, op } => {
                self.walk_expr(lhs);
                self.walk_expr(rhs);
                ExprKind::Assign { lhs, rhs, op }
            }
            ExprKind::Cast { expr, mut target } => {
                let scope = self.scopes.current();
                let mut lengths = Vec::new();
                anchor(&mut target, scope, &mut lengths);
                for len in lengths {
                    self.walk_expr(len);
                }
                self.walk_expr(expr);
                ExprKind::Cast { expr, target }
            }
            ExprKind::Call { callee, args } => {
                self.walk_expr(callee);
                for arg in &args {
                    self.walk_expr(*arg);
                }
                ExprKind::Call { callee, args }
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                resolved,
            } => {
                self.walk_expr(receiver);
                for arg in &args {
                    self.walk_expr(*arg);
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
                self.walk_expr(cond);
                self.walk_expr(then_block);
                if let Some(else_expr) = else_expr {
                    self.walk_expr(else_expr);
                }
                ExprKind::If {
                    cond,
                    then_block,
                    else_expr,
                }
            }
            ExprKind::Loop { body } => {
                self.walk_expr(body);
                ExprKind::Loop { body }
            }
            ExprKind::While { cond, body } => {
                self.walk_expr(cond);
                self.walk_expr(body);
                ExprKind::While { cond, body }
            }
            ExprKind::Break { value, target } => {
                if let Some(value) = value {
                    self.walk_expr(value);
                }
                ExprKind::Break { value, target }
            }
            ExprKind::Return { value, target } => {
                if let Some(value) = value {
                    self.walk_expr(value);
                }
                ExprKind::Return { value, target }
            }
            ExprKind::Block { mut stmts, tail } => {
                self.walk_block(&mut stmts, tail);
                ExprKind::Block { stmts, tail }
            }
            other @ (ExprKind::Literal(_)
            | ExprKind::Value(_)
            | ExprKind::Continue { .. }
            | ExprKind::Underscore) => other,
        };
        self.program.exprs[id].kind = kind;
    }

    /// Walk a block's statements. The statement list is owned by the
    /// caller (moved out of the arena for the duration of the walk), so
    /// let-annotation slots are anchored directly in place.
    fn walk_block(&mut self, stmts: &mut [Stmt], tail: Option<ExprId>) {
        self.scopes.enter(ScopeKind::Block);
        // Items of the block are visible from its start.
        let items: Vec<ItemRef> = stmts
            .iter()
            .filter_map(|s| match s {
                Stmt::Item(item) => Some(*item),
                _ => None,
            })
            .collect();
        self.discover_scope(&items);

        for stmt in stmts.iter_mut() {
            match stmt {
                Stmt::Let(l) => {
                    // The initializer sees the scope before the binding;
                    // shadowing takes effect afterwards.
                    self.walk_expr(l.init);
                    let scope = self.scopes.current();
                    let mut lengths = Vec::new();
                    if let Some(slot) = &mut l.ty {
                        anchor(slot, scope, &mut lengths);
                    }
                    for len in lengths {
                        self.walk_expr(len);
                    }
                    let pat = l.pat.clone();
                    self.declare_pattern(&pat);
                }
                Stmt::Expr { expr, .. } => {
                    let expr = *expr;
                    self.walk_expr(expr);
                }
                Stmt::Item(item) => {
                    let item = *item;
                    self.resolve_items(&[item]);
                }
            }
        }
        if let Some(tail) = tail {
            self.walk_expr(tail);
        }
        self.scopes.exit();
    }

    // ---- path resolution ----

    fn resolve_value_path(&mut self, path: &ast::Path, span: Span) -> ValueSlot {
        match path.segments.as_slice() {
            [PathSeg::SelfValue] => match self.scopes.lookup_value(Symbol::intern("self")) {
                Some(ValueDef::Local(local)) => ValueSlot::Local(local),
                _ => {
                    self.error(
                        codes::SELF_OUTSIDE_IMPL,
                        span,
                        "`self` is only available inside methods",
                    );
                    ValueSlot::Error
                }
            },
            [PathSeg::Ident(name)] => self.resolve_single_value(*name, span),
            [first, PathSeg::Ident(item)] => self.resolve_assoc_path(first, *item, span),
            _ => {
                self.error(codes::INVALID_PATH, span, "unsupported path");
                ValueSlot::Error
            }
        }
    }

    fn resolve_single_value(&mut self, name: Symbol, span: Span) -> ValueSlot {
        match self.scopes.lookup_value(name) {
            Some(ValueDef::Local(local)) => ValueSlot::Local(local),
            Some(ValueDef::Func(fid)) => ValueSlot::Func(fid),
            Some(ValueDef::Const(cid)) => ValueSlot::Const(cid),
            Some(ValueDef::Variant(eid, index)) => ValueSlot::EnumVariant(eid, index),
            None => match self.scopes.lookup_type(name) {
                // A unit struct's name is its sole value.
                Some(TypeDef::Struct(sid)) if self.program.structs[sid].fields.is_empty() => {
                    ValueSlot::StructConst(sid)
                }
                Some(_) => {
                    self.error(
                        codes::UNDEFINED_NAME,
                        span,
                        format!("expected a value, found type `{name}`"),
                    );
                    ValueSlot::Error
                }
                None => {
                    self.error(
                        codes::UNDEFINED_NAME,
                        span,
                        format!("cannot find value `{name}` in this scope"),
                    );
                    ValueSlot::Error
                }
            },
        }
    }

    fn resolve_assoc_path(&mut self, first: &PathSeg, item: Symbol, span: Span) -> ValueSlot {
        let key = match first {
            PathSeg::SelfType => match self.current_impl {
                Some(iid) => match self.impl_keys.get(&iid) {
                    Some(key) => *key,
                    // The impl target failed to key; already reported.
                    None => return ValueSlot::Error,
                },
                None => {
                    self.error(
                        codes::SELF_OUTSIDE_IMPL,
                        span,
                        "`Self` is only available inside impl blocks",
                    );
                    return ValueSlot::Error;
                }
            },
            PathSeg::Ident(type_name) => match self.scopes.lookup_type(*type_name) {
                Some(TypeDef::Enum(eid)) => {
                    if let Some(index) = self.program.enums[eid].variant_index(item) {
                        return ValueSlot::EnumVariant(eid, index);
                    }
                    ImplKey::Enum(eid)
                }
                Some(TypeDef::Struct(sid)) => ImplKey::Struct(sid),
                Some(TypeDef::Prim(p)) => ImplKey::Prim(Primitive::from_ast(p)),
                Some(TypeDef::SelfAlias(iid)) => match self.impl_keys.get(&iid) {
                    Some(key) => *key,
                    None => return ValueSlot::Error,
                },
                Some(TypeDef::Trait(_)) => {
                    self.error(
                        codes::NO_ASSOCIATED_ITEM,
                        span,
                        format!("associated items cannot be taken from trait `{type_name}`"),
                    );
                    return ValueSlot::Error;
                }
                None => {
                    self.error(
                        codes::UNDEFINED_NAME,
                        span,
                        format!("cannot find type `{type_name}` in this scope"),
                    );
                    return ValueSlot::Error;
                }
            },
            PathSeg::SelfValue => {
                self.error(codes::INVALID_PATH, span, "`self` cannot start a path");
                return ValueSlot::Error;
            }
        };
        self.find_assoc(key, item, span)
    }

    fn find_assoc(&mut self, key: ImplKey, item: Symbol, span: Span) -> ValueSlot {
        if let Some(impls) = self.assoc_index.get(&key) {
            for &iid in impls {
                for assoc in &self.program.impls[iid].items {
                    match *assoc {
                        AssocItem::Func(fid) if self.program.functions[fid].name == item => {
                            return ValueSlot::Func(fid);
                        }
                        AssocItem::Const(cid) if self.program.consts[cid].name == item => {
                            return ValueSlot::Const(cid);
                        }
                        _ => {}
                    }
                }
            }
        }
        self.error(
            codes::NO_ASSOCIATED_ITEM,
            span,
            format!("no associated item `{item}` found"),
        );
        ValueSlot::Error
    }

    fn resolve_struct_target(&mut self, path: &ast::Path, span: Span) -> StructTarget {
        let resolve_key = |key: Option<&ImplKey>| match key {
            Some(ImplKey::Struct(sid)) => StructTarget::Resolved(*sid),
            _ => StructTarget::Error,
        };
        match path.segments.as_slice() {
            [PathSeg::SelfType] => match self.current_impl {
                Some(iid) => {
                    let target = resolve_key(self.impl_keys.get(&iid));
                    if matches!(target, StructTarget::Error) {
                        self.error(
                            codes::NOT_A_TYPE,
                            span,
                            "`Self` does not name a struct here",
                        );
                    }
                    target
                }
                None => {
                    self.error(
                        codes::SELF_OUTSIDE_IMPL,
                        span,
                        "`Self` is only available inside impl blocks",
                    );
                    StructTarget::Error
                }
            },
            [PathSeg::Ident(name)] => match self.scopes.lookup_type(*name) {
                Some(TypeDef::Struct(sid)) => StructTarget::Resolved(sid),
                Some(TypeDef::SelfAlias(iid)) => {
                    let target = resolve_key(self.impl_keys.get(&iid));
                    if matches!(target, StructTarget::Error) {
                        self.error(
                            codes::NOT_A_TYPE,
                            span,
                            "`Self` does not name a struct here",
                        );
                    }
                    target
                }
                Some(_) => {
                    self.error(
                        codes::NOT_A_TYPE,
                        span,
                        format!("`{name}` is not a struct"),
                    );
                    StructTarget::Error
                }
                None => {
                    self.error(
                        codes::UNDEFINED_NAME,
                        span,
                        format!("cannot find struct `{name}` in this scope"),
                    );
                    StructTarget::Error
                }
            },
            _ => {
                self.error(codes::INVALID_PATH, span, "unsupported struct path");
                StructTarget::Error
            }
        }
    }
}

/// Anchor an unresolved slot to `scope` and collect the array-length
/// expressions buried in its type node for name resolution.
fn anchor(slot: &mut TypeSlot, scope: ScopeId, lengths: &mut Vec<ExprId>) {
    if let TypeSlot::Unresolved {
        node,
        scope: anchored,
        ..
    } = slot
    {
        *anchored = Some(scope);
        collect_lengths(node, lengths);
    }
}

fn collect_lengths(node: &TyNode, lengths: &mut Vec<ExprId>) {
    match node {
        TyNode::Array { element, length } => {
            lengths.push(*length);
            collect_lengths(element, lengths);
        }
        TyNode::Ref { inner, .. } => collect_lengths(inner, lengths),
        TyNode::Prim(_) | TyNode::Path(_) | TyNode::Unit | TyNode::Infer => {}
    }
}
