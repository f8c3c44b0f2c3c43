//! AST → HIR lowering.
//!
//! A mechanical rewrite: every semantic slot comes out in its unresolved
//! shape, every node keeps its AST back-reference, and no validation or
//! inference happens. Binding patterns allocate fresh [`Local`]s in the
//! enclosing function's local table; identifiers in value position become
//! unresolved paths for the name resolver.
//!
//! The only failures here are malformed AST shapes, which indicate a broken
//! front end and abort with a panic rather than a user diagnostic.

use rxc_ast as ast;

use crate::hir::*;

/// Lower a parsed file into a fresh [`Program`].
pub fn lower(ast: &ast::Ast) -> Program {
    let mut lowering = Lowering {
        program: Program::default(),
        local_frames: Vec::new(),
    };
    let roots: Vec<ItemRef> = ast.items.iter().map(|i| lowering.lower_item(i)).collect();
    lowering.program.root_items = roots;
    lowering.program
}

struct Lowering {
    program: Program,
    /// One frame per function currently being lowered; binding patterns
    /// register their locals in the innermost frame.
    local_frames: Vec<Vec<LocalId>>,
}

impl Lowering {
    fn lower_item(&mut self, item: &ast::Item) -> ItemRef {
        match item {
            ast::Item::Fn(f) => ItemRef::Func(self.lower_fn(f)),
            ast::Item::Const(c) => ItemRef::Const(self.lower_const(c)),
            ast::Item::Struct(s) => ItemRef::Struct(self.lower_struct(s)),
            ast::Item::Enum(e) => ItemRef::Enum(self.lower_enum(e)),
            ast::Item::Trait(t) => ItemRef::Trait(self.lower_trait(t)),
            ast::Item::Impl(i) => ItemRef::Impl(self.lower_impl(i)),
        }
    }

    fn lower_fn(&mut self, f: &ast::FnItem) -> FuncId {
        self.local_frames.push(Vec::new());

        let self_param = f.self_param.map(|sp| SelfParam {
            is_reference: sp.is_reference,
            mutable: sp.mutable,
        });
        // `self` is an ordinary local of the body; only `mut self` by value
        // makes the binding itself mutable.
        let self_local = match (&f.self_param, &f.body) {
            (Some(sp), Some(_)) => Some(self.alloc_local(
                rxc_util::Symbol::intern("self"),
                sp.mutable && !sp.is_reference,
                sp.span,
            )),
            _ => None,
        };

        let params: Vec<Param> = f
            .params
            .iter()
            .map(|p| Param {
                pat: self.lower_pat(&p.pat),
                ty: TypeSlot::new(self.lower_ty_node(&p.ty), p.ty.span),
            })
            .collect();

        let ret_ty = match &f.ret_ty {
            Some(ty) => TypeSlot::new(self.lower_ty_node(ty), ty.span),
            None => TypeSlot::new(TyNode::Unit, f.span),
        };

        let body = f.body.as_ref().map(|b| self.lower_block(b));
        let locals = self.local_frames.pop().unwrap_or_default();

        self.program.functions.push(Function {
            name: f.name.name,
            self_param,
            self_local,
            params,
            ret_ty,
            body,
            locals,
            owner_impl: None,
            origin: f.id,
            span: f.span,
        })
    }

    fn lower_const(&mut self, c: &ast::ConstItem) -> ConstId {
        let init = c.value.as_ref().map(|e| self.lower_expr(e));
        let ty = TypeSlot::new(self.lower_ty_node(&c.ty), c.ty.span);
        self.program.consts.push(ConstDef {
            name: c.name.name,
            ty,
            init,
            value: ValueState::Unresolved,
            origin: c.id,
            span: c.span,
        })
    }

    fn lower_struct(&mut self, s: &ast::StructItem) -> StructId {
        let fields = s
            .fields
            .iter()
            .map(|f| FieldDef {
                name: f.name.name,
                ty: TypeSlot::new(self.lower_ty_node(&f.ty), f.ty.span),
                span: f.name.span,
            })
            .collect();
        self.program.structs.push(StructDef {
            name: s.name.name,
            fields,
            origin: s.id,
            span: s.span,
        })
    }

    fn lower_enum(&mut self, e: &ast::EnumItem) -> EnumId {
        self.program.enums.push(EnumDef {
            name: e.name.name,
            variants: e.variants.iter().map(|v| v.name).collect(),
            origin: e.id,
            span: e.span,
        })
    }

    fn lower_trait(&mut self, t: &ast::TraitItem) -> TraitId {
        let items = t.items.iter().map(|i| self.lower_assoc_item(i)).collect();
        self.program.traits.push(TraitDef {
            name: t.name.name,
            items,
            origin: t.id,
            span: t.span,
        })
    }

    fn lower_impl(&mut self, i: &ast::ImplItem) -> ImplId {
        let items: Vec<AssocItem> = i.items.iter().map(|it| self.lower_assoc_item(it)).collect();
        let self_ty = TypeSlot::new(self.lower_ty_node(&i.self_ty), i.self_ty.span);
        let imp = self.program.impls.push(ImplDef {
            trait_ref: i.trait_path.clone().map(TraitRef::Unresolved),
            self_ty,
            items: items.clone(),
            origin: i.id,
            span: i.span,
        });
        for item in items {
            if let AssocItem::Func(fid) = item {
                self.program.functions[fid].owner_impl = Some(imp);
            }
        }
        imp
    }

    fn lower_assoc_item(&mut self, item: &ast::AssocItem) -> AssocItem {
        match item {
            ast::AssocItem::Fn(f) => AssocItem::Func(self.lower_fn(f)),
            ast::AssocItem::Const(c) => AssocItem::Const(self.lower_const(c)),
        }
    }

    fn lower_ty_node(&mut self, ty: &ast::Ty) -> TyNode {
        match &ty.kind {
            ast::TyKind::Prim(p) => TyNode::Prim(*p),
            ast::TyKind::Path(path) => {
                assert!(!path.segments.is_empty(), "invalid AST: empty type path");
                TyNode::Path(path.clone())
            }
            ast::TyKind::Ref { inner, mutable } => TyNode::Ref {
                inner: Box::new(self.lower_ty_node(inner)),
                mutable: *mutable,
            },
            ast::TyKind::Array { element, length } => TyNode::Array {
                element: Box::new(self.lower_ty_node(element)),
                length: self.lower_expr(length),
            },
            ast::TyKind::Unit => TyNode::Unit,
            ast::TyKind::Infer => TyNode::Infer,
        }
    }

    fn alloc_local(&mut self, name: rxc_util::Symbol, mutable: bool, span: rxc_util::Span) -> LocalId {
        let local = self.program.locals.push(Local {
            name,
            mutable,
            ty: None,
            span,
        });
        match self.local_frames.last_mut() {
            Some(frame) => frame.push(local),
            None => panic!("invalid AST: binding pattern outside a function body"),
        }
        local
    }

    fn lower_pat(&mut self, pat: &ast::Pat) -> Pat {
        let kind = match &pat.kind {
            ast::PatKind::Binding {
                ident,
                mutable,
                by_ref,
            } => PatKind::Binding {
                local: self.alloc_local(ident.name, *mutable, ident.span),
                by_ref: *by_ref,
            },
            ast::PatKind::Literal { expr, negative } => PatKind::Literal {
                expr: self.lower_expr(expr),
                negative: *negative,
            },
            ast::PatKind::Wildcard => PatKind::Wildcard,
            ast::PatKind::Ref { inner, mutable } => PatKind::Ref {
                inner: Box::new(self.lower_pat(inner)),
                mutable: *mutable,
            },
            ast::PatKind::Path(path) => PatKind::Path(path.clone()),
        };
        Pat {
            kind,
            span: pat.span,
        }
    }

    fn lower_block(&mut self, block: &ast::Block) -> ExprId {
        let stmts: Vec<Stmt> = block.stmts.iter().map(|s| self.lower_stmt(s)).collect();
        let tail = block.tail.as_ref().map(|e| self.lower_expr(e));
        self.program.exprs.push(Expr {
            kind: ExprKind::Block { stmts, tail },
            info: None,
            origin: block.id,
            span: block.span,
        })
    }

    fn lower_stmt(&mut self, stmt: &ast::Stmt) -> Stmt {
        match stmt {
            ast::Stmt::Let(l) => {
                // An explicit `_` annotation carries no information; treat
                // it like an omitted one.
                let ty = match &l.ty {
                    Some(t) if !matches!(t.kind, ast::TyKind::Infer) => {
                        Some(TypeSlot::new(self.lower_ty_node(t), t.span))
                    }
                    _ => None,
                };
                let init = self.lower_expr(&l.init);
                Stmt::Let(LetStmt {
                    pat: self.lower_pat(&l.pat),
                    ty,
                    init,
                    span: l.span,
                })
            }
            ast::Stmt::Expr { expr, semi } => Stmt::Expr {
                expr: self.lower_expr(expr),
                semi: *semi,
            },
            ast::Stmt::Item(item) => Stmt::Item(self.lower_item(item)),
        }
    }

    fn lower_expr(&mut self, expr: &ast::Expr) -> ExprId {
        let kind = match &expr.kind {
            ast::ExprKind::Lit(lit) => ExprKind::Literal(lit.clone()),
            ast::ExprKind::Path(path) => {
                assert!(!path.segments.is_empty(), "invalid AST: empty value path");
                ExprKind::Value(ValueSlot::Unresolved(path.clone()))
            }
            ast::ExprKind::Field { base, field } => ExprKind::FieldAccess {
                base: self.lower_expr(base),
                selector: FieldSelector::Name(field.name),
            },
            ast::ExprKind::Index { base, index } => ExprKind::Index {
                base: self.lower_expr(base),
                index: self.lower_expr(index),
            },
            ast::ExprKind::StructLit { path, fields } => ExprKind::StructLiteral {
                target: StructTarget::Unresolved(path.clone()),
                fields: fields
                    .iter()
                    .map(|(name, value)| StructLitField {
                        name: name.name,
                        index: None,
                        value: self.lower_expr(value),
                        span: name.span,
                    })
                    .collect(),
            },
            ast::ExprKind::ArrayLit(elements) => {
                ExprKind::ArrayLiteral(elements.iter().map(|e| self.lower_expr(e)).collect())
            }
            ast::ExprKind::ArrayRepeat { value, count } => ExprKind::ArrayRepeat {
                value: self.lower_expr(value),
                count: self.lower_expr(count),
            },
            ast::ExprKind::Unary { op, operand } => ExprKind::Unary {
                op: *op,
                operand: self.lower_expr(operand),
            },
            ast::ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
                op: *op,
                lhs: self.lower_expr(lhs),
                rhs: self.lower_expr(rhs),
            },
            ast::ExprKind::Assign { lhs, rhs, op } => ExprKind::Assign {
                lhs: self.lower_expr(lhs),
                rhs: self.lower_expr(rhs),
                op: *op,
            },
            ast::ExprKind::Cast { expr: inner, ty } => ExprKind::Cast {
                expr: self.lower_expr(inner),
                target: TypeSlot::new(self.lower_ty_node(ty), ty.span),
            },
            ast::ExprKind::Call { callee, args } => ExprKind::Call {
                callee: self.lower_expr(callee),
                args: args.iter().map(|a| self.lower_expr(a)).collect(),
            },
            ast::ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => ExprKind::MethodCall {
                receiver: self.lower_expr(receiver),
                method: method.name,
                args: args.iter().map(|a| self.lower_expr(a)).collect(),
                resolved: None,
            },
            ast::ExprKind::If {
                cond,
                then_block,
                else_expr,
            } => ExprKind::If {
                cond: self.lower_expr(cond),
                then_block: self.lower_block(then_block),
                else_expr: else_expr.as_ref().map(|e| self.lower_expr(e)),
            },
            ast::ExprKind::Loop { body } => ExprKind::Loop {
                body: self.lower_block(body),
            },
            ast::ExprKind::While { cond, body } => ExprKind::While {
                cond: self.lower_expr(cond),
                body: self.lower_block(body),
            },
            ast::ExprKind::Break { value } => ExprKind::Break {
                value: value.as_ref().map(|v| self.lower_expr(v)),
                target: None,
            },
            ast::ExprKind::Continue => ExprKind::Continue { target: None },
            ast::ExprKind::Return { value } => ExprKind::Return {
                value: value.as_ref().map(|v| self.lower_expr(v)),
                target: None,
            },
            ast::ExprKind::Block(block) => return self.lower_block(block),
            ast::ExprKind::Underscore => ExprKind::Underscore,
        };
        self.program.exprs.push(Expr {
            kind,
            info: None,
            origin: expr.id,
            span: expr.span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxc_ast::build::Builder;

    #[test]
    fn test_lower_simple_function() {
        let b = Builder::new();
        let body = b.expr_block(b.lit_int(1));
        let ast = b.ast(vec![rxc_ast::Item::Fn(b.fn_item(
            "answer",
            vec![],
            Some(b.ty_i32()),
            body,
        ))]);
        let program = lower(&ast);
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.root_items.len(), 1);
        let f = &program.functions[FuncId(0)];
        assert_eq!(f.name.as_str(), "answer");
        assert!(f.body.is_some());
        assert!(!f.ret_ty.is_resolved());
    }

    #[test]
    fn test_lowered_slots_start_unresolved() {
        let b = Builder::new();
        let body = b.expr_block(b.name("x"));
        let ast = b.ast(vec![rxc_ast::Item::Fn(b.fn_item(
            "f",
            vec![b.param("x", b.ty_i32())],
            Some(b.ty_i32()),
            body,
        ))]);
        let program = lower(&ast);
        let f = &program.functions[FuncId(0)];
        assert!(!f.params[0].ty.is_resolved());
        // The body tail is an unresolved identifier.
        let body = program.expr(f.body.unwrap());
        let tail = match &body.kind {
            ExprKind::Block { tail, .. } => tail.unwrap(),
            other => panic!("expected block, got {other:?}"),
        };
        match &program.expr(tail).kind {
            ExprKind::Value(slot) => assert!(!slot.is_resolved()),
            other => panic!("expected value, got {other:?}"),
        }
        assert!(program.expr(tail).info.is_none());
    }

    #[test]
    fn test_params_allocate_locals() {
        let b = Builder::new();
        let ast = b.ast(vec![rxc_ast::Item::Fn(b.fn_item(
            "f",
            vec![b.param("a", b.ty_i32()), b.param("b", b.ty_bool())],
            None,
            b.empty_block(),
        ))]);
        let program = lower(&ast);
        let f = &program.functions[FuncId(0)];
        assert_eq!(f.locals.len(), 2);
        assert_eq!(program.local(f.locals[0]).name.as_str(), "a");
        assert_eq!(program.local(f.locals[1]).name.as_str(), "b");
    }

    #[test]
    fn test_method_gets_self_local() {
        let b = Builder::new();
        let method = b.method("m", b.self_param(true, false), vec![], None, b.empty_block());
        let imp = b.impl_inherent(b.ty_path(&["S"]), vec![rxc_ast::AssocItem::Fn(method)]);
        let ast = b.ast(vec![
            rxc_ast::Item::Struct(b.struct_item("S", vec![])),
            rxc_ast::Item::Impl(imp),
        ]);
        let program = lower(&ast);
        let f = &program.functions[FuncId(0)];
        assert!(f.is_method());
        let self_local = f.self_local.expect("method body should bind self");
        assert_eq!(program.local(self_local).name.as_str(), "self");
        assert_eq!(f.owner_impl, Some(ImplId(0)));
    }

    #[test]
    fn test_block_items_are_hoisted() {
        let b = Builder::new();
        let inner = b.fn_item("inner", vec![], None, b.empty_block());
        let body = b.block(vec![b.item_stmt(rxc_ast::Item::Fn(inner))], None);
        let ast = b.ast(vec![rxc_ast::Item::Fn(b.fn_item("outer", vec![], None, body))]);
        let program = lower(&ast);
        assert_eq!(program.functions.len(), 2);
        // Items nest in lowering order: inner is lowered first.
        assert_eq!(program.functions[FuncId(0)].name.as_str(), "inner");
    }

    #[test]
    fn test_underscore_let_annotation_dropped() {
        let b = Builder::new();
        let body = b.block(vec![b.let_name("x", Some(b.ty_infer()), b.lit_int(1))], None);
        let ast = b.ast(vec![rxc_ast::Item::Fn(b.fn_item("f", vec![], None, body))]);
        let program = lower(&ast);
        let f = &program.functions[FuncId(0)];
        let body = program.expr(f.body.unwrap());
        match &body.kind {
            ExprKind::Block { stmts, .. } => match &stmts[0] {
                Stmt::Let(l) => assert!(l.ty.is_none()),
                other => panic!("expected let, got {other:?}"),
            },
            other => panic!("expected block, got {other:?}"),
        }
    }
}
