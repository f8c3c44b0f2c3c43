//! Programmatic AST construction.
//!
//! [`Builder`] hands out [`NodeId`]s sequentially and fills in dummy spans,
//! which is exactly what the analyzer's test-suites need to assemble
//! programs without a parser. A real parser uses the same constructors and
//! overrides the spans afterwards.

use crate::ast::*;
use rxc_util::{Idx, Span, Symbol};
use std::cell::Cell;

/// Factory for AST nodes with fresh [`NodeId`]s.
pub struct Builder {
    next_id: Cell<u32>,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
        }
    }

    fn id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId::from_usize(id as usize)
    }

    fn expr(&self, kind: ExprKind) -> Expr {
        Expr {
            id: self.id(),
            kind,
            span: Span::DUMMY,
        }
    }

    fn ty(&self, kind: TyKind) -> Ty {
        Ty {
            id: self.id(),
            kind,
            span: Span::DUMMY,
        }
    }

    fn pat(&self, kind: PatKind) -> Pat {
        Pat {
            id: self.id(),
            kind,
            span: Span::DUMMY,
        }
    }

    // ---- names and paths ----

    pub fn ident(&self, name: &str) -> Ident {
        Ident {
            name: Symbol::intern(name),
            span: Span::DUMMY,
        }
    }

    /// Build a path; `"self"` and `"Self"` segments become their dedicated
    /// variants.
    pub fn path(&self, segments: &[&str]) -> Path {
        Path {
            segments: segments
                .iter()
                .map(|s| match *s {
                    "self" => PathSeg::SelfValue,
                    "Self" => PathSeg::SelfType,
                    name => PathSeg::Ident(Symbol::intern(name)),
                })
                .collect(),
            span: Span::DUMMY,
        }
    }

    // ---- types ----

    pub fn ty_prim(&self, prim: PrimTy) -> Ty {
        self.ty(TyKind::Prim(prim))
    }

    pub fn ty_i32(&self) -> Ty {
        self.ty_prim(PrimTy::I32)
    }

    pub fn ty_u32(&self) -> Ty {
        self.ty_prim(PrimTy::U32)
    }

    pub fn ty_usize(&self) -> Ty {
        self.ty_prim(PrimTy::Usize)
    }

    pub fn ty_bool(&self) -> Ty {
        self.ty_prim(PrimTy::Bool)
    }

    pub fn ty_str(&self) -> Ty {
        self.ty_prim(PrimTy::Str)
    }

    pub fn ty_path(&self, segments: &[&str]) -> Ty {
        let path = self.path(segments);
        self.ty(TyKind::Path(path))
    }

    pub fn ty_ref(&self, inner: Ty, mutable: bool) -> Ty {
        self.ty(TyKind::Ref {
            inner: Box::new(inner),
            mutable,
        })
    }

    pub fn ty_array(&self, element: Ty, length: Expr) -> Ty {
        self.ty(TyKind::Array {
            element: Box::new(element),
            length: Box::new(length),
        })
    }

    pub fn ty_unit(&self) -> Ty {
        self.ty(TyKind::Unit)
    }

    pub fn ty_infer(&self) -> Ty {
        self.ty(TyKind::Infer)
    }

    // ---- literals ----

    pub fn lit_int(&self, value: u64) -> Expr {
        self.expr(ExprKind::Lit(Lit::Int {
            value,
            suffix: None,
        }))
    }

    pub fn lit_int_suffixed(&self, value: u64, suffix: IntSuffix) -> Expr {
        self.expr(ExprKind::Lit(Lit::Int {
            value,
            suffix: Some(suffix),
        }))
    }

    pub fn lit_bool(&self, value: bool) -> Expr {
        self.expr(ExprKind::Lit(Lit::Bool(value)))
    }

    pub fn lit_char(&self, value: char) -> Expr {
        self.expr(ExprKind::Lit(Lit::Char(value)))
    }

    pub fn lit_str(&self, value: &str) -> Expr {
        self.expr(ExprKind::Lit(Lit::Str(Symbol::intern(value))))
    }

    // ---- expressions ----

    /// A single-identifier path expression.
    pub fn name(&self, name: &str) -> Expr {
        let path = self.path(&[name]);
        self.expr(ExprKind::Path(path))
    }

    pub fn path_expr(&self, segments: &[&str]) -> Expr {
        let path = self.path(segments);
        self.expr(ExprKind::Path(path))
    }

    pub fn field(&self, base: Expr, field: &str) -> Expr {
        let field = self.ident(field);
        self.expr(ExprKind::Field {
            base: Box::new(base),
            field,
        })
    }

    pub fn index(&self, base: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index {
            base: Box::new(base),
            index: Box::new(index),
        })
    }

    pub fn struct_lit(&self, name: &str, fields: Vec<(&str, Expr)>) -> Expr {
        let path = self.path(&[name]);
        let fields = fields
            .into_iter()
            .map(|(name, expr)| (self.ident(name), expr))
            .collect();
        self.expr(ExprKind::StructLit { path, fields })
    }

    pub fn array_lit(&self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::ArrayLit(elements))
    }

    pub fn array_repeat(&self, value: Expr, count: Expr) -> Expr {
        self.expr(ExprKind::ArrayRepeat {
            value: Box::new(value),
            count: Box::new(count),
        })
    }

    pub fn unary(&self, op: UnOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn neg(&self, operand: Expr) -> Expr {
        self.unary(UnOp::Neg, operand)
    }

    pub fn addr_of(&self, operand: Expr) -> Expr {
        self.unary(UnOp::Ref, operand)
    }

    pub fn addr_of_mut(&self, operand: Expr) -> Expr {
        self.unary(UnOp::RefMut, operand)
    }

    pub fn deref(&self, operand: Expr) -> Expr {
        self.unary(UnOp::Deref, operand)
    }

    pub fn binary(&self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn assign(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Assign {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            op: None,
        })
    }

    pub fn assign_op(&self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Assign {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            op: Some(op),
        })
    }

    pub fn cast(&self, expr: Expr, ty: Ty) -> Expr {
        self.expr(ExprKind::Cast {
            expr: Box::new(expr),
            ty,
        })
    }

    pub fn call(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    /// Call a function by name.
    pub fn call_name(&self, name: &str, args: Vec<Expr>) -> Expr {
        let callee = self.name(name);
        self.call(callee, args)
    }

    pub fn method_call(&self, receiver: Expr, method: &str, args: Vec<Expr>) -> Expr {
        let method = self.ident(method);
        self.expr(ExprKind::MethodCall {
            receiver: Box::new(receiver),
            method,
            args,
        })
    }

    pub fn if_expr(&self, cond: Expr, then_block: Block, else_expr: Option<Expr>) -> Expr {
        self.expr(ExprKind::If {
            cond: Box::new(cond),
            then_block,
            else_expr: else_expr.map(Box::new),
        })
    }

    pub fn loop_expr(&self, body: Block) -> Expr {
        self.expr(ExprKind::Loop { body })
    }

    pub fn while_expr(&self, cond: Expr, body: Block) -> Expr {
        self.expr(ExprKind::While {
            cond: Box::new(cond),
            body,
        })
    }

    pub fn break_expr(&self, value: Option<Expr>) -> Expr {
        self.expr(ExprKind::Break {
            value: value.map(Box::new),
        })
    }

    pub fn continue_expr(&self) -> Expr {
        self.expr(ExprKind::Continue)
    }

    pub fn return_expr(&self, value: Option<Expr>) -> Expr {
        self.expr(ExprKind::Return {
            value: value.map(Box::new),
        })
    }

    pub fn block_expr(&self, block: Block) -> Expr {
        self.expr(ExprKind::Block(block))
    }

    pub fn underscore(&self) -> Expr {
        self.expr(ExprKind::Underscore)
    }

    // ---- blocks and statements ----

    pub fn block(&self, stmts: Vec<Stmt>, tail: Option<Expr>) -> Block {
        Block {
            id: self.id(),
            stmts,
            tail: tail.map(Box::new),
            span: Span::DUMMY,
        }
    }

    /// A block whose only content is its tail expression.
    pub fn expr_block(&self, tail: Expr) -> Block {
        self.block(Vec::new(), Some(tail))
    }

    /// An empty `{}` block.
    pub fn empty_block(&self) -> Block {
        self.block(Vec::new(), None)
    }

    pub fn let_stmt(&self, pat: Pat, ty: Option<Ty>, init: Expr) -> Stmt {
        Stmt::Let(LetStmt {
            id: self.id(),
            pat,
            ty,
            init,
            span: Span::DUMMY,
        })
    }

    /// `let name = init;`
    pub fn let_name(&self, name: &str, ty: Option<Ty>, init: Expr) -> Stmt {
        let pat = self.pat_bind(name);
        self.let_stmt(pat, ty, init)
    }

    /// `let mut name = init;`
    pub fn let_mut(&self, name: &str, ty: Option<Ty>, init: Expr) -> Stmt {
        let pat = self.pat_bind_mut(name);
        self.let_stmt(pat, ty, init)
    }

    /// An expression statement terminated by a semicolon.
    pub fn semi_stmt(&self, expr: Expr) -> Stmt {
        Stmt::Expr { expr, semi: true }
    }

    /// An expression statement without a semicolon.
    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        Stmt::Expr { expr, semi: false }
    }

    pub fn item_stmt(&self, item: Item) -> Stmt {
        Stmt::Item(Box::new(item))
    }

    // ---- patterns ----

    pub fn pat_bind(&self, name: &str) -> Pat {
        let ident = self.ident(name);
        self.pat(PatKind::Binding {
            ident,
            mutable: false,
            by_ref: false,
        })
    }

    pub fn pat_bind_mut(&self, name: &str) -> Pat {
        let ident = self.ident(name);
        self.pat(PatKind::Binding {
            ident,
            mutable: true,
            by_ref: false,
        })
    }

    pub fn pat_wild(&self) -> Pat {
        self.pat(PatKind::Wildcard)
    }

    pub fn pat_lit(&self, expr: Expr, negative: bool) -> Pat {
        self.pat(PatKind::Literal {
            expr: Box::new(expr),
            negative,
        })
    }

    pub fn pat_ref(&self, inner: Pat, mutable: bool) -> Pat {
        self.pat(PatKind::Ref {
            inner: Box::new(inner),
            mutable,
        })
    }

    pub fn pat_path(&self, segments: &[&str]) -> Pat {
        let path = self.path(segments);
        self.pat(PatKind::Path(path))
    }

    // ---- items ----

    pub fn param(&self, name: &str, ty: Ty) -> FnParam {
        FnParam {
            pat: self.pat_bind(name),
            ty,
        }
    }

    pub fn self_param(&self, is_reference: bool, mutable: bool) -> SelfParam {
        SelfParam {
            is_reference,
            mutable,
            span: Span::DUMMY,
        }
    }

    /// A free function with a body.
    pub fn fn_item(
        &self,
        name: &str,
        params: Vec<FnParam>,
        ret_ty: Option<Ty>,
        body: Block,
    ) -> FnItem {
        FnItem {
            id: self.id(),
            name: self.ident(name),
            self_param: None,
            params,
            ret_ty,
            body: Some(body),
            span: Span::DUMMY,
        }
    }

    /// A method (with a `self` parameter) and a body.
    pub fn method(
        &self,
        name: &str,
        self_param: SelfParam,
        params: Vec<FnParam>,
        ret_ty: Option<Ty>,
        body: Block,
    ) -> FnItem {
        FnItem {
            id: self.id(),
            name: self.ident(name),
            self_param: Some(self_param),
            params,
            ret_ty,
            body: Some(body),
            span: Span::DUMMY,
        }
    }

    /// A bodiless signature, as found in trait declarations.
    pub fn fn_decl(
        &self,
        name: &str,
        self_param: Option<SelfParam>,
        params: Vec<FnParam>,
        ret_ty: Option<Ty>,
    ) -> FnItem {
        FnItem {
            id: self.id(),
            name: self.ident(name),
            self_param,
            params,
            ret_ty,
            body: None,
            span: Span::DUMMY,
        }
    }

    pub fn const_item(&self, name: &str, ty: Ty, value: Option<Expr>) -> ConstItem {
        ConstItem {
            id: self.id(),
            name: self.ident(name),
            ty,
            value,
            span: Span::DUMMY,
        }
    }

    pub fn struct_item(&self, name: &str, fields: Vec<(&str, Ty)>) -> StructItem {
        StructItem {
            id: self.id(),
            name: self.ident(name),
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef {
                    name: self.ident(name),
                    ty,
                })
                .collect(),
            span: Span::DUMMY,
        }
    }

    pub fn enum_item(&self, name: &str, variants: &[&str]) -> EnumItem {
        EnumItem {
            id: self.id(),
            name: self.ident(name),
            variants: variants.iter().map(|v| self.ident(v)).collect(),
            span: Span::DUMMY,
        }
    }

    pub fn trait_item(&self, name: &str, items: Vec<AssocItem>) -> TraitItem {
        TraitItem {
            id: self.id(),
            name: self.ident(name),
            items,
            span: Span::DUMMY,
        }
    }

    /// An inherent `impl Ty { .. }`.
    pub fn impl_inherent(&self, self_ty: Ty, items: Vec<AssocItem>) -> ImplItem {
        ImplItem {
            id: self.id(),
            trait_path: None,
            self_ty,
            items,
            span: Span::DUMMY,
        }
    }

    /// A trait implementation `impl Trait for Ty { .. }`.
    pub fn impl_trait(&self, trait_name: &str, self_ty: Ty, items: Vec<AssocItem>) -> ImplItem {
        ImplItem {
            id: self.id(),
            trait_path: Some(self.path(&[trait_name])),
            self_ty,
            items,
            span: Span::DUMMY,
        }
    }

    pub fn ast(&self, items: Vec<Item>) -> Ast {
        Ast { items }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_unique() {
        let b = Builder::new();
        let e1 = b.lit_int(1);
        let e2 = b.lit_int(2);
        let t = b.ty_i32();
        assert_ne!(e1.id, e2.id);
        assert_ne!(e2.id, t.id);
    }

    #[test]
    fn test_path_keywords() {
        let b = Builder::new();
        let p = b.path(&["self", "Self", "x"]);
        assert_eq!(p.segments[0], PathSeg::SelfValue);
        assert_eq!(p.segments[1], PathSeg::SelfType);
        assert!(matches!(p.segments[2], PathSeg::Ident(_)));
    }

    #[test]
    fn test_single_ident_path() {
        let b = Builder::new();
        assert!(b.path(&["x"]).as_single_ident().is_some());
        assert!(b.path(&["A", "b"]).as_single_ident().is_none());
        assert!(b.path(&["self"]).as_single_ident().is_none());
    }

    #[test]
    fn test_fn_item_shape() {
        let b = Builder::new();
        let body = b.expr_block(b.lit_int(1));
        let f = b.fn_item("answer", vec![], Some(b.ty_i32()), body);
        assert_eq!(f.name.name.as_str(), "answer");
        assert!(f.self_param.is_none());
        assert!(f.body.is_some());
    }

    #[test]
    fn test_method_has_self() {
        let b = Builder::new();
        let m = b.method(
            "touch",
            b.self_param(true, true),
            vec![],
            None,
            b.empty_block(),
        );
        let sp = m.self_param.unwrap();
        assert!(sp.is_reference);
        assert!(sp.mutable);
    }
}
