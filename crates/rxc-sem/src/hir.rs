//! HIR - the analyzer's intermediate representation.
//!
//! The HIR is a mechanical rewrite of the AST whose semantic fields are
//! *slots*: two-state enums that start `Unresolved` and are advanced exactly
//! once by the pass that owns them. A slot never moves backwards, and
//! reading a slot in its unresolved shape after its owning pass has run is a
//! bug in the compiler, surfaced by the panicking accessors here rather
//! than propagated as a user diagnostic.
//!
//! Ownership is flat: [`Program`] holds every entity in id-indexed arenas
//! and all cross-references are typed indices. Expressions form a tree
//! through [`ExprId`]s, which lets any pass mutate one node while reading
//! others without fighting the borrow checker.

use indexmap::IndexMap;
use rxc_ast as ast;
use rxc_ast::NodeId;
use rxc_util::{define_idx, IndexVec, Span, Symbol};

use crate::ty::TypeId;

define_idx!(
    /// A function or method in [`Program::functions`].
    FuncId
);
define_idx!(
    /// A struct definition in [`Program::structs`].
    StructId
);
define_idx!(
    /// An enum definition in [`Program::enums`].
    EnumId
);
define_idx!(
    /// A constant definition in [`Program::consts`].
    ConstId
);
define_idx!(
    /// A trait definition in [`Program::traits`].
    TraitId
);
define_idx!(
    /// An impl block in [`Program::impls`].
    ImplId
);
define_idx!(
    /// A local binding in [`Program::locals`].
    LocalId
);
define_idx!(
    /// An expression node in [`Program::exprs`].
    ExprId
);

/// Identity of a scope in the resolver's scope tree.
///
/// Defined here because type-annotation slots anchor the scope they were
/// written in, and slots live in the HIR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl rxc_util::Idx for ScopeId {
    fn from_usize(idx: usize) -> Self {
        assert!(idx <= u32::MAX as usize, "scope id space exhausted");
        ScopeId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Syntactic type tree carried by an unresolved [`TypeSlot`].
///
/// Identical in shape to `ast::TyKind` except that array lengths are lowered
/// expression ids, so name resolution and constant evaluation reach them
/// through the normal expression machinery.
#[derive(Debug, Clone)]
pub enum TyNode {
    Prim(ast::PrimTy),
    Path(ast::Path),
    Ref { inner: Box<TyNode>, mutable: bool },
    Array { element: Box<TyNode>, length: ExprId },
    Unit,
    Infer,
}

/// A type annotation slot: syntactic until finalization, a [`TypeId`]
/// afterwards.
#[derive(Debug, Clone)]
pub enum TypeSlot {
    Unresolved {
        node: TyNode,
        /// Scope to resolve paths in; anchored by the name resolver.
        scope: Option<ScopeId>,
        span: Span,
    },
    Resolved(TypeId),
}

impl TypeSlot {
    pub fn new(node: TyNode, span: Span) -> Self {
        TypeSlot::Unresolved {
            node,
            scope: None,
            span,
        }
    }

    pub fn resolved(ty: TypeId) -> Self {
        TypeSlot::Resolved(ty)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, TypeSlot::Resolved(_))
    }

    /// The resolved type.
    ///
    /// # Panics
    ///
    /// Panics when the slot is still unresolved; finalization must have run.
    pub fn ty(&self) -> TypeId {
        match self {
            TypeSlot::Resolved(ty) => *ty,
            TypeSlot::Unresolved { span, .. } => {
                panic!("type slot read before finalization (at {span})")
            }
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            TypeSlot::Unresolved { span, .. } => Some(*span),
            TypeSlot::Resolved(_) => None,
        }
    }
}

/// A value-position identifier: a path until name resolution binds it.
#[derive(Debug, Clone)]
pub enum ValueSlot {
    Unresolved(ast::Path),
    Local(LocalId),
    Const(ConstId),
    Func(FuncId),
    /// A unit struct used as a value.
    StructConst(StructId),
    /// An enum variant constructor.
    EnumVariant(EnumId, usize),
    /// Resolution failed and was reported; the checker assigns the error
    /// type without a second diagnostic.
    Error,
}

impl ValueSlot {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ValueSlot::Unresolved(_))
    }
}

/// Field selector on a field-access expression: a name until the checker
/// computes the field index from the base type.
#[derive(Debug, Clone, Copy)]
pub enum FieldSelector {
    Name(Symbol),
    Index(usize),
}

impl FieldSelector {
    /// The resolved field index.
    ///
    /// # Panics
    ///
    /// Panics when the selector has not been resolved by the checker.
    pub fn index(&self) -> usize {
        match self {
            FieldSelector::Index(idx) => *idx,
            FieldSelector::Name(name) => {
                panic!("field selector `{name}` read before expression checking")
            }
        }
    }

    pub fn name(&self) -> Option<Symbol> {
        match self {
            FieldSelector::Name(name) => Some(*name),
            FieldSelector::Index(_) => None,
        }
    }
}

/// The trait reference on an impl block.
#[derive(Debug, Clone)]
pub enum TraitRef {
    Unresolved(ast::Path),
    Resolved(TraitId),
    /// The path did not name a trait; recorded so later passes skip the
    /// impl without cascading.
    Error,
}

impl TraitRef {
    pub fn trait_id(&self) -> Option<TraitId> {
        match self {
            TraitRef::Resolved(id) => Some(*id),
            _ => None,
        }
    }
}

/// Evaluation state of a constant.
#[derive(Debug, Clone)]
pub enum ValueState {
    /// Not yet evaluated; the initializer expression is on the def.
    Unresolved,
    Resolved(crate::consts::ConstValue),
    /// Evaluation failed and was reported; consumers treat the constant as
    /// poisoned without re-reporting.
    Error,
}

impl ValueState {
    /// The evaluated value.
    ///
    /// # Panics
    ///
    /// Panics when the constant was never evaluated. An errored constant
    /// returns `None` through [`ValueState::value`], not a panic.
    pub fn unwrap(&self) -> &crate::consts::ConstValue {
        match self {
            ValueState::Resolved(value) => value,
            ValueState::Unresolved => panic!("constant read before finalization"),
            ValueState::Error => panic!("errored constant read as a value"),
        }
    }

    pub fn value(&self) -> Option<&crate::consts::ConstValue> {
        match self {
            ValueState::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Result of checking one expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprInfo {
    /// The expression's type; `Never` for diverging expressions.
    pub ty: TypeId,
    /// The expression denotes a memory location.
    pub is_place: bool,
    /// The location can be written through.
    pub is_mutable_place: bool,
    /// Control provably does not reach this expression's continuation.
    pub diverges: bool,
}

impl ExprInfo {
    /// A non-place, non-diverging value of `ty`.
    pub fn value(ty: TypeId) -> Self {
        Self {
            ty,
            is_place: false,
            is_mutable_place: false,
            diverges: false,
        }
    }
}

/// One HIR expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    /// Set by the expression checker.
    pub info: Option<ExprInfo>,
    /// Originating AST node.
    pub origin: NodeId,
    pub span: Span,
}

impl Expr {
    /// The checker's verdict on this node.
    ///
    /// # Panics
    ///
    /// Panics when the expression was never checked.
    pub fn info(&self) -> ExprInfo {
        match self.info {
            Some(info) => info,
            None => panic!("expression info read before checking (at {})", self.span),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(ast::Lit),
    /// A value-position name; see [`ValueSlot`].
    Value(ValueSlot),
    FieldAccess {
        base: ExprId,
        selector: FieldSelector,
    },
    Index {
        base: ExprId,
        index: ExprId,
    },
    StructLiteral {
        target: StructTarget,
        fields: Vec<StructLitField>,
    },
    ArrayLiteral(Vec<ExprId>),
    ArrayRepeat {
        value: ExprId,
        count: ExprId,
    },
    Unary {
        op: ast::UnOp,
        operand: ExprId,
    },
    Binary {
        op: ast::BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Assign {
        lhs: ExprId,
        rhs: ExprId,
        op: Option<ast::BinOp>,
    },
    Cast {
        expr: ExprId,
        target: TypeSlot,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    MethodCall {
        receiver: ExprId,
        method: Symbol,
        args: Vec<ExprId>,
        /// Set by the checker on successful resolution.
        resolved: Option<FuncId>,
    },
    If {
        cond: ExprId,
        then_block: ExprId,
        else_expr: Option<ExprId>,
    },
    Loop {
        body: ExprId,
    },
    While {
        cond: ExprId,
        body: ExprId,
    },
    Break {
        value: Option<ExprId>,
        /// The targeted `Loop`/`While` expression; set by the checker.
        target: Option<ExprId>,
    },
    Continue {
        /// The targeted `Loop`/`While` expression; set by the checker.
        target: Option<ExprId>,
    },
    Return {
        value: Option<ExprId>,
        /// The enclosing function; set by the checker.
        target: Option<FuncId>,
    },
    Block {
        stmts: Vec<Stmt>,
        tail: Option<ExprId>,
    },
    /// `_` as an assignment target.
    Underscore,
}

/// The struct named by a struct literal.
#[derive(Debug, Clone)]
pub enum StructTarget {
    Unresolved(ast::Path),
    Resolved(StructId),
    Error,
}

impl StructTarget {
    pub fn struct_id(&self) -> Option<StructId> {
        match self {
            StructTarget::Resolved(id) => Some(*id),
            _ => None,
        }
    }
}

/// One field initializer in a struct literal.
#[derive(Debug, Clone)]
pub struct StructLitField {
    pub name: Symbol,
    /// Field index in the struct definition; set by the checker.
    pub index: Option<usize>,
    pub value: ExprId,
    pub span: Span,
}

/// A statement inside a block.
#[derive(Debug, Clone)]
pub enum Stmt {
    Let(LetStmt),
    Expr {
        expr: ExprId,
        /// A trailing semicolon discards the value.
        semi: bool,
    },
    /// A block-nested item, hoisted into the program arenas during
    /// lowering; the statement keeps the reference so name resolution can
    /// define it in the right scope.
    Item(ItemRef),
}

#[derive(Debug, Clone)]
pub struct LetStmt {
    pub pat: Pat,
    pub ty: Option<TypeSlot>,
    pub init: ExprId,
    pub span: Span,
}

/// A pattern.
#[derive(Debug, Clone)]
pub struct Pat {
    pub kind: PatKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum PatKind {
    /// A binding; mutability lives on the [`Local`].
    Binding { local: LocalId, by_ref: bool },
    /// A literal pattern (refutable; rejected in `let` and parameters).
    Literal { expr: ExprId, negative: bool },
    Wildcard,
    Ref { inner: Box<Pat>, mutable: bool },
    /// A path pattern (refutable; rejected in `let` and parameters).
    Path(ast::Path),
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A reference to an item in the program arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    Func(FuncId),
    Const(ConstId),
    Struct(StructId),
    Enum(EnumId),
    Trait(TraitId),
    Impl(ImplId),
}

/// A local binding (parameter or `let`).
#[derive(Debug, Clone)]
pub struct Local {
    pub name: Symbol,
    pub mutable: bool,
    /// Final type, written by the expression checker.
    pub ty: Option<TypeId>,
    pub span: Span,
}

/// The `self` parameter of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfParam {
    /// `&self` / `&mut self` rather than by-value `self`.
    pub is_reference: bool,
    pub mutable: bool,
}

/// A declared (non-self) parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub pat: Pat,
    pub ty: TypeSlot,
}

/// A function, or a method when `self_param` is present.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub self_param: Option<SelfParam>,
    /// The local injected for `self`; populated during lowering for
    /// methods with a body.
    pub self_local: Option<LocalId>,
    pub params: Vec<Param>,
    pub ret_ty: TypeSlot,
    /// A `Block` expression; absent on trait declarations and builtins.
    pub body: Option<ExprId>,
    /// Local table: every binding this function owns, in allocation order.
    pub locals: Vec<LocalId>,
    /// The impl block this function belongs to, when it is an associated
    /// item; gives methods their `Self` type.
    pub owner_impl: Option<ImplId>,
    pub origin: NodeId,
    pub span: Span,
}

impl Function {
    /// True when this is a method (has a `self` parameter).
    pub fn is_method(&self) -> bool {
        self.self_param.is_some()
    }
}

/// A struct field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Symbol,
    pub ty: TypeSlot,
    pub span: Span,
}

/// A struct definition.
#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: Symbol,
    pub fields: Vec<FieldDef>,
    pub origin: NodeId,
    pub span: Span,
}

impl StructDef {
    pub fn field_index(&self, name: Symbol) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// An enum definition; variants are bare names in this language.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: Symbol,
    pub variants: Vec<Symbol>,
    pub origin: NodeId,
    pub span: Span,
}

impl EnumDef {
    pub fn variant_index(&self, name: Symbol) -> Option<usize> {
        self.variants.iter().position(|v| *v == name)
    }
}

/// A constant definition.
#[derive(Debug, Clone)]
pub struct ConstDef {
    pub name: Symbol,
    pub ty: TypeSlot,
    /// Absent on trait const declarations.
    pub init: Option<ExprId>,
    pub value: ValueState,
    pub origin: NodeId,
    pub span: Span,
}

/// An associated item inside a trait or impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssocItem {
    Func(FuncId),
    Const(ConstId),
}

/// A trait definition.
#[derive(Debug, Clone)]
pub struct TraitDef {
    pub name: Symbol,
    pub items: Vec<AssocItem>,
    pub origin: NodeId,
    pub span: Span,
}

/// An impl block.
#[derive(Debug, Clone)]
pub struct ImplDef {
    /// Present on `impl Trait for Ty`.
    pub trait_ref: Option<TraitRef>,
    pub self_ty: TypeSlot,
    pub items: Vec<AssocItem>,
    pub origin: NodeId,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// The whole compilation unit: arenas for every entity plus the top-level
/// item list in source order.
#[derive(Debug, Default)]
pub struct Program {
    pub exprs: IndexVec<ExprId, Expr>,
    pub locals: IndexVec<LocalId, Local>,
    pub functions: IndexVec<FuncId, Function>,
    pub structs: IndexVec<StructId, StructDef>,
    pub enums: IndexVec<EnumId, EnumDef>,
    pub consts: IndexVec<ConstId, ConstDef>,
    pub traits: IndexVec<TraitId, TraitDef>,
    pub impls: IndexVec<ImplId, ImplDef>,
    /// Top-level items in source order.
    pub root_items: Vec<ItemRef>,
}

impl Program {
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id]
    }

    /// The checked type of an expression.
    ///
    /// # Panics
    ///
    /// Panics when the expression was never checked.
    pub fn expr_ty(&self, id: ExprId) -> TypeId {
        self.exprs[id].info().ty
    }

    pub fn local(&self, id: LocalId) -> &Local {
        &self.locals[id]
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id]
    }
}

/// Index from a receiver type to the impl blocks targeting it.
///
/// Filled once (builtins at seeding, user impls right after their self
/// types finalize) and read-only while the expression checker runs. An
/// insertion-ordered map keeps iteration deterministic for consumers that
/// enumerate it.
#[derive(Debug, Default)]
pub struct ImplTable {
    by_type: IndexMap<TypeId, Vec<ImplId>>,
}

impl ImplTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, ty: TypeId, imp: ImplId) {
        self.by_type.entry(ty).or_default().push(imp);
    }

    /// Impl blocks whose target is exactly `ty`.
    pub fn impls_for(&self, ty: TypeId) -> &[ImplId] {
        self.by_type.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All `(type, impls)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &[ImplId])> {
        self.by_type.iter().map(|(ty, impls)| (*ty, impls.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::TypeTable;
    use rxc_util::Idx;

    #[test]
    fn test_type_slot_advances() {
        let types = TypeTable::new();
        let mut slot = TypeSlot::new(TyNode::Unit, Span::DUMMY);
        assert!(!slot.is_resolved());
        slot = TypeSlot::resolved(types.unit());
        assert!(slot.is_resolved());
        assert_eq!(slot.ty(), types.unit());
    }

    #[test]
    #[should_panic(expected = "type slot read before finalization")]
    fn test_unresolved_type_slot_panics() {
        let slot = TypeSlot::new(TyNode::Unit, Span::DUMMY);
        let _ = slot.ty();
    }

    #[test]
    #[should_panic(expected = "field selector")]
    fn test_unresolved_selector_panics() {
        let sel = FieldSelector::Name(Symbol::intern("x"));
        let _ = sel.index();
    }

    #[test]
    fn test_field_selector_index() {
        let sel = FieldSelector::Index(2);
        assert_eq!(sel.index(), 2);
        assert!(sel.name().is_none());
    }

    #[test]
    fn test_struct_field_lookup() {
        let def = StructDef {
            name: Symbol::intern("P"),
            fields: vec![
                FieldDef {
                    name: Symbol::intern("x"),
                    ty: TypeSlot::new(TyNode::Unit, Span::DUMMY),
                    span: Span::DUMMY,
                },
                FieldDef {
                    name: Symbol::intern("y"),
                    ty: TypeSlot::new(TyNode::Unit, Span::DUMMY),
                    span: Span::DUMMY,
                },
            ],
            origin: rxc_ast::NodeId::from_usize(0),
            span: Span::DUMMY,
        };
        assert_eq!(def.field_index(Symbol::intern("y")), Some(1));
        assert_eq!(def.field_index(Symbol::intern("z")), None);
    }

    #[test]
    fn test_enum_variant_lookup() {
        let def = EnumDef {
            name: Symbol::intern("Color"),
            variants: vec![Symbol::intern("Red"), Symbol::intern("Green")],
            origin: rxc_ast::NodeId::from_usize(0),
            span: Span::DUMMY,
        };
        assert_eq!(def.variant_index(Symbol::intern("Green")), Some(1));
        assert_eq!(def.variant_index(Symbol::intern("Blue")), None);
    }

    #[test]
    fn test_impl_table() {
        let types = TypeTable::new();
        let mut table = ImplTable::new();
        assert!(table.impls_for(types.unit()).is_empty());
        table.add(types.unit(), ImplId(0));
        table.add(types.never(), ImplId(1));
        table.add(types.unit(), ImplId(2));
        assert_eq!(table.impls_for(types.unit()), &[ImplId(0), ImplId(2)]);

        // Iteration follows first-insertion order of the keys.
        let keys: Vec<_> = table.iter().map(|(ty, _)| ty).collect();
        assert_eq!(keys, vec![types.unit(), types.never()]);
    }
}
