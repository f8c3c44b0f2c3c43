//! AST node definitions.
//!
//! The tree is plain data: no interning beyond [`Symbol`], no resolution
//! state. Shapes the parser cannot produce (e.g. a `break` outside any
//! loop) still have nodes here; rejecting them is the analyzer's job, not
//! the data model's.

use rxc_util::{define_idx, Span, Symbol};

define_idx!(
    /// Identity of one AST node, unique within an [`Ast`].
    NodeId
);

/// A parsed source file: a list of top-level items.
#[derive(Debug, Clone)]
pub struct Ast {
    pub items: Vec<Item>,
}

/// An identifier with its source location.
#[derive(Debug, Clone, Copy)]
pub struct Ident {
    pub name: Symbol,
    pub span: Span,
}

/// One segment of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSeg {
    /// A plain name.
    Ident(Symbol),
    /// The receiver, `self`.
    SelfValue,
    /// The implementing type, `Self`.
    SelfType,
}

/// A (possibly qualified) path such as `Color::Red`.
#[derive(Debug, Clone)]
pub struct Path {
    pub segments: Vec<PathSeg>,
    pub span: Span,
}

impl Path {
    /// The single symbol of a one-segment identifier path, if that is what
    /// this path is.
    pub fn as_single_ident(&self) -> Option<Symbol> {
        match self.segments.as_slice() {
            [PathSeg::Ident(name)] => Some(*name),
            _ => None,
        }
    }
}

/// Primitive type names the parser recognizes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimTy {
    I32,
    U32,
    Isize,
    Usize,
    Bool,
    Char,
    Str,
}

impl PrimTy {
    pub fn name(self) -> &'static str {
        match self {
            PrimTy::I32 => "i32",
            PrimTy::U32 => "u32",
            PrimTy::Isize => "isize",
            PrimTy::Usize => "usize",
            PrimTy::Bool => "bool",
            PrimTy::Char => "char",
            PrimTy::Str => "str",
        }
    }
}

/// A syntactic type.
#[derive(Debug, Clone)]
pub struct Ty {
    pub id: NodeId,
    pub kind: TyKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TyKind {
    /// A primitive type keyword.
    Prim(PrimTy),
    /// A named type: struct, enum, trait, or `Self`.
    Path(Path),
    /// `&T` / `&mut T`.
    Ref { inner: Box<Ty>, mutable: bool },
    /// `[T; LEN]` with a constant length expression.
    Array { element: Box<Ty>, length: Box<Expr> },
    /// `()`.
    Unit,
    /// `_`, to be inferred.
    Infer,
}

/// Integer literal suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntSuffix {
    I32,
    U32,
    Isize,
    Usize,
}

/// A literal value.
#[derive(Debug, Clone)]
pub enum Lit {
    /// Integer with optional type suffix. The value is the unsigned
    /// magnitude; a leading minus is a unary operator (or the
    /// `negative` flag on a literal pattern).
    Int { value: u64, suffix: Option<IntSuffix> },
    Bool(bool),
    Char(char),
    /// String literal contents (both plain and C string tokens land here).
    Str(Symbol),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// `!` (logical on `bool`, bitwise on integers).
    Not,
    /// `-` on signed integers.
    Neg,
    /// `*`.
    Deref,
    /// `&`.
    Ref,
    /// `&mut`.
    RefMut,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// `+ - * / %`
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }

    /// `& | ^`
    pub fn is_bitwise(self) -> bool {
        matches!(self, BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor)
    }

    /// `<< >>`
    pub fn is_shift(self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Shr)
    }

    /// `&& ||`
    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    /// `== != < <= > >=`
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    /// `== !=`
    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// An expression.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Lit(Lit),
    /// A name or qualified path in value position.
    Path(Path),
    /// `base.field`
    Field { base: Box<Expr>, field: Ident },
    /// `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },
    /// `Name { field: expr, .. }`
    StructLit {
        path: Path,
        fields: Vec<(Ident, Expr)>,
    },
    /// `[a, b, c]`
    ArrayLit(Vec<Expr>),
    /// `[value; count]`
    ArrayRepeat { value: Box<Expr>, count: Box<Expr> },
    Unary { op: UnOp, operand: Box<Expr> },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `lhs = rhs` or `lhs op= rhs`.
    Assign {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        op: Option<BinOp>,
    },
    /// `expr as Ty`
    Cast { expr: Box<Expr>, ty: Ty },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    MethodCall {
        receiver: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_block: Block,
        else_expr: Option<Box<Expr>>,
    },
    Loop { body: Block },
    While { cond: Box<Expr>, body: Block },
    Break { value: Option<Box<Expr>> },
    Continue,
    Return { value: Option<Box<Expr>> },
    Block(Block),
    /// `_` as an assignment target.
    Underscore,
}

/// A brace-delimited block.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub stmts: Vec<Stmt>,
    /// Trailing expression without a semicolon, the block's value.
    pub tail: Option<Box<Expr>>,
    pub span: Span,
}

/// A statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    Let(LetStmt),
    /// An expression statement; `semi` records whether a semicolon
    /// discarded its value.
    Expr { expr: Expr, semi: bool },
    /// A nested item declaration.
    Item(Box<Item>),
}

#[derive(Debug, Clone)]
pub struct LetStmt {
    pub id: NodeId,
    pub pat: Pat,
    pub ty: Option<Ty>,
    pub init: Expr,
    pub span: Span,
}

/// A pattern.
#[derive(Debug, Clone)]
pub struct Pat {
    pub id: NodeId,
    pub kind: PatKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum PatKind {
    /// `x`, `mut x`, `ref x`.
    Binding {
        ident: Ident,
        mutable: bool,
        by_ref: bool,
    },
    /// A literal pattern, optionally negated.
    Literal { expr: Box<Expr>, negative: bool },
    /// `_`
    Wildcard,
    /// `&pat` / `&mut pat`
    Ref { inner: Box<Pat>, mutable: bool },
    /// A path pattern (unit struct or enum variant).
    Path(Path),
}

/// The `self` parameter of a method.
#[derive(Debug, Clone, Copy)]
pub struct SelfParam {
    /// `&self` / `&mut self` rather than by-value `self`.
    pub is_reference: bool,
    pub mutable: bool,
    pub span: Span,
}

/// A non-self function parameter.
#[derive(Debug, Clone)]
pub struct FnParam {
    pub pat: Pat,
    pub ty: Ty,
}

/// A function or method.
#[derive(Debug, Clone)]
pub struct FnItem {
    pub id: NodeId,
    pub name: Ident,
    /// Present on methods only.
    pub self_param: Option<SelfParam>,
    pub params: Vec<FnParam>,
    /// Absent means `()`.
    pub ret_ty: Option<Ty>,
    /// Absent for trait method declarations.
    pub body: Option<Block>,
    pub span: Span,
}

/// A `const` item.
#[derive(Debug, Clone)]
pub struct ConstItem {
    pub id: NodeId,
    pub name: Ident,
    pub ty: Ty,
    /// Absent for trait const declarations.
    pub value: Option<Expr>,
    pub span: Span,
}

/// A struct field declaration.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Ident,
    pub ty: Ty,
}

/// A `struct` item.
#[derive(Debug, Clone)]
pub struct StructItem {
    pub id: NodeId,
    pub name: Ident,
    pub fields: Vec<FieldDef>,
    pub span: Span,
}

/// An `enum` item (unit variants only in this language).
#[derive(Debug, Clone)]
pub struct EnumItem {
    pub id: NodeId,
    pub name: Ident,
    pub variants: Vec<Ident>,
    pub span: Span,
}

/// An item inside a trait or impl block.
#[derive(Debug, Clone)]
pub enum AssocItem {
    Fn(FnItem),
    Const(ConstItem),
}

/// A `trait` item.
#[derive(Debug, Clone)]
pub struct TraitItem {
    pub id: NodeId,
    pub name: Ident,
    pub items: Vec<AssocItem>,
    pub span: Span,
}

/// An `impl` block, inherent or trait.
#[derive(Debug, Clone)]
pub struct ImplItem {
    pub id: NodeId,
    /// `impl Trait for Ty` when present, inherent `impl Ty` otherwise.
    pub trait_path: Option<Path>,
    pub self_ty: Ty,
    pub items: Vec<AssocItem>,
    pub span: Span,
}

/// A top-level (or block-nested) item.
#[derive(Debug, Clone)]
pub enum Item {
    Fn(FnItem),
    Const(ConstItem),
    Struct(StructItem),
    Enum(EnumItem),
    Trait(TraitItem),
    Impl(ImplItem),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Fn(i) => i.span,
            Item::Const(i) => i.span,
            Item::Struct(i) => i.span,
            Item::Enum(i) => i.span,
            Item::Trait(i) => i.span,
            Item::Impl(i) => i.span,
        }
    }
}
