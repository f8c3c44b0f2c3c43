//! The type representation and interner.
//!
//! Types are interned: [`TypeTable`] owns one canonical [`Type`] per
//! structural value and hands out [`TypeId`]s, so type equality anywhere in
//! the analyzer is an integer comparison. The table is append-only; nothing
//! is ever de-interned.

use rxc_ast::PrimTy;
use rxc_util::{define_idx, FxHashMap, IndexVec};

use crate::hir::{EnumId, Program, StructId};

define_idx!(
    /// Handle to an interned [`Type`]. Equal ids mean structurally equal
    /// types.
    TypeId
);

/// Primitive type kinds.
///
/// `AnyInt` and `AnyUInt` are the transient types of unsuffixed integer
/// literals: `AnyInt` narrows to any integer type, `AnyUInt` only to the
/// unsigned ones. Both default (to `i32` / `u32`) the moment a literal is
/// consumed without more specific context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    I32,
    U32,
    Isize,
    Usize,
    Bool,
    Char,
    Str,
    AnyInt,
    AnyUInt,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::I32 => "i32",
            Primitive::U32 => "u32",
            Primitive::Isize => "isize",
            Primitive::Usize => "usize",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Str => "str",
            Primitive::AnyInt => "{integer}",
            Primitive::AnyUInt => "{unsigned integer}",
        }
    }

    pub fn from_ast(prim: PrimTy) -> Primitive {
        match prim {
            PrimTy::I32 => Primitive::I32,
            PrimTy::U32 => Primitive::U32,
            PrimTy::Isize => Primitive::Isize,
            PrimTy::Usize => Primitive::Usize,
            PrimTy::Bool => Primitive::Bool,
            PrimTy::Char => Primitive::Char,
            PrimTy::Str => Primitive::Str,
        }
    }

    /// Any integer kind, including the literal placeholders.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Primitive::I32
                | Primitive::U32
                | Primitive::Isize
                | Primitive::Usize
                | Primitive::AnyInt
                | Primitive::AnyUInt
        )
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(self, Primitive::I32 | Primitive::Isize | Primitive::AnyInt)
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            Primitive::U32 | Primitive::Usize | Primitive::AnyUInt
        )
    }
}

/// A structural type of the language subset. The set is closed; there are
/// no user-definable type constructors beyond structs and enums.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Prim(Primitive),
    Struct(StructId),
    Enum(EnumId),
    Ref { pointee: TypeId, mutable: bool },
    Array { element: TypeId, length: u64 },
    Unit,
    /// The type of diverging expressions; assignable to anything.
    Never,
    /// Placeholder for an omitted annotation; never survives finalization.
    Underscore,
    /// Internal recovery marker. Compatible with everything so one error
    /// does not cascade; never present in successful output.
    Error,
}

/// The per-compilation type interner.
#[derive(Debug)]
pub struct TypeTable {
    types: IndexVec<TypeId, Type>,
    lookup: FxHashMap<Type, TypeId>,
    // Pre-interned ids for the types every pass needs constantly.
    unit: TypeId,
    never: TypeId,
    error: TypeId,
    underscore: TypeId,
    i32: TypeId,
    u32: TypeId,
    isize: TypeId,
    usize: TypeId,
    bool: TypeId,
    char: TypeId,
    str: TypeId,
    any_int: TypeId,
    any_uint: TypeId,
}

impl TypeTable {
    pub fn new() -> Self {
        let mut types = IndexVec::new();
        let mut lookup = FxHashMap::default();
        let mut intern = |ty: Type| -> TypeId {
            let id = types.push(ty.clone());
            lookup.insert(ty, id);
            id
        };
        let unit = intern(Type::Unit);
        let never = intern(Type::Never);
        let error = intern(Type::Error);
        let underscore = intern(Type::Underscore);
        let i32 = intern(Type::Prim(Primitive::I32));
        let u32 = intern(Type::Prim(Primitive::U32));
        let isize = intern(Type::Prim(Primitive::Isize));
        let usize = intern(Type::Prim(Primitive::Usize));
        let bool = intern(Type::Prim(Primitive::Bool));
        let char = intern(Type::Prim(Primitive::Char));
        let str = intern(Type::Prim(Primitive::Str));
        let any_int = intern(Type::Prim(Primitive::AnyInt));
        let any_uint = intern(Type::Prim(Primitive::AnyUInt));
        Self {
            types,
            lookup,
            unit,
            never,
            error,
            underscore,
            i32,
            u32,
            isize,
            usize,
            bool,
            char,
            str,
            any_int,
            any_uint,
        }
    }

    /// Intern `ty`, returning its canonical id.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.lookup.get(&ty) {
            return id;
        }
        let id = self.types.push(ty.clone());
        self.lookup.insert(ty, id);
        id
    }

    /// The canonical type behind `id`.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    pub fn unit(&self) -> TypeId {
        self.unit
    }

    pub fn never(&self) -> TypeId {
        self.never
    }

    pub fn error(&self) -> TypeId {
        self.error
    }

    pub fn underscore(&self) -> TypeId {
        self.underscore
    }

    pub fn i32(&self) -> TypeId {
        self.i32
    }

    pub fn u32(&self) -> TypeId {
        self.u32
    }

    pub fn isize_ty(&self) -> TypeId {
        self.isize
    }

    pub fn usize_ty(&self) -> TypeId {
        self.usize
    }

    pub fn bool(&self) -> TypeId {
        self.bool
    }

    pub fn char(&self) -> TypeId {
        self.char
    }

    pub fn str(&self) -> TypeId {
        self.str
    }

    pub fn any_int(&self) -> TypeId {
        self.any_int
    }

    pub fn any_uint(&self) -> TypeId {
        self.any_uint
    }

    pub fn prim(&self, prim: Primitive) -> TypeId {
        match prim {
            Primitive::I32 => self.i32,
            Primitive::U32 => self.u32,
            Primitive::Isize => self.isize,
            Primitive::Usize => self.usize,
            Primitive::Bool => self.bool,
            Primitive::Char => self.char,
            Primitive::Str => self.str,
            Primitive::AnyInt => self.any_int,
            Primitive::AnyUInt => self.any_uint,
        }
    }

    pub fn mk_ref(&mut self, pointee: TypeId, mutable: bool) -> TypeId {
        self.intern(Type::Ref { pointee, mutable })
    }

    pub fn mk_array(&mut self, element: TypeId, length: u64) -> TypeId {
        self.intern(Type::Array { element, length })
    }

    pub fn mk_struct(&mut self, id: StructId) -> TypeId {
        self.intern(Type::Struct(id))
    }

    pub fn mk_enum(&mut self, id: EnumId) -> TypeId {
        self.intern(Type::Enum(id))
    }

    // ---- classification ----

    pub fn is_error(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Error)
    }

    pub fn is_never(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Never)
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Prim(p) if p.is_integer())
    }

    pub fn is_signed_integer(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Prim(p) if p.is_signed_integer())
    }

    pub fn is_unsigned_integer(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Prim(p) if p.is_unsigned_integer())
    }

    /// The literal placeholder kinds `AnyInt` / `AnyUInt`.
    pub fn is_any_integer(&self, id: TypeId) -> bool {
        id == self.any_int || id == self.any_uint
    }

    pub fn is_bool(&self, id: TypeId) -> bool {
        id == self.bool
    }

    pub fn is_reference(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Ref { .. })
    }

    /// `&T` / `&mut T` → `(T, mutable)`.
    pub fn as_ref(&self, id: TypeId) -> Option<(TypeId, bool)> {
        match self.get(id) {
            Type::Ref { pointee, mutable } => Some((*pointee, *mutable)),
            _ => None,
        }
    }

    /// Strip any number of reference layers, returning the base type.
    pub fn strip_refs(&self, mut id: TypeId) -> TypeId {
        while let Type::Ref { pointee, .. } = self.get(id) {
            id = *pointee;
        }
        id
    }

    /// Render `id` for diagnostics, pulling names from `program`.
    pub fn display(&self, id: TypeId, program: &Program) -> String {
        match self.get(id) {
            Type::Prim(p) => p.name().to_owned(),
            Type::Struct(sid) => program.structs[*sid].name.as_str().to_owned(),
            Type::Enum(eid) => program.enums[*eid].name.as_str().to_owned(),
            Type::Ref { pointee, mutable } => {
                let inner = self.display(*pointee, program);
                if *mutable {
                    format!("&mut {inner}")
                } else {
                    format!("&{inner}")
                }
            }
            Type::Array { element, length } => {
                format!("[{}; {length}]", self.display(*element, program))
            }
            Type::Unit => "()".to_owned(),
            Type::Never => "!".to_owned(),
            Type::Underscore => "_".to_owned(),
            Type::Error => "{error}".to_owned(),
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
