//! Lexical scope tree for name resolution.
//!
//! Scopes form a tree mirroring the HIR's lexical structure. Each scope has
//! three namespaces:
//!
//! - **types**: struct, enum and trait names, plus `Self` inside impls;
//! - **items**: functions, consts and enum-variant constructors — stable
//!   names visible from anywhere inside their scope;
//! - **bindings**: `let` and parameter bindings — transient names that
//!   shadow items and disappear across a *boundary* scope.
//!
//! The boundary rule implements "a nested function does not see the outer
//! function's locals but does see enclosing items": value lookup walks
//! parents, and once it steps out of a [`ScopeKind::Boundary`] scope it
//! stops consulting binding namespaces.

use rxc_ast::PrimTy;
use rxc_util::{FxHashMap, IndexVec, Symbol};

use crate::hir::{ConstId, EnumId, FuncId, ImplId, LocalId, ScopeId, StructId, TraitId};

/// What kind of region a scope covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The root scope holding predefined and top-level items.
    Global,
    /// The scope wrapped around an impl block, carrying `Self`.
    Item,
    /// A function or method body. Crossing it outward hides bindings.
    Boundary,
    /// A plain block.
    Block,
}

/// A name in the type namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDef {
    Struct(StructId),
    Enum(EnumId),
    Trait(TraitId),
    Prim(PrimTy),
    /// `Self` inside the given impl block.
    SelfAlias(ImplId),
}

/// A name in the value namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    Local(LocalId),
    Func(FuncId),
    Const(ConstId),
    /// A unit enum-variant constructor.
    Variant(EnumId, usize),
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    types: FxHashMap<Symbol, TypeDef>,
    items: FxHashMap<Symbol, ValueDef>,
    bindings: FxHashMap<Symbol, LocalId>,
}

/// The scope tree plus a cursor at the scope currently being visited.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: IndexVec<ScopeId, Scope>,
    current: ScopeId,
}

impl ScopeTree {
    /// Create a tree holding only the global root scope.
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let root = scopes.push(Scope {
            parent: None,
            kind: ScopeKind::Global,
            types: FxHashMap::default(),
            items: FxHashMap::default(),
            bindings: FxHashMap::default(),
        });
        Self {
            scopes,
            current: root,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope].kind
    }

    /// Open a child of the current scope and move the cursor into it.
    pub fn enter(&mut self, kind: ScopeKind) -> ScopeId {
        let scope = self.scopes.push(Scope {
            parent: Some(self.current),
            kind,
            types: FxHashMap::default(),
            items: FxHashMap::default(),
            bindings: FxHashMap::default(),
        });
        self.current = scope;
        scope
    }

    /// Close the current scope, returning the cursor to its parent.
    ///
    /// # Panics
    ///
    /// Panics when called on the root; that is an unbalanced enter/exit
    /// pair, a compiler bug.
    pub fn exit(&mut self) {
        match self.scopes[self.current].parent {
            Some(parent) => self.current = parent,
            None => panic!("exited the root scope"),
        }
    }

    /// Define a type name in the current scope.
    ///
    /// Returns false when the name is already taken in this scope's type
    /// namespace.
    pub fn define_type(&mut self, name: Symbol, def: TypeDef) -> bool {
        let scope = &mut self.scopes[self.current];
        if scope.types.contains_key(&name) {
            return false;
        }
        scope.types.insert(name, def);
        true
    }

    /// Define an item name in the current scope.
    ///
    /// Returns false on a duplicate in this scope's item namespace.
    pub fn define_item(&mut self, name: Symbol, def: ValueDef) -> bool {
        let scope = &mut self.scopes[self.current];
        if scope.items.contains_key(&name) {
            return false;
        }
        scope.items.insert(name, def);
        true
    }

    /// Define a binding in the current scope. Later definitions shadow
    /// earlier ones; shadowing is legal.
    pub fn define_binding(&mut self, name: Symbol, local: LocalId) {
        self.scopes[self.current].bindings.insert(name, local);
    }

    /// Look a type name up from the current scope outward.
    pub fn lookup_type(&self, name: Symbol) -> Option<TypeDef> {
        self.lookup_type_from(self.current, name)
    }

    /// Look a type name up from an arbitrary scope outward.
    pub fn lookup_type_from(&self, from: ScopeId, name: Symbol) -> Option<TypeDef> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = &self.scopes[id];
            if let Some(def) = scope.types.get(&name) {
                return Some(*def);
            }
            cursor = scope.parent;
        }
        None
    }

    /// Look a value name up from the current scope outward.
    ///
    /// Bindings shadow items within a scope. Once the walk leaves a
    /// boundary scope, binding namespaces further out are masked and only
    /// items remain visible.
    pub fn lookup_value(&self, name: Symbol) -> Option<ValueDef> {
        let mut cursor = Some(self.current);
        let mut bindings_visible = true;
        while let Some(id) = cursor {
            let scope = &self.scopes[id];
            if bindings_visible {
                if let Some(local) = scope.bindings.get(&name) {
                    return Some(ValueDef::Local(*local));
                }
            }
            if let Some(def) = scope.items.get(&name) {
                return Some(*def);
            }
            if scope.kind == ScopeKind::Boundary {
                bindings_visible = false;
            }
            cursor = scope.parent;
        }
        None
    }

    /// Look a binding up in the current scope only.
    pub fn lookup_local(&self, name: Symbol) -> Option<LocalId> {
        self.scopes[self.current].bindings.get(&name).copied()
    }

    /// The innermost enclosing impl's `Self`, if the current scope is
    /// inside one.
    pub fn enclosing_self(&self) -> Option<ImplId> {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let scope = &self.scopes[id];
            if let Some(TypeDef::SelfAlias(imp)) = scope.types.get(&Symbol::intern("Self")) {
                return Some(*imp);
            }
            cursor = scope.parent;
        }
        None
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    #[test]
    fn test_root_is_global() {
        let tree = ScopeTree::new();
        assert_eq!(tree.kind(tree.current()), ScopeKind::Global);
    }

    #[test]
    fn test_define_and_lookup_item() {
        let mut tree = ScopeTree::new();
        assert!(tree.define_item(sym("f"), ValueDef::Func(FuncId(0))));
        assert_eq!(tree.lookup_value(sym("f")), Some(ValueDef::Func(FuncId(0))));
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let mut tree = ScopeTree::new();
        assert!(tree.define_item(sym("f"), ValueDef::Func(FuncId(0))));
        assert!(!tree.define_item(sym("f"), ValueDef::Func(FuncId(1))));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut tree = ScopeTree::new();
        assert!(tree.define_type(sym("S"), TypeDef::Struct(StructId(0))));
        assert!(!tree.define_type(sym("S"), TypeDef::Enum(EnumId(0))));
    }

    #[test]
    fn test_binding_shadows_item() {
        let mut tree = ScopeTree::new();
        tree.define_item(sym("x"), ValueDef::Const(ConstId(0)));
        tree.define_binding(sym("x"), LocalId(0));
        assert_eq!(
            tree.lookup_value(sym("x")),
            Some(ValueDef::Local(LocalId(0)))
        );
    }

    #[test]
    fn test_binding_shadows_binding() {
        let mut tree = ScopeTree::new();
        tree.define_binding(sym("x"), LocalId(0));
        tree.define_binding(sym("x"), LocalId(1));
        assert_eq!(
            tree.lookup_value(sym("x")),
            Some(ValueDef::Local(LocalId(1)))
        );
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut tree = ScopeTree::new();
        tree.define_item(sym("f"), ValueDef::Func(FuncId(0)));
        tree.enter(ScopeKind::Block);
        tree.enter(ScopeKind::Block);
        assert_eq!(tree.lookup_value(sym("f")), Some(ValueDef::Func(FuncId(0))));
        tree.exit();
        tree.exit();
    }

    #[test]
    fn test_boundary_masks_bindings() {
        let mut tree = ScopeTree::new();
        tree.enter(ScopeKind::Boundary);
        tree.define_binding(sym("outer_local"), LocalId(0));
        tree.define_item(sym("outer_item"), ValueDef::Func(FuncId(0)));
        tree.enter(ScopeKind::Boundary);
        // The nested function sees the enclosing item but not the local.
        assert_eq!(tree.lookup_value(sym("outer_local")), None);
        assert_eq!(
            tree.lookup_value(sym("outer_item")),
            Some(ValueDef::Func(FuncId(0)))
        );
        tree.exit();
        tree.exit();
    }

    #[test]
    fn test_boundary_scope_sees_own_bindings() {
        let mut tree = ScopeTree::new();
        tree.enter(ScopeKind::Boundary);
        tree.define_binding(sym("param"), LocalId(3));
        tree.enter(ScopeKind::Block);
        assert_eq!(
            tree.lookup_value(sym("param")),
            Some(ValueDef::Local(LocalId(3)))
        );
        tree.exit();
        tree.exit();
    }

    #[test]
    fn test_lookup_local_is_current_scope_only() {
        let mut tree = ScopeTree::new();
        tree.define_binding(sym("x"), LocalId(0));
        tree.enter(ScopeKind::Block);
        assert_eq!(tree.lookup_local(sym("x")), None);
        tree.define_binding(sym("x"), LocalId(1));
        assert_eq!(tree.lookup_local(sym("x")), Some(LocalId(1)));
        tree.exit();
    }

    #[test]
    fn test_type_namespace_independent_of_values() {
        let mut tree = ScopeTree::new();
        assert!(tree.define_type(sym("T"), TypeDef::Struct(StructId(0))));
        assert!(tree.define_item(sym("T"), ValueDef::Func(FuncId(0))));
        assert_eq!(
            tree.lookup_type(sym("T")),
            Some(TypeDef::Struct(StructId(0)))
        );
        assert_eq!(tree.lookup_value(sym("T")), Some(ValueDef::Func(FuncId(0))));
    }

    #[test]
    fn test_enclosing_self() {
        let mut tree = ScopeTree::new();
        assert_eq!(tree.enclosing_self(), None);
        tree.enter(ScopeKind::Item);
        tree.define_type(sym("Self"), TypeDef::SelfAlias(ImplId(2)));
        tree.enter(ScopeKind::Boundary);
        assert_eq!(tree.enclosing_self(), Some(ImplId(2)));
        tree.exit();
        tree.exit();
    }

    #[test]
    fn test_lookup_type_from_anchored_scope() {
        let mut tree = ScopeTree::new();
        tree.define_type(sym("Root"), TypeDef::Struct(StructId(0)));
        let inner = tree.enter(ScopeKind::Block);
        tree.define_type(sym("Inner"), TypeDef::Struct(StructId(1)));
        tree.exit();
        // Lookup anchored at the inner scope still works after exiting.
        assert_eq!(
            tree.lookup_type_from(inner, sym("Inner")),
            Some(TypeDef::Struct(StructId(1)))
        );
        assert_eq!(
            tree.lookup_type_from(inner, sym("Root")),
            Some(TypeDef::Struct(StructId(0)))
        );
    }
}
