//! Predefined items.
//!
//! Seeds the root scope before name resolution runs: the primitive type
//! names, the opaque `String` type, the built-in free functions, and the
//! inherent methods on `String`, `str`, and the unsigned word types.
//! Builtin functions are ordinary [`Function`] entries without bodies, and
//! builtin methods hang off ordinary [`ImplDef`]s whose self types are
//! already resolved, so every later pass treats them like user code.

use rxc_ast::{NodeId, PrimTy};
use rxc_util::{Span, Symbol};

use crate::hir::*;
use crate::scope::{ScopeTree, TypeDef, ValueDef};
use crate::ty::{TypeId, TypeTable};

/// Handles to the seeded entities later passes may want by identity.
#[derive(Debug)]
pub struct Builtins {
    pub string_struct: StructId,
    pub string_ty: TypeId,
}

const BUILTIN_ORIGIN: NodeId = NodeId(u32::MAX);

pub fn seed(
    program: &mut Program,
    types: &mut TypeTable,
    scopes: &mut ScopeTree,
    impl_table: &mut ImplTable,
) -> Builtins {
    // Primitive names live in the root type namespace so `u32::to_string`
    // and friends resolve like any other associated path.
    for prim in [
        PrimTy::I32,
        PrimTy::U32,
        PrimTy::Isize,
        PrimTy::Usize,
        PrimTy::Bool,
        PrimTy::Char,
        PrimTy::Str,
    ] {
        scopes.define_type(Symbol::intern(prim.name()), TypeDef::Prim(prim));
    }

    // `String`: an opaque struct, usable only through its methods.
    let string_struct = program.structs.push(StructDef {
        name: Symbol::intern("String"),
        fields: Vec::new(),
        origin: BUILTIN_ORIGIN,
        span: Span::DUMMY,
    });
    scopes.define_type(Symbol::intern("String"), TypeDef::Struct(string_struct));
    let string_ty = types.mk_struct(string_struct);

    let str_ty = types.str();
    let str_ref = types.mk_ref(str_ty, false);
    let str_ref_mut = types.mk_ref(str_ty, true);
    let i32_ty = types.i32();
    let u32_ty = types.u32();
    let usize_ty = types.usize_ty();
    let unit = types.unit();

    // Free functions.
    for (name, params, ret) in [
        ("print", vec![str_ref], unit),
        ("println", vec![str_ref], unit),
        ("printInt", vec![i32_ty], unit),
        ("printlnInt", vec![i32_ty], unit),
        ("getString", vec![], string_ty),
        ("getInt", vec![], i32_ty),
        // `exit` terminates the process at runtime, but its declared
        // signature stays `()`.
        ("exit", vec![i32_ty], unit),
    ] {
        let fid = push_function(program, name, None, params, ret);
        scopes.define_item(Symbol::intern(name), ValueDef::Func(fid));
    }

    // Inherent methods, one builtin impl block per receiver type.
    let to_string_u32 = push_method(program, "to_string", false, vec![], string_ty);
    push_impl(program, impl_table, u32_ty, vec![to_string_u32]);

    let to_string_usize = push_method(program, "to_string", false, vec![], string_ty);
    push_impl(program, impl_table, usize_ty, vec![to_string_usize]);

    let as_str = push_method(program, "as_str", false, vec![], str_ref);
    let as_mut_str = push_method(program, "as_mut_str", true, vec![], str_ref_mut);
    let len_string = push_method(program, "len", false, vec![], usize_ty);
    let append = push_method(program, "append", true, vec![str_ref], unit);
    push_impl(
        program,
        impl_table,
        string_ty,
        vec![as_str, as_mut_str, len_string, append],
    );

    let len_str = push_method(program, "len", false, vec![], usize_ty);
    push_impl(program, impl_table, str_ty, vec![len_str]);

    Builtins {
        string_struct,
        string_ty,
    }
}

fn push_function(
    program: &mut Program,
    name: &str,
    self_param: Option<SelfParam>,
    params: Vec<TypeId>,
    ret: TypeId,
) -> FuncId {
    let params = params
        .into_iter()
        .map(|ty| Param {
            pat: Pat {
                kind: PatKind::Wildcard,
                span: Span::DUMMY,
            },
            ty: TypeSlot::resolved(ty),
        })
        .collect();
    program.functions.push(Function {
        name: Symbol::intern(name),
        self_param,
        self_local: None,
        params,
        ret_ty: TypeSlot::resolved(ret),
        body: None,
        locals: Vec::new(),
        owner_impl: None,
        origin: BUILTIN_ORIGIN,
        span: Span::DUMMY,
    })
}

fn push_method(
    program: &mut Program,
    name: &str,
    mutable_self: bool,
    params: Vec<TypeId>,
    ret: TypeId,
) -> FuncId {
    push_function(
        program,
        name,
        Some(SelfParam {
            is_reference: true,
            mutable: mutable_self,
        }),
        params,
        ret,
    )
}

fn push_impl(
    program: &mut Program,
    impl_table: &mut ImplTable,
    self_ty: TypeId,
    methods: Vec<FuncId>,
) -> ImplId {
    let items: Vec<AssocItem> = methods.iter().map(|&fid| AssocItem::Func(fid)).collect();
    let iid = program.impls.push(ImplDef {
        trait_ref: None,
        self_ty: TypeSlot::resolved(self_ty),
        items,
        origin: BUILTIN_ORIGIN,
        span: Span::DUMMY,
    });
    for fid in methods {
        program.functions[fid].owner_impl = Some(iid);
    }
    impl_table.add(self_ty, iid);
    iid
}
