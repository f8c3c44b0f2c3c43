//! End-to-end pipeline scenarios.
//!
//! Each test assembles a program through the AST builder, runs the full
//! analysis, and asserts either a property of the checked HIR or the
//! diagnostics the pipeline produced.

use rxc_ast::build::Builder;
use rxc_ast::{AssocItem, BinOp, Item, UnOp};
use rxc_sem::consts::ConstValue;
use rxc_sem::hir::{ExprKind, ValueState};
use rxc_sem::{analyze, Analysis, ErrorKind};
use rxc_util::Handler;

fn run(ast: &rxc_ast::Ast) -> (Analysis, Handler) {
    let handler = Handler::new();
    let analysis = analyze(ast, &handler);
    (analysis, handler)
}

fn error_kinds(handler: &Handler) -> Vec<ErrorKind> {
    handler
        .diagnostics()
        .iter()
        .filter(|d| d.level == rxc_util::Level::Error)
        .map(|d| ErrorKind::of(d.code.expect("every diagnostic carries a code")))
        .collect()
}

fn assert_clean(handler: &Handler) {
    assert!(
        !handler.has_errors(),
        "unexpected errors: {:?}",
        handler.diagnostics()
    );
}

// ---------------------------------------------------------------------------
// S1: literal integer defaulting
// ---------------------------------------------------------------------------

#[test]
fn s1_literal_integer_defaulting() {
    let b = Builder::new();
    let sum = b.binary(BinOp::Add, b.lit_int(1), b.lit_int(2));
    let ast = b.ast(vec![Item::Const(b.const_item("X", b.ty_i32(), Some(sum)))]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let def = analysis
        .program
        .consts
        .iter()
        .find(|c| c.name.as_str() == "X")
        .expect("constant exists");
    assert_eq!(def.value.value(), Some(&ConstValue::IntSigned(3)));
    assert_eq!(
        analysis.types.display(def.ty.ty(), &analysis.program),
        "i32"
    );

    // The literal nodes carry i32 after checking, not a placeholder.
    for expr in analysis.program.exprs.iter() {
        if matches!(expr.kind, ExprKind::Literal(_)) {
            let info = expr.info();
            assert_eq!(analysis.types.display(info.ty, &analysis.program), "i32");
        }
    }
}

// ---------------------------------------------------------------------------
// S2: mutable borrow through a field
// ---------------------------------------------------------------------------

#[test]
fn s2_mutable_borrow_through_field() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.let_mut("p", None, b.struct_lit("P", vec![("x", b.lit_int(0))])),
            b.let_name("r", None, b.addr_of_mut(b.field(b.name("p"), "x"))),
            b.semi_stmt(b.assign(b.deref(b.name("r")), b.lit_int(7))),
        ],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("P", vec![("x", b.ty_i32())])),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let r = analysis
        .program
        .locals
        .iter()
        .find(|l| l.name.as_str() == "r")
        .expect("local r exists");
    assert_eq!(
        analysis.types.display(r.ty.unwrap(), &analysis.program),
        "&mut i32"
    );

    // `*r = 7` assigns through a mutable place.
    let assign = analysis
        .program
        .exprs
        .iter()
        .find_map(|e| match &e.kind {
            ExprKind::Assign { lhs, .. } => Some(*lhs),
            _ => None,
        })
        .expect("assignment exists");
    let lhs_info = analysis.program.expr(assign).info();
    assert!(lhs_info.is_place);
    assert!(lhs_info.is_mutable_place);
}

// ---------------------------------------------------------------------------
// S3: method autoderef
// ---------------------------------------------------------------------------

#[test]
fn s3_method_autoderef() {
    let b = Builder::new();
    let method = b.method(
        "m",
        b.self_param(true, false),
        vec![],
        Some(b.ty_i32()),
        b.expr_block(b.lit_int(1)),
    );
    let imp = b.impl_inherent(b.ty_path(&["S"]), vec![AssocItem::Fn(method)]);
    let body = b.block(
        vec![
            b.let_name("s", None, b.struct_lit("S", vec![])),
            b.let_name("r", None, b.addr_of(b.name("s"))),
            b.semi_stmt(b.method_call(b.name("r"), "m", vec![])),
        ],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(imp),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let resolved = analysis
        .program
        .exprs
        .iter()
        .find_map(|e| match &e.kind {
            ExprKind::MethodCall { resolved, .. } => Some(*resolved),
            _ => None,
        })
        .expect("method call exists")
        .expect("method call resolved");
    assert_eq!(analysis.program.functions[resolved].name.as_str(), "m");
}

// ---------------------------------------------------------------------------
// S4: missing trait item
// ---------------------------------------------------------------------------

#[test]
fn s4_missing_trait_item() {
    let b = Builder::new();
    let req = b.fn_decl("req", Some(b.self_param(true, false)), vec![], Some(b.ty_i32()));
    let trait_item = b.trait_item("T", vec![AssocItem::Fn(req)]);
    let imp = b.impl_trait("T", b.ty_path(&["S"]), vec![]);
    let ast = b.ast(vec![
        Item::Trait(trait_item),
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(imp),
    ]);
    let (_, handler) = run(&ast);

    let kinds = error_kinds(&handler);
    assert_eq!(kinds, vec![ErrorKind::Trait]);
    let diagnostics = handler.diagnostics();
    assert!(diagnostics[0].message.contains("req"));
}

// ---------------------------------------------------------------------------
// S5: circular type
// ---------------------------------------------------------------------------

#[test]
fn s5_circular_struct() {
    let b = Builder::new();
    let ast = b.ast(vec![Item::Struct(
        b.struct_item("A", vec![("a", b.ty_path(&["A"]))]),
    )]);
    let (analysis, handler) = run(&ast);

    let kinds = error_kinds(&handler);
    assert!(kinds.contains(&ErrorKind::CircularDependency), "{kinds:?}");

    // The definition itself stays consistent.
    let def = analysis
        .program
        .structs
        .iter()
        .find(|s| s.name.as_str() == "A")
        .expect("struct A exists");
    assert_eq!(def.fields.len(), 1);
    assert_eq!(def.fields[0].name.as_str(), "a");
}

// ---------------------------------------------------------------------------
// S6: break type unification
// ---------------------------------------------------------------------------

#[test]
fn s6_break_type_unification() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.semi_stmt(b.break_expr(Some(b.lit_int(1)))),
            b.semi_stmt(b.break_expr(Some(b.lit_int(2)))),
        ],
        None,
    );
    let loop_expr = b.loop_expr(body);
    let ast = b.ast(vec![Item::Fn(b.fn_item(
        "f",
        vec![],
        Some(b.ty_i32()),
        b.expr_block(loop_expr),
    ))]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let loop_info = analysis
        .program
        .exprs
        .iter()
        .find(|e| matches!(e.kind, ExprKind::Loop { .. }))
        .expect("loop exists")
        .info();
    assert_eq!(
        analysis.types.display(loop_info.ty, &analysis.program),
        "i32"
    );
}

#[test]
fn s6_conflicting_break_types() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.semi_stmt(b.break_expr(Some(b.lit_int(1)))),
            b.semi_stmt(b.break_expr(Some(b.lit_bool(true)))),
        ],
        None,
    );
    let loop_expr = b.loop_expr(body);
    let ast = b.ast(vec![Item::Fn(b.fn_item(
        "f",
        vec![],
        Some(b.ty_i32()),
        b.expr_block(loop_expr),
    ))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

// ---------------------------------------------------------------------------
// Boundary behaviors
// ---------------------------------------------------------------------------

#[test]
fn bare_loop_diverges() {
    let b = Builder::new();
    let body = b.block(vec![b.semi_stmt(b.loop_expr(b.empty_block()))], None);
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let loop_info = analysis
        .program
        .exprs
        .iter()
        .find(|e| matches!(e.kind, ExprKind::Loop { .. }))
        .expect("loop exists")
        .info();
    assert!(loop_info.diverges);
    assert_eq!(analysis.types.display(loop_info.ty, &analysis.program), "!");
}

#[test]
fn fully_returning_if_diverges() {
    let b = Builder::new();
    let if_expr = b.if_expr(
        b.lit_bool(true),
        b.expr_block(b.return_expr(Some(b.lit_int(1)))),
        Some(b.block_expr(b.expr_block(b.return_expr(Some(b.lit_int(2)))))),
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item(
        "f",
        vec![],
        Some(b.ty_i32()),
        b.expr_block(if_expr),
    ))]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let if_info = analysis
        .program
        .exprs
        .iter()
        .find(|e| matches!(e.kind, ExprKind::If { .. }))
        .expect("if exists")
        .info();
    assert!(if_info.diverges);
}

#[test]
fn returning_wrong_type_from_if_arm_is_reported() {
    let b = Builder::new();
    let if_expr = b.if_expr(
        b.lit_bool(true),
        b.expr_block(b.return_expr(Some(b.lit_bool(false)))),
        Some(b.block_expr(b.expr_block(b.return_expr(Some(b.lit_int(2)))))),
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item(
        "f",
        vec![],
        Some(b.ty_i32()),
        b.expr_block(if_expr),
    ))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn acyclic_constants_resolve_in_any_order() {
    let b = Builder::new();
    let a_init = b.binary(BinOp::Add, b.name("B"), b.lit_int(1));
    let ast = b.ast(vec![
        Item::Const(b.const_item("A", b.ty_i32(), Some(a_init))),
        Item::Const(b.const_item("B", b.ty_i32(), Some(b.lit_int(2)))),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let value_of = |name: &str| {
        analysis
            .program
            .consts
            .iter()
            .find(|c| c.name.as_str() == name)
            .and_then(|c| c.value.value().cloned())
    };
    assert_eq!(value_of("A"), Some(ConstValue::IntSigned(3)));
    assert_eq!(value_of("B"), Some(ConstValue::IntSigned(2)));
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

#[test]
fn undefined_name_is_a_name_error() {
    let b = Builder::new();
    let body = b.expr_block(b.name("ghost"));
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], Some(b.ty_i32()), body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Name));
}

#[test]
fn duplicate_items_are_reported() {
    let b = Builder::new();
    let ast = b.ast(vec![
        Item::Fn(b.fn_item("f", vec![], None, b.empty_block())),
        Item::Fn(b.fn_item("f", vec![], None, b.empty_block())),
    ]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Name));
}

#[test]
fn enum_variants_resolve_bare_and_qualified() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.let_name("c", None, b.path_expr(&["Color", "Red"])),
            b.let_name("d", Some(b.ty_path(&["Color"])), b.name("Green")),
        ],
        None,
    );
    let ast = b.ast(vec![
        Item::Enum(b.enum_item("Color", &["Red", "Green"])),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let c = analysis
        .program
        .locals
        .iter()
        .find(|l| l.name.as_str() == "c")
        .unwrap();
    assert_eq!(
        analysis.types.display(c.ty.unwrap(), &analysis.program),
        "Color"
    );
}

#[test]
fn associated_const_resolves_and_evaluates() {
    let b = Builder::new();
    let assoc = b.const_item("K", b.ty_i32(), Some(b.lit_int(3)));
    let imp = b.impl_inherent(b.ty_path(&["S"]), vec![AssocItem::Const(assoc)]);
    let body = b.expr_block(b.path_expr(&["S", "K"]));
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(imp),
        Item::Fn(b.fn_item("f", vec![], Some(b.ty_i32()), body)),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let k = analysis
        .program
        .consts
        .iter()
        .find(|c| c.name.as_str() == "K")
        .unwrap();
    assert!(matches!(k.value, ValueState::Resolved(ConstValue::IntSigned(3))));
}

#[test]
fn self_type_resolves_inside_impl() {
    let b = Builder::new();
    let make = b.fn_item(
        "make",
        vec![],
        Some(b.ty_path(&["Self"])),
        b.expr_block(b.struct_lit("S", vec![])),
    );
    let imp = b.impl_inherent(b.ty_path(&["S"]), vec![AssocItem::Fn(make)]);
    let body = b.block(
        vec![b.let_name("s", None, b.call(b.path_expr(&["S", "make"]), vec![]))],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(imp),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let s = analysis
        .program
        .locals
        .iter()
        .find(|l| l.name.as_str() == "s")
        .unwrap();
    assert_eq!(
        analysis.types.display(s.ty.unwrap(), &analysis.program),
        "S"
    );
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

#[test]
fn const_division_by_zero() {
    let b = Builder::new();
    let init = b.binary(BinOp::Div, b.lit_int(1), b.lit_int(0));
    let ast = b.ast(vec![Item::Const(b.const_item("X", b.ty_i32(), Some(init)))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Const));
}

#[test]
fn circular_constant_is_reported() {
    let b = Builder::new();
    let ast = b.ast(vec![Item::Const(b.const_item(
        "A",
        b.ty_i32(),
        Some(b.name("A")),
    ))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::CircularDependency));
}

#[test]
fn array_length_from_constant() {
    let b = Builder::new();
    let annotation = b.ty_array(b.ty_i32(), b.name("N"));
    let init = b.array_repeat(b.lit_int(0), b.name("N"));
    let body = b.block(vec![b.let_name("a", Some(annotation), init)], None);
    let ast = b.ast(vec![
        Item::Const(b.const_item("N", b.ty_usize(), Some(b.lit_int(4)))),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let a = analysis
        .program
        .locals
        .iter()
        .find(|l| l.name.as_str() == "a")
        .unwrap();
    assert_eq!(
        analysis.types.display(a.ty.unwrap(), &analysis.program),
        "[i32; 4]"
    );
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn break_outside_loop_is_a_control_flow_error() {
    let b = Builder::new();
    let body = b.block(vec![b.semi_stmt(b.break_expr(None))], None);
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::ControlFlow));
}

#[test]
fn continue_outside_loop_is_a_control_flow_error() {
    let b = Builder::new();
    let body = b.block(vec![b.semi_stmt(b.continue_expr())], None);
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::ControlFlow));
}

#[test]
fn return_inside_constant_is_a_control_flow_error() {
    let b = Builder::new();
    let ast = b.ast(vec![Item::Const(b.const_item(
        "X",
        b.ty_i32(),
        Some(b.return_expr(Some(b.lit_int(1)))),
    ))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::ControlFlow));
}

#[test]
fn break_with_value_in_while_is_rejected() {
    let b = Builder::new();
    let while_body = b.block(vec![b.semi_stmt(b.break_expr(Some(b.lit_int(1))))], None);
    let body = b.block(
        vec![b.semi_stmt(b.while_expr(b.lit_bool(true), while_body))],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn while_loop_types_as_unit() {
    let b = Builder::new();
    let while_expr = b.while_expr(b.lit_bool(true), b.empty_block());
    let body = b.block(vec![b.semi_stmt(while_expr)], None);
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let info = analysis
        .program
        .exprs
        .iter()
        .find(|e| matches!(e.kind, ExprKind::While { .. }))
        .unwrap()
        .info();
    assert_eq!(analysis.types.display(info.ty, &analysis.program), "()");
    assert!(!info.diverges);
}

// ---------------------------------------------------------------------------
// Places and mutability
// ---------------------------------------------------------------------------

#[test]
fn assignment_to_immutable_local_is_rejected() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.let_name("x", None, b.lit_int(1)),
            b.semi_stmt(b.assign(b.name("x"), b.lit_int(2))),
        ],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn mutable_borrow_of_immutable_local_is_rejected() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.let_name("x", None, b.lit_int(1)),
            b.let_name("r", None, b.addr_of_mut(b.name("x"))),
        ],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn field_mutability_follows_the_reference() {
    let b = Builder::new();
    // Writing a field through `&P` is rejected.
    let ro_body = b.block(
        vec![b.semi_stmt(b.assign(b.field(b.name("p"), "x"), b.lit_int(1)))],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("P", vec![("x", b.ty_i32())])),
        Item::Fn(b.fn_item(
            "ro",
            vec![b.param("p", b.ty_ref(b.ty_path(&["P"]), false))],
            None,
            ro_body,
        )),
    ]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));

    // Writing through `&mut P` is fine.
    let b = Builder::new();
    let rw_body = b.block(
        vec![b.semi_stmt(b.assign(b.field(b.name("p"), "x"), b.lit_int(1)))],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("P", vec![("x", b.ty_i32())])),
        Item::Fn(b.fn_item(
            "rw",
            vec![b.param("p", b.ty_ref(b.ty_path(&["P"]), true))],
            None,
            rw_body,
        )),
    ]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);
}

#[test]
fn underscore_assignment_discards_any_value() {
    let b = Builder::new();
    let body = b.block(
        vec![b.semi_stmt(b.assign(b.underscore(), b.lit_int(3)))],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);
}

// ---------------------------------------------------------------------------
// Methods and calls
// ---------------------------------------------------------------------------

#[test]
fn mut_method_requires_mutable_receiver() {
    let b = Builder::new();
    let method = b.method("touch", b.self_param(true, true), vec![], None, b.empty_block());
    let imp = b.impl_inherent(b.ty_path(&["S"]), vec![AssocItem::Fn(method)]);
    let body = b.block(
        vec![
            b.let_name("s", None, b.struct_lit("S", vec![])),
            b.semi_stmt(b.method_call(b.name("s"), "touch", vec![])),
        ],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(imp),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));

    // The same call on a mutable binding succeeds.
    let b = Builder::new();
    let method = b.method("touch", b.self_param(true, true), vec![], None, b.empty_block());
    let imp = b.impl_inherent(b.ty_path(&["S"]), vec![AssocItem::Fn(method)]);
    let body = b.block(
        vec![
            b.let_mut("s", None, b.struct_lit("S", vec![])),
            b.semi_stmt(b.method_call(b.name("s"), "touch", vec![])),
        ],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(imp),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);
}

#[test]
fn method_not_found_is_reported() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.let_name("s", None, b.struct_lit("S", vec![])),
            b.semi_stmt(b.method_call(b.name("s"), "missing", vec![])),
        ],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("S", vec![])),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn wrong_argument_count_is_reported() {
    let b = Builder::new();
    let ast = b.ast(vec![
        Item::Fn(b.fn_item("g", vec![], None, b.empty_block())),
        Item::Fn(b.fn_item(
            "f",
            vec![],
            None,
            b.block(
                vec![b.semi_stmt(b.call_name("g", vec![b.lit_int(1)]))],
                None,
            ),
        )),
    ]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn builtin_functions_and_methods_are_available() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.let_name("s", None, b.call_name("getString", vec![])),
            b.let_name("n", None, b.method_call(b.name("s"), "len", vec![])),
            b.let_name("view", None, b.method_call(b.name("s"), "as_str", vec![])),
            b.semi_stmt(b.call_name("print", vec![b.lit_str("hi")])),
            b.semi_stmt(b.call_name("printInt", vec![b.lit_int(42)])),
            b.semi_stmt(b.call_name("printlnInt", vec![b.call_name("getInt", vec![])])),
        ],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("main", vec![], None, body))]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let display_of = |name: &str| {
        let local = analysis
            .program
            .locals
            .iter()
            .find(|l| l.name.as_str() == name)
            .unwrap();
        analysis.types.display(local.ty.unwrap(), &analysis.program)
    };
    assert_eq!(display_of("s"), "String");
    assert_eq!(display_of("n"), "usize");
    assert_eq!(display_of("view"), "&str");
}

#[test]
fn string_append_requires_mutable_string() {
    let b = Builder::new();
    let body = b.block(
        vec![
            b.let_mut("s", None, b.call_name("getString", vec![])),
            b.semi_stmt(b.method_call(b.name("s"), "append", vec![b.lit_str("x")])),
        ],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);

    let b = Builder::new();
    let body = b.block(
        vec![
            b.let_name("s", None, b.call_name("getString", vec![])),
            b.semi_stmt(b.method_call(b.name("s"), "append", vec![b.lit_str("x")])),
        ],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn unsigned_to_string_is_available() {
    let b = Builder::new();
    let receiver = b.lit_int_suffixed(3, rxc_ast::IntSuffix::U32);
    let body = b.block(
        vec![b.let_name("t", None, b.method_call(receiver, "to_string", vec![]))],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let t = analysis
        .program
        .locals
        .iter()
        .find(|l| l.name.as_str() == "t")
        .unwrap();
    assert_eq!(
        analysis.types.display(t.ty.unwrap(), &analysis.program),
        "String"
    );
}

#[test]
fn exit_returns_unit_not_never() {
    let b = Builder::new();
    let body = b.block(
        vec![b.let_name("u", Some(b.ty_unit()), b.call_name("exit", vec![b.lit_int(0)]))],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);
}

// ---------------------------------------------------------------------------
// Operators and casts
// ---------------------------------------------------------------------------

#[test]
fn char_casts_are_limited_to_unsigned_words() {
    let b = Builder::new();
    let body = b.block(
        vec![b.let_name("n", None, b.cast(b.lit_char('a'), b.ty_u32()))],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);

    let b = Builder::new();
    let body = b.block(
        vec![b.let_name("n", None, b.cast(b.lit_bool(true), b.ty_i32()))],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn logical_operators_demand_bool() {
    let b = Builder::new();
    let body = b.block(
        vec![b.let_name(
            "x",
            None,
            b.binary(BinOp::And, b.lit_int(1), b.lit_bool(true)),
        )],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn negating_unsigned_is_rejected() {
    let b = Builder::new();
    let value = b.lit_int_suffixed(1, rxc_ast::IntSuffix::U32);
    let body = b.block(vec![b.let_name("x", None, b.neg(value))], None);
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert!(error_kinds(&handler).contains(&ErrorKind::Type));
}

#[test]
fn comparison_yields_bool() {
    let b = Builder::new();
    let body = b.block(
        vec![b.let_name(
            "x",
            Some(b.ty_bool()),
            b.binary(BinOp::Lt, b.lit_int(1), b.lit_int(2)),
        )],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);
}

#[test]
fn bitwise_not_on_integers_is_allowed() {
    let b = Builder::new();
    let body = b.block(
        vec![b.let_name("x", Some(b.ty_i32()), b.unary(UnOp::Not, b.lit_int(5)))],
        None,
    );
    let ast = b.ast(vec![Item::Fn(b.fn_item("f", vec![], None, body))]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[test]
fn satisfied_trait_impl_passes() {
    let b = Builder::new();
    let req = b.fn_decl("req", Some(b.self_param(true, false)), vec![], Some(b.ty_i32()));
    let provided = b.method(
        "req",
        b.self_param(true, false),
        vec![],
        Some(b.ty_i32()),
        b.expr_block(b.lit_int(5)),
    );
    let ast = b.ast(vec![
        Item::Trait(b.trait_item("T", vec![AssocItem::Fn(req)])),
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(b.impl_trait("T", b.ty_path(&["S"]), vec![AssocItem::Fn(provided)])),
    ]);
    let (_, handler) = run(&ast);
    assert_clean(&handler);
}

#[test]
fn trait_signature_mismatch_is_reported() {
    let b = Builder::new();
    let req = b.fn_decl("req", Some(b.self_param(true, false)), vec![], Some(b.ty_i32()));
    let provided = b.method(
        "req",
        b.self_param(true, false),
        vec![],
        Some(b.ty_bool()),
        b.expr_block(b.lit_bool(true)),
    );
    let ast = b.ast(vec![
        Item::Trait(b.trait_item("T", vec![AssocItem::Fn(req)])),
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(b.impl_trait("T", b.ty_path(&["S"]), vec![AssocItem::Fn(provided)])),
    ]);
    let (_, handler) = run(&ast);
    assert_eq!(error_kinds(&handler), vec![ErrorKind::Trait]);
}

#[test]
fn trait_item_kind_mismatch_is_reported() {
    let b = Builder::new();
    let req = b.fn_decl("item", None, vec![], Some(b.ty_i32()));
    let provided = b.const_item("item", b.ty_i32(), Some(b.lit_int(1)));
    let ast = b.ast(vec![
        Item::Trait(b.trait_item("T", vec![AssocItem::Fn(req)])),
        Item::Struct(b.struct_item("S", vec![])),
        Item::Impl(b.impl_trait("T", b.ty_path(&["S"]), vec![AssocItem::Const(provided)])),
    ]);
    let (_, handler) = run(&ast);
    assert_eq!(error_kinds(&handler), vec![ErrorKind::Trait]);
}

// ---------------------------------------------------------------------------
// Struct literals
// ---------------------------------------------------------------------------

#[test]
fn missing_and_unknown_struct_fields_are_reported() {
    let b = Builder::new();
    let body = b.block(
        vec![b.let_name(
            "p",
            None,
            b.struct_lit("P", vec![("y", b.lit_int(1))]),
        )],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("P", vec![("x", b.ty_i32())])),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (_, handler) = run(&ast);
    let kinds = error_kinds(&handler);
    // One unknown field plus one missing field.
    assert_eq!(kinds, vec![ErrorKind::Type, ErrorKind::Type]);
}

#[test]
fn struct_literal_field_indices_are_resolved() {
    let b = Builder::new();
    let body = b.block(
        vec![b.let_name(
            "p",
            None,
            b.struct_lit("P", vec![("y", b.lit_int(2)), ("x", b.lit_int(1))]),
        )],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("P", vec![("x", b.ty_i32()), ("y", b.ty_i32())])),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let fields = analysis
        .program
        .exprs
        .iter()
        .find_map(|e| match &e.kind {
            ExprKind::StructLiteral { fields, .. } => Some(fields.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(fields[0].index, Some(1));
    assert_eq!(fields[1].index, Some(0));
}

// ---------------------------------------------------------------------------
// Whole-program invariants
// ---------------------------------------------------------------------------

#[test]
fn info_is_total_and_places_are_consistent() {
    // A program touching most expression kinds; after a clean run, every
    // expression node carries info and `is_mutable_place` implies
    // `is_place`.
    let b = Builder::new();
    let method = b.method(
        "bump",
        b.self_param(true, true),
        vec![b.param("by", b.ty_i32())],
        None,
        b.block(
            vec![b.semi_stmt(b.assign_op(
                BinOp::Add,
                b.field(b.path_expr(&["self"]), "x"),
                b.name("by"),
            ))],
            None,
        ),
    );
    let imp = b.impl_inherent(b.ty_path(&["P"]), vec![AssocItem::Fn(method)]);
    let loop_body = b.block(vec![b.semi_stmt(b.break_expr(Some(b.lit_int(3))))], None);
    let body = b.block(
        vec![
            b.let_mut("p", None, b.struct_lit("P", vec![("x", b.lit_int(1))])),
            b.semi_stmt(b.method_call(b.name("p"), "bump", vec![b.lit_int(2)])),
            b.let_name("n", None, b.loop_expr(loop_body)),
            b.let_mut("arr", None, b.array_lit(vec![b.lit_int(1), b.lit_int(2)])),
            b.semi_stmt(b.assign(b.index(b.name("arr"), b.lit_int(0)), b.name("n"))),
            b.let_name("c", None, b.cast(b.name("n"), b.ty_u32())),
            b.semi_stmt(b.if_expr(
                b.binary(BinOp::Lt, b.name("n"), b.lit_int(10)),
                b.expr_block(b.call_name("printInt", vec![b.name("n")])),
                None,
            )),
        ],
        None,
    );
    let ast = b.ast(vec![
        Item::Struct(b.struct_item("P", vec![("x", b.ty_i32())])),
        Item::Impl(imp),
        Item::Fn(b.fn_item("f", vec![], None, body)),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    for expr in analysis.program.exprs.iter() {
        let info = expr
            .info
            .unwrap_or_else(|| panic!("missing info on {:?}", expr.kind));
        if info.is_mutable_place {
            assert!(info.is_place, "mutable place that is not a place");
        }
    }
}

// ---------------------------------------------------------------------------
// Printer
// ---------------------------------------------------------------------------

#[test]
fn printer_renders_checked_program() {
    let b = Builder::new();
    let sum = b.binary(BinOp::Add, b.lit_int(1), b.lit_int(2));
    let ast = b.ast(vec![
        Item::Const(b.const_item("X", b.ty_i32(), Some(sum))),
        Item::Struct(b.struct_item("P", vec![("x", b.ty_i32())])),
        Item::Fn(b.fn_item(
            "three",
            vec![],
            Some(b.ty_i32()),
            b.expr_block(b.name("X")),
        )),
    ]);
    let (analysis, handler) = run(&ast);
    assert_clean(&handler);

    let rendered = rxc_sem::print::print_program(&analysis.program, &analysis.types);
    assert!(rendered.contains("const X: i32 = 3;"));
    assert!(rendered.contains("struct P {"));
    assert!(rendered.contains("fn three() -> i32"));
}
