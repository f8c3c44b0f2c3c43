//! A debug renderer for checked programs.
//!
//! Renders the HIR after the pipeline has run, with resolved types on
//! bindings and expressions spelled out. The output is for humans and
//! golden tests, in the style of a MIR dump: field accesses show their
//! resolved indices, method calls show the resolved target, and every
//! `let` shows the type the checker assigned.

use crate::consts::ConstValue;
use crate::hir::*;
use crate::ty::TypeTable;

pub fn print_program(program: &Program, types: &TypeTable) -> String {
    let printer = Printer { program, types };
    let mut out = String::new();
    for item in &program.root_items {
        printer.print_item(&mut out, *item, 0);
        out.push('\n');
    }
    out
}

struct Printer<'a> {
    program: &'a Program,
    types: &'a TypeTable,
}

impl<'a> Printer<'a> {
    fn ty(&self, slot: &TypeSlot) -> String {
        match slot {
            TypeSlot::Resolved(tid) => self.types.display(*tid, self.program),
            TypeSlot::Unresolved { .. } => "<unresolved>".to_owned(),
        }
    }

    fn indent(out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("    ");
        }
    }

    fn print_item(&self, out: &mut String, item: ItemRef, depth: usize) {
        match item {
            ItemRef::Struct(sid) => {
                let def = &self.program.structs[sid];
                Self::indent(out, depth);
                out.push_str(&format!("struct {} {{\n", def.name));
                for field in &def.fields {
                    Self::indent(out, depth + 1);
                    out.push_str(&format!("{}: {},\n", field.name, self.ty(&field.ty)));
                }
                Self::indent(out, depth);
                out.push_str("}\n");
            }
            ItemRef::Enum(eid) => {
                let def = &self.program.enums[eid];
                Self::indent(out, depth);
                out.push_str(&format!("enum {} {{ ", def.name));
                for (i, variant) in def.variants.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(variant.as_str());
                }
                out.push_str(" }\n");
            }
            ItemRef::Const(cid) => {
                let def = &self.program.consts[cid];
                Self::indent(out, depth);
                out.push_str(&format!("const {}: {}", def.name, self.ty(&def.ty)));
                match &def.value {
                    ValueState::Resolved(value) => {
                        out.push_str(&format!(" = {}", render_const(value)))
                    }
                    ValueState::Error => out.push_str(" = <error>"),
                    ValueState::Unresolved => {}
                }
                out.push_str(";\n");
            }
            ItemRef::Trait(tid) => {
                let def = &self.program.traits[tid];
                Self::indent(out, depth);
                out.push_str(&format!("trait {} {{\n", def.name));
                for assoc in &def.items {
                    self.print_assoc(out, *assoc, depth + 1);
                }
                Self::indent(out, depth);
                out.push_str("}\n");
            }
            ItemRef::Impl(iid) => {
                let def = &self.program.impls[iid];
                Self::indent(out, depth);
                match &def.trait_ref {
                    Some(TraitRef::Resolved(tid)) => out.push_str(&format!(
                        "impl {} for {} {{\n",
                        self.program.traits[*tid].name,
                        self.ty(&def.self_ty)
                    )),
                    _ => out.push_str(&format!("impl {} {{\n", self.ty(&def.self_ty))),
                }
                for assoc in &def.items {
                    self.print_assoc(out, *assoc, depth + 1);
                }
                Self::indent(out, depth);
                out.push_str("}\n");
            }
            ItemRef::Func(fid) => self.print_fn(out, fid, depth),
        }
    }

    fn print_assoc(&self, out: &mut String, assoc: AssocItem, depth: usize) {
        match assoc {
            AssocItem::Func(fid) => self.print_fn(out, fid, depth),
            AssocItem::Const(cid) => self.print_item(out, ItemRef::Const(cid), depth),
        }
    }

    fn print_fn(&self, out: &mut String, fid: FuncId, depth: usize) {
        let f = &self.program.functions[fid];
        Self::indent(out, depth);
        out.push_str(&format!("fn {}(", f.name));
        let mut first = true;
        if let Some(sp) = f.self_param {
            out.push_str(match (sp.is_reference, sp.mutable) {
                (true, true) => "&mut self",
                (true, false) => "&self",
                (false, true) => "mut self",
                (false, false) => "self",
            });
            first = false;
        }
        for param in &f.params {
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(&format!("{}: {}", self.pat(&param.pat), self.ty(&param.ty)));
        }
        out.push_str(&format!(") -> {}", self.ty(&f.ret_ty)));
        match f.body {
            Some(body) => {
                out.push(' ');
                self.print_expr(out, body, depth);
                out.push('\n');
            }
            None => out.push_str(";\n"),
        }
    }

    fn pat(&self, pat: &Pat) -> String {
        match &pat.kind {
            PatKind::Binding { local, by_ref } => {
                let l = &self.program.locals[*local];
                let mut s = String::new();
                if *by_ref {
                    s.push_str("ref ");
                }
                if l.mutable {
                    s.push_str("mut ");
                }
                s.push_str(l.name.as_str());
                s
            }
            PatKind::Wildcard => "_".to_owned(),
            PatKind::Ref { inner, mutable } => {
                format!("&{}{}", if *mutable { "mut " } else { "" }, self.pat(inner))
            }
            PatKind::Literal { .. } => "<literal>".to_owned(),
            PatKind::Path(_) => "<path>".to_owned(),
        }
    }

    fn print_expr(&self, out: &mut String, id: ExprId, depth: usize) {
        let expr = self.program.expr(id);
        match &expr.kind {
            ExprKind::Literal(lit) => out.push_str(&render_lit(lit)),
            ExprKind::Value(slot) => out.push_str(&self.value_name(slot)),
            ExprKind::FieldAccess { base, selector } => {
                self.print_expr(out, *base, depth);
                match selector {
                    FieldSelector::Index(i) => out.push_str(&format!(".{i}")),
                    FieldSelector::Name(name) => out.push_str(&format!(".{name}?")),
                }
            }
            ExprKind::Index { base, index } => {
                self.print_expr(out, *base, depth);
                out.push('[');
                self.print_expr(out, *index, depth);
                out.push(']');
            }
            ExprKind::StructLiteral { target, fields } => {
                match target.struct_id() {
                    Some(sid) => out.push_str(self.program.structs[sid].name.as_str()),
                    None => out.push_str("<error>"),
                }
                out.push_str(" { ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&format!("{}: ", field.name));
                    self.print_expr(out, field.value, depth);
                }
                out.push_str(" }");
            }
            ExprKind::ArrayLiteral(elements) => {
                out.push('[');
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.print_expr(out, *e, depth);
                }
                out.push(']');
            }
            ExprKind::ArrayRepeat { value, count } => {
                out.push('[');
                self.print_expr(out, *value, depth);
                out.push_str("; ");
                self.print_expr(out, *count, depth);
                out.push(']');
            }
            ExprKind::Unary { op, operand } => {
                out.push_str(match op {
                    rxc_ast::UnOp::Not => "!",
                    rxc_ast::UnOp::Neg => "-",
                    rxc_ast::UnOp::Deref => "*",
                    rxc_ast::UnOp::Ref => "&",
                    rxc_ast::UnOp::RefMut => "&mut ",
                });
                self.print_expr(out, *operand, depth);
            }
            ExprKind::Binary { op, lhs, rhs } => {
                out.push('(');
                self.print_expr(out, *lhs, depth);
                out.push_str(&format!(" {} ", op.symbol()));
                self.print_expr(out, *rhs, depth);
                out.push(')');
            }
            ExprKind::Assign { lhs, rhs, op } => {
                self.print_expr(out, *lhs, depth);
                match op {
                    Some(op) => out.push_str(&format!(" {}= ", op.symbol())),
                    None => out.push_str(" = "),
                }
                self.print_expr(out, *rhs, depth);
            }
            ExprKind::Cast { expr, target } => {
                self.print_expr(out, *expr, depth);
                out.push_str(&format!(" as {}", self.ty(target)));
            }
            ExprKind::Call { callee, args } => {
                self.print_expr(out, *callee, depth);
                out.push('(');
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.print_expr(out, *a, depth);
                }
                out.push(')');
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                resolved,
            } => {
                self.print_expr(out, *receiver, depth);
                out.push_str(&format!(".{method}"));
                if resolved.is_some() {
                    out.push_str("/*resolved*/");
                }
                out.push('(');
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.print_expr(out, *a, depth);
                }
                out.push(')');
            }
            ExprKind::If {
                cond,
                then_block,
                else_expr,
            } => {
                out.push_str("if ");
                self.print_expr(out, *cond, depth);
                out.push(' ');
                self.print_expr(out, *then_block, depth);
                if let Some(else_expr) = else_expr {
                    out.push_str(" else ");
                    self.print_expr(out, *else_expr, depth);
                }
            }
            ExprKind::Loop { body } => {
                out.push_str("loop ");
                self.print_expr(out, *body, depth);
            }
            ExprKind::While { cond, body } => {
                out.push_str("while ");
                self.print_expr(out, *cond, depth);
                out.push(' ');
                self.print_expr(out, *body, depth);
            }
            ExprKind::Break { value, .. } => {
                out.push_str("break");
                if let Some(value) = value {
                    out.push(' ');
                    self.print_expr(out, *value, depth);
                }
            }
            ExprKind::Continue { .. } => out.push_str("continue"),
            ExprKind::Return { value, .. } => {
                out.push_str("return");
                if let Some(value) = value {
                    out.push(' ');
                    self.print_expr(out, *value, depth);
                }
            }
            ExprKind::Block { stmts, tail } => {
                out.push_str("{\n");
                for stmt in stmts {
                    self.print_stmt(out, stmt, depth + 1);
                }
                if let Some(tail) = tail {
                    Self::indent(out, depth + 1);
                    self.print_expr(out, *tail, depth + 1);
                    out.push('\n');
                }
                Self::indent(out, depth);
                out.push('}');
            }
            ExprKind::Underscore => out.push('_'),
        }
    }

    fn print_stmt(&self, out: &mut String, stmt: &Stmt, depth: usize) {
        match stmt {
            Stmt::Let(l) => {
                Self::indent(out, depth);
                out.push_str(&format!("let {}", self.pat(&l.pat)));
                let shown_ty = match &l.ty {
                    Some(slot) => self.ty(slot),
                    None => match self.bound_ty(&l.pat) {
                        Some(ty) => ty,
                        None => "_".to_owned(),
                    },
                };
                out.push_str(&format!(": {shown_ty} = "));
                self.print_expr(out, l.init, depth);
                out.push_str(";\n");
            }
            Stmt::Expr { expr, semi } => {
                Self::indent(out, depth);
                self.print_expr(out, *expr, depth);
                if *semi {
                    out.push(';');
                }
                out.push('\n');
            }
            Stmt::Item(item) => self.print_item(out, *item, depth),
        }
    }

    /// The checker-assigned type of a pattern's binding, for display when
    /// the source had no annotation.
    fn bound_ty(&self, pat: &Pat) -> Option<String> {
        match &pat.kind {
            PatKind::Binding { local, .. } => {
                let ty = self.program.locals[*local].ty?;
                Some(self.types.display(ty, self.program))
            }
            PatKind::Ref { inner, .. } => self.bound_ty(inner),
            _ => None,
        }
    }

    fn value_name(&self, slot: &ValueSlot) -> String {
        match slot {
            ValueSlot::Local(local) => self.program.locals[*local].name.as_str().to_owned(),
            ValueSlot::Const(cid) => self.program.consts[*cid].name.as_str().to_owned(),
            ValueSlot::Func(fid) => self.program.functions[*fid].name.as_str().to_owned(),
            ValueSlot::StructConst(sid) => self.program.structs[*sid].name.as_str().to_owned(),
            ValueSlot::EnumVariant(eid, index) => {
                let def = &self.program.enums[*eid];
                format!("{}::{}", def.name, def.variants[*index])
            }
            ValueSlot::Error => "<error>".to_owned(),
            ValueSlot::Unresolved(_) => "<unresolved>".to_owned(),
        }
    }
}

fn render_lit(lit: &rxc_ast::Lit) -> String {
    match lit {
        rxc_ast::Lit::Int { value, .. } => value.to_string(),
        rxc_ast::Lit::Bool(b) => b.to_string(),
        rxc_ast::Lit::Char(c) => format!("{c:?}"),
        rxc_ast::Lit::Str(s) => format!("{:?}", s.as_str()),
    }
}

fn render_const(value: &ConstValue) -> String {
    match value {
        ConstValue::IntSigned(v) => v.to_string(),
        ConstValue::IntUnsigned(v) => v.to_string(),
        ConstValue::Bool(b) => b.to_string(),
        ConstValue::Char(c) => format!("{c:?}"),
        ConstValue::String(s) => format!("{:?}", s.as_str()),
    }
}
