//! Control-flow link validation.
//!
//! The expression checker links every `break`/`continue` to its enclosing
//! loop and every `return` to its function while it descends; this sweep
//! asserts the links and reports the expressions that had nothing to link
//! to: `break`/`continue` outside any loop, `return` outside any function
//! (which can only happen inside a constant initializer).

use rxc_util::diagnostic::codes;
use rxc_util::{DiagnosticBuilder, Handler};

use crate::hir::*;

pub fn validate(program: &Program, handler: &Handler) {
    let mut walker = Walker { program, handler };
    for function in program.functions.iter() {
        if let Some(body) = function.body {
            walker.walk(body);
        }
    }
    for def in program.consts.iter() {
        if let Some(init) = def.init {
            walker.walk(init);
        }
    }
}

struct Walker<'a> {
    program: &'a Program,
    handler: &'a Handler,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, id: ExprId) {
        let expr = self.program.expr(id);
        match &expr.kind {
            ExprKind::Break { value, target } => {
                if target.is_none() {
                    DiagnosticBuilder::error("`break` outside of a loop")
                        .code(codes::BREAK_OUTSIDE_LOOP)
                        .span(expr.span)
                        .emit(self.handler);
                }
                if let Some(value) = value {
                    self.walk(*value);
                }
            }
            ExprKind::Continue { target } => {
                if target.is_none() {
                    DiagnosticBuilder::error("`continue` outside of a loop")
                        .code(codes::CONTINUE_OUTSIDE_LOOP)
                        .span(expr.span)
                        .emit(self.handler);
                }
            }
            ExprKind::Return { value, target } => {
                if target.is_none() {
                    DiagnosticBuilder::error("`return` outside of a function")
                        .code(codes::RETURN_OUTSIDE_FUNCTION)
                        .span(expr.span)
                        .emit(self.handler);
                }
                if let Some(value) = value {
                    self.walk(*value);
                }
            }
            ExprKind::FieldAccess { base, .. } => self.walk(*base),
            ExprKind::Index { base, index } => {
                self.walk(*base);
                self.walk(*index);
            }
            ExprKind::StructLiteral { fields, .. } => {
                for field in fields {
                    self.walk(field.value);
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.walk(*element);
                }
            }
            ExprKind::ArrayRepeat { value, count } => {
                self.walk(*value);
                self.walk(*count);
            }
            ExprKind::Unary { operand, .. } => self.walk(*operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.walk(*lhs);
                self.walk(*rhs);
            }
            ExprKind::Assign { lhs, rhs, .. } => {
                self.walk(*lhs);
                self.walk(*rhs);
            }
            ExprKind::Cast { expr, .. } => self.walk(*expr),
            ExprKind::Call { callee, args } => {
                self.walk(*callee);
                for arg in args {
                    self.walk(*arg);
                }
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                self.walk(*receiver);
                for arg in args {
                    self.walk(*arg);
                }
            }
            ExprKind::If {
                cond,
                then_block,
                else_expr,
            } => {
                self.walk(*cond);
                self.walk(*then_block);
                if let Some(else_expr) = else_expr {
                    self.walk(*else_expr);
                }
            }
            ExprKind::Loop { body } => self.walk(*body),
            ExprKind::While { cond, body } => {
                self.walk(*cond);
                self.walk(*body);
            }
            ExprKind::Block { stmts, tail } => {
                for stmt in stmts {
                    match stmt {
                        Stmt::Let(l) => self.walk(l.init),
                        Stmt::Expr { expr, .. } => self.walk(*expr),
                        Stmt::Item(_) => {}
                    }
                }
                if let Some(tail) = tail {
                    self.walk(*tail);
                }
            }
            ExprKind::Literal(_)
            | ExprKind::Value(_)
            | ExprKind::Underscore => {}
        }
    }
}
