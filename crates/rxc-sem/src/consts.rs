//! Constant values and the arithmetic applied to them.
//!
//! The evaluator itself lives in the finalization pass (it needs the
//! recursion guard and the type resolver); this module holds the value
//! representation and the pure operator semantics so they can be tested in
//! isolation.
//!
//! Integer semantics are fixed for portability: all arithmetic wraps modulo
//! 2^32, for signed and unsigned alike. The evaluator distinguishes only
//! signedness; whether a value fits `i32` vs `isize` is the expression
//! checker's concern at the point of consumption.

use rxc_ast::{BinOp, IntSuffix, Lit, UnOp};
use rxc_util::Symbol;

use crate::hir::{ConstId, ExprId, Program, ValueSlot, ValueState};

/// An evaluated constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    IntSigned(i64),
    IntUnsigned(u64),
    Bool(bool),
    Char(char),
    String(Symbol),
}

impl ConstValue {
    /// The value as an array length: a non-negative integer.
    pub fn as_length(&self) -> Option<u64> {
        match self {
            ConstValue::IntSigned(v) if *v >= 0 => Some(*v as u64),
            ConstValue::IntUnsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ConstValue::IntSigned(_) | ConstValue::IntUnsigned(_))
    }
}

/// Why a constant expression failed to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// The expression kind is outside the const-evaluable subset.
    NotConst,
    DivisionByZero,
    /// Unary minus on an unsigned value.
    NegateUnsigned,
    /// Signed and unsigned operands mixed in one operator.
    MixedSignedness,
    /// Operand types do not fit the operator (e.g. `!` on a char).
    InvalidOperand,
    /// A referenced constant already failed; the original error was
    /// reported, so callers stay silent on this one.
    Poisoned,
}

/// Signedness context for defaulting unsuffixed integer literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Signed,
    Unsigned,
}

/// Convert a literal into a constant, defaulting unsuffixed integers by the
/// surrounding signedness context (signed when there is none).
pub fn literal_value(lit: &Lit, hint: Option<Sign>) -> ConstValue {
    match lit {
        Lit::Int { value, suffix } => match suffix {
            Some(IntSuffix::I32) | Some(IntSuffix::Isize) => {
                ConstValue::IntSigned(wrap_signed(*value as i64))
            }
            Some(IntSuffix::U32) | Some(IntSuffix::Usize) => {
                ConstValue::IntUnsigned(wrap_unsigned(*value))
            }
            None => match hint {
                Some(Sign::Unsigned) => ConstValue::IntUnsigned(wrap_unsigned(*value)),
                _ => ConstValue::IntSigned(wrap_signed(*value as i64)),
            },
        },
        Lit::Bool(b) => ConstValue::Bool(*b),
        Lit::Char(c) => ConstValue::Char(*c),
        Lit::Str(s) => ConstValue::String(*s),
    }
}

/// Evaluate a constant expression against a program whose constants have
/// already been finalized.
///
/// This is the evaluator the expression checker uses for lengths that show
/// up inside bodies (array-repeat counts): by then every `ConstDef` is
/// `Resolved` or `Error`, so no recursive resolution is needed. The
/// finalization pass has its own evaluator with the recursion guard.
pub fn eval_resolved(
    program: &Program,
    expr: ExprId,
    hint: Option<Sign>,
) -> Result<ConstValue, EvalErrorKind> {
    use crate::hir::ExprKind;

    match &program.expr(expr).kind {
        ExprKind::Literal(lit) => Ok(literal_value(lit, hint)),
        ExprKind::Value(ValueSlot::Const(cid)) => lookup_resolved(program, *cid),
        ExprKind::Value(ValueSlot::Error) => Err(EvalErrorKind::Poisoned),
        ExprKind::Value(_) => Err(EvalErrorKind::NotConst),
        ExprKind::Unary { op, operand } => {
            let operand_hint = match op {
                rxc_ast::UnOp::Neg => Some(Sign::Signed),
                _ => hint,
            };
            let value = eval_resolved(program, *operand, operand_hint)?;
            apply_unop(*op, &value)
        }
        ExprKind::Binary { op, lhs, rhs } => {
            if op.is_logical() {
                let lhs = eval_resolved(program, *lhs, None)?;
                match (op, &lhs) {
                    (BinOp::And, ConstValue::Bool(false)) => return Ok(ConstValue::Bool(false)),
                    (BinOp::Or, ConstValue::Bool(true)) => return Ok(ConstValue::Bool(true)),
                    (_, ConstValue::Bool(_)) => {}
                    _ => return Err(EvalErrorKind::InvalidOperand),
                }
                let rhs = eval_resolved(program, *rhs, None)?;
                return apply_binop(*op, &lhs, &rhs);
            }
            let operand_hint = if op.is_comparison() { None } else { hint };
            let lhs = eval_resolved(program, *lhs, operand_hint)?;
            let rhs = eval_resolved(program, *rhs, operand_hint)?;
            apply_binop(*op, &lhs, &rhs)
        }
        _ => Err(EvalErrorKind::NotConst),
    }
}

fn lookup_resolved(program: &Program, cid: ConstId) -> Result<ConstValue, EvalErrorKind> {
    match &program.consts[cid].value {
        ValueState::Resolved(value) => Ok(value.clone()),
        _ => Err(EvalErrorKind::Poisoned),
    }
}

/// Wrap a signed 64-bit intermediate into the 32-bit value domain.
fn wrap_signed(v: i64) -> i64 {
    v as i32 as i64
}

/// Wrap an unsigned 64-bit intermediate into the 32-bit value domain.
fn wrap_unsigned(v: u64) -> u64 {
    v as u32 as u64
}

/// Apply a unary operator to a constant.
pub fn apply_unop(op: UnOp, value: &ConstValue) -> Result<ConstValue, EvalErrorKind> {
    match (op, value) {
        (UnOp::Not, ConstValue::Bool(b)) => Ok(ConstValue::Bool(!b)),
        (UnOp::Neg, ConstValue::IntSigned(v)) => {
            Ok(ConstValue::IntSigned(wrap_signed(v.wrapping_neg())))
        }
        (UnOp::Neg, ConstValue::IntUnsigned(_)) => Err(EvalErrorKind::NegateUnsigned),
        (UnOp::Not | UnOp::Neg, _) => Err(EvalErrorKind::InvalidOperand),
        // References and dereferences have no constant meaning here.
        (UnOp::Deref | UnOp::Ref | UnOp::RefMut, _) => Err(EvalErrorKind::NotConst),
    }
}

/// Apply a non-short-circuiting binary operator to two constants.
///
/// `&&`/`||` are handled by the evaluator before the right operand is even
/// evaluated; passing them here means both sides were already needed, so
/// plain boolean logic applies.
pub fn apply_binop(
    op: BinOp,
    lhs: &ConstValue,
    rhs: &ConstValue,
) -> Result<ConstValue, EvalErrorKind> {
    use ConstValue::*;

    match (lhs, rhs) {
        (IntSigned(a), IntSigned(b)) => signed_binop(op, *a, *b),
        (IntUnsigned(a), IntUnsigned(b)) => unsigned_binop(op, *a, *b),
        (IntSigned(_), IntUnsigned(_)) | (IntUnsigned(_), IntSigned(_)) => {
            Err(EvalErrorKind::MixedSignedness)
        }
        (Bool(a), Bool(b)) => match op {
            BinOp::Eq => Ok(Bool(a == b)),
            BinOp::Ne => Ok(Bool(a != b)),
            BinOp::And => Ok(Bool(*a && *b)),
            BinOp::Or => Ok(Bool(*a || *b)),
            _ => Err(EvalErrorKind::InvalidOperand),
        },
        (Char(a), Char(b)) if op.is_comparison() => Ok(Bool(compare(op, a, b))),
        (String(a), String(b)) if op.is_equality() => match op {
            BinOp::Eq => Ok(Bool(a == b)),
            _ => Ok(Bool(a != b)),
        },
        _ => Err(EvalErrorKind::InvalidOperand),
    }
}

fn compare<T: Ord>(op: BinOp, a: &T, b: &T) -> bool {
    match op {
        BinOp::Eq => a == b,
        BinOp::Ne => a != b,
        BinOp::Lt => a < b,
        BinOp::Le => a <= b,
        BinOp::Gt => a > b,
        BinOp::Ge => a >= b,
        _ => unreachable!("compare called with non-comparison operator"),
    }
}

fn signed_binop(op: BinOp, a: i64, b: i64) -> Result<ConstValue, EvalErrorKind> {
    use ConstValue::*;
    if op.is_comparison() {
        return Ok(Bool(compare(op, &a, &b)));
    }
    let (a32, b32) = (a as i32, b as i32);
    let result = match op {
        BinOp::Add => a32.wrapping_add(b32),
        BinOp::Sub => a32.wrapping_sub(b32),
        BinOp::Mul => a32.wrapping_mul(b32),
        BinOp::Div => {
            if b32 == 0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            a32.wrapping_div(b32)
        }
        BinOp::Rem => {
            if b32 == 0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            a32.wrapping_rem(b32)
        }
        BinOp::BitAnd => a32 & b32,
        BinOp::BitOr => a32 | b32,
        BinOp::BitXor => a32 ^ b32,
        // Shift counts are masked into 0..32, the wrapping semantics.
        BinOp::Shl => a32.wrapping_shl(b32 as u32),
        BinOp::Shr => a32.wrapping_shr(b32 as u32),
        BinOp::And | BinOp::Or => return Err(EvalErrorKind::InvalidOperand),
        _ => unreachable!("comparisons handled above"),
    };
    Ok(IntSigned(wrap_signed(result as i64)))
}

fn unsigned_binop(op: BinOp, a: u64, b: u64) -> Result<ConstValue, EvalErrorKind> {
    use ConstValue::*;
    if op.is_comparison() {
        return Ok(Bool(compare(op, &a, &b)));
    }
    let (a32, b32) = (a as u32, b as u32);
    let result = match op {
        BinOp::Add => a32.wrapping_add(b32),
        BinOp::Sub => a32.wrapping_sub(b32),
        BinOp::Mul => a32.wrapping_mul(b32),
        BinOp::Div => {
            if b32 == 0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            a32 / b32
        }
        BinOp::Rem => {
            if b32 == 0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            a32 % b32
        }
        BinOp::BitAnd => a32 & b32,
        BinOp::BitOr => a32 | b32,
        BinOp::BitXor => a32 ^ b32,
        BinOp::Shl => a32.wrapping_shl(b32),
        BinOp::Shr => a32.wrapping_shr(b32),
        BinOp::And | BinOp::Or => return Err(EvalErrorKind::InvalidOperand),
        _ => unreachable!("comparisons handled above"),
    };
    Ok(IntUnsigned(wrap_unsigned(result as u64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConstValue::*;

    #[test]
    fn test_signed_arithmetic() {
        assert_eq!(apply_binop(BinOp::Add, &IntSigned(1), &IntSigned(2)), Ok(IntSigned(3)));
        assert_eq!(apply_binop(BinOp::Sub, &IntSigned(1), &IntSigned(2)), Ok(IntSigned(-1)));
        assert_eq!(apply_binop(BinOp::Mul, &IntSigned(6), &IntSigned(7)), Ok(IntSigned(42)));
        assert_eq!(apply_binop(BinOp::Div, &IntSigned(7), &IntSigned(2)), Ok(IntSigned(3)));
        assert_eq!(apply_binop(BinOp::Rem, &IntSigned(7), &IntSigned(2)), Ok(IntSigned(1)));
    }

    #[test]
    fn test_signed_overflow_wraps() {
        let max = i32::MAX as i64;
        assert_eq!(
            apply_binop(BinOp::Add, &IntSigned(max), &IntSigned(1)),
            Ok(IntSigned(i32::MIN as i64))
        );
        assert_eq!(
            apply_binop(BinOp::Div, &IntSigned(i32::MIN as i64), &IntSigned(-1)),
            Ok(IntSigned(i32::MIN as i64))
        );
    }

    #[test]
    fn test_unsigned_overflow_wraps() {
        let max = u32::MAX as u64;
        assert_eq!(
            apply_binop(BinOp::Add, &IntUnsigned(max), &IntUnsigned(1)),
            Ok(IntUnsigned(0))
        );
        assert_eq!(
            apply_binop(BinOp::Sub, &IntUnsigned(0), &IntUnsigned(1)),
            Ok(IntUnsigned(max))
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            apply_binop(BinOp::Div, &IntSigned(1), &IntSigned(0)),
            Err(EvalErrorKind::DivisionByZero)
        );
        assert_eq!(
            apply_binop(BinOp::Rem, &IntUnsigned(1), &IntUnsigned(0)),
            Err(EvalErrorKind::DivisionByZero)
        );
    }

    #[test]
    fn test_mixed_signedness_rejected() {
        assert_eq!(
            apply_binop(BinOp::Add, &IntSigned(1), &IntUnsigned(1)),
            Err(EvalErrorKind::MixedSignedness)
        );
    }

    #[test]
    fn test_negate() {
        assert_eq!(apply_unop(UnOp::Neg, &IntSigned(5)), Ok(IntSigned(-5)));
        assert_eq!(
            apply_unop(UnOp::Neg, &IntUnsigned(5)),
            Err(EvalErrorKind::NegateUnsigned)
        );
    }

    #[test]
    fn test_not_on_bool_only() {
        assert_eq!(apply_unop(UnOp::Not, &Bool(true)), Ok(Bool(false)));
        assert_eq!(
            apply_unop(UnOp::Not, &IntSigned(1)),
            Err(EvalErrorKind::InvalidOperand)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(apply_binop(BinOp::Lt, &IntSigned(1), &IntSigned(2)), Ok(Bool(true)));
        assert_eq!(apply_binop(BinOp::Ge, &IntUnsigned(2), &IntUnsigned(2)), Ok(Bool(true)));
        assert_eq!(apply_binop(BinOp::Ne, &Char('a'), &Char('b')), Ok(Bool(true)));
        assert_eq!(apply_binop(BinOp::Eq, &Bool(true), &Bool(false)), Ok(Bool(false)));
    }

    #[test]
    fn test_string_equality_only() {
        let a = String(Symbol::intern("a"));
        let b = Symbol::intern("b");
        assert_eq!(apply_binop(BinOp::Eq, &a, &a.clone()), Ok(Bool(true)));
        assert_eq!(apply_binop(BinOp::Ne, &a, &String(b)), Ok(Bool(true)));
        assert_eq!(
            apply_binop(BinOp::Lt, &a, &String(b)),
            Err(EvalErrorKind::InvalidOperand)
        );
    }

    #[test]
    fn test_shifts_mask_count() {
        assert_eq!(
            apply_binop(BinOp::Shl, &IntUnsigned(1), &IntUnsigned(33)),
            Ok(IntUnsigned(2))
        );
        assert_eq!(
            apply_binop(BinOp::Shr, &IntSigned(-8), &IntSigned(1)),
            Ok(IntSigned(-4))
        );
    }

    #[test]
    fn test_as_length() {
        assert_eq!(IntSigned(4).as_length(), Some(4));
        assert_eq!(IntUnsigned(0).as_length(), Some(0));
        assert_eq!(IntSigned(-1).as_length(), None);
        assert_eq!(Bool(true).as_length(), None);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let a = apply_binop(BinOp::Mul, &IntSigned(1234), &IntSigned(5678));
        let b = apply_binop(BinOp::Mul, &IntSigned(1234), &IntSigned(5678));
        assert_eq!(a, b);
    }
}
