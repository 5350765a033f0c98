//! Numeric operator semantics.
//!
//! Integer and real operands share one set of rules: if either side is real
//! the other is widened and the result is real, otherwise the result is an
//! integer. Integer overflow and integer division (or modulo) by zero are
//! faults. These functions are pure; the evaluator allocates the result.

use tarn_ir::{BinaryOp, UnaryOp};

use crate::diagnostics::FaultKind;
use crate::value::{Payload, Value};

/// Absolute tolerance for real equality.
pub const REAL_EPSILON: f64 = 1e-16;

/// A numeric operand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    /// The numeric view of `value`, if it is an Integer or Real.
    #[inline]
    pub fn of(value: &Value) -> Option<Number> {
        match value.payload {
            Payload::Int(i) => Some(Number::Int(i)),
            Payload::Real(r) => Some(Number::Real(r)),
            _ => None,
        }
    }

    #[inline]
    #[expect(
        clippy::cast_precision_loss,
        reason = "integers widen to real by language rule"
    )]
    pub fn as_real(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Real(r) => r,
        }
    }
}

/// Result of a numeric operator, before allocation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    Int(i64),
    Real(f64),
    Bool(bool),
}

#[inline]
fn overflow(op: BinaryOp) -> FaultKind {
    FaultKind::IntegerOverflow {
        op: op.as_symbol(),
    }
}

#[inline]
fn checked_arith(result: Option<i64>, op: BinaryOp) -> Result<Outcome, FaultKind> {
    result.map(Outcome::Int).ok_or_else(|| overflow(op))
}

/// Checked division or modulo with a zero guard.
#[inline]
fn checked_div<F>(is_zero: bool, f: F, op: BinaryOp) -> Result<Outcome, FaultKind>
where
    F: FnOnce() -> Option<i64>,
{
    if is_zero {
        Err(FaultKind::DivisionByZero)
    } else {
        checked_arith(f(), op)
    }
}

/// Real equality under [`REAL_EPSILON`].
#[inline]
pub fn real_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < REAL_EPSILON
}

/// Apply a non-logical binary operator to two numbers.
///
/// `And` and `Or` are not numeric; they report an invalid operand.
pub fn evaluate_numeric(op: BinaryOp, left: Number, right: Number) -> Result<Outcome, FaultKind> {
    match (left, right) {
        (Number::Int(a), Number::Int(b)) => eval_int_binary(a, b, op),
        _ => eval_real_binary(left.as_real(), right.as_real(), op),
    }
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> Result<Outcome, FaultKind> {
    match op {
        BinaryOp::Add => checked_arith(a.checked_add(b), op),
        BinaryOp::Sub => checked_arith(a.checked_sub(b), op),
        BinaryOp::Mul => checked_arith(a.checked_mul(b), op),
        BinaryOp::Div => checked_div(b == 0, || a.checked_div(b), op),
        BinaryOp::Mod => checked_div(b == 0, || a.checked_rem(b), op),
        BinaryOp::Pow => int_pow(a, b),
        BinaryOp::Eq => Ok(Outcome::Bool(a == b)),
        BinaryOp::NotEq => Ok(Outcome::Bool(a != b)),
        BinaryOp::Lt => Ok(Outcome::Bool(a < b)),
        BinaryOp::LtEq => Ok(Outcome::Bool(a <= b)),
        BinaryOp::Gt => Ok(Outcome::Bool(a > b)),
        BinaryOp::GtEq => Ok(Outcome::Bool(a >= b)),
        BinaryOp::And | BinaryOp::Or => Err(not_logical(op)),
    }
}

/// `Integer ** Integer`; a negative exponent yields a real.
fn int_pow(base: i64, exp: i64) -> Result<Outcome, FaultKind> {
    if exp < 0 {
        let base = Number::Int(base).as_real();
        let exp = i32::try_from(exp).map_or(f64::NEG_INFINITY, f64::from);
        return Ok(Outcome::Real(base.powf(exp)));
    }
    // Bases whose powers never grow are exact for any exponent.
    match base {
        0 | 1 => return Ok(Outcome::Int(if exp == 0 { 1 } else { base })),
        -1 => return Ok(Outcome::Int(if exp % 2 == 0 { 1 } else { -1 })),
        _ => {}
    }
    let exp = u32::try_from(exp).map_err(|_| overflow(BinaryOp::Pow))?;
    checked_arith(base.checked_pow(exp), BinaryOp::Pow)
}

fn eval_real_binary(a: f64, b: f64, op: BinaryOp) -> Result<Outcome, FaultKind> {
    match op {
        BinaryOp::Add => Ok(Outcome::Real(a + b)),
        BinaryOp::Sub => Ok(Outcome::Real(a - b)),
        BinaryOp::Mul => Ok(Outcome::Real(a * b)),
        BinaryOp::Div => Ok(Outcome::Real(a / b)),
        BinaryOp::Mod => Ok(Outcome::Real(a % b)),
        BinaryOp::Pow => Ok(Outcome::Real(a.powf(b))),
        BinaryOp::Eq => Ok(Outcome::Bool(real_eq(a, b))),
        BinaryOp::NotEq => Ok(Outcome::Bool(!real_eq(a, b))),
        BinaryOp::Lt => Ok(Outcome::Bool(a < b)),
        BinaryOp::LtEq => Ok(Outcome::Bool(a <= b || real_eq(a, b))),
        BinaryOp::Gt => Ok(Outcome::Bool(a > b)),
        BinaryOp::GtEq => Ok(Outcome::Bool(a >= b || real_eq(a, b))),
        BinaryOp::And | BinaryOp::Or => Err(not_logical(op)),
    }
}

fn not_logical(op: BinaryOp) -> FaultKind {
    FaultKind::InvalidOperand {
        op: op.as_symbol(),
        ty: "number".to_owned(),
    }
}

/// Numeric negation.
pub fn evaluate_neg(operand: Number) -> Result<Outcome, FaultKind> {
    match operand {
        Number::Int(i) => i.checked_neg().map(Outcome::Int).ok_or(FaultKind::IntegerOverflow {
            op: UnaryOp::Neg.as_symbol(),
        }),
        Number::Real(r) => Ok(Outcome::Real(-r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(op: BinaryOp, a: Number, b: Number) -> Result<Outcome, FaultKind> {
        evaluate_numeric(op, a, b)
    }

    #[test]
    fn test_mixed_operands_widen_to_real() {
        assert_eq!(
            num(BinaryOp::Add, Number::Int(2), Number::Real(1.5)),
            Ok(Outcome::Real(3.5))
        );
        assert_eq!(
            num(BinaryOp::Mul, Number::Real(0.5), Number::Int(4)),
            Ok(Outcome::Real(2.0))
        );
    }

    #[test]
    fn test_integer_results_stay_integer() {
        assert_eq!(
            num(BinaryOp::Mod, Number::Int(7), Number::Int(2)),
            Ok(Outcome::Int(1))
        );
        assert_eq!(
            num(BinaryOp::Div, Number::Int(7), Number::Int(2)),
            Ok(Outcome::Int(3))
        );
        assert_eq!(
            num(BinaryOp::Pow, Number::Int(2), Number::Int(10)),
            Ok(Outcome::Int(1024))
        );
    }

    #[test]
    fn test_integer_faults() {
        assert_eq!(
            num(BinaryOp::Div, Number::Int(1), Number::Int(0)),
            Err(FaultKind::DivisionByZero)
        );
        assert_eq!(
            num(BinaryOp::Mod, Number::Int(1), Number::Int(0)),
            Err(FaultKind::DivisionByZero)
        );
        assert_eq!(
            num(BinaryOp::Add, Number::Int(i64::MAX), Number::Int(1)),
            Err(FaultKind::IntegerOverflow { op: "+" })
        );
        assert_eq!(
            num(BinaryOp::Div, Number::Int(i64::MIN), Number::Int(-1)),
            Err(FaultKind::IntegerOverflow { op: "/" })
        );
        assert_eq!(
            evaluate_neg(Number::Int(i64::MIN)),
            Err(FaultKind::IntegerOverflow { op: "-" })
        );
    }

    #[test]
    fn test_unit_bases_accept_huge_exponents() {
        let huge = Number::Int(5_000_000_000);
        assert_eq!(num(BinaryOp::Pow, Number::Int(1), huge), Ok(Outcome::Int(1)));
        assert_eq!(num(BinaryOp::Pow, Number::Int(0), huge), Ok(Outcome::Int(0)));
        assert_eq!(num(BinaryOp::Pow, Number::Int(-1), huge), Ok(Outcome::Int(1)));
        assert_eq!(
            num(BinaryOp::Pow, Number::Int(-1), Number::Int(5_000_000_001)),
            Ok(Outcome::Int(-1))
        );
        assert_eq!(
            num(BinaryOp::Pow, Number::Int(0), Number::Int(0)),
            Ok(Outcome::Int(1))
        );
        assert_eq!(
            num(BinaryOp::Pow, Number::Int(2), huge),
            Err(FaultKind::IntegerOverflow { op: "**" })
        );
    }

    #[test]
    fn test_negative_exponent_yields_real() {
        assert_eq!(
            num(BinaryOp::Pow, Number::Int(2), Number::Int(-1)),
            Ok(Outcome::Real(0.5))
        );
    }

    #[test]
    fn test_real_equality_uses_epsilon() {
        let sum: f64 = 0.1 + 0.2;
        assert_ne!(sum.to_bits(), 0.3_f64.to_bits());
        assert_eq!(
            num(BinaryOp::Eq, Number::Real(sum), Number::Real(0.3)),
            Ok(Outcome::Bool(true))
        );
        assert_eq!(
            num(BinaryOp::NotEq, Number::Real(sum), Number::Real(0.3)),
            Ok(Outcome::Bool(false))
        );
        assert_eq!(
            num(BinaryOp::Eq, Number::Real(1.0), Number::Real(1.001)),
            Ok(Outcome::Bool(false))
        );
    }

    #[test]
    fn test_real_division_by_zero_is_infinite() {
        assert_eq!(
            num(BinaryOp::Div, Number::Real(1.0), Number::Int(0)),
            Ok(Outcome::Real(f64::INFINITY))
        );
    }
}
