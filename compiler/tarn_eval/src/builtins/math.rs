//! The `math` module.

use std::rc::Rc;

use crate::diagnostics::FaultKind;
use crate::errors::RuntimeError;
use crate::interpreter::Interpreter;
use crate::operators::Number;
use crate::types::TypeId;
use crate::value::{EvalResult, NativeFunction, Payload, Value, ValueRef};

use super::NativeSpec;

const MEMBERS: &[NativeSpec] = &[
    ("sqrt", 1, false, sqrt),
    ("abs", 1, false, abs),
    ("floor", 1, false, floor),
];

pub(super) fn install(interp: &mut Interpreter) -> Result<(), RuntimeError> {
    let module = interp.intern("math");
    interp.modules.register(module)?;

    let pi = interp.try_alloc(Value::new(TypeId::REAL, Payload::Real(std::f64::consts::PI)))?;
    let name = interp.intern("pi");
    interp.modules.insert_member(module, name, pi)?;

    for &(name, arity, variadic, func) in MEMBERS {
        let name = interp.intern(name);
        let native = NativeFunction::new(name, arity, variadic, func);
        let value = interp.try_alloc(Value::new(
            TypeId::BUILTIN_FN,
            Payload::Builtin(Rc::new(native)),
        ))?;
        interp.modules.insert_member(module, name, value)?;
    }
    Ok(())
}

fn number(interp: &Interpreter, v: ValueRef, op: &'static str) -> Result<Number, FaultKind> {
    Number::of(interp.value(v)).ok_or_else(|| FaultKind::InvalidOperand {
        op,
        ty: interp.type_name(v).to_owned(),
    })
}

fn sqrt(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let n = number(interp, args[0], "sqrt")?;
    Ok(interp.alloc_real(n.as_real().sqrt()))
}

/// Keeps the argument's type; `abs(i64::MIN)` overflows.
fn abs(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    Ok(match number(interp, args[0], "abs")? {
        Number::Int(i) => {
            let abs = i
                .checked_abs()
                .ok_or(FaultKind::IntegerOverflow { op: "abs" })?;
            interp.alloc_int(abs)
        }
        Number::Real(r) => interp.alloc_real(r.abs()),
    })
}

/// Always a Real, like the host `floor`.
fn floor(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let n = number(interp, args[0], "floor")?;
    Ok(interp.alloc_real(n.as_real().floor()))
}
