//! Builtin method tables.
//!
//! BaseObject carries the defaults every type inherits: operators that
//! evaluate to `nil`, identity equality, `str`, `dbg`, `hash` and the `new`
//! constructor. Builtin types override what they give meaning to.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use tarn_ir::BinaryOp;

use super::NativeSpec;
use crate::diagnostics::FaultKind;
use crate::interpreter::Interpreter;
use crate::operators::{evaluate_neg, evaluate_numeric, Number};
use crate::types::{TypeId, TypeKind};
use crate::value::{EvalResult, Payload, Value, ValueRef};

/// Largest string a builtin will build, in bytes.
pub(crate) const MAX_STRING_BYTES: usize = 1 << 30;

/// Method tables, installed in this order.
pub(super) const TABLES: &[(TypeId, &[NativeSpec])] = &[
    (TypeId::BASE_OBJECT, BASE_OBJECT),
    (TypeId::NIL, NIL),
    (TypeId::BOOLEAN, BOOLEAN),
    (TypeId::INTEGER, NUMERIC),
    (TypeId::REAL, NUMERIC),
    (TypeId::STRING, STRING),
    (TypeId::VECTOR, VECTOR),
    (TypeId::TYPE, TYPE),
];

const BASE_OBJECT: &[NativeSpec] = &[
    ("add", 1, true, object_nil),
    ("sub", 1, true, object_nil),
    ("mul", 1, true, object_nil),
    ("div", 1, true, object_nil),
    ("mod", 1, true, object_nil),
    ("pow", 1, true, object_nil),
    ("lt", 1, true, object_nil),
    ("le", 1, true, object_nil),
    ("gt", 1, true, object_nil),
    ("ge", 1, true, object_nil),
    ("neg", 1, true, object_nil),
    ("not", 1, true, object_nil),
    ("index", 1, true, object_nil),
    ("eq", 2, false, object_eq),
    ("ne", 2, false, object_ne),
    ("str", 1, false, object_str),
    ("dbg", 1, false, object_dbg),
    ("hash", 1, false, object_hash),
    ("new", 1, true, object_new),
];

const NIL: &[NativeSpec] = &[("new", 1, true, nil_new)];

const BOOLEAN: &[NativeSpec] = &[("not", 1, false, bool_not), ("new", 1, true, bool_new)];

const NUMERIC: &[NativeSpec] = &[
    ("add", 2, false, num_add),
    ("sub", 2, false, num_sub),
    ("mul", 2, false, num_mul),
    ("div", 2, false, num_div),
    ("mod", 2, false, num_mod),
    ("pow", 2, false, num_pow),
    ("eq", 2, false, num_eq),
    ("ne", 2, false, num_ne),
    ("lt", 2, false, num_lt),
    ("le", 2, false, num_le),
    ("gt", 2, false, num_gt),
    ("ge", 2, false, num_ge),
    ("neg", 1, false, num_neg),
    ("new", 1, true, num_new),
];

const STRING: &[NativeSpec] = &[
    ("add", 2, false, str_add),
    ("mul", 2, false, str_mul),
    ("eq", 2, false, str_eq),
    ("ne", 2, false, str_ne),
    ("lt", 2, false, str_lt),
    ("le", 2, false, str_le),
    ("gt", 2, false, str_gt),
    ("ge", 2, false, str_ge),
    ("len", 1, false, str_len),
    ("new", 1, true, str_new),
];

const VECTOR: &[NativeSpec] = &[
    ("add", 2, false, vec_add),
    ("push", 2, false, vec_push),
    ("len", 1, false, vec_len),
    ("new", 1, true, vec_new),
];

const TYPE: &[NativeSpec] = &[
    ("eq", 2, false, type_eq),
    ("ne", 2, false, type_ne),
    ("name", 1, false, type_name),
];

// BaseObject

fn object_nil(_: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    Ok(ValueRef::Nil)
}

fn object_eq(_: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[a, b] = args else {
        return Ok(ValueRef::Nil);
    };
    Ok(ValueRef::bool(a == b))
}

fn object_ne(_: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[a, b] = args else {
        return Ok(ValueRef::Nil);
    };
    Ok(ValueRef::bool(a != b))
}

fn object_str(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v] = args else {
        return Ok(ValueRef::Nil);
    };
    let text = interp.render_payload(v)?;
    Ok(interp.alloc_str(text))
}

fn object_dbg(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v] = args else {
        return Ok(ValueRef::Nil);
    };
    let text = interp.render_dbg(v)?;
    Ok(interp.alloc_str(text))
}

fn object_hash(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v] = args else {
        return Ok(ValueRef::Nil);
    };
    let hash = match &interp.value(v).payload {
        Payload::Nil => 0,
        Payload::Bool(b) => i64::from(*b),
        Payload::Int(i) => *i,
        // Adding +0.0 folds -0.0 into 0.0. Reals equal only under the
        // epsilon rule still hash apart.
        Payload::Real(r) => i64::from_ne_bytes((r + 0.0).to_bits().to_ne_bytes()),
        Payload::Str(s) => fx_hash(s),
        _ => fx_hash(&v),
    };
    Ok(interp.alloc_int(hash))
}

fn fx_hash<T: Hash + ?Sized>(value: &T) -> i64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    i64::from_ne_bytes(hasher.finish().to_ne_bytes())
}

/// Construct an instance of the receiver type, filling members in order.
/// Missing members are `nil`; surplus arguments are an arity fault.
fn object_new(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let Some((&receiver, fields)) = args.split_first() else {
        return Ok(ValueRef::Nil);
    };
    let ty = match interp.value(receiver).payload {
        Payload::Type(ty) => ty,
        _ => interp.type_of(receiver),
    };
    let Some(info) = interp.types().get(ty) else {
        return Ok(ValueRef::Nil);
    };
    if info.kind() != TypeKind::Object || ty == TypeId::BASE_OBJECT {
        return Err(FaultKind::InvalidOperand {
            op: "new",
            ty: interp.interner().lookup(info.name()).to_owned(),
        });
    }
    let expected = info.members().len();
    if fields.len() > expected {
        return Err(FaultKind::ArityMismatch {
            callee: interp.interner().lookup(info.name()).to_owned(),
            expected,
            got: fields.len(),
        });
    }
    let mut slots = fields.to_vec();
    slots.resize(expected, ValueRef::Nil);
    interp
        .types_mut()
        .seal(ty)
        .map_err(|_| FaultKind::UnknownType {
            name: format!("{ty:?}"),
        })?;
    Ok(interp.alloc(Value::new(ty, Payload::Instance(slots))))
}

// Nil and Boolean

fn nil_new(_: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    Ok(ValueRef::Nil)
}

fn bool_not(_: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v] = args else {
        return Ok(ValueRef::Nil);
    };
    Ok(v.as_bool().map_or(ValueRef::Nil, |b| ValueRef::bool(!b)))
}

/// `Boolean(x)`: truthiness of `x`; `false` with no argument.
fn bool_new(_: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    Ok(ValueRef::bool(args.get(1).is_some_and(|v| v.is_truthy())))
}

// Integer and Real

/// Numeric operator as a method. A non-numeric right operand makes `eq`
/// false, `ne` true and everything else `nil`.
fn numeric(interp: &mut Interpreter, args: &[ValueRef], op: BinaryOp) -> EvalResult {
    let &[l, r] = args else {
        return Ok(ValueRef::Nil);
    };
    match (Number::of(interp.value(l)), Number::of(interp.value(r))) {
        (Some(a), Some(b)) => {
            let outcome = evaluate_numeric(op, a, b)?;
            Ok(interp.alloc_outcome(outcome))
        }
        _ => Ok(match op {
            BinaryOp::Eq => ValueRef::False,
            BinaryOp::NotEq => ValueRef::True,
            _ => ValueRef::Nil,
        }),
    }
}

macro_rules! numeric_methods {
    ($($name:ident => $op:expr),* $(,)?) => {
        $(
            fn $name(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
                numeric(interp, args, $op)
            }
        )*
    };
}

numeric_methods! {
    num_add => BinaryOp::Add,
    num_sub => BinaryOp::Sub,
    num_mul => BinaryOp::Mul,
    num_div => BinaryOp::Div,
    num_mod => BinaryOp::Mod,
    num_pow => BinaryOp::Pow,
    num_eq => BinaryOp::Eq,
    num_ne => BinaryOp::NotEq,
    num_lt => BinaryOp::Lt,
    num_le => BinaryOp::LtEq,
    num_gt => BinaryOp::Gt,
    num_ge => BinaryOp::GtEq,
}

fn num_neg(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v] = args else {
        return Ok(ValueRef::Nil);
    };
    match Number::of(interp.value(v)) {
        Some(n) => {
            let outcome = evaluate_neg(n)?;
            Ok(interp.alloc_outcome(outcome))
        }
        None => Ok(ValueRef::Nil),
    }
}

/// `Integer(x)` / `Real(x)`: numeric conversion. Strings are parsed;
/// booleans map to 0 and 1; no argument gives zero.
fn num_new(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let Some((&receiver, rest)) = args.split_first() else {
        return Ok(ValueRef::Nil);
    };
    let target = match interp.value(receiver).payload {
        Payload::Type(ty) => ty,
        _ => interp.type_of(receiver),
    };
    let source = match rest {
        [] => Number::Int(0),
        [arg] => to_number(interp, *arg)?,
        _ => {
            return Err(FaultKind::ArityMismatch {
                callee: interp.interner().lookup(interp.types().name_of(target)).to_owned(),
                expected: 1,
                got: rest.len(),
            })
        }
    };
    Ok(if target == TypeId::REAL {
        interp.alloc_real(source.as_real())
    } else {
        match source {
            Number::Int(i) => interp.alloc_int(i),
            Number::Real(r) => interp.alloc_int(truncate(r)),
        }
    })
}

fn to_number(interp: &Interpreter, v: ValueRef) -> Result<Number, FaultKind> {
    let value = interp.value(v);
    if let Some(n) = Number::of(value) {
        return Ok(n);
    }
    let parsed = match &value.payload {
        Payload::Bool(b) => Some(Number::Int(i64::from(*b))),
        Payload::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::Int)
                .or_else(|_| s.parse::<f64>().map(Number::Real))
                .ok()
        }
        _ => None,
    };
    parsed.ok_or_else(|| FaultKind::InvalidOperand {
        op: "new",
        ty: interp.type_name(v).to_owned(),
    })
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Integer(real) truncates toward zero, saturating"
)]
fn truncate(r: f64) -> i64 {
    r.trunc() as i64
}

// String

fn str_pair(interp: &Interpreter, args: &[ValueRef]) -> Option<(String, String)> {
    let &[l, r] = args else {
        return None;
    };
    let l = interp.value(l).as_str()?;
    let r = interp.value(r).as_str()?;
    Some((l.to_owned(), r.to_owned()))
}

/// Concatenation; a non-string right operand is rendered first.
fn str_add(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[l, r] = args else {
        return Ok(ValueRef::Nil);
    };
    let Some(left) = interp.value(l).as_str().map(str::to_owned) else {
        return Ok(ValueRef::Nil);
    };
    let right = match interp.value(r).as_str() {
        Some(s) => s.to_owned(),
        None => interp.render(r)?,
    };
    Ok(interp.alloc_str(left + &right))
}

fn str_mul(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[l, r] = args else {
        return Ok(ValueRef::Nil);
    };
    let (Some(s), Some(n)) = (interp.value(l).as_str(), interp.value(r).as_int()) else {
        return Ok(ValueRef::Nil);
    };
    let count = usize::try_from(n).map_err(|_| FaultKind::InvalidOperand {
        op: "*",
        ty: "negative Integer".to_owned(),
    })?;
    let fits = matches!(s.len().checked_mul(count), Some(total) if total <= MAX_STRING_BYTES);
    if !fits {
        return Err(FaultKind::SizeLimit {
            op: "*",
            limit: MAX_STRING_BYTES,
        });
    }
    let repeated = s.repeat(count);
    Ok(interp.alloc_str(repeated))
}

macro_rules! string_comparisons {
    ($($name:ident => $test:path, $mismatch:expr);* $(;)?) => {
        $(
            fn $name(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
                Ok(match str_pair(interp, args) {
                    Some((l, r)) => ValueRef::bool($test(l.cmp(&r))),
                    None => $mismatch,
                })
            }
        )*
    };
}

string_comparisons! {
    str_eq => Ordering::is_eq, ValueRef::False;
    str_ne => Ordering::is_ne, ValueRef::True;
    str_lt => Ordering::is_lt, ValueRef::Nil;
    str_le => Ordering::is_le, ValueRef::Nil;
    str_gt => Ordering::is_gt, ValueRef::Nil;
    str_ge => Ordering::is_ge, ValueRef::Nil;
}

fn str_len(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v] = args else {
        return Ok(ValueRef::Nil);
    };
    let Some(len) = interp.value(v).as_str().map(|s| s.chars().count()) else {
        return Ok(ValueRef::Nil);
    };
    Ok(interp.alloc_int(i64::try_from(len).unwrap_or(i64::MAX)))
}

/// `String(x)`: the `str` rendering of `x`; empty with no argument.
fn str_new(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let text = match args.get(1) {
        Some(&v) => interp.render(v)?,
        None => String::new(),
    };
    Ok(interp.alloc_str(text))
}

// Vector

fn vec_items(interp: &Interpreter, v: ValueRef) -> Option<&[ValueRef]> {
    match &interp.value(v).payload {
        Payload::Vector(items) => Some(items),
        _ => None,
    }
}

fn vec_add(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[l, r] = args else {
        return Ok(ValueRef::Nil);
    };
    let (Some(a), Some(b)) = (vec_items(interp, l), vec_items(interp, r)) else {
        return Ok(ValueRef::Nil);
    };
    let joined: Vec<ValueRef> = a.iter().chain(b).copied().collect();
    Ok(interp.alloc_payload(TypeId::VECTOR, Payload::Vector(joined)))
}

/// Append in place; returns the receiver.
fn vec_push(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v, item] = args else {
        return Ok(ValueRef::Nil);
    };
    match interp.value_mut(v).map(|value| &mut value.payload) {
        Some(Payload::Vector(items)) => {
            items.push(item);
            Ok(v)
        }
        _ => Ok(ValueRef::Nil),
    }
}

fn vec_len(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v] = args else {
        return Ok(ValueRef::Nil);
    };
    let Some(len) = vec_items(interp, v).map(<[ValueRef]>::len) else {
        return Ok(ValueRef::Nil);
    };
    Ok(interp.alloc_int(i64::try_from(len).unwrap_or(i64::MAX)))
}

/// `Vector(a, b, ...)`.
fn vec_new(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let items = args.get(1..).unwrap_or_default().to_vec();
    Ok(interp.alloc_payload(TypeId::VECTOR, Payload::Vector(items)))
}

// Type

fn described(interp: &Interpreter, v: ValueRef) -> Option<TypeId> {
    match interp.value(v).payload {
        Payload::Type(ty) => Some(ty),
        _ => None,
    }
}

fn type_eq(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[l, r] = args else {
        return Ok(ValueRef::Nil);
    };
    let same = described(interp, l).is_some_and(|a| described(interp, r) == Some(a));
    Ok(ValueRef::bool(same))
}

fn type_ne(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let equal = type_eq(interp, args)?;
    Ok(ValueRef::bool(equal == ValueRef::False))
}

fn type_name(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let &[v] = args else {
        return Ok(ValueRef::Nil);
    };
    let Some(ty) = described(interp, v) else {
        return Ok(ValueRef::Nil);
    };
    let name = interp.interner().lookup(interp.types().name_of(ty));
    Ok(interp.alloc_str(name))
}
