#![expect(clippy::unwrap_used, reason = "tests unwrap freely")]

use std::rc::Rc;

use pretty_assertions::assert_eq;
use tarn_ir::{AstBuilder, NodeKind, SharedInterner};

use super::*;
use crate::gc::Heap;

fn noop(_: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    Ok(ValueRef::Nil)
}

#[test]
fn test_singletons_are_not_heap_handles() {
    for v in [ValueRef::Nil, ValueRef::True, ValueRef::False] {
        assert!(v.as_gc().is_none());
    }
    assert_eq!(ValueRef::bool(true), ValueRef::True);
    assert_eq!(ValueRef::bool(false), ValueRef::False);
    assert_eq!(ValueRef::True.as_bool(), Some(true));
    assert_eq!(ValueRef::Nil.as_bool(), None);
}

#[test]
fn test_truthiness() {
    let mut heap = Heap::new();
    let zero = ValueRef::Heap(heap.insert(Value::new(TypeId::INTEGER, Payload::Int(0))).unwrap());
    assert!(!ValueRef::Nil.is_truthy());
    assert!(!ValueRef::False.is_truthy());
    assert!(ValueRef::True.is_truthy());
    assert!(zero.is_truthy());
}

#[test]
fn test_native_arity() {
    let interner = SharedInterner::new();
    let name = interner.intern("f");
    let fixed = NativeFunction::new(name, 2, false, noop);
    assert!(fixed.accepts(2));
    assert!(!fixed.accepts(1));
    assert!(!fixed.accepts(3));

    let variadic = NativeFunction::new(name, 1, true, noop);
    assert!(!variadic.accepts(0));
    assert!(variadic.accepts(1));
    assert!(variadic.accepts(5));
}

fn user_function(variadic: bool, receiver: bool) -> UserFunction {
    let interner = SharedInterner::new();
    let b = AstBuilder::new(&interner, "test.tn");
    let node = if variadic {
        b.variadic_func("f", &["a", "rest"], vec![])
    } else {
        b.func("f", &["a", "b"], vec![])
    };
    let NodeKind::FnDecl(def) = node.kind else {
        panic!("expected a function declaration");
    };
    UserFunction {
        def,
        scope: ScopeId::GLOBAL,
        receiver: receiver.then(|| interner.intern("self")),
    }
}

#[test]
fn test_user_function_params() {
    let plain = user_function(false, false);
    assert_eq!(plain.param_count(), 2);
    assert_eq!(plain.required(), 2);

    let method = user_function(false, true);
    assert_eq!(method.param_count(), 3);
    assert_eq!(method.required(), 3);
    assert_eq!(method.params().next(), method.receiver);

    let variadic = user_function(true, false);
    assert_eq!(variadic.param_count(), 2);
    assert_eq!(variadic.required(), 1);
}

#[test]
fn test_payload_callable() {
    let interner = SharedInterner::new();
    let native = Rc::new(NativeFunction::new(interner.intern("g"), 0, false, noop));
    let callable = Payload::Builtin(Rc::clone(&native)).as_callable().unwrap();
    assert_eq!(callable.name(), native.name);
    assert!(Payload::Int(3).as_callable().is_none());
    assert!(Payload::Type(TypeId::INTEGER).as_callable().is_none());
}

#[test]
fn test_payload_trace_reports_elements() {
    let mut heap = Heap::new();
    let a = heap.insert(Value::new(TypeId::INTEGER, Payload::Int(1))).unwrap();
    let b = heap.insert(Value::new(TypeId::INTEGER, Payload::Int(2))).unwrap();
    let vector = Payload::Vector(vec![ValueRef::Heap(a), ValueRef::Nil, ValueRef::Heap(b)]);

    let mut out = Vec::new();
    vector.trace(&mut out);
    assert_eq!(out, vec![a, b]);

    let mut out = Vec::new();
    Payload::Str("x".to_owned()).trace(&mut out);
    assert!(out.is_empty());
}

#[test]
fn test_value_accessors() {
    assert_eq!(Value::new(TypeId::INTEGER, Payload::Int(4)).as_int(), Some(4));
    assert_eq!(Value::new(TypeId::REAL, Payload::Real(0.5)).as_real(), Some(0.5));
    assert_eq!(
        Value::new(TypeId::STRING, Payload::Str("hi".to_owned())).as_str(),
        Some("hi")
    );
    assert_eq!(Value::new(TypeId::INTEGER, Payload::Int(4)).as_str(), None);
}
