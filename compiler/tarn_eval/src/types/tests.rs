#![expect(clippy::unwrap_used, reason = "tests unwrap freely")]

use std::mem::size_of;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tarn_ir::{SourceLoc, StringInterner};

use super::*;
use crate::interpreter::Interpreter;
use crate::value::{EvalResult, NativeFunction, ValueRef};

fn noop(_: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    Ok(ValueRef::Nil)
}

fn method(interner: &StringInterner, name: &str) -> Callable {
    Callable::Native(Rc::new(NativeFunction::new(
        interner.intern(name),
        0,
        true,
        noop,
    )))
}

/// A <- B <- C, all plain object types.
fn chain_abc(interner: &StringInterner, registry: &mut TypeRegistry) -> (TypeId, TypeId, TypeId) {
    let a = registry
        .make(TypeKind::Object, TypeId::BASE_OBJECT, interner.intern("A"))
        .unwrap();
    let b = registry
        .make(TypeKind::Object, a, interner.intern("B"))
        .unwrap();
    let c = registry
        .make(TypeKind::Object, b, interner.intern("C"))
        .unwrap();
    (a, b, c)
}

#[test]
fn test_bootstrap_types_are_registered_in_order() {
    let interner = StringInterner::new();
    let registry = TypeRegistry::new(&interner);
    assert_eq!(registry.find(interner.intern("Integer")), Some(TypeId::INTEGER));
    assert_eq!(registry.find(interner.intern("Type")), Some(TypeId::TYPE));
    assert_eq!(registry.len(), 11);
}

#[test]
fn test_base_object_is_self_parented() {
    let interner = StringInterner::new();
    let registry = TypeRegistry::new(&interner);
    let base = registry.get(TypeId::BASE_OBJECT).unwrap();
    assert_eq!(base.derived_from(), TypeId::BASE_OBJECT);
    assert_eq!(registry.chain(TypeId::BASE_OBJECT).count(), 1);
}

#[test]
fn test_instance_size_follows_kind() {
    let interner = StringInterner::new();
    let registry = TypeRegistry::new(&interner);
    assert_eq!(registry.get(TypeId::INTEGER).unwrap().size(), size_of::<i64>());
    assert_eq!(registry.get(TypeId::REAL).unwrap().size(), size_of::<f64>());
    assert_eq!(registry.get(TypeId::STRING).unwrap().size(), size_of::<usize>());
}

#[test]
fn test_make_rejects_empty_name() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let err = registry.make(TypeKind::Object, TypeId::BASE_OBJECT, interner.intern(""));
    assert_eq!(err, Err(RuntimeError::InvalidArgument));
}

#[test]
fn test_make_rejects_self_parent() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let next = TypeId(u32::try_from(registry.len()).unwrap());
    let err = registry.make(TypeKind::Object, next, interner.intern("Loop"));
    assert_eq!(err, Err(RuntimeError::InvalidArgument));
}

#[test]
fn test_make_rejects_duplicate_name() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let err = registry.make(TypeKind::Object, TypeId::BASE_OBJECT, interner.intern("Integer"));
    assert_eq!(err, Err(RuntimeError::KeyAlreadyInTable));
}

#[test]
fn test_insert_member_assigns_offsets_and_grows_size() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let point = registry
        .make(TypeKind::Object, TypeId::BASE_OBJECT, interner.intern("Point"))
        .unwrap();
    let base = size_of::<usize>();

    let x = registry
        .insert_member(point, interner.intern("x"), TypeId::INTEGER)
        .unwrap();
    let y = registry
        .insert_member(point, interner.intern("y"), TypeId::REAL)
        .unwrap();

    assert_eq!(x, base);
    assert_eq!(y, base + size_of::<i64>());
    assert_eq!(
        registry.get(point).unwrap().size(),
        base + size_of::<i64>() + size_of::<f64>()
    );
    let (position, member) = registry.lookup_member(point, interner.intern("y")).unwrap();
    assert_eq!(position, 1);
    assert_eq!(member.ty, TypeId::REAL);
}

#[test]
fn test_insert_member_rejected_after_seal() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let point = registry
        .make(TypeKind::Object, TypeId::BASE_OBJECT, interner.intern("Point"))
        .unwrap();
    registry.seal(point).unwrap();
    let err = registry.insert_member(point, interner.intern("x"), TypeId::INTEGER);
    assert_eq!(err, Err(RuntimeError::InvalidArgument));
}

#[test]
fn test_insert_member_rejects_duplicate() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let point = registry
        .make(TypeKind::Object, TypeId::BASE_OBJECT, interner.intern("Point"))
        .unwrap();
    let x = interner.intern("x");
    registry.insert_member(point, x, TypeId::INTEGER).unwrap();
    assert_eq!(
        registry.insert_member(point, x, TypeId::INTEGER),
        Err(RuntimeError::KeyAlreadyInTable)
    );
}

#[test]
fn test_method_on_root_resolves_from_leaf() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let (a, _, c) = chain_abc(&interner, &mut registry);
    registry
        .insert_method(a, method(&interner, "greet"), SourceLoc::DUMMY)
        .unwrap();

    let resolved = registry.lookup_method(c, interner.intern("greet")).unwrap();
    assert_eq!(resolved.owner, a);
}

#[test]
fn test_redefinition_shadows_for_descendants_only() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let (a, b, c) = chain_abc(&interner, &mut registry);
    let greet = interner.intern("greet");
    registry
        .insert_method(a, method(&interner, "greet"), SourceLoc::DUMMY)
        .unwrap();
    registry
        .insert_method(b, method(&interner, "greet"), SourceLoc::DUMMY)
        .unwrap();

    assert_eq!(registry.lookup_method(a, greet).unwrap().owner, a);
    assert_eq!(registry.lookup_method(b, greet).unwrap().owner, b);
    assert_eq!(registry.lookup_method(c, greet).unwrap().owner, b);
}

#[test]
fn test_insert_method_replaces_same_name() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let (a, _, _) = chain_abc(&interner, &mut registry);
    let file = interner.intern("patch.tn");
    registry
        .insert_method(a, method(&interner, "greet"), SourceLoc::new(file, 1, 1))
        .unwrap();
    registry
        .insert_method(a, method(&interner, "greet"), SourceLoc::new(file, 9, 1))
        .unwrap();

    let info = registry.get(a).unwrap();
    assert_eq!(info.method_count(), 1);
    let resolved = registry.lookup_method(a, interner.intern("greet")).unwrap();
    assert_eq!(resolved.entry.loc.line, 9);
}

#[test]
fn test_missing_method_is_method_not_found() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let (_, _, c) = chain_abc(&interner, &mut registry);
    let err = registry.lookup_method(c, interner.intern("nope")).unwrap_err();
    assert_eq!(err, RuntimeError::MethodNotFound);
}

#[test]
fn test_chain_and_subtype() {
    let interner = StringInterner::new();
    let mut registry = TypeRegistry::new(&interner);
    let (a, b, c) = chain_abc(&interner, &mut registry);
    assert_eq!(
        registry.chain(c).collect::<Vec<_>>(),
        vec![c, b, a, TypeId::BASE_OBJECT]
    );
    assert!(registry.is_subtype(c, a));
    assert!(!registry.is_subtype(a, c));
    assert!(registry.is_subtype(TypeId::INTEGER, TypeId::BASE_OBJECT));
}
