#![expect(clippy::unwrap_used, reason = "tests unwrap freely")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tarn_ir::StringInterner;

use super::*;
use crate::gc::GcRef;

fn heap_ref(index: u32) -> ValueRef {
    ValueRef::Heap(GcRef {
        index,
        generation: 0,
    })
}

fn bind(env: &mut ScopeStack, name: Name, value: ValueRef, mutability: Mutability) {
    env.insert(name, value, mutability, SourceLoc::DUMMY).unwrap();
}

#[test]
fn test_insert_then_find_local() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut env = ScopeStack::new();
    bind(&mut env, x, heap_ref(1), Mutability::Immutable);
    assert_eq!(env.find_local(x).unwrap().value, heap_ref(1));
}

#[test]
fn test_duplicate_in_same_frame_is_rejected() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut env = ScopeStack::new();
    bind(&mut env, x, heap_ref(1), Mutability::Mutable);
    let err = env.insert(x, heap_ref(2), Mutability::Mutable, SourceLoc::DUMMY);
    assert_eq!(err, Err(RuntimeError::KeyAlreadyInTable));
    assert_eq!(env.find_local(x).unwrap().value, heap_ref(1));
}

#[test]
fn test_shadowing_and_restore_on_pop() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut env = ScopeStack::new();
    bind(&mut env, x, heap_ref(1), Mutability::Immutable);

    env.push_scope();
    bind(&mut env, x, heap_ref(2), Mutability::Immutable);
    assert_eq!(env.find_nearest(x).unwrap().value, heap_ref(2));

    env.pop_scope();
    assert_eq!(env.find_nearest(x).unwrap().value, heap_ref(1));
}

#[test]
fn test_find_local_ignores_parents() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut env = ScopeStack::new();
    bind(&mut env, x, heap_ref(1), Mutability::Immutable);
    env.push_scope();
    assert!(env.find_local(x).is_none());
    assert!(env.find_nearest(x).is_some());
}

#[test]
fn test_assign_mutable_in_outer_frame() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut env = ScopeStack::new();
    bind(&mut env, x, heap_ref(1), Mutability::Mutable);
    env.push_scope();
    env.assign(x, heap_ref(2)).unwrap();
    env.pop_scope();
    assert_eq!(env.find_nearest(x).unwrap().value, heap_ref(2));
}

#[test]
fn test_assign_errors() {
    let interner = StringInterner::new();
    let y = interner.intern("y");
    let mut env = ScopeStack::new();
    bind(&mut env, y, heap_ref(5), Mutability::Immutable);

    assert_eq!(env.assign(y, heap_ref(6)), Err(AssignError::Immutable));
    assert_eq!(env.find_nearest(y).unwrap().value, heap_ref(5));
    assert_eq!(
        env.assign(interner.intern("missing"), heap_ref(1)),
        Err(AssignError::Undefined)
    );
    assert_eq!(env.check_assign(y), Err(AssignError::Immutable));
}

#[test]
fn test_global_frame_is_never_popped() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut env = ScopeStack::new();
    bind(&mut env, x, heap_ref(1), Mutability::Immutable);
    env.pop_scope();
    env.pop_scope();
    assert_eq!(env.depth(), 1);
    assert!(env.find_nearest(x).is_some());
}

#[test]
fn test_function_frame_skips_caller_locals() {
    let interner = StringInterner::new();
    let local = interner.intern("local");
    let global = interner.intern("global");
    let mut env = ScopeStack::new();
    bind(&mut env, global, heap_ref(1), Mutability::Immutable);

    env.push_scope();
    bind(&mut env, local, heap_ref(2), Mutability::Immutable);
    env.push_scope_with_parent(ScopeId::GLOBAL);

    assert!(env.find_nearest(local).is_none());
    assert!(env.find_nearest(global).is_some());
}

#[test]
fn test_function_frame_sees_defining_frame() {
    let interner = StringInterner::new();
    let captured = interner.intern("captured");
    let mut env = ScopeStack::new();
    env.push_scope();
    bind(&mut env, captured, heap_ref(3), Mutability::Immutable);
    let defining = env.current();

    env.push_scope();
    env.push_scope_with_parent(defining);
    assert_eq!(env.find_nearest(captured).unwrap().value, heap_ref(3));
}

#[test]
fn test_popped_parent_falls_back_to_global() {
    let interner = StringInterner::new();
    let gone = interner.intern("gone");
    let mut env = ScopeStack::new();
    env.push_scope();
    bind(&mut env, gone, heap_ref(3), Mutability::Immutable);
    let defining = env.current();
    env.pop_scope();

    env.push_scope();
    env.push_scope_with_parent(defining);
    assert!(env.find_nearest(gone).is_none());
    assert_ne!(env.current(), defining);
}

#[test]
fn test_trace_yields_every_frame() {
    let interner = StringInterner::new();
    let mut env = ScopeStack::new();
    bind(&mut env, interner.intern("a"), heap_ref(1), Mutability::Immutable);
    bind(&mut env, interner.intern("n"), ValueRef::Nil, Mutability::Immutable);
    env.push_scope();
    bind(&mut env, interner.intern("b"), heap_ref(2), Mutability::Immutable);
    env.push_scope_with_parent(ScopeId::GLOBAL);
    bind(&mut env, interner.intern("c"), heap_ref(3), Mutability::Immutable);

    let mut roots = Vec::new();
    env.trace(&mut roots);
    roots.sort();
    let indices: Vec<u32> = roots.iter().map(|r| r.index()).collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

proptest! {
    #[test]
    fn prop_outermost_binding_visible_at_every_depth(depth in 1usize..64) {
        let interner = StringInterner::new();
        let outer = interner.intern("outer");
        let mut env = ScopeStack::new();
        env.push_scope();
        bind(&mut env, outer, heap_ref(7), Mutability::Immutable);

        for level in 0..depth {
            env.push_scope();
            let name = interner.intern(&format!("v{level}"));
            bind(&mut env, name, heap_ref(100), Mutability::Mutable);
            prop_assert_eq!(env.find_nearest(outer).map(|e| e.value), Some(heap_ref(7)));
        }
        for _ in 0..depth {
            env.pop_scope();
            prop_assert!(env.find_nearest(outer).is_some());
        }
        env.pop_scope();
        prop_assert!(env.find_nearest(outer).is_none());
        prop_assert_eq!(env.depth(), 1);
    }
}
