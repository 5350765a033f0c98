#![expect(clippy::unwrap_used, reason = "tests unwrap freely")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::types::TypeId;
use crate::value::{Payload, ValueRef};

fn int(i: i64) -> Value {
    Value::new(TypeId::INTEGER, Payload::Int(i))
}

fn vector(items: &[GcRef]) -> Value {
    let items = items.iter().copied().map(ValueRef::Heap).collect();
    Value::new(TypeId::VECTOR, Payload::Vector(items))
}

fn ints(heap: &Heap) -> Vec<i64> {
    heap.iter().filter_map(|(_, rec)| rec.value().as_int()).collect()
}

#[test]
fn test_iteration_follows_allocation_order() {
    let mut heap = Heap::new();
    for i in 0..5 {
        heap.insert(int(i)).unwrap();
    }
    assert_eq!(ints(&heap), vec![0, 1, 2, 3, 4]);
    assert_eq!(heap.live(), 5);
}

#[test]
fn test_sweep_without_marks_frees_everything() {
    let mut heap = Heap::new();
    let a = heap.insert(int(1)).unwrap();
    heap.insert(int(2)).unwrap();
    assert_eq!(heap.sweep(), 2);
    assert_eq!(heap.live(), 0);
    assert!(!heap.contains(a));
    assert_eq!(heap.iter().count(), 0);
}

#[test]
fn test_mark_follows_vector_elements() {
    let mut heap = Heap::new();
    let a = heap.insert(int(1)).unwrap();
    let b = heap.insert(int(2)).unwrap();
    let garbage = heap.insert(int(3)).unwrap();
    let v = heap.insert(vector(&[a, b])).unwrap();

    assert_eq!(heap.collect([v]), 1);
    assert!(heap.contains(a));
    assert!(heap.contains(b));
    assert!(heap.contains(v));
    assert!(!heap.contains(garbage));
}

#[test]
fn test_cycles_are_collected() {
    let mut heap = Heap::new();
    let a = heap.insert(vector(&[])).unwrap();
    let b = heap.insert(vector(&[a])).unwrap();
    heap.get_mut(a).unwrap().payload = Payload::Vector(vec![ValueRef::Heap(b)]);

    assert_eq!(heap.collect(std::iter::empty()), 2);
    assert_eq!(heap.live(), 0);
}

#[test]
fn test_reused_slot_gets_new_generation() {
    let mut heap = Heap::new();
    let old = heap.insert(int(1)).unwrap();
    heap.collect(std::iter::empty());
    let new = heap.insert(int(2)).unwrap();

    assert_eq!(old.index(), new.index());
    assert_ne!(old.generation(), new.generation());
    assert!(heap.get(old).is_none());
    assert_eq!(heap.get(new).unwrap().as_int(), Some(2));
    assert!(heap.stale_reason(old).contains("use of collected value"));
}

#[test]
fn test_freeing_middle_record_keeps_links() {
    let mut heap = Heap::new();
    let a = heap.insert(int(1)).unwrap();
    heap.insert(int(2)).unwrap();
    let c = heap.insert(int(3)).unwrap();
    heap.collect([a, c]);
    assert_eq!(ints(&heap), vec![1, 3]);

    heap.insert(int(4)).unwrap();
    assert_eq!(ints(&heap), vec![1, 3, 4]);
}

#[test]
fn test_freeing_head_and_tail() {
    let mut heap = Heap::new();
    heap.insert(int(1)).unwrap();
    let b = heap.insert(int(2)).unwrap();
    heap.insert(int(3)).unwrap();
    heap.collect([b]);
    assert_eq!(ints(&heap), vec![2]);
    heap.insert(int(5)).unwrap();
    assert_eq!(ints(&heap), vec![2, 5]);
}

#[test]
fn test_should_collect_respects_threshold_and_switch() {
    let mut heap = Heap::with_config(GcConfig {
        threshold: 2,
        enabled: true,
    });
    heap.insert(int(1)).unwrap();
    heap.insert(int(2)).unwrap();
    assert!(!heap.should_collect());
    heap.insert(int(3)).unwrap();
    assert!(heap.should_collect());

    heap.disable();
    assert!(heap.is_disabled());
    assert!(!heap.should_collect());
    heap.enable();
    assert!(heap.should_collect());
}

#[test]
fn test_stats_count_work() {
    let mut heap = Heap::new();
    let keep = heap.insert(int(1)).unwrap();
    heap.insert(int(2)).unwrap();
    heap.collect([keep]);
    assert_eq!(
        heap.stats(),
        GcStats {
            allocations: 2,
            collections: 1,
            freed: 1,
        }
    );
}

#[test]
fn test_dump_lists_records() {
    let interner = tarn_ir::StringInterner::new();
    let types = TypeRegistry::new(&interner);
    let mut heap = Heap::new();
    heap.insert(int(1)).unwrap();
    heap.insert(vector(&[])).unwrap();
    let dump = heap.dump(&types, &interner);
    assert!(dump.starts_with("heap: 2 live, threshold 50, enabled"));
    assert!(dump.contains("Integer"));
    assert!(dump.contains("Vector"));
}

proptest! {
    #[test]
    fn prop_iteration_equals_allocation_order(values in prop::collection::vec(any::<i64>(), 0..200)) {
        let mut heap = Heap::new();
        for &v in &values {
            heap.insert(int(v)).unwrap();
        }
        prop_assert_eq!(ints(&heap), values);
    }

    #[test]
    fn prop_sweep_keeps_exactly_the_marked_subset(keep in prop::collection::vec(any::<bool>(), 1..120)) {
        let mut heap = Heap::new();
        let handles: Vec<GcRef> = (0..keep.len())
            .map(|i| heap.insert(int(i64::try_from(i).unwrap())).unwrap())
            .collect();
        let roots: Vec<GcRef> = handles
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(&h, _)| h)
            .collect();

        heap.mark(roots.iter().copied());
        let freed = heap.sweep();

        prop_assert_eq!(freed, keep.len() - roots.len());
        let survivors: Vec<GcRef> = heap.iter().map(|(r, _)| r).collect();
        prop_assert_eq!(&survivors, &roots);
        prop_assert!(heap.iter().all(|(_, rec)| !rec.is_marked()));
    }
}
