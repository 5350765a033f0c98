//! Tracing mark-sweep collector.
//!
//! Values live in an arena of slots. Live slots form a doubly linked list in
//! allocation order (`head` is the oldest record, `tail` the newest); freed
//! slots form a singly linked free list and are reused by later allocations.
//!
//! A [`GcRef`] names a slot *and* the generation it was handed out in.
//! Freeing a slot bumps its generation, so a handle that outlived its value
//! can never alias whatever gets allocated there next. Resolving such a
//! handle is an internal invariant violation; the interpreter panics on it.
//!
//! Collection is two-phase: [`Heap::mark`] runs a worklist DFS from a root
//! list, following references through [`GcTrace`]; [`Heap::sweep`] walks the
//! allocation list once and frees every record the mark phase did not reach.
//! The heap does not know where roots live. The interpreter gathers them (scope
//! frames, temporary roots, module members) and calls [`Heap::collect`].

use std::fmt::{self, Write as _};

use tarn_ir::StringInterner;

use crate::errors::RuntimeError;
use crate::types::TypeRegistry;
use crate::value::Value;

/// Live count above which an allocation triggers a collection.
pub const DEFAULT_THRESHOLD: usize = 50;

/// Generation-checked handle to a heap slot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GcRef {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl GcRef {
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for GcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GcRef({}v{})", self.index, self.generation)
    }
}

/// Enumerates the heap references a value (or a root container) holds.
pub trait GcTrace {
    fn trace(&self, out: &mut Vec<GcRef>);
}

impl<T: GcTrace> GcTrace for [T] {
    fn trace(&self, out: &mut Vec<GcRef>) {
        for item in self {
            item.trace(out);
        }
    }
}

/// Collector settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GcConfig {
    /// Collect when the live count exceeds this.
    pub threshold: usize,
    /// Automatic collection on allocation.
    pub enabled: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            threshold: DEFAULT_THRESHOLD,
            enabled: true,
        }
    }
}

impl GcConfig {
    /// Defaults, overridden by `TARN_GC_THRESHOLD` (a count) and
    /// `TARN_GC_DISABLE` (any value other than empty or `0`).
    pub fn from_env() -> Self {
        let mut config = GcConfig::default();
        if let Some(threshold) = std::env::var("TARN_GC_THRESHOLD")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            config.threshold = threshold;
        }
        if let Ok(v) = std::env::var("TARN_GC_DISABLE") {
            config.enabled = v.is_empty() || v == "0";
        }
        config
    }
}

/// Lifetime counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    pub allocations: u64,
    pub collections: u64,
    pub freed: u64,
}

/// A live heap record.
#[derive(Debug)]
pub struct AllocRecord {
    value: Value,
    generation: u32,
    /// Reachability flag; only set between `mark` and `sweep`.
    marked: bool,
    prev: Option<u32>,
    next: Option<u32>,
}

impl AllocRecord {
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn is_marked(&self) -> bool {
        self.marked
    }
}

#[derive(Debug)]
enum Slot {
    Live(AllocRecord),
    Free {
        /// Generation the next occupant will carry.
        generation: u32,
        next_free: Option<u32>,
        /// Collection cycle that freed this slot.
        #[cfg(debug_assertions)]
        freed_in: u64,
    },
}

/// The value arena.
#[derive(Debug)]
pub struct Heap {
    slots: Vec<Slot>,
    head: Option<u32>,
    tail: Option<u32>,
    free: Option<u32>,
    live: usize,
    config: GcConfig,
    stats: GcStats,
}

impl Default for Heap {
    fn default() -> Self {
        Heap::with_config(GcConfig::default())
    }
}

impl Heap {
    pub fn new() -> Self {
        Heap::default()
    }

    pub fn with_config(config: GcConfig) -> Self {
        Heap {
            slots: Vec::with_capacity(config.threshold.saturating_mul(2)),
            head: None,
            tail: None,
            free: None,
            live: 0,
            config,
            stats: GcStats::default(),
        }
    }

    /// Append `value` at the tail of the allocation list.
    ///
    /// Never collects; callers decide when to (see `should_collect`).
    pub fn insert(&mut self, value: Value) -> Result<GcRef, RuntimeError> {
        let (index, generation) = match self.free {
            Some(index) => {
                let Some(Slot::Free {
                    generation,
                    next_free,
                    ..
                }) = self.slots.get(index as usize)
                else {
                    return Err(RuntimeError::AllocFailed);
                };
                self.free = *next_free;
                (index, *generation)
            }
            None => {
                let index =
                    u32::try_from(self.slots.len()).map_err(|_| RuntimeError::AllocFailed)?;
                self.slots.push(Slot::Free {
                    generation: 0,
                    next_free: None,
                    #[cfg(debug_assertions)]
                    freed_in: 0,
                });
                (index, 0)
            }
        };

        let record = AllocRecord {
            value,
            generation,
            marked: false,
            prev: self.tail,
            next: None,
        };
        self.slots[index as usize] = Slot::Live(record);
        match self.tail {
            Some(tail) => self.record_mut(tail).next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.live += 1;
        self.stats.allocations += 1;

        let handle = GcRef { index, generation };
        tracing::trace!(?handle, live = self.live, "alloc");
        Ok(handle)
    }

    fn record(&self, r: GcRef) -> Option<&AllocRecord> {
        match self.slots.get(r.index as usize) {
            Some(Slot::Live(rec)) if rec.generation == r.generation => Some(rec),
            _ => None,
        }
    }

    /// Record at a slot known to be on the allocation list.
    fn record_mut(&mut self, index: u32) -> &mut AllocRecord {
        match &mut self.slots[index as usize] {
            Slot::Live(rec) => rec,
            Slot::Free { .. } => unreachable!("allocation list links a free slot {index}"),
        }
    }

    /// The value behind `r`, or `None` if it has been collected.
    #[inline]
    pub fn get(&self, r: GcRef) -> Option<&Value> {
        self.record(r).map(AllocRecord::value)
    }

    #[inline]
    pub fn get_mut(&mut self, r: GcRef) -> Option<&mut Value> {
        match self.slots.get_mut(r.index as usize) {
            Some(Slot::Live(rec)) if rec.generation == r.generation => Some(&mut rec.value),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, r: GcRef) -> bool {
        self.record(r).is_some()
    }

    pub fn is_marked(&self, r: GcRef) -> Option<bool> {
        self.record(r).map(AllocRecord::is_marked)
    }

    /// Why `r` does not resolve, for the stale-handle panic.
    pub fn stale_reason(&self, r: GcRef) -> String {
        match self.slots.get(r.index as usize) {
            None => format!("use of collected value: {r:?} was never allocated"),
            Some(Slot::Live(rec)) => format!(
                "use of collected value: {r:?} was reused as generation {}",
                rec.generation
            ),
            #[cfg(debug_assertions)]
            Some(Slot::Free { freed_in, .. }) => {
                format!("use of collected value: {r:?} was freed by collection {freed_in}")
            }
            #[cfg(not(debug_assertions))]
            Some(Slot::Free { .. }) => format!("use of collected value: {r:?} was freed"),
        }
    }

    /// Records from oldest to newest.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            heap: self,
            next: self.head,
        }
    }

    /// Flag every record reachable from `roots`.
    ///
    /// Handles that no longer resolve are skipped.
    pub fn mark(&mut self, roots: impl IntoIterator<Item = GcRef>) {
        let mut worklist: Vec<GcRef> = roots.into_iter().collect();
        while let Some(r) = worklist.pop() {
            let Some(Slot::Live(rec)) = self.slots.get_mut(r.index as usize) else {
                continue;
            };
            if rec.generation != r.generation || rec.marked {
                continue;
            }
            rec.marked = true;
            rec.value.trace(&mut worklist);
        }
    }

    /// Free every unflagged record and clear the flag on survivors.
    /// Returns the number of records freed.
    pub fn sweep(&mut self) -> usize {
        let mut freed = 0;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let rec = self.record_mut(index);
            cursor = rec.next;
            if rec.marked {
                rec.marked = false;
            } else {
                self.release(index);
                freed += 1;
            }
        }
        self.live -= freed;
        self.stats.freed += freed as u64;
        freed
    }

    /// Unlink the record at `index` and push its slot on the free list.
    fn release(&mut self, index: u32) {
        let (prev, next, generation) = {
            let rec = self.record_mut(index);
            (rec.prev, rec.next, rec.generation)
        };
        match prev {
            Some(p) => self.record_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.record_mut(n).prev = prev,
            None => self.tail = prev,
        }
        // Dropping the old slot drops the payload.
        self.slots[index as usize] = Slot::Free {
            generation: generation.wrapping_add(1),
            next_free: self.free,
            #[cfg(debug_assertions)]
            freed_in: self.stats.collections,
        };
        self.free = Some(index);
    }

    /// Mark from `roots`, then sweep. Returns the number of records freed.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn collect(&mut self, roots: impl IntoIterator<Item = GcRef>) -> usize {
        let before = self.live;
        self.stats.collections += 1;
        self.mark(roots);
        let freed = self.sweep();
        tracing::debug!(before, after = self.live, freed, "collection finished");
        freed
    }

    /// Whether an allocation should collect first.
    #[inline]
    pub fn should_collect(&self) -> bool {
        self.config.enabled && self.live > self.config.threshold
    }

    /// Number of live records.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    pub fn is_disabled(&self) -> bool {
        !self.config.enabled
    }

    pub fn config(&self) -> GcConfig {
        self.config
    }

    pub fn stats(&self) -> GcStats {
        self.stats
    }

    /// One line per record, oldest first: slot, generation, type, mark flag.
    pub fn dump(&self, types: &TypeRegistry, interner: &StringInterner) -> String {
        let mut out = format!(
            "heap: {} live, threshold {}, {}\n",
            self.live,
            self.config.threshold,
            if self.config.enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        for (r, rec) in self.iter() {
            let ty = interner.lookup(types.name_of(rec.value.ty));
            let _ = writeln!(
                out,
                "  #{:<4} gen {:<3} {:<12} {}",
                r.index,
                r.generation,
                ty,
                if rec.marked { "marked" } else { "-" }
            );
        }
        out
    }
}

/// Allocation-order iterator over live records.
pub struct Iter<'a> {
    heap: &'a Heap,
    next: Option<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (GcRef, &'a AllocRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let Some(Slot::Live(rec)) = self.heap.slots.get(index as usize) else {
            return None;
        };
        self.next = rec.next;
        let handle = GcRef {
            index,
            generation: rec.generation,
        };
        Some((handle, rec))
    }
}

#[cfg(test)]
mod tests;
