//! Scope chain for variable bindings.
//!
//! Frames live on a stack (not cloned) and are pushed and popped in strict
//! LIFO order. Each frame links to a lexical parent *below* it on the stack:
//! block frames link to the frame that was on top when they were pushed,
//! function frames link to the frame the function was defined in. Lookup walks
//! those links, so a function body never sees its caller's locals.
//!
//! Every live frame is a GC root; see the `GcTrace` impl.

use rustc_hash::FxHashMap;
use tarn_ir::{Mutability, Name, SourceLoc};

use crate::errors::{AssignError, RuntimeError};
use crate::gc::{GcRef, GcTrace};
use crate::value::ValueRef;

/// Initial bucket count of the global frame.
const GLOBAL_CAPACITY: usize = 256;
/// Initial bucket count of nested frames.
const LOCAL_CAPACITY: usize = 16;

/// Identity of a frame. Ids increase monotonically and are never reused, so
/// an id outlives its frame without ever naming a different one.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

/// A binding: value, mutability and where it was declared.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry {
    pub value: ValueRef,
    pub mutability: Mutability,
    pub loc: SourceLoc,
}

#[derive(Debug)]
struct Frame {
    id: ScopeId,
    /// Stack position of the lexical parent; `None` only for the global frame.
    parent: Option<usize>,
    entries: FxHashMap<Name, Entry>,
}

impl Frame {
    fn new(id: ScopeId, parent: Option<usize>, capacity: usize) -> Self {
        let mut entries = FxHashMap::default();
        entries.reserve(capacity);
        Frame {
            id,
            parent,
            entries,
        }
    }
}

/// The interpreter's binding environment.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    next_id: u32,
}

impl ScopeStack {
    /// A stack holding only the global frame.
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![Frame::new(ScopeId::GLOBAL, None, GLOBAL_CAPACITY)],
            next_id: 1,
        }
    }

    /// Number of live frames, global included.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    fn top(&self) -> usize {
        self.frames.len() - 1
    }

    /// Id of the innermost frame.
    #[inline]
    pub fn current(&self) -> ScopeId {
        self.frames[self.top()].id
    }

    fn fresh_id(&mut self) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Push a block frame whose parent is the current frame.
    #[inline]
    pub fn push_scope(&mut self) {
        let parent = self.top();
        let id = self.fresh_id();
        self.frames.push(Frame::new(id, Some(parent), LOCAL_CAPACITY));
    }

    /// Push a function frame whose parent is `parent`, or the global frame
    /// if `parent` has already been popped.
    pub fn push_scope_with_parent(&mut self, parent: ScopeId) {
        let position = self
            .frames
            .binary_search_by_key(&parent, |f| f.id)
            .unwrap_or(0);
        let id = self.fresh_id();
        self.frames
            .push(Frame::new(id, Some(position), LOCAL_CAPACITY));
    }

    /// Pop the innermost frame. The global frame is never popped.
    #[inline]
    pub fn pop_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind `name` in the current frame.
    ///
    /// Fails with `KeyAlreadyInTable` only if `name` is already bound in this
    /// exact frame; shadowing an outer binding is fine.
    pub fn insert(
        &mut self,
        name: Name,
        value: ValueRef,
        mutability: Mutability,
        loc: SourceLoc,
    ) -> Result<(), RuntimeError> {
        let top = self.top();
        Self::insert_into(&mut self.frames[top], name, value, mutability, loc)
    }

    /// Bind `name` in the global frame.
    pub fn insert_global(
        &mut self,
        name: Name,
        value: ValueRef,
        mutability: Mutability,
        loc: SourceLoc,
    ) -> Result<(), RuntimeError> {
        Self::insert_into(&mut self.frames[0], name, value, mutability, loc)
    }

    fn insert_into(
        frame: &mut Frame,
        name: Name,
        value: ValueRef,
        mutability: Mutability,
        loc: SourceLoc,
    ) -> Result<(), RuntimeError> {
        if name.is_empty() {
            return Err(RuntimeError::InvalidArgument);
        }
        if frame.entries.contains_key(&name) {
            return Err(RuntimeError::KeyAlreadyInTable);
        }
        frame.entries.insert(
            name,
            Entry {
                value,
                mutability,
                loc,
            },
        );
        Ok(())
    }

    /// Look `name` up in the current frame only.
    #[inline]
    pub fn find_local(&self, name: Name) -> Option<&Entry> {
        self.frames[self.top()].entries.get(&name)
    }

    /// Stack position of the nearest frame binding `name`.
    fn resolve(&self, name: Name) -> Option<usize> {
        let mut cursor = Some(self.top());
        while let Some(position) = cursor {
            let frame = &self.frames[position];
            if frame.entries.contains_key(&name) {
                return Some(position);
            }
            cursor = frame.parent;
        }
        None
    }

    /// Look `name` up along the parent links, innermost first.
    pub fn find_nearest(&self, name: Name) -> Option<&Entry> {
        let position = self.resolve(name)?;
        self.frames[position].entries.get(&name)
    }

    /// Rebind the nearest `name` to `value`.
    pub fn assign(&mut self, name: Name, value: ValueRef) -> Result<(), AssignError> {
        let position = self.resolve(name).ok_or(AssignError::Undefined)?;
        let entry = self.frames[position]
            .entries
            .get_mut(&name)
            .ok_or(AssignError::Undefined)?;
        if !entry.mutability.is_mutable() {
            return Err(AssignError::Immutable);
        }
        entry.value = value;
        Ok(())
    }

    /// Whether `name` could be assigned right now.
    pub fn check_assign(&self, name: Name) -> Result<(), AssignError> {
        match self.find_nearest(name) {
            None => Err(AssignError::Undefined),
            Some(entry) if !entry.mutability.is_mutable() => Err(AssignError::Immutable),
            Some(_) => Ok(()),
        }
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl GcTrace for ScopeStack {
    /// Every value bound in every live frame, not only the current chain:
    /// a caller's locals stay alive while the callee runs.
    fn trace(&self, out: &mut Vec<GcRef>) {
        for frame in &self.frames {
            out.extend(frame.entries.values().filter_map(|e| e.value.as_gc()));
        }
    }
}

#[cfg(test)]
mod tests;
