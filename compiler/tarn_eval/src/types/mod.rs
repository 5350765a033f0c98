//! Type descriptors and the type registry.
//!
//! Each [`TypeInfo`] has exactly one parent (`derived_from`); the root,
//! BaseObject, is its own parent. A type can only derive from a type that is
//! already registered, so the graph is acyclic and every chain ends at
//! BaseObject. Method resolution (see `dispatch`) walks that chain.
//!
//! Descriptors are immutable after construction except for their method
//! tables, which accept replacements at any time so methods can be patched
//! at runtime.

mod dispatch;

pub use dispatch::Resolved;

use std::mem::size_of;

use rustc_hash::FxHashMap;
use tarn_ir::{Name, SourceLoc, StringInterner};

use crate::errors::RuntimeError;
use crate::value::Callable;

/// Index of a type in the registry.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const BASE_OBJECT: TypeId = TypeId(0);
    pub const NIL: TypeId = TypeId(1);
    pub const BOOLEAN: TypeId = TypeId(2);
    pub const INTEGER: TypeId = TypeId(3);
    pub const REAL: TypeId = TypeId(4);
    pub const STRING: TypeId = TypeId(5);
    pub const VECTOR: TypeId = TypeId(6);
    pub const FUNCTION: TypeId = TypeId(7);
    pub const BUILTIN_FN: TypeId = TypeId(8);
    pub const MODULE: TypeId = TypeId(9);
    pub const TYPE: TypeId = TypeId(10);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind tag of a type; decides its instance size.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeKind {
    /// BaseObject and user-defined types.
    Object,
    Nil,
    Boolean,
    Integer,
    Real,
    String,
    Vector,
    Function,
    BuiltinFn,
    Module,
    Type,
}

impl TypeKind {
    /// Size of an instance with no members.
    pub const fn base_size(self) -> usize {
        match self {
            TypeKind::Integer => size_of::<i64>(),
            TypeKind::Real => size_of::<f64>(),
            TypeKind::Boolean => size_of::<bool>(),
            TypeKind::Nil => 0,
            TypeKind::Object
            | TypeKind::String
            | TypeKind::Vector
            | TypeKind::Function
            | TypeKind::BuiltinFn
            | TypeKind::Module
            | TypeKind::Type => size_of::<usize>(),
        }
    }
}

/// A named, typed field of a user type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub name: Name,
    pub ty: TypeId,
    pub offset: usize,
}

/// A method table slot.
#[derive(Clone, Debug)]
pub struct MethodEntry {
    pub callable: Callable,
    /// Where the method was defined; `SourceLoc::DUMMY` for builtins.
    pub loc: SourceLoc,
}

/// Type descriptor.
#[derive(Debug)]
pub struct TypeInfo {
    kind: TypeKind,
    derived_from: TypeId,
    name: Name,
    size: usize,
    members: Vec<Member>,
    methods: FxHashMap<Name, MethodEntry>,
    /// Set on first instantiation; members can no longer be added.
    sealed: bool,
}

impl TypeInfo {
    fn new(kind: TypeKind, derived_from: TypeId, name: Name) -> Self {
        TypeInfo {
            kind,
            derived_from,
            name,
            size: kind.base_size(),
            members: Vec::new(),
            methods: FxHashMap::default(),
            sealed: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn derived_from(&self) -> TypeId {
        self.derived_from
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    /// Instance size in bytes: the kind's base size plus every member's size.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// This type's own method, without walking the chain.
    #[inline]
    pub fn own_method(&self, name: Name) -> Option<&MethodEntry> {
        self.methods.get(&name)
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

/// Every type known to one interpreter.
#[derive(Debug)]
pub struct TypeRegistry {
    types: Vec<TypeInfo>,
    by_name: FxHashMap<Name, TypeId>,
}

impl TypeRegistry {
    /// Registry holding the bootstrap types, with empty method tables.
    pub fn new(interner: &StringInterner) -> Self {
        let mut registry = TypeRegistry {
            types: Vec::with_capacity(16),
            by_name: FxHashMap::default(),
        };
        // BaseObject is self-parented; it is the only type created this way.
        let base = interner.intern("BaseObject");
        registry
            .types
            .push(TypeInfo::new(TypeKind::Object, TypeId::BASE_OBJECT, base));
        registry.by_name.insert(base, TypeId::BASE_OBJECT);

        let builtins = [
            (TypeKind::Nil, "Nil", TypeId::NIL),
            (TypeKind::Boolean, "Boolean", TypeId::BOOLEAN),
            (TypeKind::Integer, "Integer", TypeId::INTEGER),
            (TypeKind::Real, "Real", TypeId::REAL),
            (TypeKind::String, "String", TypeId::STRING),
            (TypeKind::Vector, "Vector", TypeId::VECTOR),
            (TypeKind::Function, "Function", TypeId::FUNCTION),
            (TypeKind::BuiltinFn, "BuiltinFn", TypeId::BUILTIN_FN),
            (TypeKind::Module, "Module", TypeId::MODULE),
            (TypeKind::Type, "Type", TypeId::TYPE),
        ];
        for (kind, name, expected) in builtins {
            let id = registry.make(kind, TypeId::BASE_OBJECT, interner.intern(name));
            debug_assert_eq!(id, Ok(expected), "bootstrap type order");
        }
        registry
    }

    /// Register a new type deriving from `derived_from`.
    ///
    /// Fails with `InvalidArgument` if `name` is empty, if `derived_from` is
    /// the id being created, or if `derived_from` is not registered.
    /// Fails with `KeyAlreadyInTable` if the name is taken.
    pub fn make(
        &mut self,
        kind: TypeKind,
        derived_from: TypeId,
        name: Name,
    ) -> Result<TypeId, RuntimeError> {
        let id = u32::try_from(self.types.len())
            .map(TypeId)
            .map_err(|_| RuntimeError::AllocFailed)?;
        if name.is_empty() || derived_from == id || self.get(derived_from).is_none() {
            return Err(RuntimeError::InvalidArgument);
        }
        if self.by_name.contains_key(&name) {
            return Err(RuntimeError::KeyAlreadyInTable);
        }
        self.types.push(TypeInfo::new(kind, derived_from, name));
        self.by_name.insert(name, id);
        tracing::trace!(?id, ?derived_from, "registered type");
        Ok(id)
    }

    #[inline]
    pub fn get(&self, id: TypeId) -> Option<&TypeInfo> {
        self.types.get(id.index())
    }

    #[inline]
    fn get_mut(&mut self, id: TypeId) -> Result<&mut TypeInfo, RuntimeError> {
        self.types
            .get_mut(id.index())
            .ok_or(RuntimeError::InvalidArgument)
    }

    /// Find a type by its display name.
    pub fn find(&self, name: Name) -> Option<TypeId> {
        self.by_name.get(&name).copied()
    }

    /// Display name of `id`; empty for unknown ids.
    pub fn name_of(&self, id: TypeId) -> Name {
        self.get(id).map_or(Name::EMPTY, TypeInfo::name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Append a member, returning its offset.
    ///
    /// Construction-time only: fails with `InvalidArgument` once the type has
    /// been instantiated or if `member_type` is unknown, and with
    /// `KeyAlreadyInTable` for a duplicate member name.
    pub fn insert_member(
        &mut self,
        ty: TypeId,
        name: Name,
        member_type: TypeId,
    ) -> Result<usize, RuntimeError> {
        let member_size = self
            .get(member_type)
            .map(TypeInfo::size)
            .ok_or(RuntimeError::InvalidArgument)?;
        let info = self.get_mut(ty)?;
        if info.sealed || name.is_empty() {
            return Err(RuntimeError::InvalidArgument);
        }
        if info.members.iter().any(|m| m.name == name) {
            return Err(RuntimeError::KeyAlreadyInTable);
        }
        let offset = info.size;
        info.members.push(Member {
            name,
            ty: member_type,
            offset,
        });
        info.size += member_size;
        Ok(offset)
    }

    /// Position and descriptor of a member. A linear scan.
    pub fn lookup_member(&self, ty: TypeId, name: Name) -> Option<(usize, &Member)> {
        self.get(ty)?
            .members
            .iter()
            .enumerate()
            .find(|(_, m)| m.name == name)
    }

    /// Install `callable` under its own name, replacing any previous entry
    /// for that name on this type (ancestors are untouched).
    pub fn insert_method(
        &mut self,
        ty: TypeId,
        callable: Callable,
        loc: SourceLoc,
    ) -> Result<(), RuntimeError> {
        let name = callable.name();
        if name.is_empty() {
            return Err(RuntimeError::InvalidArgument);
        }
        let info = self.get_mut(ty)?;
        if info
            .methods
            .insert(name, MethodEntry { callable, loc })
            .is_some()
        {
            tracing::debug!(?ty, ?name, "method replaced");
        }
        Ok(())
    }

    /// Mark `ty` as instantiated. Idempotent.
    pub fn seal(&mut self, ty: TypeId) -> Result<(), RuntimeError> {
        self.get_mut(ty)?.sealed = true;
        Ok(())
    }

    /// True if `ancestor` is `ty` or on its inheritance chain.
    pub fn is_subtype(&self, ty: TypeId, ancestor: TypeId) -> bool {
        self.chain(ty).any(|id| id == ancestor)
    }

    /// `ty`, its parent, and so on up to and including BaseObject.
    pub fn chain(&self, ty: TypeId) -> Chain<'_> {
        Chain {
            registry: self,
            next: self.get(ty).map(|_| ty),
        }
    }
}

/// Iterator over an inheritance chain, most derived first.
pub struct Chain<'a> {
    registry: &'a TypeRegistry,
    next: Option<TypeId>,
}

impl Iterator for Chain<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        let current = self.next?;
        let parent = self.registry.get(current).map(TypeInfo::derived_from);
        // The root is self-parented; stop once it has been yielded.
        self.next = parent.filter(|&p| p != current);
        Some(current)
    }
}

#[cfg(test)]
mod tests;
