//! Module table.
//!
//! Modules are named groups of members registered by the host (the `math`
//! module is registered at bootstrap). `import name` binds a Module value in
//! the current scope; `name.member` then resolves here. Members are GC roots
//! for as long as the interpreter lives.

use rustc_hash::FxHashMap;
use tarn_ir::Name;

use crate::errors::RuntimeError;
use crate::gc::{GcRef, GcTrace};
use crate::value::ValueRef;

#[derive(Debug, Default)]
pub struct Module {
    members: FxHashMap<Name, ValueRef>,
}

impl Module {
    pub fn get(&self, member: Name) -> Option<ValueRef> {
        self.members.get(&member).copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ModuleTable {
    modules: FxHashMap<Name, Module>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty module. Fails with `KeyAlreadyInTable` if taken.
    pub fn register(&mut self, name: Name) -> Result<(), RuntimeError> {
        if name.is_empty() {
            return Err(RuntimeError::InvalidArgument);
        }
        if self.modules.contains_key(&name) {
            return Err(RuntimeError::KeyAlreadyInTable);
        }
        self.modules.insert(name, Module::default());
        Ok(())
    }

    /// Add `member` to a registered module.
    pub fn insert_member(
        &mut self,
        module: Name,
        member: Name,
        value: ValueRef,
    ) -> Result<(), RuntimeError> {
        let module = self
            .modules
            .get_mut(&module)
            .ok_or(RuntimeError::KeyNotInTable)?;
        if module.members.contains_key(&member) {
            return Err(RuntimeError::KeyAlreadyInTable);
        }
        module.members.insert(member, value);
        Ok(())
    }

    pub fn get(&self, name: Name) -> Option<&Module> {
        self.modules.get(&name)
    }

    pub fn contains(&self, name: Name) -> bool {
        self.modules.contains_key(&name)
    }
}

impl GcTrace for ModuleTable {
    fn trace(&self, out: &mut Vec<GcRef>) {
        for module in self.modules.values() {
            out.extend(module.members.values().filter_map(|v| v.as_gc()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tarn_ir::StringInterner;

    #[test]
    fn test_register_and_resolve() {
        let interner = StringInterner::new();
        let math = interner.intern("math");
        let pi = interner.intern("pi");
        let mut table = ModuleTable::new();
        assert_eq!(table.register(math), Ok(()));
        assert_eq!(table.insert_member(math, pi, ValueRef::Nil), Ok(()));
        assert_eq!(table.get(math).and_then(|m| m.get(pi)), Some(ValueRef::Nil));
        assert_eq!(table.register(math), Err(RuntimeError::KeyAlreadyInTable));
    }

    #[test]
    fn test_member_of_unknown_module() {
        let interner = StringInterner::new();
        let mut table = ModuleTable::new();
        let err = table.insert_member(interner.intern("io"), interner.intern("x"), ValueRef::Nil);
        assert_eq!(err, Err(RuntimeError::KeyNotInTable));
    }
}
