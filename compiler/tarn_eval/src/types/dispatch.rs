//! Method resolution.
//!
//! The runtime's only form of dynamic dispatch: operators, constructors and
//! method calls all resolve a method *name* against the receiver's type by
//! walking the inheritance chain. Single inheritance means the first match is
//! the only candidate; there is nothing to disambiguate.

use tarn_ir::Name;

use super::{MethodEntry, TypeId, TypeRegistry};
use crate::errors::RuntimeError;

/// A successful method lookup.
#[derive(Clone, Copy, Debug)]
pub struct Resolved<'a> {
    /// The type on the chain whose table held the method.
    pub owner: TypeId,
    pub entry: &'a MethodEntry,
}

impl TypeRegistry {
    /// Resolve `name` starting at `ty`: self first, then each parent, ending
    /// after BaseObject. Fails with `MethodNotFound` when the chain is exhausted.
    pub fn lookup_method(&self, ty: TypeId, name: Name) -> Result<Resolved<'_>, RuntimeError> {
        for owner in self.chain(ty) {
            if let Some(entry) = self.get(owner).and_then(|info| info.own_method(name)) {
                return Ok(Resolved { owner, entry });
            }
        }
        Err(RuntimeError::MethodNotFound)
    }
}
