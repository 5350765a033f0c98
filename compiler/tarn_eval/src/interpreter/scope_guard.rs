//! RAII scope guards for the interpreter's scope stack.
//!
//! The guard holds `&mut Interpreter` and derefs to it, so evaluation inside
//! the scope reads like evaluation outside it. Dropping the guard pops the
//! frame, including on early return and during unwinding.
//!
//! ```text
//! interpreter.with_env_scope(|scoped| {
//!     let cond = scoped.eval(&node.children[0]);
//!     ...
//! })
//! ```

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::scope::ScopeId;

/// Pops the scope it was created with when dropped.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        self.interpreter.env.pop_scope();
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Push a block scope and return a guard that pops it.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_> {
        self.env.push_scope();
        ScopedInterpreter { interpreter: self }
    }

    /// Push a function scope parented at `parent` and return a guard that pops it.
    pub fn scoped_with_parent(&mut self, parent: ScopeId) -> ScopedInterpreter<'_> {
        self.env.push_scope_with_parent(parent);
        ScopedInterpreter { interpreter: self }
    }

    /// Run `f` inside a fresh block scope.
    pub fn with_env_scope<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let mut scoped = self.scoped();
        f(&mut scoped)
    }

    /// Run `f` inside a function scope parented at `parent`.
    pub fn with_function_scope<T, F>(&mut self, parent: ScopeId, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let mut scoped = self.scoped_with_parent(parent);
        f(&mut scoped)
    }
}
