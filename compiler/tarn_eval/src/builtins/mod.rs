//! Bootstrap: builtin methods, global functions, type bindings and modules.
//!
//! Everything here is ordinary runtime data once installed. Builtin methods
//! sit in the same method tables as user methods and can be replaced at
//! runtime; global functions are immutable bindings in the global scope.

mod functions;
mod math;
mod methods;
mod render;

use std::rc::Rc;

use tarn_ir::{Mutability, SourceLoc};

use crate::errors::RuntimeError;
use crate::interpreter::Interpreter;
use crate::types::{TypeId, TypeKind};
use crate::value::{Callable, NativeFn, NativeFunction, Payload, Value};

/// One builtin: name, required argument count, variadic flag, host procedure.
/// For methods the count includes the receiver.
pub(crate) type NativeSpec = (&'static str, usize, bool, NativeFn);

/// Install every builtin into a freshly constructed interpreter.
pub(crate) fn install(interp: &mut Interpreter) -> Result<(), RuntimeError> {
    for &(ty, table) in methods::TABLES {
        install_methods(interp, ty, table)?;
    }
    bind_types(interp)?;
    for &(name, arity, variadic, func) in functions::FUNCTIONS {
        interp.register_native(name, arity, variadic, func)?;
    }
    math::install(interp)
}

fn install_methods(
    interp: &mut Interpreter,
    ty: TypeId,
    table: &[NativeSpec],
) -> Result<(), RuntimeError> {
    for &(name, arity, variadic, func) in table {
        let native = NativeFunction::new(interp.intern(name), arity, variadic, func);
        interp
            .types
            .insert_method(ty, Callable::Native(Rc::new(native)), SourceLoc::DUMMY)?;
    }
    Ok(())
}

/// Bind every registered type by name, so `Integer("4")` and `Point(1, 2)` work.
fn bind_types(interp: &mut Interpreter) -> Result<(), RuntimeError> {
    for index in 0..interp.types.len() {
        let ty = u32::try_from(index)
            .map(TypeId::from_raw)
            .map_err(|_| RuntimeError::InvalidArgument)?;
        bind_type(interp, ty)?;
    }
    Ok(())
}

/// Bind `ty` in the global scope under its name, as an immutable Type value.
pub(crate) fn bind_type(interp: &mut Interpreter, ty: TypeId) -> Result<(), RuntimeError> {
    let name = interp.types.name_of(ty);
    let value = interp.try_alloc(Value::new(TypeId::TYPE, Payload::Type(ty)))?;
    interp
        .env
        .insert_global(name, value, Mutability::Immutable, SourceLoc::DUMMY)
}

impl Interpreter {
    /// Register a user type deriving from `parent` with the given members,
    /// and bind it globally so scripts can construct it.
    pub fn define_type(
        &mut self,
        name: &str,
        parent: TypeId,
        members: &[(&str, TypeId)],
    ) -> Result<TypeId, RuntimeError> {
        let name = self.intern(name);
        let ty = self.types.make(TypeKind::Object, parent, name)?;
        for &(member, member_type) in members {
            let member = self.intern(member);
            self.types.insert_member(ty, member, member_type)?;
        }
        bind_type(self, ty)?;
        Ok(ty)
    }
}
