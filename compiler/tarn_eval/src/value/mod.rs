//! Runtime values.
//!
//! A [`Value`] is the heap-resident datum: a reference to its type descriptor
//! plus a [`Payload`]. Everything else in the runtime refers to values through
//! [`ValueRef`], a `Copy` handle. `nil`, `true` and `false` are handles with no
//! heap record behind them; the interpreter owns their `Value`s for its whole
//! life and the collector never sees them.
//!
//! # Sharing
//!
//! Handles are shared freely: a scope slot, a vector element and a module
//! member may all name the same value. Lifetime is decided by reachability
//! alone (see `gc`), never by who "owns" a handle.

use std::fmt;
use std::rc::Rc;

use tarn_ir::{FnDef, Name};

use crate::diagnostics::FaultKind;
use crate::gc::{GcRef, GcTrace};
use crate::interpreter::Interpreter;
use crate::scope::ScopeId;
use crate::types::TypeId;

/// Handle to a runtime value.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ValueRef {
    /// The `nil` singleton.
    Nil,
    /// The `true` singleton.
    True,
    /// The `false` singleton.
    False,
    /// A collector-managed value.
    Heap(GcRef),
}

impl ValueRef {
    /// The boolean singleton for `b`.
    #[inline]
    pub const fn bool(b: bool) -> Self {
        if b {
            ValueRef::True
        } else {
            ValueRef::False
        }
    }

    #[inline]
    pub const fn is_nil(self) -> bool {
        matches!(self, ValueRef::Nil)
    }

    /// `Some(b)` for the boolean singletons.
    #[inline]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            ValueRef::True => Some(true),
            ValueRef::False => Some(false),
            ValueRef::Nil | ValueRef::Heap(_) => None,
        }
    }

    /// The heap handle, if this is not a singleton.
    #[inline]
    pub const fn as_gc(self) -> Option<GcRef> {
        match self {
            ValueRef::Heap(r) => Some(r),
            ValueRef::Nil | ValueRef::True | ValueRef::False => None,
        }
    }

    /// Conditions treat `nil` and `false` as false, everything else as true.
    #[inline]
    pub const fn is_truthy(self) -> bool {
        !matches!(self, ValueRef::Nil | ValueRef::False)
    }
}

/// Result of evaluating a node or calling a callable.
///
/// The error side is a language fault; it is attached to a source location
/// and reported by the node that produced it, which then evaluates to `nil`.
pub type EvalResult = Result<ValueRef, FaultKind>;

/// Host procedure behind a builtin. `args` are already evaluated and rooted.
pub type NativeFn = fn(&mut Interpreter, &[ValueRef]) -> EvalResult;

/// A builtin backed by host logic.
pub struct NativeFunction {
    pub name: Name,
    /// Required argument count (minimum count when `variadic`).
    pub arity: usize,
    pub variadic: bool,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: Name, arity: usize, variadic: bool, func: NativeFn) -> Self {
        NativeFunction {
            name,
            arity,
            variadic,
            func,
        }
    }

    /// Whether `count` arguments satisfy the declared arity.
    #[inline]
    pub fn accepts(&self, count: usize) -> bool {
        if self.variadic {
            count >= self.arity
        } else {
            count == self.arity
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("variadic", &self.variadic)
            .finish_non_exhaustive()
    }
}

/// A function defined in Tarn code.
#[derive(Debug)]
pub struct UserFunction {
    pub def: Rc<FnDef>,
    /// Scope the function was defined in; parent of every call frame.
    pub scope: ScopeId,
    /// Implicit leading parameter for methods (`self`).
    pub receiver: Option<Name>,
}

impl UserFunction {
    /// Parameter names in binding order, receiver first.
    pub fn params(&self) -> impl Iterator<Item = Name> + '_ {
        self.receiver.into_iter().chain(self.def.params.iter().copied())
    }

    pub fn param_count(&self) -> usize {
        self.def.params.len() + usize::from(self.receiver.is_some())
    }

    /// Arguments that must be supplied; the variadic tail may be empty.
    pub fn required(&self) -> usize {
        if self.def.variadic {
            self.param_count().saturating_sub(1)
        } else {
            self.param_count()
        }
    }
}

/// Anything that can sit in a method table or be called.
#[derive(Clone, Debug)]
pub enum Callable {
    User(Rc<UserFunction>),
    Native(Rc<NativeFunction>),
}

impl Callable {
    pub fn name(&self) -> Name {
        match self {
            Callable::User(f) => f.def.name,
            Callable::Native(f) => f.name,
        }
    }
}

/// Payload of a value: one variant per runtime kind.
#[derive(Clone, Debug)]
pub enum Payload {
    Nil,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    Vector(Vec<ValueRef>),
    Function(Rc<UserFunction>),
    Builtin(Rc<NativeFunction>),
    /// An imported module, by name.
    Module(Name),
    /// A type descriptor exposed as a value; calling it constructs an instance.
    Type(TypeId),
    /// Field slots of a user-type instance, in member order.
    Instance(Vec<ValueRef>),
}

impl Payload {
    /// The callable this payload wraps, if any.
    pub fn as_callable(&self) -> Option<Callable> {
        match self {
            Payload::Function(f) => Some(Callable::User(Rc::clone(f))),
            Payload::Builtin(f) => Some(Callable::Native(Rc::clone(f))),
            Payload::Nil
            | Payload::Bool(_)
            | Payload::Int(_)
            | Payload::Real(_)
            | Payload::Str(_)
            | Payload::Vector(_)
            | Payload::Module(_)
            | Payload::Type(_)
            | Payload::Instance(_) => None,
        }
    }
}

impl GcTrace for Payload {
    fn trace(&self, out: &mut Vec<GcRef>) {
        match self {
            Payload::Vector(items) | Payload::Instance(items) => {
                out.extend(items.iter().filter_map(|v| v.as_gc()));
            }
            Payload::Nil
            | Payload::Bool(_)
            | Payload::Int(_)
            | Payload::Real(_)
            | Payload::Str(_)
            | Payload::Function(_)
            | Payload::Builtin(_)
            | Payload::Module(_)
            | Payload::Type(_) => {}
        }
    }
}

/// A runtime datum: its type and its payload.
#[derive(Clone, Debug)]
pub struct Value {
    pub ty: TypeId,
    pub payload: Payload,
}

impl Value {
    #[inline]
    pub fn new(ty: TypeId, payload: Payload) -> Self {
        Value { ty, payload }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self.payload {
            Payload::Int(i) => Some(i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_real(&self) -> Option<f64> {
        match self.payload {
            Payload::Real(r) => Some(r),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl GcTrace for Value {
    #[inline]
    fn trace(&self, out: &mut Vec<GcRef>) {
        self.payload.trace(out);
    }
}

#[cfg(test)]
mod tests;
