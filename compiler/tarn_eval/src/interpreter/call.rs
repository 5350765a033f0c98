//! Calls: user functions, builtins, methods and constructors.
//!
//! Arguments reach a callee already evaluated and rooted by the caller.
//! User functions receive independent copies of their arguments (vectors and
//! instances are copied all the way down), bound in a frame whose parent is
//! the scope the function was defined in.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tarn_ir::{Mutability, Name, SourceLoc};

use super::eval::Args;
use super::{ensure_sufficient_stack, Interpreter};
use crate::diagnostics::{CallFrame, FaultKind};
use crate::gc::GcRef;
use crate::types::TypeId;
use crate::value::{Callable, EvalResult, NativeFunction, Payload, UserFunction, Value, ValueRef};

impl Interpreter {
    /// Call whatever `callee` holds: a function, a builtin, or a type
    /// (which constructs through its `new` method).
    pub fn call_value(&mut self, callee: ValueRef, args: &[ValueRef], loc: SourceLoc) -> EvalResult {
        let value = self.value(callee);
        if let Some(callable) = value.payload.as_callable() {
            return self.call_callable(&callable, args, loc);
        }
        if let Payload::Type(ty) = value.payload {
            let new = self.names.new;
            return self.call_on_type(ty, new, callee, args, loc);
        }
        Err(FaultKind::NotCallable {
            ty: self.type_name(callee).to_owned(),
        })
    }

    /// `recv.method(args)`: resolve on the receiver's type and call with the
    /// receiver prepended. `T.new(...)` on a type value resolves on `T`.
    pub fn call_method(
        &mut self,
        recv: ValueRef,
        method: Name,
        args: &[ValueRef],
        loc: SourceLoc,
    ) -> EvalResult {
        let value = self.value(recv);
        let ty = match value.payload {
            Payload::Type(described) if method == self.names.new => described,
            _ => value.ty,
        };
        self.call_on_type(ty, method, recv, args, loc)
    }

    /// Resolve `method` starting at `ty` and call it as `method(recv, args...)`.
    pub(crate) fn call_on_type(
        &mut self,
        ty: TypeId,
        method: Name,
        recv: ValueRef,
        args: &[ValueRef],
        loc: SourceLoc,
    ) -> EvalResult {
        let callable = match self.types.lookup_method(ty, method) {
            Ok(resolved) => resolved.entry.callable.clone(),
            Err(_) => {
                return Err(FaultKind::MethodNotFound {
                    ty: self.interner().lookup(self.types.name_of(ty)).to_owned(),
                    method: self.interner().lookup(method).to_owned(),
                })
            }
        };
        let mut full: Args = SmallVec::with_capacity(args.len() + 1);
        full.push(recv);
        full.extend_from_slice(args);
        self.call_callable(&callable, &full, loc)
    }

    /// Invoke a callable with evaluated, rooted arguments.
    #[tracing::instrument(level = "debug", skip_all, fields(depth = self.call_stack.depth()))]
    pub fn call_callable(
        &mut self,
        callable: &Callable,
        args: &[ValueRef],
        loc: SourceLoc,
    ) -> EvalResult {
        match callable {
            Callable::Native(f) => self.call_native(f, args, loc),
            Callable::User(f) => self.call_user(f, args, loc),
        }
    }

    fn arity_fault(&self, name: Name, expected: usize, got: usize) -> FaultKind {
        FaultKind::ArityMismatch {
            callee: self.interner().lookup(name).to_owned(),
            expected,
            got,
        }
    }

    fn call_native(&mut self, f: &NativeFunction, args: &[ValueRef], loc: SourceLoc) -> EvalResult {
        if !f.accepts(args.len()) {
            return Err(self.arity_fault(f.name, f.arity, args.len()));
        }
        self.call_stack.push(CallFrame {
            name: f.name,
            call_loc: loc,
        })?;
        let result = (f.func)(self, args);
        self.call_stack.pop();
        result
    }

    fn call_user(&mut self, f: &Rc<UserFunction>, args: &[ValueRef], loc: SourceLoc) -> EvalResult {
        let required = f.required();
        let accepted = if f.def.variadic {
            args.len() >= required
        } else {
            args.len() == required
        };
        if !accepted {
            return Err(self.arity_fault(f.def.name, required, args.len()));
        }
        self.call_stack.push(CallFrame {
            name: f.def.name,
            call_loc: loc,
        })?;
        tracing::trace!(name = self.interner().lookup(f.def.name), "call");

        let result = self.with_temp_roots(|this| {
            let copies: Args = args
                .iter()
                .map(|&arg| {
                    let copy = this.duplicate(arg);
                    this.root(copy)
                })
                .collect();
            let bound = if f.def.variadic {
                let (fixed, rest) = copies.split_at(required);
                let rest = this.alloc_payload(TypeId::VECTOR, Payload::Vector(rest.to_vec()));
                let mut bound: Args = SmallVec::from_slice(fixed);
                bound.push(this.root(rest));
                bound
            } else {
                copies
            };

            this.with_function_scope(f.scope, |scope| {
                for (name, value) in f.params().zip(bound.iter().copied()) {
                    scope.bind(name, value, Mutability::Mutable, f.def.body.loc)?;
                }
                Ok(scope.eval_statements(&f.def.body.children))
            })
        });

        self.call_stack.pop();
        result
    }

    /// An independent copy of `v`. Singletons are shared.
    ///
    /// Vectors and instances are copied element by element. A value reached
    /// twice is copied once, so shared and cyclic structure keeps its shape.
    /// Every copy is rooted in the caller's temporary-root scope.
    pub(crate) fn duplicate(&mut self, v: ValueRef) -> ValueRef {
        let mut copies = FxHashMap::default();
        self.duplicate_into(v, &mut copies)
    }

    fn duplicate_into(&mut self, v: ValueRef, copies: &mut FxHashMap<GcRef, ValueRef>) -> ValueRef {
        let Some(r) = v.as_gc() else {
            return v;
        };
        if let Some(&copy) = copies.get(&r) {
            return copy;
        }
        let original = self.value(v).clone();
        let elements = match &original.payload {
            Payload::Vector(items) | Payload::Instance(items) => Some(items.clone()),
            _ => None,
        };
        let Some(elements) = elements else {
            let copy = self.alloc(original);
            copies.insert(r, copy);
            return self.root(copy);
        };

        // The shell starts out holding the original elements, which the
        // caller keeps alive, and is registered before recursing so a cycle
        // back to `v` lands on it.
        let shell = self.alloc(original);
        self.root(shell);
        copies.insert(r, shell);
        for (i, element) in elements.into_iter().enumerate() {
            let copy = ensure_sufficient_stack(|| self.duplicate_into(element, copies));
            if let Some(Value {
                payload: Payload::Vector(items) | Payload::Instance(items),
                ..
            }) = self.value_mut(shell)
            {
                if let Some(slot) = items.get_mut(i) {
                    *slot = copy;
                }
            }
        }
        shell
    }
}
