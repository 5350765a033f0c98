//! The runtime context and tree-walking evaluator.
//!
//! One [`Interpreter`] owns everything a running program touches: the heap,
//! the type registry, the scope stack, the module table, the fault log and
//! the output handler. There is no global state; two interpreters never share
//! values.
//!
//! # Rooting
//!
//! Every allocation goes through [`Interpreter::alloc`], which may collect
//! before allocating. Values bound in a scope frame or a module are roots.
//! Values the evaluator holds in locals across a nested evaluation are not,
//! so they go on the temporary-root stack (`root`) inside
//! [`Interpreter::with_temp_roots`], which unwinds it on exit.

mod builder;
mod call;
mod eval;
mod interned_names;
mod scope_guard;

pub use builder::InterpreterBuilder;
pub use scope_guard::ScopedInterpreter;

pub(crate) use interned_names::OpNames;

use tarn_ir::{Mutability, Name, Node, SharedInterner, SourceLoc, StringInterner};

use crate::diagnostics::{CallStack, Fault, FaultKind};
use crate::errors::RuntimeError;
use crate::gc::{GcRef, GcStats, GcTrace, Heap};
use crate::modules::ModuleTable;
use crate::print_handler::SharedPrintHandler;
use crate::scope::ScopeStack;
use crate::types::{TypeId, TypeRegistry};
use crate::value::{NativeFn, NativeFunction, Payload, Value, ValueRef};

/// Default limit on nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Run `f` with at least a red zone of stack, growing the stack if needed.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    const RED_ZONE: usize = 128 * 1024;
    const GROW_BY: usize = 2 * 1024 * 1024;
    stacker::maybe_grow(RED_ZONE, GROW_BY, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// `Value`s of the three singletons. They live as long as the interpreter
/// and are never on the heap.
struct Singletons {
    nil: Value,
    true_: Value,
    false_: Value,
}

impl Singletons {
    fn new() -> Self {
        Singletons {
            nil: Value::new(TypeId::NIL, Payload::Nil),
            true_: Value::new(TypeId::BOOLEAN, Payload::Bool(true)),
            false_: Value::new(TypeId::BOOLEAN, Payload::Bool(false)),
        }
    }
}

/// A Tarn runtime.
pub struct Interpreter {
    interner: SharedInterner,
    pub(crate) heap: Heap,
    pub(crate) types: TypeRegistry,
    pub(crate) env: ScopeStack,
    pub(crate) modules: ModuleTable,
    /// Values held by the evaluator across nested evaluation.
    temps: Vec<ValueRef>,
    faults: Vec<Fault>,
    pub(crate) call_stack: CallStack,
    print_handler: SharedPrintHandler,
    echo_faults: bool,
    singletons: Singletons,
    pub(crate) names: OpNames,
    /// Nesting of `str` rendering, to cut off self-containing vectors.
    pub(crate) render_depth: usize,
}

impl Interpreter {
    /// An interpreter with default settings, printing to stdout.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn shared_interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn gc_stats(&self) -> GcStats {
        self.heap.stats()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn env(&self) -> &ScopeStack {
        &self.env
    }

    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    /// Resolve a handle.
    ///
    /// # Panics
    ///
    /// Panics if `v` refers to a collected value. Reachable handles never do;
    /// hitting this means a value was held without being rooted.
    #[inline]
    pub fn value(&self, v: ValueRef) -> &Value {
        match v {
            ValueRef::Nil => &self.singletons.nil,
            ValueRef::True => &self.singletons.true_,
            ValueRef::False => &self.singletons.false_,
            ValueRef::Heap(r) => match self.heap.get(r) {
                Some(value) => value,
                None => panic!("{}", self.heap.stale_reason(r)),
            },
        }
    }

    /// Mutable access to a heap value; `None` for singletons.
    ///
    /// # Panics
    ///
    /// Panics if `v` refers to a collected value.
    pub fn value_mut(&mut self, v: ValueRef) -> Option<&mut Value> {
        let r = v.as_gc()?;
        if !self.heap.contains(r) {
            panic!("{}", self.heap.stale_reason(r));
        }
        self.heap.get_mut(r)
    }

    #[inline]
    pub fn type_of(&self, v: ValueRef) -> TypeId {
        self.value(v).ty
    }

    /// Display name of `v`'s type.
    pub fn type_name(&self, v: ValueRef) -> &'static str {
        self.interner.lookup(self.types.name_of(self.type_of(v)))
    }

    /// Allocate `value`, collecting first if the heap is over its threshold.
    ///
    /// References inside `value` are treated as roots for that collection.
    pub fn try_alloc(&mut self, value: Value) -> Result<ValueRef, RuntimeError> {
        if self.heap.should_collect() {
            let mut roots = self.roots();
            value.trace(&mut roots);
            self.heap.collect(roots);
        }
        self.heap.insert(value).map(ValueRef::Heap)
    }

    /// Allocate `value`.
    ///
    /// # Panics
    ///
    /// Panics if the heap has run out of slot indices. Use `try_alloc` for
    /// fallible allocation.
    pub fn alloc(&mut self, value: Value) -> ValueRef {
        self.try_alloc(value)
            .unwrap_or_else(|e| panic!("heap exhausted: {e}"))
    }

    /// Allocate a value of `ty` holding `payload`.
    #[inline]
    pub fn alloc_payload(&mut self, ty: TypeId, payload: Payload) -> ValueRef {
        self.alloc(Value::new(ty, payload))
    }

    pub fn alloc_int(&mut self, i: i64) -> ValueRef {
        self.alloc_payload(TypeId::INTEGER, Payload::Int(i))
    }

    pub fn alloc_real(&mut self, r: f64) -> ValueRef {
        self.alloc_payload(TypeId::REAL, Payload::Real(r))
    }

    pub fn alloc_str(&mut self, s: impl Into<String>) -> ValueRef {
        self.alloc_payload(TypeId::STRING, Payload::Str(s.into()))
    }

    /// Every handle the program can still reach.
    fn roots(&self) -> Vec<GcRef> {
        let mut roots: Vec<GcRef> = self.temps.iter().filter_map(|v| v.as_gc()).collect();
        self.env.trace(&mut roots);
        self.modules.trace(&mut roots);
        roots
    }

    /// Collect now, regardless of threshold or the enabled flag.
    pub fn collect_garbage(&mut self) -> usize {
        let roots = self.roots();
        self.heap.collect(roots)
    }

    /// Keep `v` alive until the enclosing `with_temp_roots` returns.
    #[inline]
    pub fn root(&mut self, v: ValueRef) -> ValueRef {
        if v.as_gc().is_some() {
            self.temps.push(v);
        }
        v
    }

    /// Run `f`; values it roots are released when it returns.
    pub fn with_temp_roots<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mark = self.temps.len();
        let result = f(self);
        self.temps.truncate(mark);
        result
    }

    /// Record a fault raised at `loc`.
    pub(crate) fn report(&mut self, kind: FaultKind, loc: SourceLoc) {
        let fault = Fault {
            kind,
            loc,
            backtrace: self.call_stack.capture(),
        };
        let rendered = fault.render(&self.interner);
        tracing::warn!(fault = %rendered, "fault");
        if self.echo_faults {
            self.print_handler.error(&rendered);
        }
        self.faults.push(fault);
    }

    /// Faults reported so far.
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// Drain the fault log.
    pub fn take_faults(&mut self) -> Vec<Fault> {
        std::mem::take(&mut self.faults)
    }

    /// Evaluate a whole program in the global scope.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run_program(&mut self, program: &Node) -> ValueRef {
        let result = self.eval(program);
        tracing::debug!(
            live = self.heap.live(),
            faults = self.faults.len(),
            "program finished"
        );
        result
    }

    /// Evaluate one top-level statement; bindings persist between calls.
    pub fn run_statement(&mut self, statement: &Node) -> ValueRef {
        self.eval(statement)
    }

    /// Bind `name` in the global scope.
    pub fn define_global(
        &mut self,
        name: &str,
        value: ValueRef,
        mutability: Mutability,
    ) -> Result<(), RuntimeError> {
        let name = self.interner.intern(name);
        self.env
            .insert_global(name, value, mutability, SourceLoc::DUMMY)
    }

    /// Register a global builtin function.
    pub fn register_native(
        &mut self,
        name: &str,
        arity: usize,
        variadic: bool,
        func: NativeFn,
    ) -> Result<ValueRef, RuntimeError> {
        let native = NativeFunction::new(self.interner.intern(name), arity, variadic, func);
        let value = self.try_alloc(Value::new(
            TypeId::BUILTIN_FN,
            Payload::Builtin(std::rc::Rc::new(native)),
        ))?;
        self.define_global(name, value, Mutability::Immutable)?;
        Ok(value)
    }

    /// The value bound to `name` as seen from the current scope.
    pub fn lookup(&self, name: &str) -> Option<ValueRef> {
        let name = self.interner.get(name)?;
        self.env.find_nearest(name).map(|e| e.value)
    }

    pub(crate) fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Text of `v` as `print` shows it: the result of its `str` method.
    pub fn display(&mut self, v: ValueRef) -> String {
        match self.render(v) {
            Ok(s) => s,
            Err(kind) => {
                self.report(kind, SourceLoc::DUMMY);
                self.render_default(v)
            }
        }
    }

    /// Output captured by a buffer print handler.
    pub fn output(&self) -> String {
        self.print_handler.output()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
