//! Tarn Eval - runtime for the Tarn scripting language.
//!
//! Gives meaning to a parsed program by walking its tree against a model of
//! typed, garbage-collected values.
//!
//! # Architecture
//!
//! - `Interpreter`: owns every piece of runtime state and evaluates nodes
//! - `TypeRegistry`: type descriptors, member layout, name-based method tables
//!   resolved along the single-inheritance chain
//! - `ScopeStack`: lexical frames with mutability-checked bindings
//! - `Heap`: arena of values with a tracing mark-sweep collector
//! - `ModuleTable`: host-registered modules reachable through `import`
//!
//! Faults raised by a program (`FaultKind`) never unwind the host: the node
//! that raised one reports it and evaluates to `nil`. Construction APIs return
//! `RuntimeError`.

mod builtins;
pub mod diagnostics;
pub mod errors;
pub mod gc;
pub mod interpreter;
pub mod modules;
pub mod operators;
pub mod print_handler;
pub mod scope;
pub mod types;
pub mod value;

use std::sync::Once;

pub use diagnostics::{CallFrame, Fault, FaultKind};
pub use errors::{AssignError, RuntimeError};
pub use gc::{GcConfig, GcRef, GcStats, Heap};
pub use interpreter::{Interpreter, InterpreterBuilder, DEFAULT_MAX_CALL_DEPTH};
pub use modules::{Module, ModuleTable};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};
pub use scope::{ScopeId, ScopeStack};
pub use types::{TypeId, TypeInfo, TypeKind, TypeRegistry};
pub use value::{Callable, EvalResult, NativeFn, Payload, Value, ValueRef};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set; safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
