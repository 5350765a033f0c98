//! `InterpreterBuilder` for creating interpreters with non-default settings.

use tarn_ir::SharedInterner;

use super::{Interpreter, OpNames, Singletons, DEFAULT_MAX_CALL_DEPTH};
use crate::builtins;
use crate::diagnostics::CallStack;
use crate::gc::{GcConfig, Heap};
use crate::modules::ModuleTable;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::scope::ScopeStack;
use crate::types::TypeRegistry;

/// Builder for [`Interpreter`].
///
/// ```text
/// let output = buffer_handler();
/// let mut interp = Interpreter::builder()
///     .print_handler(output.clone())
///     .gc_config(GcConfig { threshold: 8, enabled: true })
///     .build();
/// ```
pub struct InterpreterBuilder {
    interner: Option<SharedInterner>,
    print_handler: Option<SharedPrintHandler>,
    gc: GcConfig,
    echo_faults: bool,
    max_call_depth: Option<usize>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            interner: None,
            print_handler: None,
            gc: GcConfig::default(),
            echo_faults: true,
            max_call_depth: Some(DEFAULT_MAX_CALL_DEPTH),
        }
    }

    /// Share an interner with the parser that produced the trees.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    /// Where `print`, `println`, `dbg`, `gc_dump` and fault echo write.
    /// Default is stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn gc_config(mut self, config: GcConfig) -> Self {
        self.gc = config;
        self
    }

    /// Read collector settings from `TARN_GC_THRESHOLD` / `TARN_GC_DISABLE`.
    #[must_use]
    pub fn gc_config_from_env(mut self) -> Self {
        self.gc = GcConfig::from_env();
        self
    }

    /// Write each fault to the handler's error stream as it is reported.
    /// On by default; faults are logged either way.
    #[must_use]
    pub fn echo_faults(mut self, echo: bool) -> Self {
        self.echo_faults = echo;
        self
    }

    /// Nested-call limit; `None` for unlimited.
    #[must_use]
    pub fn max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Build the interpreter and install the bootstrap types, builtins and
    /// the `math` module.
    ///
    /// # Panics
    ///
    /// Panics if bootstrap fails, which only happens if the builtin tables
    /// themselves are inconsistent.
    pub fn build(self) -> Interpreter {
        let interner = self.interner.unwrap_or_default();
        let types = TypeRegistry::new(&interner);
        let names = OpNames::new(&interner);
        let mut interpreter = Interpreter {
            heap: Heap::with_config(self.gc),
            types,
            env: ScopeStack::new(),
            modules: ModuleTable::new(),
            temps: Vec::new(),
            faults: Vec::new(),
            call_stack: CallStack::new(self.max_call_depth),
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
            echo_faults: self.echo_faults,
            singletons: Singletons::new(),
            names,
            render_depth: 0,
            interner,
        };
        if let Err(e) = builtins::install(&mut interpreter) {
            panic!("runtime bootstrap failed: {e}");
        }
        tracing::debug!(
            types = interpreter.types.len(),
            live = interpreter.heap.live(),
            "interpreter ready"
        );
        interpreter
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
