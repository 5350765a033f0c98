//! Language faults and call-stack tracking.
//!
//! A fault is a recoverable, script-visible error: the node that raised it
//! evaluates to `nil`, the fault is recorded in the interpreter's log and
//! evaluation continues. Faults carry already-resolved names so they can be
//! displayed without an interner.
//!
//! `CallStack` tracks live calls; its depth check turns runaway recursion
//! into a `RecursionLimit` fault and its frames become the fault backtrace.

use std::fmt::Write as _;

use tarn_ir::{Name, SourceLoc, StringInterner};
use thiserror::Error;

/// Kind and message of a language fault.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FaultKind {
    #[error("cannot assign to immutable binding `{name}`")]
    ImmutableBinding { name: String },

    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { name: String },

    #[error("`{callee}` expects {expected} argument(s), got {got}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        got: usize,
    },

    #[error("type `{ty}` has no method `{method}`")]
    MethodNotFound { ty: String, method: String },

    #[error("value of type `{ty}` is not callable")]
    NotCallable { ty: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in `{op}`")]
    IntegerOverflow { op: &'static str },

    #[error("invalid operand of type `{ty}` for `{op}`")]
    InvalidOperand { op: &'static str, ty: String },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("unknown module `{name}`")]
    UnknownModule { name: String },

    #[error("`{owner}` has no member `{member}`")]
    UnknownMember { owner: String, member: String },

    #[error("unknown type `{name}`")]
    UnknownType { name: String },

    #[error("`{name}` is already defined in this scope")]
    AlreadyDefined { name: String },

    #[error("maximum recursion depth exceeded ({limit})")]
    RecursionLimit { limit: usize },

    #[error("result of `{op}` would exceed {limit} bytes")]
    SizeLimit { op: &'static str, limit: usize },
}

/// A reported fault: what went wrong, where, and the calls leading there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub loc: SourceLoc,
    /// Live calls at report time, innermost first.
    pub backtrace: Vec<CallFrame>,
}

impl Fault {
    /// `file:line:col: error: message`, followed by one line per call frame.
    pub fn render(&self, interner: &StringInterner) -> String {
        let mut out = format!("{}: error: {}", self.loc.display(interner), self.kind);
        for frame in &self.backtrace {
            let _ = write!(
                out,
                "\n  in {} called at {}",
                interner.lookup(frame.name),
                frame.call_loc.display(interner)
            );
        }
        out
    }
}

/// A single frame in the live call stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// Function or method name.
    pub name: Name,
    /// Location of the call site, not the definition.
    pub call_loc: SourceLoc,
}

/// Live call stack for the interpreter.
///
/// Each call pushes a frame and pops it on return. The depth check is part of
/// `push`, so a call that would exceed the limit never starts.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `max_depth` of `None` means unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a call frame, checking the depth limit. The frame is not pushed
    /// on overflow.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), FaultKind> {
        if let Some(limit) = self.max_depth {
            if self.frames.len() >= limit {
                return Err(FaultKind::RecursionLimit { limit });
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Snapshot of the live frames, most recent call first.
    pub fn capture(&self) -> Vec<CallFrame> {
        self.frames.iter().rev().copied().collect()
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(interner: &StringInterner, name: &str, line: u32) -> CallFrame {
        CallFrame {
            name: interner.intern(name),
            call_loc: SourceLoc::new(interner.intern("main.tn"), line, 1),
        }
    }

    #[test]
    fn test_push_respects_limit() {
        let interner = StringInterner::new();
        let mut stack = CallStack::new(Some(2));
        assert!(stack.push(frame(&interner, "a", 1)).is_ok());
        assert!(stack.push(frame(&interner, "b", 2)).is_ok());
        assert_eq!(
            stack.push(frame(&interner, "c", 3)),
            Err(FaultKind::RecursionLimit { limit: 2 })
        );
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_capture_is_innermost_first() {
        let interner = StringInterner::new();
        let mut stack = CallStack::default();
        stack.push(frame(&interner, "outer", 1)).ok();
        stack.push(frame(&interner, "inner", 2)).ok();
        let names: Vec<&str> = stack
            .capture()
            .iter()
            .map(|f| interner.lookup(f.name))
            .collect();
        assert_eq!(names, vec!["inner", "outer"]);
        stack.pop();
        stack.pop();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_render_includes_location_and_frames() {
        let interner = StringInterner::new();
        let fault = Fault {
            kind: FaultKind::ImmutableBinding {
                name: "y".to_owned(),
            },
            loc: SourceLoc::new(interner.intern("main.tn"), 2, 3),
            backtrace: vec![frame(&interner, "f", 7)],
        };
        assert_eq!(
            fault.render(&interner),
            "main.tn:2:3: error: cannot assign to immutable binding `y`\n  in f called at main.tn:7:1"
        );
    }
}
