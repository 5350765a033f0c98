//! Console output for `print`, `println`, `dbg`, `gc_dump` and fault echo.
//!
//! Output goes through a handler chosen when the interpreter is built:
//! - `Stdout`: the process console (program output to stdout, faults to stderr)
//! - `Buffer`: captured in memory, for tests and embedders
//! - `Silent`: discarded
//!
//! Enum dispatch rather than trait objects keeps the hot `print` path static.

use std::sync::Arc;

use parking_lot::Mutex;

/// Captured output, split by stream.
#[derive(Default)]
pub struct BufferPrintHandler {
    out: Mutex<String>,
    err: Mutex<String>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written to the output stream so far.
    pub fn output(&self) -> String {
        self.out.lock().clone()
    }

    /// Everything written to the error stream so far.
    pub fn errors(&self) -> String {
        self.err.lock().clone()
    }

    pub fn clear(&self) {
        self.out.lock().clear();
        self.err.lock().clear();
    }
}

/// Print handler implementation using enum dispatch.
pub enum PrintHandlerImpl {
    /// Writes to the process console.
    Stdout,
    /// Captures to memory.
    Buffer(BufferPrintHandler),
    /// Discards all output.
    Silent,
}

impl PrintHandlerImpl {
    /// Write `msg` without a trailing newline.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => print!("{msg}"),
            Self::Buffer(h) => h.out.lock().push_str(msg),
            Self::Silent => {}
        }
    }

    /// Write `msg` and a newline.
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => println!("{msg}"),
            Self::Buffer(h) => {
                let mut out = h.out.lock();
                out.push_str(msg);
                out.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Write a diagnostic line to the error stream.
    pub fn error(&self, msg: &str) {
        match self {
            Self::Stdout => eprintln!("{msg}"),
            Self::Buffer(h) => {
                let mut err = h.err.lock();
                err.push_str(msg);
                err.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Captured output stream; empty for handlers that don't capture.
    pub fn output(&self) -> String {
        match self {
            Self::Buffer(h) => h.output(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    /// Captured error stream; empty for handlers that don't capture.
    pub fn errors(&self) -> String {
        match self {
            Self::Buffer(h) => h.errors(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }
}

/// Shared print handler; the embedder keeps a clone to read captured output.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(BufferPrintHandler::new()))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_buffer_separates_streams() {
        let handler = buffer_handler();
        handler.print("a");
        handler.println("b");
        handler.error("oops");
        assert_eq!(handler.output(), "ab\n");
        assert_eq!(handler.errors(), "oops\n");

        handler.clear();
        assert_eq!(handler.output(), "");
        assert_eq!(handler.errors(), "");
    }

    #[test]
    fn test_silent_captures_nothing() {
        let handler = silent_handler();
        handler.println("hidden");
        assert_eq!(handler.output(), "");
    }
}
