//! Text rendering of values for `str`, `dbg`, `print` and diagnostics.

use std::fmt::Write as _;

use tarn_ir::SourceLoc;

use crate::diagnostics::FaultKind;
use crate::interpreter::Interpreter;
use crate::value::{Payload, ValueRef};

/// Nesting beyond which containers render as `...`; cuts self-reference.
const MAX_RENDER_DEPTH: usize = 32;

impl Interpreter {
    /// Render `v` through its type's `str` method.
    pub(crate) fn render(&mut self, v: ValueRef) -> Result<String, FaultKind> {
        let method = self.names.str_;
        let text = self.with_temp_roots(|this| {
            this.root(v);
            this.call_method(v, method, &[], SourceLoc::DUMMY)
        })?;
        Ok(match self.value(text).as_str() {
            Some(s) => s.to_owned(),
            None => self.render_default(text),
        })
    }

    /// The builtin `str` rendering. Container elements render through their
    /// own `str` methods.
    pub(crate) fn render_payload(&mut self, v: ValueRef) -> Result<String, FaultKind> {
        let Payload::Vector(items) = &self.value(v).payload else {
            return Ok(self.render_default(v));
        };
        if self.render_depth >= MAX_RENDER_DEPTH {
            return Ok("[...]".to_owned());
        }
        let items = items.clone();
        self.render_depth += 1;
        let rendered: Result<Vec<String>, FaultKind> =
            items.into_iter().map(|item| self.render(item)).collect();
        self.render_depth -= 1;
        Ok(format!("[{}]", rendered?.join(", ")))
    }

    /// Rendering that never dispatches; used for fallbacks and fault text.
    pub(crate) fn render_default(&self, v: ValueRef) -> String {
        let mut out = String::new();
        self.write_default(&mut out, v, 0);
        out
    }

    fn write_default(&self, out: &mut String, v: ValueRef, depth: usize) {
        let value = self.value(v);
        let _ = match &value.payload {
            Payload::Nil => write!(out, "nil"),
            Payload::Bool(b) => write!(out, "{b}"),
            Payload::Int(i) => write!(out, "{i}"),
            Payload::Real(r) => write!(out, "{r:?}"),
            Payload::Str(s) => write!(out, "{s}"),
            Payload::Vector(items) => {
                if depth >= MAX_RENDER_DEPTH {
                    out.push_str("[...]");
                    return;
                }
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_default(out, *item, depth + 1);
                }
                out.push(']');
                Ok(())
            }
            Payload::Function(f) => write!(out, "<fn {}>", self.interner().lookup(f.def.name)),
            Payload::Builtin(f) => write!(out, "<builtin {}>", self.interner().lookup(f.name)),
            Payload::Module(m) => write!(out, "<module {}>", self.interner().lookup(*m)),
            Payload::Type(ty) => write!(out, "{}", self.interner().lookup(self.types.name_of(*ty))),
            Payload::Instance(_) => write!(out, "<{} instance>", self.type_name(v)),
        };
    }

    /// `Type(text)`, quoting strings.
    pub(crate) fn render_dbg(&mut self, v: ValueRef) -> Result<String, FaultKind> {
        let ty = self.type_name(v);
        if let Some(s) = self.value(v).as_str() {
            return Ok(format!("{ty}({s:?})"));
        }
        let text = self.render(v)?;
        Ok(format!("{ty}({text})"))
    }
}
