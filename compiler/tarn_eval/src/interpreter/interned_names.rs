//! Pre-interned names for hot-path dispatch.
//!
//! Interned once at construction so operator dispatch compares `Name`s
//! instead of hashing strings on every call.

use tarn_ir::{BinaryOp, Name, StringInterner, UnaryOp};

/// Method names that operators, constructors and rendering dispatch to.
#[derive(Clone, Copy)]
pub(crate) struct OpNames {
    pub(crate) add: Name,
    pub(crate) sub: Name,
    pub(crate) mul: Name,
    pub(crate) div: Name,
    pub(crate) rem: Name,
    pub(crate) pow: Name,
    pub(crate) eq: Name,
    pub(crate) ne: Name,
    pub(crate) lt: Name,
    pub(crate) le: Name,
    pub(crate) gt: Name,
    pub(crate) ge: Name,
    pub(crate) neg: Name,
    pub(crate) not: Name,
    pub(crate) index: Name,
    pub(crate) str_: Name,
    pub(crate) hash: Name,
    pub(crate) dbg: Name,
    pub(crate) len: Name,
    pub(crate) new: Name,
    pub(crate) self_: Name,
}

impl OpNames {
    pub(crate) fn new(interner: &StringInterner) -> Self {
        Self {
            add: interner.intern("add"),
            sub: interner.intern("sub"),
            mul: interner.intern("mul"),
            div: interner.intern("div"),
            rem: interner.intern("mod"),
            pow: interner.intern("pow"),
            eq: interner.intern("eq"),
            ne: interner.intern("ne"),
            lt: interner.intern("lt"),
            le: interner.intern("le"),
            gt: interner.intern("gt"),
            ge: interner.intern("ge"),
            neg: interner.intern("neg"),
            not: interner.intern("not"),
            index: interner.intern("index"),
            str_: interner.intern("str"),
            hash: interner.intern("hash"),
            dbg: interner.intern("dbg"),
            len: interner.intern("len"),
            new: interner.intern("new"),
            self_: interner.intern("self"),
        }
    }

    /// Method a binary operator dispatches to; `None` for `and`/`or`.
    pub(crate) fn binary(&self, op: BinaryOp) -> Option<Name> {
        Some(match op {
            BinaryOp::Add => self.add,
            BinaryOp::Sub => self.sub,
            BinaryOp::Mul => self.mul,
            BinaryOp::Div => self.div,
            BinaryOp::Mod => self.rem,
            BinaryOp::Pow => self.pow,
            BinaryOp::Eq => self.eq,
            BinaryOp::NotEq => self.ne,
            BinaryOp::Lt => self.lt,
            BinaryOp::LtEq => self.le,
            BinaryOp::Gt => self.gt,
            BinaryOp::GtEq => self.ge,
            BinaryOp::And | BinaryOp::Or => return None,
        })
    }

    pub(crate) fn unary(&self, op: UnaryOp) -> Name {
        match op {
            UnaryOp::Neg => self.neg,
            UnaryOp::Not => self.not,
        }
    }
}
