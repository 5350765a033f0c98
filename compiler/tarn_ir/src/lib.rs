//! Tarn IR - syntax tree and identifier types shared by the parser and the runtime.
//!
//! This crate contains:
//! - `Name` and `StringInterner` for interned identifiers
//! - `SourceLoc` for filename/line/column annotations
//! - The syntax tree (`Node`, `NodeKind`) a parser hands to the evaluator
//! - `AstBuilder`, a convenience constructor for trees (parsers, tests, embedders)
//!
//! The tree is a validated, fully-annotated product of parsing: every node
//! carries its kind, its ordered children and the location it came from.

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
pub mod builder;
mod interner;
mod loc;
mod name;

pub use ast::{BinaryOp, FnDef, Literal, Mutability, Node, NodeKind, UnaryOp};
pub use builder::AstBuilder;
pub use interner::{InternError, SharedInterner, StringInterner};
pub use loc::SourceLoc;
pub use name::Name;
