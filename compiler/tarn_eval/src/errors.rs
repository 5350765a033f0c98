//! Structural errors returned by the runtime's construction APIs.
//!
//! These are result codes for embedders and bootstrap code (type registry,
//! scope insertion, module registration, allocation). They are never visible
//! to scripts; language-level problems are `Fault`s (see `diagnostics`).

use thiserror::Error;

/// Result code of a runtime construction API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// An argument violates the API's preconditions.
    #[error("invalid argument")]
    InvalidArgument,
    /// The heap could not hand out another slot.
    #[error("allocation failed")]
    AllocFailed,
    /// The key is already bound in this exact table.
    #[error("key already in table")]
    KeyAlreadyInTable,
    /// The key is not bound in the table.
    #[error("key not in table")]
    KeyNotInTable,
    /// No type on the inheritance chain defines the method.
    #[error("method not found")]
    MethodNotFound,
}

/// Error returned by `ScopeStack::assign` when assignment fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AssignError {
    /// Variable exists but is immutable.
    #[error("binding is immutable")]
    Immutable,
    /// Variable not found in any scope.
    #[error("binding is undefined")]
    Undefined,
}
