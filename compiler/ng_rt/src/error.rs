//! Runtime errors.
//!
//! Each variant renders as the one-line diagnostic printed before the
//! process terminates (see [`crate::fail`]). Inside the crate every fallible
//! operation returns [`RtResult`] instead of exiting.

use ng_alloc::AllocError;
use thiserror::Error;

/// Result alias for runtime operations.
pub type RtResult<T> = Result<T, RuntimeError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    // Type/Operator
    #[error("TypeError: unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("TypeError: {message}")]
    Type { message: String },

    // Access
    #[error("IndexError: {container} index {index} out of range")]
    IndexOutOfRange {
        container: &'static str,
        index: i64,
    },
    #[error("IndexError: {message}")]
    Index { message: &'static str },
    #[error("KeyError: {key}")]
    KeyNotFound { key: String },
    #[error("AttributeError: '{type_name}' object has no attribute '{member}'")]
    NoAttribute { type_name: String, member: String },
    #[error("ValueError: {message}")]
    Value { message: String },

    // Arithmetic
    #[error("ZeroDivisionError: {message}")]
    ZeroDivision { message: &'static str },
    #[error("OverflowError: {message}")]
    Overflow { message: String },

    // Resources
    #[error("MemoryError: {0}")]
    Memory(#[from] AllocError),
    #[error("RuntimeError: symbol table is full ({count} names)")]
    SymbolTableFull { count: usize },
}

impl RuntimeError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type {
            message: message.into(),
        }
    }

    pub(crate) fn value_error(message: impl Into<String>) -> Self {
        RuntimeError::Value {
            message: message.into(),
        }
    }

    pub(crate) fn overflow(op: &str) -> Self {
        RuntimeError::Overflow {
            message: format!("integer overflow in {op}"),
        }
    }

    /// The exception-style class name that prefixes the diagnostic.
    pub fn category(&self) -> &'static str {
        match self {
            RuntimeError::UnsupportedOperands { .. } | RuntimeError::Type { .. } => "TypeError",
            RuntimeError::IndexOutOfRange { .. } | RuntimeError::Index { .. } => "IndexError",
            RuntimeError::KeyNotFound { .. } => "KeyError",
            RuntimeError::NoAttribute { .. } => "AttributeError",
            RuntimeError::Value { .. } => "ValueError",
            RuntimeError::ZeroDivision { .. } => "ZeroDivisionError",
            RuntimeError::Overflow { .. } => "OverflowError",
            RuntimeError::Memory(_) => "MemoryError",
            RuntimeError::SymbolTableFull { .. } => "RuntimeError",
        }
    }
}
