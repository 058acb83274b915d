//! Runtime error types for intrinsic dispatch
//!
//! This module provides the error taxonomy shared by the value domain and
//! the dispatch engine. Contract violations (mismatched vector lengths,
//! integer `abs` overflow) are not represented here: they are programming
//! errors and fail fast through assertions.

use std::path::PathBuf;

use thiserror::Error;

use crate::memory::MemoryFault;

/// Runtime error type
///
/// Every recoverable failure of an intrinsic call surfaces to the immediate
/// caller as one of these variants. Nothing is logged or retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// No catalog entry matches the operand kinds at a call site
    #[error("UnsupportedOperands: no specialization of {operation} for ({operands})")]
    UnsupportedOperands {
        /// Operation name as written at the call site
        operation: String,
        /// Comma-separated operand kind names
        operands: String,
    },

    /// Operation name is not part of the catalog
    #[error("UnknownOperation: {0}")]
    UnknownOperation(String),

    /// Foreign parse, compile or execute failure
    #[error("EvalError: {language}: {message}")]
    Eval {
        /// Language identifier (or MIME type for legacy evaluation)
        language: String,
        /// Diagnostic reported by the language host
        message: String,
    },

    /// Foreign source file could not be read or parsed
    #[error("EvalError: Could not parse file {} ({message})", path.display())]
    FileEval {
        /// Path handed to the file entry point
        path: PathBuf,
        /// Diagnostic reported by the language host
        message: String,
    },

    /// Fault raised by the external memory capability, passed through unmodified
    #[error(transparent)]
    Memory(#[from] MemoryFault),

    /// Internal runtime failure (e.g. arithmetic constants could not be set up)
    #[error("InternalError: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// Create an unsupported-operands error from an operation name and operand kind names
    pub fn unsupported_operands<S, I, T>(operation: S, operands: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let operands = operands
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        RuntimeError::UnsupportedOperands {
            operation: operation.into(),
            operands,
        }
    }

    /// Create an unknown-operation error
    pub fn unknown_operation<S: Into<String>>(name: S) -> Self {
        RuntimeError::UnknownOperation(name.into())
    }

    /// Create an evaluation failure
    pub fn eval_failure<S1: Into<String>, S2: Into<String>>(language: S1, message: S2) -> Self {
        RuntimeError::Eval {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Create a file evaluation failure
    pub fn file_eval_failure<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        RuntimeError::FileEval {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        RuntimeError::Internal(msg.into())
    }

    /// True for failures that originate in the foreign language host
    pub fn is_eval_failure(&self) -> bool {
        matches!(self, RuntimeError::Eval { .. } | RuntimeError::FileEval { .. })
    }
}

/// Result type alias for intrinsic operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
