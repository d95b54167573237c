//! # Pool Error Types
//!
//! All errors that can occur in the pooling system.
//!
//! None of these abort the caller. The degraded registry operations log them
//! and carry on; the `try_*` operations hand them back for inspection.

use thiserror::Error;

/// Errors that can occur in the pooling system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No entity pool is registered under the requested name.
    #[error("pool not found: '{name}'")]
    PoolNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// No typed pool is registered for the requested type.
    #[error("pool for type '{type_name}' not found")]
    TypedPoolNotFound {
        /// The type that was looked up.
        type_name: &'static str,
    },

    /// An entity was narrowed to a capability it does not support.
    ///
    /// This is a caller bug. The entity is returned to its pool before the
    /// error is reported.
    #[error("entity from pool '{pool}' does not support capability '{capability}'")]
    CapabilityMismatch {
        /// The pool the entity came from.
        pool: String,
        /// The requested capability type.
        capability: &'static str,
    },

    /// The pool manifest could not be parsed or failed validation.
    #[error("invalid pool manifest: {0}")]
    InvalidManifest(String),

    /// The pool manifest file could not be read.
    #[error("cannot read pool manifest {path}: {message}")]
    ManifestIo {
        /// Path of the manifest file.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
