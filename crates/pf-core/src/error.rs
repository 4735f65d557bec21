//! Unified error type for portalfs.
//!
//! Every crate funnels its failures into [`Error`], which carries enough
//! context for API handlers to derive an HTTP status code via
//! [`Error::http_status`] and a caller-safe message via
//! [`Error::public_message`].

use std::fmt;

/// Unified error type covering all failure modes in portalfs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested object or prefix does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "folder", "image").
        entity: String,
        /// The key or prefix that was looked up.
        id: String,
    },

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request data failed validation. Always raised before touching storage.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing object store rejected or failed a call.
    #[error("Storage error [{operation}]: {source}")]
    Storage {
        /// The store operation that failed (list, get, put, ...).
        operation: String,
        /// The underlying backend error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Unauthorized(_) => 401,
            Error::Validation(_) => 400,
            Error::Storage { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Unauthorized(_) => "unauthorized",
            Error::Validation(_) => "validation_error",
            Error::Storage { .. } => "storage_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to return to a caller.
    ///
    /// Server-side failures never leak their cause; it is logged instead.
    /// Storage failures name only the operation.
    pub fn public_message(&self) -> String {
        match self {
            Error::Storage { operation, .. } => format!("Storage operation failed: {operation}"),
            Error::Io { .. } | Error::Internal(_) => "Internal server error".into(),
            other => other.to_string(),
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Storage`].
    pub fn storage(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Storage {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
