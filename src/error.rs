//! Unified error handling for the edumon crate
//!
//! Domain-specific errors (currently [`AllocationError`]) are wrapped into a
//! single [`Error`] enum so storage, seeding and API code can share one
//! `Result` type while keeping the detail of the underlying failure.
//!
//! # Usage
//!
//! ```rust,ignore
//! use edumon::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Validation => tracing::info!(error = %err, "rejected input"),
//!         ErrorCategory::Auth => tracing::warn!(error = %err, "access denied"),
//!         _ => tracing::error!(error = %err, "request failed"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::allocation::AllocationError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Storage and I/O errors
    Storage,
    /// Missing records and rejected input
    Validation,
    /// Rejected credentials and forbidden account operations
    Auth,
    /// Allocation precondition violations
    Allocation,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::Allocation => "allocation",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the edumon crate
#[derive(Error, Debug)]
pub enum Error {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Requested record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credentials were missing or did not match an active account
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The operation is not allowed on this record
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Allocation engine precondition violations
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Database(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::NotFound { .. } | Self::Validation(_) => ErrorCategory::Validation,
            Self::Unauthorized(_) | Self::Forbidden(_) => ErrorCategory::Auth,
            Self::Allocation(_) => ErrorCategory::Allocation,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Whether a write was rejected by a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
