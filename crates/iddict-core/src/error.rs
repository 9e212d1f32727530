//! Store error types.
//!
//! Every store operation reports failures through [`StoreError`]. Validation
//! errors are raised before the database is touched, concurrency errors tell
//! the caller to reload and retry, and configuration errors are surfaced as
//! [`StoreError::InvalidOperation`].

use std::fmt;

/// Boxed error used for wrapped causes (entity factories, backends).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required argument was empty or otherwise invalid.
    #[error("Invalid argument '{parameter}': {message}")]
    InvalidArgument {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Description of why the argument is invalid.
        message: String,
    },

    /// The store cannot perform the operation in its current configuration.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of the failure, including remediation guidance.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The identifier/concurrency token pair no longer matches the stored row.
    #[error("Concurrency conflict: {message}")]
    Concurrency {
        /// Description of the conflict.
        message: String,
    },

    /// The storage engine rejected the write (uniqueness constraint).
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The operation was cancelled before it reached the database.
    #[error("Operation cancelled")]
    Cancelled,

    /// A document could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend failed.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter,
            message: message.into(),
        }
    }

    /// Creates an `InvalidArgument` error for a null or empty value.
    ///
    /// `subject` is the human readable name of the value ("client identifier").
    #[must_use]
    pub fn empty_argument(parameter: &'static str, subject: &str) -> Self {
        Self::invalid_argument(parameter, format!("The {subject} cannot be null or empty."))
    }

    /// Creates a new `InvalidOperation` error without a cause.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `InvalidOperation` error wrapping a cause.
    #[must_use]
    pub fn invalid_operation_with(message: impl Into<String>, source: BoxError) -> Self {
        Self::InvalidOperation {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates the concurrency error reported when an update or delete of
    /// an entity of the given kind matches no row.
    #[must_use]
    pub fn concurrency(kind: &str) -> Self {
        Self::Concurrency {
            message: format!(
                "The {kind} was concurrently updated and cannot be persisted in its current state. \
                 Reload the {kind} from the database and retry the operation."
            ),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an argument validation error.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns `true` if this is an invalid operation error.
    #[must_use]
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation { .. })
    }

    /// Returns `true` if this is a concurrency conflict.
    #[must_use]
    pub fn is_concurrency(&self) -> bool {
        matches!(self, Self::Concurrency { .. })
    }

    /// Returns `true` if this is a uniqueness conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if the operation was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::Validation,
            Self::InvalidOperation { .. } => ErrorCategory::Configuration,
            Self::Concurrency { .. } | Self::Conflict { .. } => ErrorCategory::Concurrency,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Serialization(_) | Self::Backend { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Categories of store errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller supplied an invalid argument.
    Validation,
    /// Write-write race or uniqueness violation.
    Concurrency,
    /// Missing database, unusable entity factory.
    Configuration,
    /// Cancellation requested by the caller.
    Cancelled,
    /// Backend or serialization failure.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Concurrency => write!(f, "concurrency"),
            Self::Configuration => write!(f, "configuration"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
