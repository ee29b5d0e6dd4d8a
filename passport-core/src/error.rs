//! Error types for passport operations

use crate::{PassportId, PassportStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage layer errors, shared by every backing tier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Duplicate key {key}")]
    Conflict { key: String },

    #[error("Write-once object {key} already exists with different content")]
    WriteOnceViolation { key: String },

    #[error("Record {id} does not exist")]
    MissingRecord { id: PassportId },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Payload validation errors.
///
/// `Display` is the client-safe reason; [`ValidationError::detail`] carries
/// the underlying violation text for logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed JSON")]
    MalformedJson { detail: String },

    #[error("schema validation failed")]
    SchemaViolation { violations: Vec<String> },

    #[error("unsupported product category: {category}")]
    UnsupportedCategory { category: String },
}

impl ValidationError {
    /// Full violation detail, intended for logs rather than responses.
    pub fn detail(&self) -> String {
        match self {
            ValidationError::MalformedJson { detail } => detail.clone(),
            ValidationError::SchemaViolation { violations } => violations.join("; "),
            ValidationError::UnsupportedCategory { category } => category.clone(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

// ============================================================================
// ERROR CODE
// ============================================================================

/// Transport-neutral classification of a [`PassportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    Forbidden,
    NotFound,
    Conflict,
    AlreadyPublished,
    InvalidTransition,
    StorageFailure,
    InconsistentState,
    InternalError,
}

impl ErrorCode {
    /// HTTP-equivalent status for this error class.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 400,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict | ErrorCode::AlreadyPublished | ErrorCode::InvalidTransition => {
                409
            }
            ErrorCode::StorageFailure | ErrorCode::InconsistentState | ErrorCode::InternalError => {
                500
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Generic message safe to hand to any caller.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Request contains invalid input",
            ErrorCode::Forbidden => "Access to this passport is not permitted",
            ErrorCode::NotFound => "Passport not found",
            ErrorCode::Conflict => "Request conflicts with an existing passport",
            ErrorCode::AlreadyPublished => "Passport is already published",
            ErrorCode::InvalidTransition => "Operation not allowed in the current status",
            ErrorCode::StorageFailure
            | ErrorCode::InconsistentState
            | ErrorCode::InternalError => "An internal error occurred",
        }
    }
}

// ============================================================================
// MASTER ERROR
// ============================================================================

/// Master error type for passport lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum PassportError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Passport {id} is already published")]
    AlreadyPublished { id: PassportId },

    #[error("Passport {id} not found")]
    NotFound { id: PassportId },

    #[error("Caller does not own passport {id}")]
    Forbidden { id: PassportId },

    #[error("Cannot {action} passport {id} in status {status}")]
    InvalidTransition {
        id: PassportId,
        status: PassportStatus,
        action: &'static str,
    },

    /// Backing store failed and nothing was committed.
    #[error("Storage failure: {0}")]
    StorageFailure(StorageError),

    /// The blob is committed but the durable record was not updated.
    /// Operators reconcile from `locator` and `hash`.
    #[error(
        "Inconsistent publish of passport {id}: blob {locator} (hash {hash}) committed, record update failed: {source}"
    )]
    InconsistentPublish {
        id: PassportId,
        locator: String,
        hash: String,
        source: StorageError,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl From<StorageError> for PassportError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { key } => PassportError::Conflict {
                reason: format!("duplicate key {}", key),
            },
            other => PassportError::StorageFailure(other),
        }
    }
}

impl PassportError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PassportError::InvalidInput(_) => ErrorCode::InvalidInput,
            PassportError::Conflict { .. } => ErrorCode::Conflict,
            PassportError::AlreadyPublished { .. } => ErrorCode::AlreadyPublished,
            PassportError::NotFound { .. } => ErrorCode::NotFound,
            PassportError::Forbidden { .. } => ErrorCode::Forbidden,
            PassportError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            PassportError::StorageFailure(_) => ErrorCode::StorageFailure,
            PassportError::InconsistentPublish { .. } => ErrorCode::InconsistentState,
            PassportError::Config(_) | PassportError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Message suitable for the caller. Server-side failures collapse to a
    /// generic message; the full `Display` output is for logs only.
    pub fn client_message(&self) -> String {
        match self {
            PassportError::InvalidInput(inner) => inner.to_string(),
            err if err.code().is_client_error() => err.to_string(),
            err => err.code().default_message().to_string(),
        }
    }
}

/// Result type alias for passport operations.
pub type PassportResult<T> = Result<T, PassportError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
