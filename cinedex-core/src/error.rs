//! Error types for cinedex operations

use crate::EntityKind;
use thiserror::Error;

/// Search backend errors.
///
/// Only [`BackendError::NotFound`] is recoverable; every other variant means
/// the index could not answer and is surfaced as an internal error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Record not found: {kind} with id {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Index does not exist: {index}")]
    IndexMissing { index: String },

    #[error("Search backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Malformed response from index {index}: {reason}")]
    MalformedResponse { index: String, reason: String },
}

impl BackendError {
    /// Whether the error only says the record is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Cache store errors. Never fatal for a lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache payload for {key} could not be encoded: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Cache payload for {key} could not be decoded: {reason}")]
    Deserialization { key: String, reason: String },
}

/// Validation errors for request parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid identifier {value}: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Unknown entity kind: {value}")]
    UnknownKind { value: String },
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

/// Master error type for all cinedex errors.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CatalogError {
    /// Whether the error must be surfaced to the caller as an internal error.
    ///
    /// Cache errors and backend "not found" are degraded away before they
    /// reach a caller, so they are not fatal.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Backend(err) => !err.is_not_found(),
            Self::Cache(_) => false,
            Self::Validation(_) | Self::Config(_) => true,
        }
    }
}

/// Result type alias for cinedex operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// TESTS
// =============================================================================
