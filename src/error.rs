use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by core operations
///
/// None of these are retried internally; each is terminal for the call
/// that triggered it.
#[derive(Debug, Error)]
pub enum CareError {
    /// Missing, or outside the caller's scope. The two cases are not distinguished.
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not permitted: {0}")]
    Authorization(String),

    /// The stored record changed between read and conditional write
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Stable machine-readable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Authorization,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
        }
    }
}

impl CareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CareError::NotFound(_) => ErrorKind::NotFound,
            CareError::Validation(_) => ErrorKind::Validation,
            CareError::Authorization(_) => ErrorKind::Authorization,
            CareError::Conflict(_) => ErrorKind::Conflict,
            CareError::Storage(StoreError::StaleState { .. }) => ErrorKind::Conflict,
            CareError::Storage(StoreError::Missing(_)) => ErrorKind::NotFound,
            CareError::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Errors raised by a storage collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("record missing: {0}")]
    Missing(String),

    #[error("stale state: expected {expected}, found {found}")]
    StaleState { expected: String, found: String },

    #[error("corrupt record: {0}")]
    Corrupt(String),
}
