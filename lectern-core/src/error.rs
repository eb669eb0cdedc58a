use lectern_model::ModelError;
use thiserror::Error;

/// Failures reported by the persistence collaborator.
///
/// Stream failures are non-fatal for the catalog: they surface as an empty
/// window with the error flag raised. Write failures are handed back to the
/// caller untouched; the core never retries either kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("subscription to {stream} failed: {reason}")]
    Subscription { stream: String, reason: String },

    #[error("write rejected: {0}")]
    Write(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid parameter {key}={value}")]
    InvalidParam { key: String, value: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
