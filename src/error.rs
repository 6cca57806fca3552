use crate::domain::payout::PayoutStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("Payout not found: {0}")]
    NotFound(String),
    #[error("Invalid status transition for payout {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: PayoutStatus,
        to: PayoutStatus,
    },
    /// A doctor-side settlement identity is absent. The message is shown as-is.
    #[error("{0}")]
    ConfigurationMissing(String),
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("provider timeout")]
    ProviderTimeout,
    #[error("{0}")]
    TransportError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl From<reqwest::Error> for PayoutError {
    fn from(err: reqwest::Error) -> Self {
        PayoutError::TransportError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PayoutError>;
