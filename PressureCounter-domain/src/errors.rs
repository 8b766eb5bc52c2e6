use thiserror::Error;

use pressure_counter_data::StorageError;

/// Errors raised by the domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The storage port failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}
