use std::sync::PoisonError;
use thiserror::Error;

#[cfg(feature = "sqlite")]
use crate::database::DatabaseError;

/// Error type for storage and repository operations
///
/// Lookups that find nothing are `Ok(None)`, and updates or deletes of a
/// missing id are `Ok(())`. Everything here is a real persistence failure.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database setup error
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[cfg(feature = "sqlite")]
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),

    /// Background storage task failed to complete
    #[error("Storage task error: {0}")]
    Task(String),

    /// No id is left to assign to a new measurement
    #[error("No measurement ids left to assign")]
    IdsExhausted,

    /// A stored record could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(error: PoisonError<T>) -> Self {
        StorageError::Lock(error.to_string())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(error: tokio::task::JoinError) -> Self {
        StorageError::Task(error.to_string())
    }
}
