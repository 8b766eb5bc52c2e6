use async_trait::async_trait;

use super::errors::StorageError;
use crate::models::{Measurement, Statistics};

/// Storage port for measurements
///
/// Implemented by the persistence layer. Range bounds are inclusive
/// millisecond timestamps. Orderings are part of the contract: `get_all` and
/// `get_between` return newest first, `get_from` returns oldest first (the
/// order charts plot in). Ties on `timestamp` are broken by `id` in the same
/// direction.
#[async_trait]
pub trait MeasurementStorage: Send + Sync {
    /// All measurements, newest first
    async fn get_all(&self) -> Result<Vec<Measurement>, StorageError>;

    /// A measurement by id
    async fn get_by_id(&self, id: i64) -> Result<Option<Measurement>, StorageError>;

    /// The most recent measurement
    async fn get_latest(&self) -> Result<Option<Measurement>, StorageError>;

    /// Measurements with `start <= timestamp <= end`, newest first
    async fn get_between(&self, start: i64, end: i64) -> Result<Vec<Measurement>, StorageError>;

    /// Measurements with `timestamp >= start`, oldest first
    async fn get_from(&self, start: i64) -> Result<Vec<Measurement>, StorageError>;

    /// Number of stored measurements
    async fn count(&self) -> Result<usize, StorageError>;

    /// Store a measurement and return its id
    ///
    /// An id of 0 gets a freshly assigned id. A measurement carrying an id
    /// that already exists replaces the stored record.
    async fn insert(&self, measurement: &Measurement) -> Result<i64, StorageError>;

    /// Replace the measurement with the same id, doing nothing if it is absent
    async fn update(&self, measurement: &Measurement) -> Result<(), StorageError>;

    /// Remove a measurement by id, doing nothing if it is absent
    async fn delete_by_id(&self, id: i64) -> Result<(), StorageError>;

    /// Remove every measurement
    async fn delete_all(&self) -> Result<(), StorageError>;

    /// Aggregate the measurements with `start <= timestamp <= end`
    ///
    /// The default implementation aggregates in-process over `get_between`.
    async fn aggregate(&self, start: i64, end: i64) -> Result<Statistics, StorageError> {
        let measurements = self.get_between(start, end).await?;
        Ok(Statistics::from_measurements(&measurements))
    }
}
