use std::fmt;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use super::errors::StorageError;
use super::observable::LiveQuery;
use super::storage::MeasurementStorage;
use crate::models::{Measurement, Statistics};
use crate::time_window::{window_start_millis, Clock, SystemClock, TimeWindow};

/// Repository for measurements
///
/// Wraps an injected storage port. Reads come in two flavours: live queries
/// that follow every later write made through this repository (and its
/// clones), and one-shot snapshots. Every write bumps a revision counter
/// before returning, which is what drives the live queries.
#[derive(Clone)]
pub struct MeasurementRepository {
    storage: Arc<dyn MeasurementStorage>,
    clock: Arc<dyn Clock>,
    time_zone: FixedOffset,
    revisions: Arc<watch::Sender<u64>>,
}

impl fmt::Debug for MeasurementRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeasurementRepository")
            .field("clock", &self.clock)
            .field("time_zone", &self.time_zone)
            .field("revision", &*self.revisions.borrow())
            .finish_non_exhaustive()
    }
}

impl MeasurementRepository {
    /// Create a repository over `storage`, using the system clock and UTC
    pub fn new(storage: Arc<dyn MeasurementStorage>) -> Self {
        let (revisions, _) = watch::channel(0);
        Self {
            storage,
            clock: Arc::new(SystemClock),
            time_zone: Utc.fix(),
            revisions: Arc::new(revisions),
        }
    }

    /// Replace the clock used for window queries
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Time zone used for calendar arithmetic of window queries
    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// Current instant according to the repository clock
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Start of `window` ending now
    pub fn window_start(&self, window: TimeWindow) -> i64 {
        window_start_millis(self.now_millis(), window, &self.time_zone)
    }

    /// Number of writes published so far
    pub fn revision(&self) -> u64 {
        *self.revisions.borrow()
    }

    fn live<T, F, Fut>(&self, name: &'static str, query: F) -> LiveQuery<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Arc<dyn MeasurementStorage>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T, StorageError>> + Send + 'static,
    {
        let storage = self.storage.clone();
        LiveQuery::spawn(name, self.revisions.subscribe(), move || query(storage.clone()))
    }

    fn publish_write(&self, operation: &str) {
        self.revisions.send_modify(|revision| *revision = revision.wrapping_add(1));
        debug!("Published {} at revision {}", operation, self.revision());
    }

    // ---- live reads ----

    /// All measurements, newest first
    pub fn all_measurements(&self) -> LiveQuery<Vec<Measurement>> {
        self.live("all_measurements", |storage| async move { storage.get_all().await })
    }

    /// The most recent measurement
    pub fn latest(&self) -> LiveQuery<Option<Measurement>> {
        self.live("latest", |storage| async move { storage.get_latest().await })
    }

    /// Measurements with `start <= timestamp <= end`, newest first
    pub fn measurements_between(&self, start: i64, end: i64) -> LiveQuery<Vec<Measurement>> {
        self.live("measurements_between", move |storage| async move {
            storage.get_between(start, end).await
        })
    }

    /// Measurements with `timestamp >= start`, oldest first for plotting
    pub fn measurements_from(&self, start: i64) -> LiveQuery<Vec<Measurement>> {
        self.live("measurements_from", move |storage| async move { storage.get_from(start).await })
    }

    /// Number of stored measurements
    pub fn total_count(&self) -> LiveQuery<usize> {
        self.live("total_count", |storage| async move { storage.count().await })
    }

    /// A single measurement by id, following later writes
    pub fn observe_by_id(&self, id: i64) -> LiveQuery<Option<Measurement>> {
        self.live("observe_by_id", move |storage| async move { storage.get_by_id(id).await })
    }

    /// Measurements of the last 7 days, oldest first
    pub fn week_window(&self) -> LiveQuery<Vec<Measurement>> {
        self.window(TimeWindow::Week)
    }

    /// Measurements of the last calendar month, oldest first
    pub fn month_window(&self) -> LiveQuery<Vec<Measurement>> {
        self.window(TimeWindow::Month)
    }

    /// Measurements of the last calendar year, oldest first
    pub fn year_window(&self) -> LiveQuery<Vec<Measurement>> {
        self.window(TimeWindow::Year)
    }

    /// Measurements of `window`, with the start fixed at call time
    pub fn window(&self, window: TimeWindow) -> LiveQuery<Vec<Measurement>> {
        let start = self.window_start(window);
        debug!("Opening {} window from {}", window, start);
        self.measurements_from(start)
    }

    // ---- one-shot reads ----

    /// A measurement by id
    pub async fn by_id(&self, id: i64) -> Result<Option<Measurement>, StorageError> {
        self.storage.get_by_id(id).await
    }

    pub async fn snapshot_all(&self) -> Result<Vec<Measurement>, StorageError> {
        self.storage.get_all().await
    }

    pub async fn snapshot_between(&self, start: i64, end: i64) -> Result<Vec<Measurement>, StorageError> {
        self.storage.get_between(start, end).await
    }

    pub async fn snapshot_from(&self, start: i64) -> Result<Vec<Measurement>, StorageError> {
        self.storage.get_from(start).await
    }

    pub async fn count(&self) -> Result<usize, StorageError> {
        self.storage.count().await
    }

    /// Aggregates over `start <= timestamp <= end`
    pub async fn statistics(&self, start: i64, end: i64) -> Result<Statistics, StorageError> {
        self.storage.aggregate(start, end).await
    }

    // ---- writes ----

    /// Store a measurement, replacing any record with the same id
    pub async fn insert(&self, measurement: &Measurement) -> Result<i64, StorageError> {
        let id = self.storage.insert(measurement).await?;
        info!("Inserted measurement {}", id);
        self.publish_write("insert");
        Ok(id)
    }

    /// Replace the stored measurement with the same id; missing ids are ignored
    pub async fn update(&self, measurement: &Measurement) -> Result<(), StorageError> {
        self.storage.update(measurement).await?;
        self.publish_write("update");
        Ok(())
    }

    /// Remove a measurement; missing ones are ignored
    pub async fn delete(&self, measurement: &Measurement) -> Result<(), StorageError> {
        self.delete_by_id(measurement.id).await
    }

    /// Remove a measurement by id; missing ids are ignored
    pub async fn delete_by_id(&self, id: i64) -> Result<(), StorageError> {
        self.storage.delete_by_id(id).await?;
        self.publish_write("delete");
        Ok(())
    }

    /// Remove every measurement
    pub async fn delete_all(&self) -> Result<(), StorageError> {
        self.storage.delete_all().await?;
        info!("Deleted all measurements");
        self.publish_write("delete_all");
        Ok(())
    }
}
