use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::errors::StorageError;
use super::storage::MeasurementStorage;
use crate::models::Measurement;

#[derive(Debug, Default)]
struct Store {
    measurements: BTreeMap<i64, Measurement>,
    last_id: i64,
}

/// In-memory storage implementation for measurements
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<Mutex<Store>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-filled with measurements, assigning ids where needed
    pub fn with_measurements(measurements: impl IntoIterator<Item = Measurement>) -> Result<Self, StorageError> {
        let storage = Self::new();
        {
            let mut store = storage.store.lock()?;
            for measurement in measurements {
                store.upsert(measurement)?;
            }
        }
        Ok(storage)
    }

    fn collect_sorted<F>(&self, filter: F, newest_first: bool) -> Result<Vec<Measurement>, StorageError>
    where
        F: Fn(&Measurement) -> bool,
    {
        let store = self.store.lock()?;
        let mut measurements: Vec<Measurement> = store.measurements.values().filter(|m| filter(*m)).cloned().collect();
        measurements.sort_by(|a, b| {
            let cmp = chronological(a, b);
            if newest_first {
                cmp.reverse()
            } else {
                cmp
            }
        });
        Ok(measurements)
    }
}

impl Store {
    fn upsert(&mut self, mut measurement: Measurement) -> Result<i64, StorageError> {
        if measurement.id == 0 {
            self.last_id = self.last_id.checked_add(1).ok_or(StorageError::IdsExhausted)?;
            measurement.id = self.last_id;
        } else {
            self.last_id = self.last_id.max(measurement.id);
        }
        let id = measurement.id;
        self.measurements.insert(id, measurement);
        Ok(id)
    }
}

fn chronological(a: &Measurement, b: &Measurement) -> Ordering {
    a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id))
}

#[async_trait]
impl MeasurementStorage for InMemoryStorage {
    async fn get_all(&self) -> Result<Vec<Measurement>, StorageError> {
        self.collect_sorted(|_| true, true)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Measurement>, StorageError> {
        let store = self.store.lock()?;
        Ok(store.measurements.get(&id).cloned())
    }

    async fn get_latest(&self) -> Result<Option<Measurement>, StorageError> {
        let store = self.store.lock()?;
        Ok(store.measurements.values().max_by(|a, b| chronological(a, b)).cloned())
    }

    async fn get_between(&self, start: i64, end: i64) -> Result<Vec<Measurement>, StorageError> {
        self.collect_sorted(|m| m.timestamp >= start && m.timestamp <= end, true)
    }

    async fn get_from(&self, start: i64) -> Result<Vec<Measurement>, StorageError> {
        self.collect_sorted(|m| m.timestamp >= start, false)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let store = self.store.lock()?;
        Ok(store.measurements.len())
    }

    async fn insert(&self, measurement: &Measurement) -> Result<i64, StorageError> {
        let mut store = self.store.lock()?;
        let id = store.upsert(measurement.clone())?;
        debug!("Stored measurement in memory: id={}", id);
        Ok(id)
    }

    async fn update(&self, measurement: &Measurement) -> Result<(), StorageError> {
        let mut store = self.store.lock()?;
        match store.measurements.get_mut(&measurement.id) {
            Some(existing) => *existing = measurement.clone(),
            None => debug!("Ignoring update of missing measurement: id={}", measurement.id),
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StorageError> {
        let mut store = self.store.lock()?;
        if store.measurements.remove(&id).is_none() {
            debug!("Ignoring delete of missing measurement: id={}", id);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        let mut store = self.store.lock()?;
        store.measurements.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(systolic: i32, timestamp: i64) -> Measurement {
        Measurement::recorded_at(systolic, 80, 70, timestamp)
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        tokio_test::block_on(async {
            let storage = InMemoryStorage::new();
            assert_eq!(storage.insert(&reading(120, 1)).await.unwrap(), 1);
            assert_eq!(storage.insert(&reading(121, 2)).await.unwrap(), 2);
            assert_eq!(storage.count().await.unwrap(), 2);
        });
    }

    #[test]
    fn test_insert_with_existing_id_replaces() {
        tokio_test::block_on(async {
            let storage = InMemoryStorage::new();
            let id = storage.insert(&reading(120, 1)).await.unwrap();
            storage.insert(&reading(150, 5).with_id(id)).await.unwrap();

            assert_eq!(storage.count().await.unwrap(), 1);
            let stored = storage.get_by_id(id).await.unwrap().unwrap();
            assert_eq!(stored.systolic, 150);
            assert_eq!(stored.timestamp, 5);
        });
    }

    #[test]
    fn test_explicit_id_moves_id_sequence() {
        tokio_test::block_on(async {
            let storage = InMemoryStorage::new();
            storage.insert(&reading(120, 1).with_id(10)).await.unwrap();
            assert_eq!(storage.insert(&reading(121, 2)).await.unwrap(), 11);
        });
    }

    #[test]
    fn test_insert_fails_when_ids_run_out() {
        tokio_test::block_on(async {
            let storage = InMemoryStorage::new();
            storage.insert(&reading(120, 1).with_id(i64::MAX)).await.unwrap();

            let result = storage.insert(&reading(121, 2)).await;
            assert!(matches!(result, Err(StorageError::IdsExhausted)));
            assert_eq!(storage.count().await.unwrap(), 1);

            let prefilled = InMemoryStorage::with_measurements(vec![reading(120, 1).with_id(i64::MAX), reading(121, 2)]);
            assert!(matches!(prefilled, Err(StorageError::IdsExhausted)));
        });
    }

    #[test]
    fn test_ordering() {
        tokio_test::block_on(async {
            let storage = InMemoryStorage::with_measurements(vec![
                reading(120, 300),
                reading(130, 100),
                reading(140, 200),
            ])
            .unwrap();

            let all: Vec<i64> = storage.get_all().await.unwrap().iter().map(|m| m.timestamp).collect();
            assert_eq!(all, vec![300, 200, 100]);

            let between: Vec<i64> = storage.get_between(100, 200).await.unwrap().iter().map(|m| m.timestamp).collect();
            assert_eq!(between, vec![200, 100]);

            let from: Vec<i64> = storage.get_from(150).await.unwrap().iter().map(|m| m.timestamp).collect();
            assert_eq!(from, vec![200, 300]);

            assert_eq!(storage.get_latest().await.unwrap().unwrap().timestamp, 300);
        });
    }

    #[test]
    fn test_update_and_delete_missing_are_noops() {
        tokio_test::block_on(async {
            let storage = InMemoryStorage::new();
            let id = storage.insert(&reading(120, 1)).await.unwrap();
            let before = storage.get_all().await.unwrap();

            storage.update(&reading(999, 9).with_id(id + 100)).await.unwrap();
            storage.delete_by_id(id + 100).await.unwrap();

            assert_eq!(storage.get_all().await.unwrap(), before);
        });
    }

    #[test]
    fn test_default_aggregate() {
        tokio_test::block_on(async {
            let storage = InMemoryStorage::with_measurements(vec![reading(120, 10), reading(140, 20), reading(200, 30)])
                .unwrap();
            let stats = storage.aggregate(10, 20).await.unwrap();
            assert_eq!(stats.avg_systolic, Some(130.0));
            assert_eq!(stats.record_count, 2);

            let empty = storage.aggregate(40, 50).await.unwrap();
            assert!(!empty.has_data());
        });
    }
}
