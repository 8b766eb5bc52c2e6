use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::errors::StorageError;
use super::storage::MeasurementStorage;
use crate::database::{create_sqlite_pool, DatabaseConfig, SqlitePool};
use crate::models::{Feeling, Measurement, Statistics};

const SELECT_COLUMNS: &str = "SELECT id, systolic, diastolic, pulse, timestamp, notes, feeling FROM measurements";

/// SQLite storage adapter for measurements
///
/// Queries run on tokio's blocking pool so callers on the async runtime are
/// never stalled by disk access.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Wrap an already migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the pool described by `config`, running migrations
    pub fn open(config: &DatabaseConfig) -> Result<Self, StorageError> {
        Ok(Self::new(create_sqlite_pool(config)?))
    }

    /// Private in-memory database, mostly useful for tests
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::open(&DatabaseConfig::in_memory())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            op(&conn)
        })
        .await?
    }
}

fn row_to_measurement(row: &Row<'_>) -> rusqlite::Result<Measurement> {
    let feeling: String = row.get(6)?;
    Ok(Measurement {
        id: row.get(0)?,
        systolic: row.get(1)?,
        diastolic: row.get(2)?,
        pulse: row.get(3)?,
        timestamp: row.get(4)?,
        notes: row.get(5)?,
        feeling: Feeling::from_token_lenient(&feeling),
    })
}

fn query_measurements<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Measurement>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, row_to_measurement)?;

    let mut result = Vec::new();
    for measurement in rows {
        result.push(measurement?);
    }
    Ok(result)
}

#[async_trait]
impl MeasurementStorage for SqliteStorage {
    async fn get_all(&self) -> Result<Vec<Measurement>, StorageError> {
        debug!("Getting all measurements from database");
        self.with_connection(|conn| {
            query_measurements(
                conn,
                &format!("{} ORDER BY timestamp DESC, id DESC", SELECT_COLUMNS),
                [],
            )
        })
        .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Measurement>, StorageError> {
        debug!("Getting measurement by ID from database: id={}", id);
        self.with_connection(move |conn| {
            let measurement = conn
                .query_row(
                    &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                    [id],
                    row_to_measurement,
                )
                .optional()?;
            Ok(measurement)
        })
        .await
    }

    async fn get_latest(&self) -> Result<Option<Measurement>, StorageError> {
        debug!("Getting latest measurement from database");
        self.with_connection(|conn| {
            let measurement = conn
                .query_row(
                    &format!("{} ORDER BY timestamp DESC, id DESC LIMIT 1", SELECT_COLUMNS),
                    [],
                    row_to_measurement,
                )
                .optional()?;
            Ok(measurement)
        })
        .await
    }

    async fn get_between(&self, start: i64, end: i64) -> Result<Vec<Measurement>, StorageError> {
        debug!("Getting measurements between {} and {}", start, end);
        self.with_connection(move |conn| {
            query_measurements(
                conn,
                &format!(
                    "{} WHERE timestamp >= ?1 AND timestamp <= ?2 ORDER BY timestamp DESC, id DESC",
                    SELECT_COLUMNS
                ),
                params![start, end],
            )
        })
        .await
    }

    async fn get_from(&self, start: i64) -> Result<Vec<Measurement>, StorageError> {
        debug!("Getting measurements from {}", start);
        self.with_connection(move |conn| {
            query_measurements(
                conn,
                &format!("{} WHERE timestamp >= ?1 ORDER BY timestamp ASC, id ASC", SELECT_COLUMNS),
                [start],
            )
        })
        .await
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
            usize::try_from(count).map_err(|_| StorageError::Corrupt(format!("Negative row count: {}", count)))
        })
        .await
    }

    async fn insert(&self, measurement: &Measurement) -> Result<i64, StorageError> {
        debug!("Storing measurement in database: id={}", measurement.id);
        let measurement = measurement.clone();
        self.with_connection(move |conn| {
            if measurement.is_persisted() {
                conn.execute(
                    "INSERT OR REPLACE INTO measurements
                     (id, systolic, diastolic, pulse, timestamp, notes, feeling)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        measurement.id,
                        measurement.systolic,
                        measurement.diastolic,
                        measurement.pulse,
                        measurement.timestamp,
                        measurement.notes,
                        measurement.feeling.as_token(),
                    ],
                )?;
                Ok(measurement.id)
            } else {
                conn.execute(
                    "INSERT INTO measurements
                     (systolic, diastolic, pulse, timestamp, notes, feeling)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        measurement.systolic,
                        measurement.diastolic,
                        measurement.pulse,
                        measurement.timestamp,
                        measurement.notes,
                        measurement.feeling.as_token(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            }
        })
        .await
    }

    async fn update(&self, measurement: &Measurement) -> Result<(), StorageError> {
        let measurement = measurement.clone();
        self.with_connection(move |conn| {
            let changed = conn.execute(
                "UPDATE measurements
                 SET systolic = ?2, diastolic = ?3, pulse = ?4, timestamp = ?5, notes = ?6, feeling = ?7
                 WHERE id = ?1",
                params![
                    measurement.id,
                    measurement.systolic,
                    measurement.diastolic,
                    measurement.pulse,
                    measurement.timestamp,
                    measurement.notes,
                    measurement.feeling.as_token(),
                ],
            )?;
            if changed == 0 {
                debug!("Ignoring update of missing measurement: id={}", measurement.id);
            }
            Ok(())
        })
        .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StorageError> {
        self.with_connection(move |conn| {
            let changed = conn.execute("DELETE FROM measurements WHERE id = ?1", [id])?;
            if changed == 0 {
                debug!("Ignoring delete of missing measurement: id={}", id);
            }
            Ok(())
        })
        .await
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM measurements", [])?;
            debug!("Deleted {} measurements", removed);
            Ok(())
        })
        .await
    }

    async fn aggregate(&self, start: i64, end: i64) -> Result<Statistics, StorageError> {
        debug!("Aggregating measurements between {} and {}", start, end);
        self.with_connection(move |conn| {
            let stats = conn.query_row(
                "SELECT AVG(systolic), AVG(diastolic), AVG(pulse),
                        MIN(systolic), MAX(systolic),
                        MIN(diastolic), MAX(diastolic),
                        MIN(pulse), MAX(pulse),
                        COUNT(*)
                 FROM measurements WHERE timestamp >= ?1 AND timestamp <= ?2",
                params![start, end],
                |row| {
                    let count: i64 = row.get(9)?;
                    Ok(Statistics {
                        avg_systolic: row.get(0)?,
                        avg_diastolic: row.get(1)?,
                        avg_pulse: row.get(2)?,
                        min_systolic: row.get(3)?,
                        max_systolic: row.get(4)?,
                        min_diastolic: row.get(5)?,
                        max_diastolic: row.get(6)?,
                        min_pulse: row.get(7)?,
                        max_pulse: row.get(8)?,
                        record_count: count.max(0) as usize,
                    })
                },
            )?;
            Ok(stats)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(systolic: i32, timestamp: i64) -> Measurement {
        Measurement::recorded_at(systolic, 80, 70, timestamp)
    }

    #[tokio::test]
    async fn test_round_trip_by_id() {
        let storage = SqliteStorage::in_memory().unwrap();
        let measurement = reading(128, 1_000)
            .with_notes("left arm, \"after\" walk")
            .with_feeling(Feeling::Bad);

        let id = storage.insert(&measurement).await.unwrap();
        assert!(id > 0);

        let stored = storage.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored, measurement.with_id(id));
        assert!(storage.get_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_and_update() {
        let storage = SqliteStorage::in_memory().unwrap();
        let id = storage.insert(&reading(120, 1)).await.unwrap();

        storage.insert(&reading(130, 2).with_id(id)).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 1);
        assert_eq!(storage.get_by_id(id).await.unwrap().unwrap().systolic, 130);

        storage.update(&reading(140, 3).with_id(id)).await.unwrap();
        assert_eq!(storage.get_by_id(id).await.unwrap().unwrap().systolic, 140);

        storage.update(&reading(150, 4).with_id(id + 7)).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 1);
        assert!(storage.get_by_id(id + 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_range_queries_order() {
        let storage = SqliteStorage::in_memory().unwrap();
        for (systolic, ts) in [(120, 300), (130, 100), (140, 200), (150, 400)] {
            storage.insert(&reading(systolic, ts)).await.unwrap();
        }

        let all: Vec<i64> = storage.get_all().await.unwrap().iter().map(|m| m.timestamp).collect();
        assert_eq!(all, vec![400, 300, 200, 100]);

        let between: Vec<i64> = storage.get_between(200, 300).await.unwrap().iter().map(|m| m.timestamp).collect();
        assert_eq!(between, vec![300, 200]);

        let from: Vec<i64> = storage.get_from(200).await.unwrap().iter().map(|m| m.timestamp).collect();
        assert_eq!(from, vec![200, 300, 400]);

        assert_eq!(storage.get_latest().await.unwrap().unwrap().timestamp, 400);
    }

    #[tokio::test]
    async fn test_delete() {
        let storage = SqliteStorage::in_memory().unwrap();
        let first = storage.insert(&reading(120, 1)).await.unwrap();
        storage.insert(&reading(125, 2)).await.unwrap();

        storage.delete_by_id(first).await.unwrap();
        storage.delete_by_id(first).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 1);

        storage.delete_all().await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);
        assert!(storage.get_latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sql_aggregate_matches_in_process() {
        let storage = SqliteStorage::in_memory().unwrap();
        let readings = vec![
            Measurement::recorded_at(120, 80, 70, 10),
            Measurement::recorded_at(135, 85, 64, 20),
            Measurement::recorded_at(151, 97, 81, 30),
            Measurement::recorded_at(200, 110, 99, 40),
        ];
        for measurement in &readings {
            storage.insert(measurement).await.unwrap();
        }

        let from_sql = storage.aggregate(10, 30).await.unwrap();
        let in_process = Statistics::from_measurements(&readings[..3]);
        assert_eq!(from_sql, in_process);

        let empty = storage.aggregate(50, 60).await.unwrap();
        assert_eq!(empty, Statistics::empty());
    }

    #[tokio::test]
    async fn test_unknown_feeling_token_reads_as_normal() {
        let storage = SqliteStorage::in_memory().unwrap();
        let conn = storage.pool().get().unwrap();
        conn.execute(
            "INSERT INTO measurements (systolic, diastolic, pulse, timestamp, feeling) VALUES (120, 80, 70, 1, 'SLEEPY')",
            [],
        )
        .unwrap();
        drop(conn);

        let stored = storage.get_latest().await.unwrap().unwrap();
        assert_eq!(stored.feeling, Feeling::Normal);
    }
}
