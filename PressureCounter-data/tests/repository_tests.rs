use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pressure_counter_data::{
    Feeling, FixedClock, InMemoryStorage, Measurement, MeasurementRepository, MeasurementStorage, PressureCategory,
    QueryState,
};
use serde_json::json;

const DAY: i64 = 24 * 60 * 60 * 1000;

fn now() -> i64 {
    Utc.with_ymd_and_hms(2024, 4, 15, 10, 0, 0).unwrap().timestamp_millis()
}

fn repository(storage: Arc<dyn MeasurementStorage>) -> MeasurementRepository {
    MeasurementRepository::new(storage).with_clock(Arc::new(FixedClock::new(now())))
}

async fn ten_day_scenario(repo: MeasurementRepository) -> anyhow::Result<()> {
    repo.insert(&Measurement::recorded_at(120, 80, 70, now() - 10 * DAY)).await?;
    repo.insert(&Measurement::recorded_at(135, 85, 72, now() - 5 * DAY)).await?;
    repo.insert(&Measurement::recorded_at(150, 95, 80, now() - DAY)).await?;

    let mut last_week = repo.measurements_between(now() - 7 * DAY, now());
    let rows = last_week.wait_for_value(|rows| !rows.is_empty()).await.expect("live query stopped");
    assert_eq!(rows.iter().map(|m| m.systolic).collect::<Vec<_>>(), vec![150, 135]);

    let stats = repo.statistics(now() - 7 * DAY, now()).await?;
    assert_eq!(stats.avg_systolic, Some(142.5));
    assert_eq!(stats.min_systolic, Some(135));
    assert_eq!(stats.max_systolic, Some(150));
    assert_eq!(stats.record_count, 2);

    let empty = repo.statistics(now() + DAY, now() + 2 * DAY).await?;
    assert!(!empty.has_data());
    assert!(empty.avg_pulse.is_none());
    assert!(empty.max_diastolic.is_none());
    Ok(())
}

async fn insert_then_list_once(repo: MeasurementRepository) -> anyhow::Result<()> {
    let mut all = repo.all_measurements();
    assert!(matches!(all.current(), QueryState::Loading | QueryState::Ready(_)));

    let id = repo.insert(&Measurement::recorded_at(118, 76, 64, now()).with_feeling(Feeling::Great)).await?;
    let rows = all.wait_for_value(|rows| rows.len() == 1).await.expect("live query stopped");
    assert_eq!(rows.iter().filter(|m| m.id == id).count(), 1);

    repo.update(&Measurement::recorded_at(200, 70, 64, now()).with_id(id + 100)).await?;
    assert_eq!(repo.count().await?, 1);
    assert_eq!(repo.by_id(id).await?.map(|m| m.systolic), Some(118));
    Ok(())
}

#[tokio::test]
async fn test_in_memory_scenario() -> anyhow::Result<()> {
    ten_day_scenario(repository(Arc::new(InMemoryStorage::new()))).await
}

#[tokio::test]
async fn test_in_memory_insert_then_list() -> anyhow::Result<()> {
    insert_then_list_once(repository(Arc::new(InMemoryStorage::new()))).await
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use pressure_counter_data::database::DatabaseConfig;
    use pressure_counter_data::SqliteStorage;

    #[tokio::test]
    async fn test_sqlite_scenario() -> anyhow::Result<()> {
        ten_day_scenario(repository(Arc::new(SqliteStorage::in_memory()?))).await
    }

    #[tokio::test]
    async fn test_sqlite_insert_then_list() -> anyhow::Result<()> {
        insert_then_list_once(repository(Arc::new(SqliteStorage::in_memory()?))).await
    }

    #[tokio::test]
    async fn test_sqlite_file_survives_reopen() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = DatabaseConfig {
            sqlite_path: Some(dir.path().join("pressure.db").to_string_lossy().into_owned()),
            ..DatabaseConfig::default()
        };

        let id = {
            let repo = repository(Arc::new(SqliteStorage::open(&config)?));
            repo.insert(&Measurement::recorded_at(131, 84, 70, now()).with_notes("kept")).await?
        };

        let repo = repository(Arc::new(SqliteStorage::open(&config)?));
        let stored = repo.by_id(id).await?.expect("measurement should survive reopen");
        assert_eq!(stored.notes, "kept");
        assert_eq!(stored.pressure_category(), PressureCategory::HypertensionStage1);
        Ok(())
    }
}

#[test]
fn test_measurement_json_tokens() {
    let measurement = Measurement::recorded_at(185, 125, 90, 0).with_feeling(Feeling::Terrible);
    let value = serde_json::to_value(&measurement).unwrap();
    assert_eq!(value["feeling"], json!("TERRIBLE"));
    assert_eq!(value["notes"], json!(""));
    assert_eq!(serde_json::to_value(measurement.pressure_category()).unwrap(), json!("HYPERTENSIVE_CRISIS"));
}
