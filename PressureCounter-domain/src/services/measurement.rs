use std::io;

use chrono::TimeZone;
use tracing::{debug, info};

use pressure_counter_data::{Feeling, Measurement, MeasurementRepository};

use crate::errors::ServiceError;
use crate::export::CsvExporter;
use crate::services::statistics::StatisticsService;

/// A measurement as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementInput {
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub notes: String,
    pub feeling: Feeling,
    /// Defaults to the service clock when absent
    pub timestamp: Option<i64>,
}

impl MeasurementInput {
    pub fn new(systolic: i32, diastolic: i32, pulse: i32) -> Self {
        Self {
            systolic,
            diastolic,
            pulse,
            notes: String::new(),
            feeling: Feeling::default(),
            timestamp: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_feeling(mut self, feeling: Feeling) -> Self {
        self.feeling = feeling;
        self
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Recording intents followed by a statistics refresh
///
/// Every write awaits the repository before the refresh is started, so the
/// refresh always sees the write.
#[derive(Debug, Clone)]
pub struct MeasurementService {
    repository: MeasurementRepository,
    statistics: StatisticsService,
    exporter: CsvExporter,
}

impl MeasurementService {
    pub fn new(repository: MeasurementRepository) -> Self {
        let exporter = CsvExporter::new(repository.time_zone());
        Self {
            statistics: StatisticsService::new(repository.clone()),
            repository,
            exporter,
        }
    }

    pub fn with_exporter(mut self, exporter: CsvExporter) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn repository(&self) -> &MeasurementRepository {
        &self.repository
    }

    pub fn statistics(&self) -> &StatisticsService {
        &self.statistics
    }

    /// Store a new measurement and return it with its assigned id
    pub async fn record(&self, input: MeasurementInput) -> Result<Measurement, ServiceError> {
        let timestamp = input.timestamp.unwrap_or_else(|| self.repository.now_millis());
        let measurement = Measurement::recorded_at(input.systolic, input.diastolic, input.pulse, timestamp)
            .with_notes(input.notes)
            .with_feeling(input.feeling);

        let id = self.repository.insert(&measurement).await?;
        info!("Recorded measurement {} ({})", id, measurement.pressure_category());
        self.statistics.spawn_refresh();
        Ok(measurement.with_id(id))
    }

    pub async fn update(&self, measurement: &Measurement) -> Result<(), ServiceError> {
        self.repository.update(measurement).await?;
        self.statistics.spawn_refresh();
        Ok(())
    }

    pub async fn delete(&self, measurement: &Measurement) -> Result<(), ServiceError> {
        self.delete_by_id(measurement.id).await
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), ServiceError> {
        self.repository.delete_by_id(id).await?;
        self.statistics.spawn_refresh();
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), ServiceError> {
        self.repository.delete_all().await?;
        self.statistics.spawn_refresh();
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Measurement>, ServiceError> {
        Ok(self.repository.by_id(id).await?)
    }

    /// All measurements as CSV, newest first
    pub async fn export_csv(&self) -> Result<String, ServiceError> {
        let measurements = self.repository.snapshot_all().await?;
        debug!("Exporting {} measurements", measurements.len());
        Ok(self.exporter.export_to_csv(&measurements))
    }

    /// Stream all measurements as CSV into `writer`
    pub async fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), ServiceError> {
        let measurements = self.repository.snapshot_all().await?;
        self.exporter.write_csv(writer, &measurements)?;
        Ok(())
    }

    /// File name for an export taken now
    pub fn export_file_name(&self) -> String {
        let now = self
            .exporter
            .time_zone()
            .timestamp_millis_opt(self.repository.now_millis())
            .single();
        match now {
            Some(now) => CsvExporter::export_file_name(&now),
            None => "pressure_data.csv".to_string(),
        }
    }
}

/// Build a service over the SQLite database described by `config`
#[cfg(feature = "sqlite")]
pub fn create_default_measurement_service(
    config: &crate::config::EngineConfig,
) -> Result<MeasurementService, ServiceError> {
    use pressure_counter_data::SqliteStorage;

    let storage = SqliteStorage::open(&config.database)?;
    let repository = MeasurementRepository::new(std::sync::Arc::new(storage)).with_time_zone(config.utc_offset);
    let exporter = CsvExporter::new(config.utc_offset).with_line_ending(config.line_ending);
    Ok(MeasurementService::new(repository).with_exporter(exporter))
}
