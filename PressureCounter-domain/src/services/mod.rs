// Domain services
// Period statistics and the recording intents issued by the presentation layer.
pub mod measurement;
pub mod statistics;

pub use measurement::{MeasurementInput, MeasurementService};
pub use statistics::{PeriodStatistics, StatisticsService};

#[cfg(feature = "sqlite")]
pub use measurement::create_default_measurement_service;
