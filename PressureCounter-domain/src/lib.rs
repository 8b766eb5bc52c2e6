// PressureCounter Domain
// Services built on the measurement repository: period statistics, recording
// intents, CSV export and presentation helpers

// Services that implement business logic
pub mod services;

// Errors raised by the services
pub mod errors;

// CSV export
pub mod export;

// History and chart helpers
pub mod chart;
pub mod history;

// Configuration and logging setup
pub mod config;
pub mod logging;

pub use errors::ServiceError;

// Test doubles
#[cfg(test)]
pub(crate) mod testing;

// Re-export the database module from the data crate for convenience
#[cfg(feature = "sqlite")]
pub use pressure_counter_data::database;
