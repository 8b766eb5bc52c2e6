// PressureCounter Data
// This crate holds the measurement model, the storage port and the repository

// Database connection management for the SQLite adapter
#[cfg(feature = "sqlite")]
pub mod database;

// Repository, storage port and storage adapters
pub mod repository;

// Data storage models
pub mod models;

// Time windows and clocks
pub mod time_window;

// Re-export commonly used types
pub use models::{categorize_pressure, Feeling, Measurement, PressureCategory, Statistics};
pub use repository::{
    InMemoryStorage, LiveQuery, MeasurementRepository, MeasurementStorage, QueryState, StorageError,
};
pub use time_window::{Clock, FixedClock, SystemClock, TimeWindow};

#[cfg(feature = "sqlite")]
pub use repository::SqliteStorage;
