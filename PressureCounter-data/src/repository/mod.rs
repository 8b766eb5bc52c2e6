// Repository module structure
pub mod errors;
mod in_memory;
mod measurement;
mod observable;
#[cfg(feature = "sqlite")]
mod sqlite;
mod storage;

// Re-export commonly used types
pub use errors::StorageError;
pub use in_memory::InMemoryStorage;
pub use measurement::MeasurementRepository;
pub use observable::{LiveQuery, QueryState};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
pub use storage::MeasurementStorage;
