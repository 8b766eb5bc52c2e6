// Storage models for measurements and their derived views
pub mod classification;
pub mod measurement;
pub mod statistics;

pub use classification::{categorize_pressure, PressureCategory};
pub use measurement::{Feeling, Measurement};
pub use statistics::Statistics;
