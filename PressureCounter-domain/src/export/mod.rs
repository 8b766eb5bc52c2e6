// Export formats for stored measurements
pub mod csv;

pub use self::csv::{CsvExporter, LineEnding, CSV_HEADER};
