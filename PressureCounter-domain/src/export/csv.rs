//! CSV export of measurements
//!
//! One header line followed by one row per measurement, in the order given.
//! Dates and times are rendered in the exporter's time zone. Every row,
//! including the last one, ends with the configured line terminator.

use std::io;

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use tracing::{debug, warn};

use pressure_counter_data::Measurement;

/// Header line of every export
pub const CSV_HEADER: &str = "Date,Time,Systolic,Diastolic,Pulse,PulsePressure,Feeling,Notes";

/// Line terminator written after every line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Renders measurements as CSV text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvExporter {
    time_zone: FixedOffset,
    line_ending: LineEnding,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl CsvExporter {
    pub fn new(time_zone: FixedOffset) -> Self {
        Self {
            time_zone,
            line_ending: LineEnding::Lf,
        }
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Render `measurements` as a complete CSV document
    pub fn export_to_csv(&self, measurements: &[Measurement]) -> String {
        let mut out = String::with_capacity(CSV_HEADER.len() + measurements.len() * 64);
        out.push_str(CSV_HEADER);
        out.push_str(self.line_ending.as_str());
        for measurement in measurements {
            self.push_row(&mut out, measurement);
        }
        debug!("Exported {} measurements to CSV", measurements.len());
        out
    }

    /// Stream the CSV document into `writer`
    pub fn write_csv<W: io::Write>(&self, mut writer: W, measurements: &[Measurement]) -> io::Result<()> {
        writer.write_all(CSV_HEADER.as_bytes())?;
        writer.write_all(self.line_ending.as_str().as_bytes())?;

        let mut row = String::new();
        for measurement in measurements {
            row.clear();
            self.push_row(&mut row, measurement);
            writer.write_all(row.as_bytes())?;
        }
        writer.flush()
    }

    /// Suggested file name for an export taken at `now`
    pub fn export_file_name<Tz>(now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        format!("pressure_data_{}.csv", now.format("%Y-%m-%d_%H-%M"))
    }

    fn push_row(&self, out: &mut String, measurement: &Measurement) {
        let (date, time) = match self.time_zone.timestamp_millis_opt(measurement.timestamp).single() {
            Some(at) => (at.format("%d.%m.%Y").to_string(), at.format("%H:%M").to_string()),
            None => {
                warn!(
                    "Measurement {} has an unrepresentable timestamp {}",
                    measurement.id, measurement.timestamp
                );
                (String::new(), String::new())
            }
        };

        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}",
            date,
            time,
            measurement.systolic,
            measurement.diastolic,
            measurement.pulse,
            measurement.pulse_pressure(),
            measurement.feeling.label(),
            quote(&measurement.notes),
        ));
        out.push_str(self.line_ending.as_str());
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
