//! Engine configuration
//!
//! Values come from the environment, after loading a `.env` file if one
//! exists.

use std::env;

use chrono::{FixedOffset, Offset, Utc};
use tracing::info;

#[cfg(feature = "sqlite")]
use pressure_counter_data::database::DatabaseConfig;

use crate::errors::ServiceError;
use crate::export::LineEnding;

/// Runtime settings of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Offset used for calendar windows, history grouping and CSV rendering
    pub utc_offset: FixedOffset,
    /// Line terminator of CSV exports
    pub line_ending: LineEnding,
    #[cfg(feature = "sqlite")]
    pub database: DatabaseConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            line_ending: LineEnding::Lf,
            #[cfg(feature = "sqlite")]
            database: DatabaseConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read `PRESSURE_UTC_OFFSET_MINUTES`, `PRESSURE_CSV_CRLF` and the
    /// database settings
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenv::dotenv().ok();

        let offset_minutes = match env::var("PRESSURE_UTC_OFFSET_MINUTES") {
            Ok(value) => value.trim().parse::<i32>().map_err(|_| {
                ServiceError::Config(format!("Invalid value for PRESSURE_UTC_OFFSET_MINUTES: {}", value))
            })?,
            Err(_) => 0,
        };
        let utc_offset = parse_offset(offset_minutes)?;

        let line_ending = match env::var("PRESSURE_CSV_CRLF") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => LineEnding::CrLf,
                "0" | "false" | "no" | "" => LineEnding::Lf,
                _ => {
                    return Err(ServiceError::Config(format!(
                        "Invalid value for PRESSURE_CSV_CRLF: {}",
                        value
                    )))
                }
            },
            Err(_) => LineEnding::Lf,
        };

        #[cfg(feature = "sqlite")]
        let database = DatabaseConfig::from_env().map_err(|e| ServiceError::Config(e.to_string()))?;

        info!("Engine configuration: utc_offset={}, line_ending={:?}", utc_offset, line_ending);

        Ok(Self {
            utc_offset,
            line_ending,
            #[cfg(feature = "sqlite")]
            database,
        })
    }
}

fn parse_offset(minutes: i32) -> Result<FixedOffset, ServiceError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ServiceError::Config(format!("UTC offset out of range: {} minutes", minutes)))
}
