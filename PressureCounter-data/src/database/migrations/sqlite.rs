use rusqlite::Connection;
use tracing::info;

use crate::database::DatabaseError;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Running SQLite migrations");

    create_measurements_table(conn)?;
    create_measurements_index(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the measurements table
fn create_measurements_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating measurements table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS measurements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            systolic INTEGER NOT NULL,
            diastolic INTEGER NOT NULL,
            pulse INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            feeling TEXT NOT NULL DEFAULT 'NORMAL'
        )",
        [],
    )
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create measurements table: {}", e)))?;

    Ok(())
}

/// Create index on timestamp for efficient range queries
fn create_measurements_index(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating index on timestamp");

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_measurements_timestamp
        ON measurements (timestamp DESC)",
        [],
    )
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    Ok(())
}
