//! SQLite connection pool management for the PressureCounter engine
//!
//! The pool is built from a [`DatabaseConfig`] and handed to the storage
//! adapter by the caller. There is no process-wide pool.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use tracing::{info, warn};

use super::migrations::run_sqlite_migrations;
use super::DatabaseError;

/// Pool of SQLite connections
pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

/// Default location of the database file
pub const DEFAULT_SQLITE_PATH: &str = "./data/pressure.db";

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, `None` for a private in-memory database
    pub sqlite_path: Option<String>,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: Some(DEFAULT_SQLITE_PATH.to_string()),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            sqlite_path: None,
            ..Self::default()
        }
    }

    /// Create a new database configuration from environment variables
    ///
    /// Reads `DB_SQLITE_PATH`, `DB_MAX_CONNECTIONS` and `DB_TIMEOUT_SECONDS`,
    /// after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self, DatabaseError> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let sqlite_path = match env::var("DB_SQLITE_PATH") {
            Ok(path) if path.trim().is_empty() => {
                return Err(DatabaseError::ConfigError("DB_SQLITE_PATH is empty".to_string()));
            }
            Ok(path) => {
                info!("Using SQLite database at: {}", path);
                path
            }
            Err(_) => {
                info!("No DB_SQLITE_PATH provided, will use default path: {}", DEFAULT_SQLITE_PATH);
                DEFAULT_SQLITE_PATH.to_string()
            }
        };

        let max_connections = parse_var("DB_MAX_CONNECTIONS", defaults.max_connections)?;
        let timeout_seconds = parse_var("DB_TIMEOUT_SECONDS", defaults.timeout_seconds)?;

        if max_connections == 0 {
            return Err(DatabaseError::ConfigError("DB_MAX_CONNECTIONS must be at least 1".to_string()));
        }

        info!(
            "Database configuration: max_connections={}, timeout={}s",
            max_connections, timeout_seconds
        );

        Ok(DatabaseConfig {
            sqlite_path: Some(sqlite_path),
            max_connections,
            timeout_seconds,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, DatabaseError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| DatabaseError::ConfigError(format!("Invalid value for {}: {}", name, value))),
        Err(_) => Ok(default),
    }
}

/// Build a migrated SQLite connection pool for `config`
pub fn create_sqlite_pool(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = match &config.sqlite_path {
        Some(path) => create_file_pool(path, config)?,
        None => create_in_memory_pool(config)?,
    };

    let conn = pool.get()?;
    run_sqlite_migrations(&conn)?;

    Ok(pool)
}

fn create_file_pool(sqlite_path: &str, config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    info!("Initializing SQLite database at: {}", sqlite_path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = Path::new(sqlite_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            fs::create_dir_all(parent).map_err(|e| {
                warn!("Failed to create directory {:?}: {}", parent, e);
                DatabaseError::ConnectionError(format!("Cannot create {:?}: {}", parent, e))
            })?;
        }
    }

    let manager = SqliteConnectionManager::file(sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

    let pool = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    info!("SQLite connection pool created successfully");
    Ok(pool)
}

fn create_in_memory_pool(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    info!("Initializing in-memory SQLite database");

    // Every in-memory connection is its own database, so the pool must hold
    // exactly one and never recycle it
    let manager = SqliteConnectionManager::memory();
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    Ok(pool)
}

/// Describe the database behind a pool
pub fn connection_info(pool: &SqlitePool) -> Result<String, DatabaseError> {
    let conn = pool.get()?;
    let path: String = conn.query_row("PRAGMA database_list", [], |row| row.get(2))?;
    let location = if path.is_empty() || path == ":memory:" {
        "SQLite in-memory database".to_string()
    } else {
        format!("SQLite database at {}", path)
    };

    let state = pool.state();
    Ok(format!(
        "{} (connections: active={}, idle={})",
        location, state.connections, state.idle_connections
    ))
}
