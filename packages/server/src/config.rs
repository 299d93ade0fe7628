//! Server configuration read from environment variables.

use std::path::PathBuf;

use london_crime_database::{StoreBackend, paths};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PORT` is not a valid port number.
    #[error("Invalid PORT value: {value}")]
    InvalidPort {
        /// The rejected value.
        value: String,
    },

    /// `CRIME_STORE` names an unknown backend.
    #[error("Invalid CRIME_STORE value: {value} (expected \"memory\" or \"duckdb\")")]
    InvalidStore {
        /// The rejected value.
        value: String,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// Record store backend (`CRIME_STORE`).
    pub store: StoreBackend,
    /// Dashboard CSV extract (`CRIME_DATA_CSV`).
    pub csv_path: PathBuf,
    /// `DuckDB` record store (`CRIME_DUCKDB_PATH`).
    pub duckdb_path: PathBuf,
    /// Frontend bundle to serve at `/` (`STATIC_DIR`).
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            store: StoreBackend::default(),
            csv_path: paths::crime_csv_path(),
            duckdb_path: paths::crime_duckdb_path(),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `PORT` or `CRIME_STORE` is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Unset and blank variables
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `PORT` or `CRIME_STORE` is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value })?,
            None => defaults.port,
        };

        let store = match var("CRIME_STORE") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidStore { value })?,
            None => defaults.store,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            store,
            csv_path: var("CRIME_DATA_CSV").map_or(defaults.csv_path, PathBuf::from),
            duckdb_path: var("CRIME_DUCKDB_PATH").map_or(defaults.duckdb_path, PathBuf::from),
            static_dir: var("STATIC_DIR").map(PathBuf::from),
        })
    }
}
