#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the data directory.
//!
//! All paths are relative to the project root's `data/` directory.

use std::path::{Path, PathBuf};

/// File name of the CSV extract produced from the monthly dashboard
/// spreadsheet.
pub const CRIME_CSV_FILENAME: &str = "MonthlyCrimeDashboard_TNOCrimeData.csv";

/// File name of the `DuckDB` record store.
pub const CRIME_DUCKDB_FILENAME: &str = "crime.duckdb";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`; falls back to the
/// current directory if the manifest directory has no such ancestor.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default path of the dashboard CSV extract.
#[must_use]
pub fn crime_csv_path() -> PathBuf {
    data_dir().join(CRIME_CSV_FILENAME)
}

/// Returns the default path of the `DuckDB` record store.
#[must_use]
pub fn crime_duckdb_path() -> PathBuf {
    data_dir().join(CRIME_DUCKDB_FILENAME)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
