#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record storage for the London crime dashboard data.
//!
//! The analytics engines only ever talk to a [`RecordStore`]: a read-only
//! collection of [`IncidentRecord`]s that can filter, list distinct values,
//! sum and group-sum. Two backends are provided: [`memory::MemoryStore`]
//! keeps every row in a `Vec`, and [`duck::DuckDbStore`] keeps them in a
//! `DuckDB` table and pushes filters down as SQL.

pub mod csv_import;
pub mod duck;
pub mod memory;
pub mod paths;

use std::collections::BTreeMap;
use std::path::Path;

use london_crime_database_models::{IncidentRecord, RecordField, RecordFilter};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::duck::DuckDbStore;
use crate::memory::MemoryStore;

/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` operation failed.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the store's connection lock.
    #[error("Record store lock poisoned")]
    Poisoned,

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Read-only access to incident records.
///
/// Implementations must give a [`RecordFilter`] exactly the meaning of
/// [`RecordFilter::matches`]. Stores are shared between request handlers,
/// so they must be safe for concurrent readers.
pub trait RecordStore: Send + Sync {
    /// Returns every record passing the filter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    fn query(&self, filter: &RecordFilter) -> Result<Vec<IncidentRecord>, DbError>;

    /// Returns the distinct values of `field` among records passing the
    /// filter, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    fn distinct_values(
        &self,
        field: RecordField,
        filter: &RecordFilter,
    ) -> Result<Vec<String>, DbError>;

    /// Sums `count` over records passing the filter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    fn sum_count(&self, filter: &RecordFilter) -> Result<u64, DbError>;

    /// Sums `count` per distinct value of `field` among records passing the
    /// filter. Values with no passing records are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    fn group_sum(
        &self,
        filter: &RecordFilter,
        field: RecordField,
    ) -> Result<BTreeMap<String, u64>, DbError>;
}

/// Which [`RecordStore`] implementation to serve from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    /// Load the CSV extract into a [`MemoryStore`] at startup.
    #[default]
    Memory,
    /// Query a [`DuckDbStore`] previously filled by an import.
    Duckdb,
}

/// Opens the configured record store.
///
/// The memory backend reads `csv_path`; the `DuckDB` backend opens
/// `duckdb_path`.
///
/// # Errors
///
/// Returns [`DbError`] if the CSV cannot be read or the database cannot be
/// opened.
pub fn open_store(
    backend: StoreBackend,
    csv_path: &Path,
    duckdb_path: &Path,
) -> Result<Box<dyn RecordStore>, DbError> {
    match backend {
        StoreBackend::Memory => {
            let records = csv_import::read_records(csv_path)?;
            Ok(Box::new(MemoryStore::new(records)))
        }
        StoreBackend::Duckdb => Ok(Box::new(DuckDbStore::open(duckdb_path)?)),
    }
}

/// Drops records sharing a (period, area, group, subgroup) key, keeping
/// the last occurrence of each.
#[must_use]
pub fn dedupe_records(records: Vec<IncidentRecord>) -> Vec<IncidentRecord> {
    let keep: Vec<bool> = {
        let mut last_seen: BTreeMap<(&str, &str, &str, &str), usize> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            last_seen.insert(record.key(), i);
        }
        records
            .iter()
            .enumerate()
            .map(|(i, record)| last_seen.get(&record.key()) == Some(&i))
            .collect()
    };

    if keep.iter().all(|k| *k) {
        return records;
    }

    let before = records.len();
    let deduped: Vec<IncidentRecord> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect();

    log::info!(
        "Deduplicated records: {before} -> {} rows ({} duplicates removed)",
        deduped.len(),
        before - deduped.len(),
    );

    deduped
}
