#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analytical queries over London crime records.
//!
//! Every entry point takes a [`RecordStore`](london_crime_database::RecordStore)
//! and returns one of the typed results from
//! [`london_crime_analytics_models`]:
//!
//! - [`filter`] turns request parameters into a
//!   [`RecordFilter`](london_crime_database_models::RecordFilter)
//! - [`trend`] computes totals and month-on-month / year-on-year change
//! - [`ranking`] places a postcode's borough among all boroughs
//! - [`queries`] serves the remaining dashboard lookups
//!
//! All functions are synchronous and read-only.

pub mod filter;
pub mod period;
pub mod queries;
pub mod ranking;
pub mod trend;

use london_crime_database::DbError;
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Record store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

#[cfg(test)]
pub(crate) mod test_support {
    use london_crime_database::memory::MemoryStore;
    use london_crime_database_models::IncidentRecord;

    pub fn record(
        period: &str,
        area_name: &str,
        offence_group: &str,
        offence_subgroup: &str,
        count: u64,
    ) -> IncidentRecord {
        IncidentRecord {
            period: period.to_string(),
            area_type: "Borough".to_string(),
            area_name: area_name.to_string(),
            offence_group: offence_group.to_string(),
            offence_subgroup: offence_subgroup.to_string(),
            count,
        }
    }

    pub fn store(records: Vec<IncidentRecord>) -> MemoryStore {
        MemoryStore::new(records)
    }

    /// `n` consecutive `YYYY-MM` periods ending at 2025-06.
    pub fn months(n: u32) -> Vec<String> {
        let mut out = Vec::new();
        let (mut year, mut month) = (2025_i32, 6_u32);
        for _ in 0..n {
            out.push(format!("{year:04}-{month:02}"));
            if month == 1 {
                year -= 1;
                month = 12;
            } else {
                month -= 1;
            }
        }
        out.reverse();
        out
    }
}
