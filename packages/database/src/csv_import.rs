//! Loader for the CSV extract of the monthly crime dashboard.
//!
//! The extract has one header row with the columns `month_year`,
//! `area_type`, `area_name`, `offence_group`, `offence_subgroup` and
//! `count`. Missing text cells become empty strings, offence names are
//! title-cased, and unparseable counts become zero. Rows without a period,
//! and rows whose count does not fit a signed 64-bit column, are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use london_crime_crime_models::title_case_offence;
use london_crime_database_models::IncidentRecord;
use serde::Deserialize;

use crate::DbError;

/// Largest count a store can hold (the `DuckDB` column is `BIGINT`).
pub const MAX_COUNT: u64 = i64::MAX.unsigned_abs();

#[derive(Debug, Deserialize)]
struct CsvRow {
    month_year: Option<String>,
    area_type: Option<String>,
    area_name: Option<String>,
    offence_group: Option<String>,
    offence_subgroup: Option<String>,
    count: Option<String>,
}

/// Reads every record from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be opened or is not valid CSV.
pub fn read_records(path: &Path) -> Result<Vec<IncidentRecord>, DbError> {
    log::info!("Reading crime records from {}", path.display());
    let file = File::open(path)?;
    read_records_from(file)
}

/// Reads every record from a CSV stream.
///
/// # Errors
///
/// Returns [`DbError`] if the stream is not valid CSV.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<IncidentRecord>, DbError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut skipped = 0u64;
    let mut out_of_range = 0u64;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        let Some(period) = row.month_year.filter(|p| !p.is_empty()) else {
            skipped += 1;
            continue;
        };

        let Some(count) = parse_count(row.count.as_deref()) else {
            log::debug!(
                "Count {:?} out of range for {period}",
                row.count.as_deref().unwrap_or_default()
            );
            out_of_range += 1;
            continue;
        };

        records.push(IncidentRecord {
            period,
            area_type: row.area_type.unwrap_or_default(),
            area_name: row.area_name.unwrap_or_default(),
            offence_group: title_case_offence(&row.offence_group.unwrap_or_default()),
            offence_subgroup: title_case_offence(&row.offence_subgroup.unwrap_or_default()),
            count,
        });

        if records.len() % 50_000 == 0 {
            log::debug!("Parsed {} rows...", records.len());
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} rows with no month_year value");
    }
    if out_of_range > 0 {
        log::warn!("Skipped {out_of_range} rows with a count above {MAX_COUNT}");
    }
    log::info!("Parsed {} crime records", records.len());

    Ok(records)
}

/// Parses a count cell.
///
/// Spreadsheet exports sometimes render integers as `"12.0"`; those are
/// truncated. Blank, negative or non-numeric cells count as zero.
///
/// Returns `None` for numbers above [`MAX_COUNT`].
#[must_use]
pub fn parse_count(raw: Option<&str>) -> Option<u64> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Some(0);
    };

    let count = if let Ok(n) = raw.parse::<u64>() {
        n
    } else {
        match raw.parse::<f64>() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(n) if n.is_finite() && n >= 0.0 => n.trunc() as u64,
            Ok(n) if n.is_infinite() && n > 0.0 => return None,
            _ => 0,
        }
    };

    (count <= MAX_COUNT).then_some(count)
}
