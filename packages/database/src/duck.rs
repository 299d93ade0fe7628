//! `DuckDB`-backed record store.
//!
//! Records live in a single `crime_records` table. Every [`RecordFilter`]
//! is rendered to a parameterized `WHERE` clause so that filtering,
//! grouping and summing happen inside `DuckDB`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use duckdb::Connection;
use london_crime_database_models::{GroupConstraint, IncidentRecord, RecordField, RecordFilter};

use crate::{DbError, RecordStore, dedupe_records};

const TABLE: &str = "crime_records";

/// Number of rows per INSERT chunk.
const CHUNK_SIZE: usize = 2_000;

/// A [`RecordStore`] backed by a `DuckDB` database.
///
/// `duckdb::Connection` is `Send` but not `Sync`, so the connection is
/// wrapped in a `Mutex` and queries are serialized.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
}

impl DuckDbStore {
    /// Opens (or creates) a `DuckDB` file and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or schema creation fails.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        log::info!("Opening DuckDB record store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a transient in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or schema creation fails.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Replaces the table contents with `records`.
    ///
    /// Duplicate keys are dropped before insertion (last occurrence wins).
    /// The delete and every insert chunk run in one transaction, so a
    /// failed replace leaves the previous contents in place. Returns the
    /// number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a count does not fit a `BIGINT` or any
    /// database operation fails.
    pub fn replace_all(&self, records: Vec<IncidentRecord>) -> Result<u64, DbError> {
        let records = dedupe_records(records);
        let counts = records
            .iter()
            .map(|record| {
                i64::try_from(record.count).map_err(|e| DbError::Conversion {
                    message: format!("Count {} out of range: {e}", record.count),
                })
            })
            .collect::<Result<Vec<i64>, DbError>>()?;

        let conn = self.lock()?;
        conn.execute_batch("BEGIN TRANSACTION")?;

        match write_records(&conn, &records, &counts) {
            Ok(total_inserted) => {
                conn.execute_batch("COMMIT")?;
                log::info!("Wrote {total_inserted} records to {TABLE}");
                Ok(total_inserted)
            }
            Err(e) => {
                log::error!("Replacing {TABLE} failed, rolling back: {e}");
                conn.execute_batch("ROLLBACK")?;
                Err(e)
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }
}

fn write_records(
    conn: &Connection,
    records: &[IncidentRecord],
    counts: &[i64],
) -> Result<u64, DbError> {
    conn.execute_batch(&format!("DELETE FROM {TABLE}"))?;

    let mut total_inserted = 0u64;

    for (chunk, chunk_counts) in records.chunks(CHUNK_SIZE).zip(counts.chunks(CHUNK_SIZE)) {
        let rows = vec!["(?, ?, ?, ?, ?, ?)"; chunk.len()].join(", ");
        let sql = format!(
            "INSERT INTO {TABLE} (
                month_year, area_type, area_name, offence_group, offence_subgroup, count
            ) VALUES {rows}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for (record, count) in chunk.iter().zip(chunk_counts) {
            stmt.raw_bind_parameter(param_idx, &record.period)?;
            stmt.raw_bind_parameter(param_idx + 1, &record.area_type)?;
            stmt.raw_bind_parameter(param_idx + 2, &record.area_name)?;
            stmt.raw_bind_parameter(param_idx + 3, &record.offence_group)?;
            stmt.raw_bind_parameter(param_idx + 4, &record.offence_subgroup)?;
            stmt.raw_bind_parameter(param_idx + 5, *count)?;

            param_idx += 6;
        }

        let inserted = stmt.raw_execute()?;
        total_inserted += u64::try_from(inserted).map_err(|e| DbError::Conversion {
            message: format!("Inserted row count {inserted} out of range: {e}"),
        })?;
    }

    Ok(total_inserted)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {TABLE} (
            month_year TEXT NOT NULL,
            area_type TEXT NOT NULL,
            area_name TEXT NOT NULL,
            offence_group TEXT NOT NULL,
            offence_subgroup TEXT NOT NULL,
            count BIGINT NOT NULL
        );"
    ))?;

    Ok(())
}

/// A rendered `WHERE` clause (possibly empty) and its positional parameters.
#[derive(Debug, Default, PartialEq, Eq)]
struct SqlFilter {
    clause: String,
    params: Vec<String>,
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Renders a [`RecordFilter`] as SQL with the same semantics as
/// [`RecordFilter::matches`].
fn render_filter(filter: &RecordFilter) -> SqlFilter {
    let mut frags: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(start) = &filter.start_period {
        frags.push("month_year >= ?".to_string());
        params.push(start.clone());
    }

    if let Some(end) = &filter.end_period {
        frags.push("month_year <= ?".to_string());
        params.push(end.clone());
    }

    if let Some(periods) = &filter.periods {
        if periods.is_empty() {
            frags.push("FALSE".to_string());
        } else {
            frags.push(format!("month_year IN ({})", placeholders(periods.len())));
            params.extend(periods.iter().cloned());
        }
    }

    if let Some(area_name) = &filter.area_name {
        frags.push("area_name = ?".to_string());
        params.push(area_name.clone());
    }

    if !filter.excluded_area_names.is_empty() {
        frags.push(format!(
            "area_name NOT IN ({})",
            placeholders(filter.excluded_area_names.len())
        ));
        params.extend(filter.excluded_area_names.iter().cloned());
    }

    match &filter.offence_group {
        Some(GroupConstraint::Exact(group)) => {
            frags.push("offence_group = ?".to_string());
            params.push(group.clone());
        }
        Some(GroupConstraint::AnyOf(groups)) if groups.is_empty() => {
            frags.push("FALSE".to_string());
        }
        Some(GroupConstraint::AnyOf(groups)) => {
            frags.push(format!("offence_group IN ({})", placeholders(groups.len())));
            params.extend(groups.iter().cloned());
        }
        None => {}
    }

    if let Some(subgroup) = &filter.offence_subgroup {
        frags.push("offence_subgroup = ?".to_string());
        params.push(subgroup.clone());
    }

    if let Some(area_type) = &filter.area_type {
        frags.push("area_type = ?".to_string());
        params.push(area_type.clone());
    }

    let clause = if frags.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", frags.join(" AND "))
    };

    SqlFilter { clause, params }
}

#[allow(clippy::cast_sign_loss)]
const fn to_count(value: i64) -> u64 {
    value as u64
}

impl RecordStore for DuckDbStore {
    fn query(&self, filter: &RecordFilter) -> Result<Vec<IncidentRecord>, DbError> {
        let SqlFilter { clause, params } = render_filter(filter);
        let sql = format!(
            "SELECT month_year, area_type, area_name, offence_group, offence_subgroup, count
             FROM {TABLE}{clause}
             ORDER BY month_year, area_name, offence_group, offence_subgroup"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(duckdb::params_from_iter(params.iter()))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(IncidentRecord {
                period: row.get(0)?,
                area_type: row.get(1)?,
                area_name: row.get(2)?,
                offence_group: row.get(3)?,
                offence_subgroup: row.get(4)?,
                count: to_count(row.get(5)?),
            });
        }

        Ok(records)
    }

    fn distinct_values(
        &self,
        field: RecordField,
        filter: &RecordFilter,
    ) -> Result<Vec<String>, DbError> {
        let SqlFilter { clause, params } = render_filter(filter);
        let column = field.as_ref();
        let sql = format!("SELECT DISTINCT {column} FROM {TABLE}{clause} ORDER BY {column}");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(duckdb::params_from_iter(params.iter()))?;

        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push(row.get::<_, String>(0)?);
        }

        Ok(values)
    }

    fn sum_count(&self, filter: &RecordFilter) -> Result<u64, DbError> {
        let SqlFilter { clause, params } = render_filter(filter);
        let sql = format!("SELECT CAST(COALESCE(SUM(count), 0) AS BIGINT) FROM {TABLE}{clause}");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let total: i64 = stmt.query_row(duckdb::params_from_iter(params.iter()), |row| row.get(0))?;

        Ok(to_count(total))
    }

    fn group_sum(
        &self,
        filter: &RecordFilter,
        field: RecordField,
    ) -> Result<BTreeMap<String, u64>, DbError> {
        let SqlFilter { clause, params } = render_filter(filter);
        let column = field.as_ref();
        let sql = format!(
            "SELECT {column}, CAST(SUM(count) AS BIGINT) FROM {TABLE}{clause} GROUP BY {column}"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(duckdb::params_from_iter(params.iter()))?;

        let mut sums = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            let total: i64 = row.get(1)?;
            sums.insert(value, to_count(total));
        }

        Ok(sums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(period: &str, area: &str, group: &str, count: u64) -> IncidentRecord {
        IncidentRecord {
            period: period.to_string(),
            area_type: "Borough".to_string(),
            area_name: area.to_string(),
            offence_group: group.to_string(),
            offence_subgroup: "All".to_string(),
            count,
        }
    }

    fn store() -> DuckDbStore {
        let store = DuckDbStore::open_in_memory().unwrap();
        store
            .replace_all(vec![
                record("2025-01", "Camden", "Theft", 10),
                record("2025-01", "Unknown", "Theft", 4),
                record("2025-02", "Camden", "Burglary", 3),
                record("2025-02", "Hackney", "Theft", 6),
            ])
            .unwrap();
        store
    }

    #[test]
    fn renders_empty_filter_without_where() {
        assert_eq!(render_filter(&RecordFilter::default()), SqlFilter::default());
    }

    #[test]
    fn renders_conjunctive_clause_in_parameter_order() {
        let filter = RecordFilter {
            start_period: Some("2025-01".to_string()),
            area_name: Some("Camden".to_string()),
            offence_group: Some(GroupConstraint::AnyOf(vec![
                "Theft".to_string(),
                "Burglary".to_string(),
            ])),
            ..RecordFilter::default()
        };

        let rendered = render_filter(&filter);
        assert_eq!(
            rendered.clause,
            " WHERE month_year >= ? AND area_name = ? AND offence_group IN (?, ?)"
        );
        assert_eq!(rendered.params, vec!["2025-01", "Camden", "Theft", "Burglary"]);
    }

    #[test]
    fn renders_empty_sets_as_false() {
        let filter = RecordFilter {
            offence_group: Some(GroupConstraint::AnyOf(Vec::new())),
            ..RecordFilter::default()
        };
        assert_eq!(render_filter(&filter).clause, " WHERE FALSE");
    }

    #[test]
    fn sums_and_groups_inside_duckdb() {
        let store = store();
        let filter = RecordFilter::default().excluding_areas(["Unknown"]);

        assert_eq!(store.sum_count(&filter).unwrap(), 19);

        let by_area = store.group_sum(&filter, RecordField::AreaName).unwrap();
        assert_eq!(by_area.get("Camden"), Some(&13));
        assert_eq!(by_area.get("Hackney"), Some(&6));
        assert!(!by_area.contains_key("Unknown"));
    }

    #[test]
    fn lists_distinct_periods() {
        let periods = store()
            .distinct_values(RecordField::Period, &RecordFilter::default())
            .unwrap();
        assert_eq!(periods, vec!["2025-01".to_string(), "2025-02".to_string()]);
    }

    #[test]
    fn query_matches_in_memory_semantics() {
        let store = store();
        let filter = RecordFilter {
            offence_group: Some(GroupConstraint::Exact("Theft".to_string())),
            ..RecordFilter::default()
        }
        .with_periods(vec!["2025-01".to_string()]);

        let rows = store.query(&filter).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| filter.matches(r)));
    }

    #[test]
    fn replace_all_overwrites_previous_contents() {
        let store = store();
        store
            .replace_all(vec![record("2026-01", "Camden", "Theft", 1)])
            .unwrap();
        assert_eq!(store.sum_count(&RecordFilter::default()).unwrap(), 1);
    }

    #[test]
    fn failed_replace_keeps_previous_contents() {
        let store = store();
        let before = store.sum_count(&RecordFilter::default()).unwrap();

        let mut records: Vec<IncidentRecord> = (0..CHUNK_SIZE)
            .map(|i| record("2026-01", &format!("Area {i}"), "Theft", 1))
            .collect();
        records.push(record("2026-02", "Camden", "Theft", u64::MAX));

        assert!(matches!(
            store.replace_all(records),
            Err(DbError::Conversion { .. })
        ));
        assert_eq!(store.sum_count(&RecordFilter::default()).unwrap(), before);
        assert_eq!(store.query(&RecordFilter::default()).unwrap().len(), 4);
    }

    #[test]
    fn replace_rolls_back_when_an_insert_fails() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE {TABLE} (
                month_year TEXT NOT NULL,
                area_type TEXT NOT NULL,
                area_name TEXT NOT NULL,
                offence_group TEXT NOT NULL,
                offence_subgroup TEXT NOT NULL,
                count BIGINT NOT NULL CHECK (count < 100)
            );"
        ))
        .unwrap();

        let store = DuckDbStore::from_connection(conn).unwrap();
        store
            .replace_all(vec![record("2025-01", "Camden", "Theft", 12)])
            .unwrap();

        let result = store.replace_all(vec![
            record("2026-01", "Camden", "Theft", 1),
            record("2026-01", "Hackney", "Theft", 500),
        ]);

        assert!(matches!(result, Err(DbError::DuckDb(_))));
        let rows = store.query(&RecordFilter::default()).unwrap();
        assert_eq!(rows, vec![record("2025-01", "Camden", "Theft", 12)]);
    }

    #[test]
    fn empty_table_sums_to_zero() {
        let store = DuckDbStore::open_in_memory().unwrap();
        assert_eq!(store.sum_count(&RecordFilter::default()).unwrap(), 0);
    }
}
