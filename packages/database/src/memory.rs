//! In-memory record store.
//!
//! Holds the whole dataset in a `Vec` and evaluates every query as a linear
//! scan with [`RecordFilter::matches`].

use std::collections::{BTreeMap, BTreeSet};

use london_crime_database_models::{IncidentRecord, RecordField, RecordFilter};

use crate::{DbError, RecordStore, dedupe_records};

/// A [`RecordStore`] backed by a plain vector of records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<IncidentRecord>,
}

impl MemoryStore {
    /// Creates a store from the given records, dropping duplicate keys.
    #[must_use]
    pub fn new(records: Vec<IncidentRecord>) -> Self {
        let records = dedupe_records(records);
        log::debug!("MemoryStore holds {} records", records.len());
        Self { records }
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matching<'a>(
        &'a self,
        filter: &'a RecordFilter,
    ) -> impl Iterator<Item = &'a IncidentRecord> + 'a {
        self.records.iter().filter(move |r| filter.matches(r))
    }
}

fn add_count(total: u64, count: u64) -> Result<u64, DbError> {
    total.checked_add(count).ok_or_else(|| DbError::Conversion {
        message: format!("Count sum overflows: {total} + {count}"),
    })
}

impl RecordStore for MemoryStore {
    fn query(&self, filter: &RecordFilter) -> Result<Vec<IncidentRecord>, DbError> {
        Ok(self.matching(filter).cloned().collect())
    }

    fn distinct_values(
        &self,
        field: RecordField,
        filter: &RecordFilter,
    ) -> Result<Vec<String>, DbError> {
        let values: BTreeSet<&str> = self.matching(filter).map(|r| r.field(field)).collect();
        Ok(values.into_iter().map(str::to_string).collect())
    }

    fn sum_count(&self, filter: &RecordFilter) -> Result<u64, DbError> {
        self.matching(filter)
            .try_fold(0u64, |total, r| add_count(total, r.count))
    }

    fn group_sum(
        &self,
        filter: &RecordFilter,
        field: RecordField,
    ) -> Result<BTreeMap<String, u64>, DbError> {
        let mut sums: BTreeMap<String, u64> = BTreeMap::new();
        for record in self.matching(filter) {
            let sum = sums.entry(record.field(field).to_string()).or_insert(0);
            *sum = add_count(*sum, record.count)?;
        }
        Ok(sums)
    }
}

#[cfg(test)]
mod tests {
    use london_crime_database_models::GroupConstraint;

    use super::*;

    fn record(period: &str, area: &str, group: &str, count: u64) -> IncidentRecord {
        IncidentRecord {
            period: period.to_string(),
            area_type: "Borough".to_string(),
            area_name: area.to_string(),
            offence_group: group.to_string(),
            offence_subgroup: format!("{group} (all)"),
            count,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(vec![
            record("2025-01", "Camden", "Theft", 10),
            record("2025-01", "Hackney", "Theft", 7),
            record("2025-02", "Camden", "Burglary", 3),
            record("2025-02", "Camden", "Theft", 5),
        ])
    }

    #[test]
    fn sums_filtered_counts() {
        let filter = RecordFilter {
            area_name: Some("Camden".to_string()),
            ..RecordFilter::default()
        };
        assert_eq!(store().sum_count(&filter).unwrap(), 18);
    }

    #[test]
    fn groups_by_field() {
        let filter = RecordFilter {
            offence_group: Some(GroupConstraint::Exact("Theft".to_string())),
            ..RecordFilter::default()
        };
        let sums = store().group_sum(&filter, RecordField::Period).unwrap();
        assert_eq!(sums.get("2025-01"), Some(&17));
        assert_eq!(sums.get("2025-02"), Some(&5));
    }

    #[test]
    fn distinct_values_are_sorted() {
        let values = store()
            .distinct_values(RecordField::AreaName, &RecordFilter::default())
            .unwrap();
        assert_eq!(values, vec!["Camden".to_string(), "Hackney".to_string()]);
    }

    #[test]
    fn query_returns_matching_rows() {
        let filter = RecordFilter::default().with_periods(vec!["2025-02".to_string()]);
        let rows = store().query(&filter).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.period == "2025-02"));
    }

    #[test]
    fn overflowing_sum_is_an_error() {
        let store = MemoryStore::new(vec![
            record("2025-01", "Camden", "Theft", u64::MAX),
            record("2025-02", "Camden", "Theft", 1),
        ]);

        assert!(matches!(
            store.sum_count(&RecordFilter::default()),
            Err(DbError::Conversion { .. })
        ));
        assert!(store.group_sum(&RecordFilter::default(), RecordField::AreaName).is_err());
    }

    #[test]
    fn empty_store_sums_to_zero() {
        let empty = MemoryStore::default();
        assert!(empty.is_empty());
        assert_eq!(empty.sum_count(&RecordFilter::default()).unwrap(), 0);
        assert!(
            empty
                .group_sum(&RecordFilter::default(), RecordField::AreaName)
                .unwrap()
                .is_empty()
        );
    }
}
