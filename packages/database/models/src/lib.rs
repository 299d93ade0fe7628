#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record and filter definitions shared by every record store.
//!
//! An [`IncidentRecord`] is one row of the monthly crime dashboard extract.
//! A [`RecordFilter`] is the declarative predicate the analytics engines
//! hand to a store; each store backend must give it the same meaning as
//! [`RecordFilter::matches`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One row of the monthly crime dashboard: the number of offences of one
/// subgroup recorded in one area during one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Month the offences were recorded in (`YYYY-MM`, `YYYY-MM-DD` or
    /// `YYYY-MM-DD HH:MM:SS`).
    #[serde(rename = "month_year")]
    pub period: String,
    /// Geography classification, e.g. `"Borough"`.
    pub area_type: String,
    /// Geography label, e.g. `"Camden"`.
    pub area_name: String,
    /// Offence group, e.g. `"Theft"`.
    pub offence_group: String,
    /// Offence subgroup within the group, e.g. `"Shoplifting"`.
    pub offence_subgroup: String,
    /// Number of offences.
    pub count: u64,
}

impl IncidentRecord {
    /// Returns the value of a string field.
    #[must_use]
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Period => &self.period,
            RecordField::AreaType => &self.area_type,
            RecordField::AreaName => &self.area_name,
            RecordField::OffenceGroup => &self.offence_group,
            RecordField::OffenceSubgroup => &self.offence_subgroup,
        }
    }

    /// Identity of the row: at most one record exists per key.
    #[must_use]
    pub fn key(&self) -> (&str, &str, &str, &str) {
        (
            &self.period,
            &self.area_name,
            &self.offence_group,
            &self.offence_subgroup,
        )
    }
}

/// String columns a store can group by or list distinct values of.
///
/// The string form is the column name used by the `DuckDB` schema and the
/// CSV extract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordField {
    /// The `month_year` column.
    #[serde(rename = "month_year")]
    #[strum(serialize = "month_year")]
    Period,
    /// The `area_type` column.
    AreaType,
    /// The `area_name` column.
    AreaName,
    /// The `offence_group` column.
    OffenceGroup,
    /// The `offence_subgroup` column.
    OffenceSubgroup,
}

/// Constraint on the offence group column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupConstraint {
    /// The group must equal this value.
    Exact(String),
    /// The group must be one of these values. An empty set matches nothing.
    AnyOf(Vec<String>),
}

impl GroupConstraint {
    /// Returns `true` if `group` satisfies the constraint.
    #[must_use]
    pub fn accepts(&self, group: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == group,
            Self::AnyOf(groups) => groups.iter().any(|g| g == group),
        }
    }
}

/// Conjunctive filter over incident records.
///
/// Every populated field must hold for a record to pass. Period bounds are
/// inclusive and compared as raw strings, so callers must supply bounds in
/// the same format family as the stored periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Inclusive lower bound on the period.
    pub start_period: Option<String>,
    /// Inclusive upper bound on the period.
    pub end_period: Option<String>,
    /// Period must be one of these values. An empty set matches nothing.
    pub periods: Option<Vec<String>>,
    /// Exact area name.
    pub area_name: Option<String>,
    /// Area names to leave out.
    pub excluded_area_names: Vec<String>,
    /// Offence group constraint.
    pub offence_group: Option<GroupConstraint>,
    /// Exact offence subgroup.
    pub offence_subgroup: Option<String>,
    /// Exact area type.
    pub area_type: Option<String>,
}

impl RecordFilter {
    /// Returns `true` if the record satisfies every populated constraint.
    #[must_use]
    pub fn matches(&self, record: &IncidentRecord) -> bool {
        if let Some(start) = &self.start_period
            && record.period.as_str() < start.as_str()
        {
            return false;
        }
        if let Some(end) = &self.end_period
            && record.period.as_str() > end.as_str()
        {
            return false;
        }
        if let Some(periods) = &self.periods
            && !periods.iter().any(|p| *p == record.period)
        {
            return false;
        }
        if let Some(area_name) = &self.area_name
            && *area_name != record.area_name
        {
            return false;
        }
        if self
            .excluded_area_names
            .iter()
            .any(|name| *name == record.area_name)
        {
            return false;
        }
        if let Some(group) = &self.offence_group
            && !group.accepts(&record.offence_group)
        {
            return false;
        }
        if let Some(subgroup) = &self.offence_subgroup
            && *subgroup != record.offence_subgroup
        {
            return false;
        }
        if let Some(area_type) = &self.area_type
            && *area_type != record.area_type
        {
            return false;
        }
        true
    }

    /// Returns a copy with every temporal constraint removed.
    #[must_use]
    pub fn without_period_bounds(&self) -> Self {
        Self {
            start_period: None,
            end_period: None,
            periods: None,
            ..self.clone()
        }
    }

    /// Restricts the filter to an explicit set of periods.
    #[must_use]
    pub fn with_periods(mut self, periods: Vec<String>) -> Self {
        self.periods = Some(periods);
        self
    }

    /// Leaves out records attributed to any of these area names.
    #[must_use]
    pub fn excluding_areas<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_area_names
            .extend(names.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(period: &str, area: &str, group: &str) -> IncidentRecord {
        IncidentRecord {
            period: period.to_string(),
            area_type: "Borough".to_string(),
            area_name: area.to_string(),
            offence_group: group.to_string(),
            offence_subgroup: "Other".to_string(),
            count: 1,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(RecordFilter::default().matches(&record("2025-01", "Camden", "Theft")));
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let filter = RecordFilter {
            start_period: Some("2025-02".to_string()),
            end_period: Some("2025-04".to_string()),
            ..RecordFilter::default()
        };
        assert!(!filter.matches(&record("2025-01", "Camden", "Theft")));
        assert!(filter.matches(&record("2025-02", "Camden", "Theft")));
        assert!(filter.matches(&record("2025-04", "Camden", "Theft")));
        assert!(!filter.matches(&record("2025-05", "Camden", "Theft")));
    }

    #[test]
    fn group_set_membership() {
        let filter = RecordFilter {
            offence_group: Some(GroupConstraint::AnyOf(vec![
                "Theft".to_string(),
                "Burglary".to_string(),
            ])),
            ..RecordFilter::default()
        };
        assert!(filter.matches(&record("2025-01", "Camden", "Burglary")));
        assert!(!filter.matches(&record("2025-01", "Camden", "Robbery")));
    }

    #[test]
    fn empty_sets_match_nothing() {
        let by_group = RecordFilter {
            offence_group: Some(GroupConstraint::AnyOf(Vec::new())),
            ..RecordFilter::default()
        };
        let by_period = RecordFilter::default().with_periods(Vec::new());
        let row = record("2025-01", "Camden", "Theft");
        assert!(!by_group.matches(&row));
        assert!(!by_period.matches(&row));
    }

    #[test]
    fn excluded_areas_are_dropped() {
        let filter = RecordFilter::default().excluding_areas(["Unknown"]);
        assert!(!filter.matches(&record("2025-01", "Unknown", "Theft")));
        assert!(filter.matches(&record("2025-01", "Camden", "Theft")));
    }

    #[test]
    fn without_period_bounds_keeps_other_constraints() {
        let filter = RecordFilter {
            start_period: Some("2025-02".to_string()),
            end_period: Some("2025-02".to_string()),
            area_name: Some("Camden".to_string()),
            ..RecordFilter::default()
        }
        .with_periods(vec!["2025-02".to_string()]);

        let relaxed = filter.without_period_bounds();
        assert_eq!(relaxed.start_period, None);
        assert_eq!(relaxed.end_period, None);
        assert_eq!(relaxed.periods, None);
        assert_eq!(relaxed.area_name.as_deref(), Some("Camden"));
    }

    #[test]
    fn record_field_names_match_columns() {
        assert_eq!(RecordField::Period.as_ref(), "month_year");
        assert_eq!(RecordField::OffenceSubgroup.as_ref(), "offence_subgroup");
        assert_eq!(
            "area_name".parse::<RecordField>().unwrap(),
            RecordField::AreaName
        );
    }
}
