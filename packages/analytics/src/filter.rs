//! Translation of request parameters into a [`RecordFilter`].
//!
//! Parameters arrive as optional strings straight from a query string or
//! command line. Blank values never constrain anything, so `?borough=` is
//! the same as leaving `borough` out.

use london_crime_database_models::{GroupConstraint, RecordFilter};

/// Accumulates optional request parameters and builds a [`RecordFilter`].
///
/// A single `offence_group` takes precedence over an `offence_groups` set
/// whichever order they are supplied in.
#[derive(Debug, Clone, Default)]
pub struct RecordFilterBuilder {
    start_period: Option<String>,
    end_period: Option<String>,
    borough: Option<String>,
    offence_group: Option<String>,
    offence_groups: Option<Vec<String>>,
    offence_subgroup: Option<String>,
    area_type: Option<String>,
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(ToString::to_string)
}

/// Splits a comma-separated list, trimming entries and dropping blanks.
#[must_use]
pub fn parse_group_set(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(ToString::to_string)
        .collect()
}

impl RecordFilterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower period bound.
    #[must_use]
    pub fn start_period(mut self, value: Option<&str>) -> Self {
        self.start_period = present(value);
        self
    }

    /// Inclusive upper period bound.
    #[must_use]
    pub fn end_period(mut self, value: Option<&str>) -> Self {
        self.end_period = present(value);
        self
    }

    /// Exact area name.
    #[must_use]
    pub fn borough(mut self, value: Option<&str>) -> Self {
        self.borough = present(value);
        self
    }

    /// Exact offence group.
    #[must_use]
    pub fn offence_group(mut self, value: Option<&str>) -> Self {
        self.offence_group = present(value);
        self
    }

    /// Comma-separated set of offence groups.
    ///
    /// A value made only of separators (`","`) yields an empty set, which
    /// matches no records.
    #[must_use]
    pub fn offence_groups(mut self, value: Option<&str>) -> Self {
        self.offence_groups = present(value).map(|raw| parse_group_set(&raw));
        self
    }

    /// Exact offence subgroup.
    #[must_use]
    pub fn offence_subgroup(mut self, value: Option<&str>) -> Self {
        self.offence_subgroup = present(value);
        self
    }

    /// Exact area type.
    #[must_use]
    pub fn area_type(mut self, value: Option<&str>) -> Self {
        self.area_type = present(value);
        self
    }

    #[must_use]
    pub fn build(self) -> RecordFilter {
        let offence_group = match (self.offence_group, self.offence_groups) {
            (Some(group), ignored) => {
                if ignored.is_some() {
                    log::debug!("offence_group {group:?} overrides offence_groups");
                }
                Some(GroupConstraint::Exact(group))
            }
            (None, Some(groups)) => Some(GroupConstraint::AnyOf(groups)),
            (None, None) => None,
        };

        RecordFilter {
            start_period: self.start_period,
            end_period: self.end_period,
            periods: None,
            area_name: self.borough,
            excluded_area_names: Vec::new(),
            offence_group,
            offence_subgroup: self.offence_subgroup,
            area_type: self.area_type,
        }
    }
}

/// The filter used to look up comparison periods: every non-temporal
/// constraint of `filter`, with its period bounds removed.
#[must_use]
pub fn comparison_filter(filter: &RecordFilter) -> RecordFilter {
    filter.without_period_bounds()
}

#[cfg(test)]
mod tests {
    use london_crime_database_models::IncidentRecord;

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
    fn no_parameters_builds_empty_filter() {
        assert_eq!(RecordFilterBuilder::new().build(), RecordFilter::default());
    }

    #[test]
    fn blank_parameters_are_absent() {
        let filter = RecordFilterBuilder::new()
            .borough(Some(""))
            .offence_group(Some("   "))
            .start_period(Some(""))
            .area_type(None)
            .build();
        assert_eq!(filter, RecordFilter::default());
    }

    #[test]
    fn single_group_beats_group_set() {
        let filter = RecordFilterBuilder::new()
            .offence_groups(Some("Theft,Burglary"))
            .offence_group(Some("Robbery"))
            .build();
        assert_eq!(
            filter.offence_group,
            Some(GroupConstraint::Exact("Robbery".to_string()))
        );
    }

    #[test]
    fn group_set_is_trimmed() {
        let filter = RecordFilterBuilder::new()
            .offence_groups(Some(" Theft , ,Burglary,"))
            .build();
        assert_eq!(
            filter.offence_group,
            Some(GroupConstraint::AnyOf(vec![
                "Theft".to_string(),
                "Burglary".to_string()
            ]))
        );
        assert!(filter.matches(&record("2025-01", "Camden", "Burglary")));
        assert!(!filter.matches(&record("2025-01", "Camden", "Robbery")));
    }

    #[test]
    fn separator_only_group_set_matches_nothing() {
        let filter = RecordFilterBuilder::new().offence_groups(Some(",")).build();
        assert_eq!(filter.offence_group, Some(GroupConstraint::AnyOf(vec![])));
        assert!(!filter.matches(&record("2025-01", "Camden", "Theft")));
    }

    #[test]
    fn constraints_are_conjunctive() {
        let filter = RecordFilterBuilder::new()
            .start_period(Some("2025-01"))
            .end_period(Some("2025-03"))
            .borough(Some("Camden"))
            .offence_group(Some("Theft"))
            .build();

        assert!(filter.matches(&record("2025-02", "Camden", "Theft")));
        assert!(!filter.matches(&record("2025-02", "Hackney", "Theft")));
        assert!(!filter.matches(&record("2025-04", "Camden", "Theft")));
        assert!(!filter.matches(&record("2025-02", "Camden", "Burglary")));
    }

    #[test]
    fn comparison_filter_drops_only_dates() {
        let filter = RecordFilterBuilder::new()
            .start_period(Some("2025-06"))
            .end_period(Some("2025-06"))
            .borough(Some("Camden"))
            .offence_groups(Some("Theft"))
            .offence_subgroup(Some("Shoplifting"))
            .area_type(Some("Borough"))
            .build();

        let comparison = comparison_filter(&filter);
        assert_eq!(comparison.start_period, None);
        assert_eq!(comparison.end_period, None);
        assert_eq!(comparison.area_name, filter.area_name);
        assert_eq!(comparison.offence_group, filter.offence_group);
        assert_eq!(comparison.offence_subgroup, filter.offence_subgroup);
        assert_eq!(comparison.area_type, filter.area_type);
    }
}
