//! Dashboard lookups: per-borough and per-period totals, category
//! breakdowns and the option lists behind the filter controls.

use london_crime_analytics_models::{
    BoroughTotal, BreakdownEntry, BreakdownMode, DateRange, TimeSeriesPoint,
};
use london_crime_crime_models::HIDDEN_OFFENCE_GROUPS;
use london_crime_database::RecordStore;
use london_crime_database_models::{GroupConstraint, RecordField, RecordFilter};

use crate::AnalyticsError;
use crate::period::sort_chronologically;
use crate::ranking::sort_by_total_desc;

/// Offence totals per area, most offences first.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn borough_totals(
    store: &dyn RecordStore,
    filter: &RecordFilter,
) -> Result<Vec<BoroughTotal>, AnalyticsError> {
    let mut totals: Vec<BoroughTotal> = store
        .group_sum(filter, RecordField::AreaName)?
        .into_iter()
        .map(|(area_name, total_count)| BoroughTotal {
            area_name,
            total_count,
        })
        .collect();
    sort_by_total_desc(&mut totals, |t| (t.area_name.as_str(), t.total_count));
    Ok(totals)
}

/// Offence totals per period, oldest first.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn time_series(
    store: &dyn RecordStore,
    filter: &RecordFilter,
) -> Result<Vec<TimeSeriesPoint>, AnalyticsError> {
    let mut sums = store.group_sum(filter, RecordField::Period)?;
    let periods = sort_chronologically(sums.keys().cloned().collect());

    Ok(periods
        .into_iter()
        .map(|month_year| TimeSeriesPoint {
            total_count: sums.remove(&month_year).unwrap_or(0),
            month_year,
        })
        .collect())
}

/// Breakdown mode for a filter: by subgroup when a single offence group
/// was requested, by group otherwise.
#[must_use]
pub const fn breakdown_mode(filter: &RecordFilter) -> BreakdownMode {
    match filter.offence_group {
        Some(GroupConstraint::Exact(_)) => BreakdownMode::Subgroup,
        _ => BreakdownMode::Group,
    }
}

/// Offence totals per group or subgroup, most offences first.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn offence_breakdown(
    store: &dyn RecordStore,
    filter: &RecordFilter,
    mode: BreakdownMode,
) -> Result<Vec<BreakdownEntry>, AnalyticsError> {
    let field = match mode {
        BreakdownMode::Group => RecordField::OffenceGroup,
        BreakdownMode::Subgroup => RecordField::OffenceSubgroup,
    };

    let mut entries: Vec<BreakdownEntry> = store
        .group_sum(filter, field)?
        .into_iter()
        .map(|(label, total_count)| BreakdownEntry { label, total_count })
        .collect();
    sort_by_total_desc(&mut entries, |e| (e.label.as_str(), e.total_count));
    Ok(entries)
}

/// Sorted distinct area names, optionally of one area type.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn boroughs(
    store: &dyn RecordStore,
    area_type: Option<&str>,
) -> Result<Vec<String>, AnalyticsError> {
    let filter = RecordFilter {
        area_type: area_type
            .filter(|t| !t.trim().is_empty())
            .map(ToString::to_string),
        ..RecordFilter::default()
    };
    Ok(store.distinct_values(RecordField::AreaName, &filter)?)
}

/// Sorted distinct area types.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn area_types(store: &dyn RecordStore) -> Result<Vec<String>, AnalyticsError> {
    Ok(store.distinct_values(RecordField::AreaType, &RecordFilter::default())?)
}

/// Sorted distinct offence groups, leaving out the hidden ones.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn offence_groups(store: &dyn RecordStore) -> Result<Vec<String>, AnalyticsError> {
    let mut groups = store.distinct_values(RecordField::OffenceGroup, &RecordFilter::default())?;
    groups.retain(|g| !HIDDEN_OFFENCE_GROUPS.contains(&g.as_str()));
    Ok(groups)
}

/// Sorted distinct offence subgroups, optionally within one group.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn offence_subgroups(
    store: &dyn RecordStore,
    offence_group: Option<&str>,
) -> Result<Vec<String>, AnalyticsError> {
    let filter = RecordFilter {
        offence_group: offence_group
            .filter(|g| !g.trim().is_empty())
            .map(|g| GroupConstraint::Exact(g.to_string())),
        ..RecordFilter::default()
    };
    Ok(store.distinct_values(RecordField::OffenceSubgroup, &filter)?)
}

/// Every period in the store, oldest first, with its bounds.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn date_range(store: &dyn RecordStore) -> Result<DateRange, AnalyticsError> {
    let months = sort_chronologically(
        store.distinct_values(RecordField::Period, &RecordFilter::default())?,
    );

    Ok(DateRange {
        earliest: months.first().cloned().unwrap_or_default(),
        latest: months.last().cloned().unwrap_or_default(),
        months,
    })
}

#[cfg(test)]
mod tests {
    use london_crime_database::memory::MemoryStore;

    use super::*;
    use crate::filter::RecordFilterBuilder;
    use crate::test_support::{record, store};

    fn dataset() -> MemoryStore {
        let mut force = record("2025-06", "Met Total", "Theft", "Shoplifting", 1);
        force.area_type = "Force".to_string();

        store(vec![
            record("2025-05", "Camden", "Theft", "Shoplifting", 40),
            record("2025-05", "Camden", "Theft", "Bicycle Theft", 5),
            record("2025-06", "Camden", "Burglary", "Residential Burglary", 7),
            record("2025-06", "Hackney", "Theft", "Shoplifting", 45),
            record("2025-04", "Hackney", "Nfib Fraud", "Nfib Fraud", 3),
            force,
        ])
    }

    #[test]
    fn borough_totals_descend_with_name_tie_break() {
        let totals = borough_totals(&dataset(), &RecordFilter::default()).unwrap();
        assert_eq!(
            totals,
            vec![
                BoroughTotal {
                    area_name: "Camden".to_string(),
                    total_count: 52
                },
                BoroughTotal {
                    area_name: "Hackney".to_string(),
                    total_count: 48
                },
                BoroughTotal {
                    area_name: "Met Total".to_string(),
                    total_count: 1
                },
            ]
        );

        let theft = RecordFilterBuilder::new().offence_group(Some("Theft")).build();
        let totals = borough_totals(&dataset(), &theft).unwrap();
        assert_eq!(totals[0].area_name, "Camden");
        assert_eq!(totals[1].area_name, "Hackney");
        assert_eq!(totals[0].total_count, totals[1].total_count);
    }

    #[test]
    fn time_series_ascends() {
        let series = time_series(&dataset(), &RecordFilter::default()).unwrap();
        let periods: Vec<&str> = series.iter().map(|p| p.month_year.as_str()).collect();
        assert_eq!(periods, ["2025-04", "2025-05", "2025-06"]);
        assert_eq!(series[1].total_count, 45);
    }

    #[test]
    fn breakdown_by_subgroup_for_single_group() {
        let filter = RecordFilterBuilder::new().offence_group(Some("Theft")).build();
        assert_eq!(breakdown_mode(&filter), BreakdownMode::Subgroup);

        let entries = offence_breakdown(&dataset(), &filter, breakdown_mode(&filter)).unwrap();
        assert_eq!(entries[0].label, "Shoplifting");
        assert_eq!(entries[0].total_count, 86);
        assert_eq!(entries[1].label, "Bicycle Theft");
    }

    #[test]
    fn breakdown_by_group_otherwise() {
        let filter = RecordFilterBuilder::new()
            .offence_groups(Some("Theft,Burglary"))
            .build();
        assert_eq!(breakdown_mode(&filter), BreakdownMode::Group);

        let entries = offence_breakdown(&dataset(), &filter, BreakdownMode::Group).unwrap();
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Theft", "Burglary"]);
    }

    #[test]
    fn lookup_lists() {
        let s = dataset();
        assert_eq!(
            boroughs(&s, None).unwrap(),
            ["Camden", "Hackney", "Met Total"]
        );
        assert_eq!(boroughs(&s, Some("Borough")).unwrap(), ["Camden", "Hackney"]);
        assert_eq!(boroughs(&s, Some("")).unwrap().len(), 3);
        assert_eq!(area_types(&s).unwrap(), ["Borough", "Force"]);
        assert_eq!(offence_groups(&s).unwrap(), ["Burglary", "Theft"]);
        assert_eq!(
            offence_subgroups(&s, Some("Theft")).unwrap(),
            ["Bicycle Theft", "Shoplifting"]
        );
        assert_eq!(offence_subgroups(&s, None).unwrap().len(), 4);
    }

    #[test]
    fn date_range_bounds() {
        let range = date_range(&dataset()).unwrap();
        assert_eq!(range.months, ["2025-04", "2025-05", "2025-06"]);
        assert_eq!(range.earliest, "2025-04");
        assert_eq!(range.latest, "2025-06");

        assert_eq!(
            date_range(&MemoryStore::default()).unwrap(),
            DateRange::default()
        );
    }
}
