//! Borough ranking for a postcode.
//!
//! The ranking window is the most recent [`RANKING_WINDOW`] periods in the
//! whole store, independent of any dashboard filter, so every category is
//! ranked over the same months.

use london_crime_analytics_models::{RankedBorough, RankingMiss, RankingOutcome, RankingResult};
use london_crime_crime_models::{BOROUGH_AREA_TYPE, CategorySelection, NON_GEOGRAPHIC_AREAS};
use london_crime_database::RecordStore;
use london_crime_database_models::{GroupConstraint, RecordField, RecordFilter};
use london_crime_geography::PostcodeResolver;

use crate::AnalyticsError;
use crate::period::sort_chronologically;

/// Number of most recent periods a ranking covers.
pub const RANKING_WINDOW: usize = 12;

/// The most recent [`RANKING_WINDOW`] periods in the store, oldest first.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn ranking_window(store: &dyn RecordStore) -> Result<Vec<String>, AnalyticsError> {
    let mut periods = sort_chronologically(
        store.distinct_values(RecordField::Period, &RecordFilter::default())?,
    );
    let skip = periods.len().saturating_sub(RANKING_WINDOW);
    periods.drain(..skip);
    Ok(periods)
}

/// Sorts `(area, total)` pairs by total descending, then area name.
pub(crate) fn sort_by_total_desc<T>(entries: &mut [T], key: impl Fn(&T) -> (&str, u64)) {
    entries.sort_by(|a, b| {
        let (a_name, a_total) = key(a);
        let (b_name, b_total) = key(b);
        b_total.cmp(&a_total).then_with(|| a_name.cmp(b_name))
    });
}

/// Ranks every borough by offences over the window and reports where the
/// postcode's borough lands.
///
/// `category` is an offence group name; missing, blank and `OVERALL` all
/// rank across every group.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails. Input problems
/// (missing or unrecognised postcode, borough absent from the ranking) are
/// reported as [`RankingOutcome::Miss`].
pub fn borough_ranking(
    store: &dyn RecordStore,
    resolver: &PostcodeResolver,
    postcode: Option<&str>,
    category: Option<&str>,
) -> Result<RankingOutcome, AnalyticsError> {
    let Some(postcode) = postcode.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(RankingOutcome::Miss(RankingMiss::MissingPostcode));
    };

    let Some(borough) = resolver.resolve(postcode) else {
        log::debug!("Postcode {postcode:?} is not in a London borough");
        return Ok(RankingOutcome::Miss(RankingMiss::PostcodeNotRecognised {
            postcode: postcode.to_string(),
        }));
    };

    let category = CategorySelection::parse(category);
    let window = ranking_window(store)?;

    let filter = RecordFilter {
        area_type: Some(BOROUGH_AREA_TYPE.to_string()),
        offence_group: category
            .group()
            .map(|g| GroupConstraint::Exact(g.to_string())),
        ..RecordFilter::default()
    }
    .with_periods(window.clone())
    .excluding_areas(NON_GEOGRAPHIC_AREAS.iter().copied());

    let mut ranked: Vec<RankedBorough> = store
        .group_sum(&filter, RecordField::AreaName)?
        .into_iter()
        .map(|(area_name, total_count)| RankedBorough {
            is_user_borough: area_name == borough,
            area_name,
            total_count,
        })
        .collect();
    sort_by_total_desc(&mut ranked, |r| (r.area_name.as_str(), r.total_count));

    let Some((index, entry)) = ranked.iter().enumerate().find(|(_, r)| r.is_user_borough) else {
        return Ok(RankingOutcome::Miss(RankingMiss::NoData {
            borough: borough.to_string(),
            category,
        }));
    };

    let rank = index + 1;
    let borough_count = entry.total_count;

    let period = match (window.first(), window.last()) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => String::new(),
    };

    log::info!(
        "{borough} ranks {rank}/{} for {category} over {period}",
        ranked.len()
    );

    Ok(RankingOutcome::Ranked(RankingResult {
        borough: borough.to_string(),
        rank,
        total_boroughs: ranked.len(),
        borough_count,
        offence_group: category.label().to_string(),
        period,
        all_boroughs: ranked,
    }))
}
