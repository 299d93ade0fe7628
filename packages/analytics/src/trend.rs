//! Headline totals and percentage change for a filtered slice.
//!
//! How change is measured depends on how many distinct periods the slice
//! covers (see [`TrendMode`]). A single selected month is compared against
//! the calendar month before it and the same month a year earlier, looked
//! up outside the slice. A multi-month slice is compared against itself:
//! its last period against the one before, and its last twelve periods
//! against the twelve before those.

use london_crime_analytics_models::SummaryResult;
use london_crime_database::RecordStore;
use london_crime_database_models::{RecordField, RecordFilter};

use crate::AnalyticsError;
use crate::filter::comparison_filter;
use crate::period::{months_before, sort_chronologically};

/// Distinct periods in a snapshot slice.
pub const SNAPSHOT_PERIODS: usize = 1;

/// Distinct periods a range needs before it reports one-month change.
pub const MIN_PERIODS_FOR_ONE_MONTH_CHANGE: usize = 2;

/// Periods per year-on-year window.
pub const YEAR_WINDOW: usize = 12;

/// Distinct periods a range needs before it reports twelve-month change.
pub const MIN_PERIODS_FOR_TWELVE_MONTH_CHANGE: usize = 2 * YEAR_WINDOW;

const ONE_MONTH: u32 = 1;
const TWELVE_MONTHS: u32 = 12;

/// How a slice's change figures are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMode {
    /// The slice covers exactly one period.
    Snapshot,
    /// The slice covers several periods.
    Range,
}

impl TrendMode {
    /// Picks the mode for a slice with the given distinct periods, or
    /// `None` for an empty slice.
    #[must_use]
    pub const fn select(periods: &[String]) -> Option<Self> {
        match periods.len() {
            0 => None,
            SNAPSHOT_PERIODS => Some(Self::Snapshot),
            _ => Some(Self::Range),
        }
    }
}

/// Rounds half away from zero to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `previous` to `current`, rounded to two decimals.
///
/// Returns `None` when `previous` is zero.
#[must_use]
pub fn percent_change(current: u64, previous: u64) -> Option<f64> {
    if previous == 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let (current, previous) = (current as f64, previous as f64);
    Some(round2((current - previous) / previous * 100.0))
}

/// Computes the headline summary for every record passing `filter`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the record store fails.
pub fn summary(
    store: &dyn RecordStore,
    filter: &RecordFilter,
) -> Result<SummaryResult, AnalyticsError> {
    let periods = sort_chronologically(store.distinct_values(RecordField::Period, filter)?);

    let (Some(mode), Some(earliest), Some(latest)) =
        (TrendMode::select(&periods), periods.first(), periods.last())
    else {
        return Ok(SummaryResult::default());
    };

    let total = store.sum_count(filter)?;

    let (one_month, twelve_month) = match mode {
        TrendMode::Snapshot => snapshot_changes(store, filter, latest, total)?,
        TrendMode::Range => range_changes(store, filter, &periods)?,
    };

    log::debug!(
        "Summary over {} periods ({mode:?}): total={total} 1m={one_month:?} 12m={twelve_month:?}",
        periods.len()
    );

    Ok(SummaryResult {
        total_offences: total,
        twelve_month_change_pct: twelve_month,
        one_month_change_pct: one_month,
        latest_period: latest.clone(),
        earliest_period: earliest.clone(),
    })
}

/// Compares a single period against the calendar month before it and the
/// same month a year earlier, under the slice's non-temporal constraints.
fn snapshot_changes(
    store: &dyn RecordStore,
    filter: &RecordFilter,
    anchor: &str,
    total: u64,
) -> Result<(Option<f64>, Option<f64>), AnalyticsError> {
    let (Some(prev_1), Some(prev_12)) = (
        months_before(anchor, ONE_MONTH),
        months_before(anchor, TWELVE_MONTHS),
    ) else {
        log::warn!("Cannot parse period {anchor:?}; skipping trend comparison");
        return Ok((None, None));
    };

    let comparison =
        comparison_filter(filter).with_periods(vec![prev_1.clone(), prev_12.clone()]);
    let sums = store.group_sum(&comparison, RecordField::Period)?;

    let prev_1_total = sums.get(&prev_1).copied().unwrap_or(0);
    let prev_12_total = sums.get(&prev_12).copied().unwrap_or(0);

    Ok((
        percent_change(total, prev_1_total),
        percent_change(total, prev_12_total),
    ))
}

/// Compares the tail of a multi-period slice against the periods before it.
fn range_changes(
    store: &dyn RecordStore,
    filter: &RecordFilter,
    periods: &[String],
) -> Result<(Option<f64>, Option<f64>), AnalyticsError> {
    let sums = store.group_sum(filter, RecordField::Period)?;
    let total_of = |window: &[String]| -> u64 {
        window
            .iter()
            .map(|p| sums.get(p).copied().unwrap_or(0))
            .sum()
    };

    let n = periods.len();

    let one_month = if n >= MIN_PERIODS_FOR_ONE_MONTH_CHANGE {
        percent_change(total_of(&periods[n - 1..]), total_of(&periods[n - 2..n - 1]))
    } else {
        None
    };

    let twelve_month = if n >= MIN_PERIODS_FOR_TWELVE_MONTH_CHANGE {
        percent_change(
            total_of(&periods[n - YEAR_WINDOW..]),
            total_of(&periods[n - 2 * YEAR_WINDOW..n - YEAR_WINDOW]),
        )
    } else {
        None
    };

    Ok((one_month, twelve_month))
}
