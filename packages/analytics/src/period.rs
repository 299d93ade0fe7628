//! Period strings and calendar arithmetic on them.
//!
//! The dashboard extract stores each row's month as text in one of three
//! shapes depending on how the spreadsheet was exported. Comparisons
//! within one shape are plain string comparisons; anything calendar-aware
//! goes through [`PeriodFormat`].

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeSet;

use strum_macros::Display;

/// The textual shape of a period value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PeriodFormat {
    /// `YYYY-MM`
    YearMonth,
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DD HH:MM:SS`, possibly followed by fractional seconds.
    DateTime,
}

const DATE_TIME_LEN: usize = 19;
const DATE_LEN: usize = 10;

impl PeriodFormat {
    /// Classifies a period by its length.
    #[must_use]
    pub const fn detect(period: &str) -> Self {
        match period.len() {
            n if n >= DATE_TIME_LEN => Self::DateTime,
            DATE_LEN => Self::Date,
            _ => Self::YearMonth,
        }
    }

    const fn pattern(self) -> &'static str {
        match self {
            Self::YearMonth => "%Y-%m",
            Self::Date => "%Y-%m-%d",
            Self::DateTime => "%Y-%m-%d %H:%M:%S",
        }
    }

    /// Parses `period` as this format.
    #[must_use]
    pub fn parse(self, period: &str) -> Option<NaiveDateTime> {
        match self {
            Self::YearMonth => NaiveDate::parse_from_str(&format!("{period}-01"), "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN)),
            Self::Date => NaiveDate::parse_from_str(period, self.pattern())
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN)),
            Self::DateTime => period
                .get(..DATE_TIME_LEN)
                .and_then(|p| NaiveDateTime::parse_from_str(p, self.pattern()).ok()),
        }
    }

    /// Renders a timestamp in this format.
    #[must_use]
    pub fn render(self, value: NaiveDateTime) -> String {
        value.format(self.pattern()).to_string()
    }
}

/// Parses a period in whatever format its length suggests.
#[must_use]
pub fn parse_period(period: &str) -> Option<NaiveDateTime> {
    PeriodFormat::detect(period).parse(period)
}

/// The period `months` calendar months before `period`, rendered in the
/// same format. Days past the end of the target month are clamped.
///
/// Returns `None` if `period` cannot be parsed.
#[must_use]
pub fn months_before(period: &str, months: u32) -> Option<String> {
    let format = PeriodFormat::detect(period);
    let anchor = format.parse(period)?;
    let shifted = anchor.checked_sub_months(Months::new(months))?;
    Some(format.render(shifted))
}

/// Orders lexicographically sorted periods chronologically.
///
/// Within one format lexicographic order already is chronological, so the
/// input is returned untouched. When formats are mixed the periods are
/// re-sorted by parsed value, with unparsable strings after every parsed
/// one, in lexicographic order.
#[must_use]
pub fn sort_chronologically(mut periods: Vec<String>) -> Vec<String> {
    let Some(first) = periods.first() else {
        return periods;
    };
    let format = PeriodFormat::detect(first);
    if periods.iter().all(|p| PeriodFormat::detect(p) == format) {
        return periods;
    }

    let formats: BTreeSet<PeriodFormat> =
        periods.iter().map(|p| PeriodFormat::detect(p)).collect();
    log::warn!(
        "Periods mix formats ({}) across {} distinct values; ordering by parsed date",
        formats
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        periods.len()
    );
    periods.sort_by_cached_key(|p| {
        let parsed = parse_period(p);
        (parsed.is_none(), parsed, p.clone())
    });
    periods
}
