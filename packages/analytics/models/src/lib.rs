#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the London crime analytics engines.
//!
//! Field names are the JSON keys served by the dashboard API, so these
//! types are serialized as-is by both the HTTP server and the CLI.

use london_crime_crime_models::CategorySelection;
use serde::{Deserialize, Serialize};

/// Headline figures for a filtered slice of the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Total offences in the slice.
    pub total_offences: u64,
    /// Change against a year earlier, in percent, rounded to 2 decimals.
    pub twelve_month_change_pct: Option<f64>,
    /// Change against the previous period, in percent, rounded to 2
    /// decimals.
    pub one_month_change_pct: Option<f64>,
    /// Most recent period in the slice, empty when the slice is empty.
    #[serde(rename = "latest_month")]
    pub latest_period: String,
    /// Earliest period in the slice, empty when the slice is empty.
    #[serde(rename = "earliest_month")]
    pub earliest_period: String,
}

/// Offence total for one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoroughTotal {
    /// Area name.
    pub area_name: String,
    /// Offences summed over the slice.
    pub total_count: u64,
}

/// Offence total for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// The period, as stored.
    pub month_year: String,
    /// Offences summed over the slice.
    pub total_count: u64,
}

/// Offence total for one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    /// Offence group or subgroup name.
    pub label: String,
    /// Offences summed over the slice.
    pub total_count: u64,
}

/// Which category column an offence breakdown is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownMode {
    /// One entry per offence group.
    Group,
    /// One entry per offence subgroup.
    Subgroup,
}

/// Every period in the store plus its bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Distinct periods in chronological order.
    pub months: Vec<String>,
    /// First period, or empty.
    pub earliest: String,
    /// Last period, or empty.
    pub latest: String,
}

/// One row of a borough ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedBorough {
    pub area_name: String,
    pub total_count: u64,
    /// Whether this is the borough the postcode resolved to.
    pub is_user_borough: bool,
}

/// Where a postcode's borough sits among all boroughs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingResult {
    /// Borough the postcode resolved to.
    pub borough: String,
    /// 1-indexed position, 1 being the most offences.
    pub rank: usize,
    /// Number of boroughs in the ranking.
    pub total_boroughs: usize,
    /// Offences recorded in [`Self::borough`] over the window.
    pub borough_count: u64,
    /// `Overall` or the offence group name.
    pub offence_group: String,
    /// `"{first} to {last}"` over the window.
    pub period: String,
    /// Full ranking, most offences first.
    pub all_boroughs: Vec<RankedBorough>,
}

/// Reasons a ranking could not be produced for the given input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RankingMiss {
    /// No postcode was supplied.
    MissingPostcode,
    /// The postcode did not resolve to a London borough.
    PostcodeNotRecognised {
        /// The postcode as supplied.
        postcode: String,
    },
    /// The borough has no records for the category in the window.
    NoData {
        borough: String,
        category: CategorySelection,
    },
}

impl RankingMiss {
    /// Human-readable explanation.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::MissingPostcode => "Please provide a postcode.".to_string(),
            Self::PostcodeNotRecognised { .. } => "That postcode was not recognised as a London \
                 postcode. Please enter a valid London postcode (e.g. E1 6AN)."
                .to_string(),
            Self::NoData { borough, category } => format!(
                "No crime data found for {borough} in the category \"{}\".",
                category.label()
            ),
        }
    }

    /// Whether the miss stems from malformed input rather than absent data.
    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::MissingPostcode | Self::PostcodeNotRecognised { .. }
        )
    }
}

impl std::fmt::Display for RankingMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Result of a borough ranking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RankingOutcome {
    Ranked(RankingResult),
    Miss(RankingMiss),
}
