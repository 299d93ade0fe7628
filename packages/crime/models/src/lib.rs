#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offence and area vocabulary for the London crime dataset.
//!
//! The Metropolitan Police dashboard extract labels every row with an area
//! type, an area name, an offence group and an offence subgroup. This crate
//! holds the handful of well-known values the rest of the workspace treats
//! specially (the "all categories" sentinel, the non-geographic catch-all
//! areas, the borough area type) together with the offence-name
//! normalization applied at import time.

use serde::{Deserialize, Serialize};

/// Area type label for London boroughs.
pub const BOROUGH_AREA_TYPE: &str = "Borough";

/// Sentinel offence group meaning "no category filter".
pub const OVERALL_CATEGORY: &str = "OVERALL";

/// Display label used for the [`OVERALL_CATEGORY`] sentinel.
pub const OVERALL_LABEL: &str = "Overall";

/// Area names that do not correspond to a real geography.
///
/// Rows attributed to these areas are excluded from borough rankings.
pub const NON_GEOGRAPHIC_AREAS: &[&str] = &["Other / NK", "Unknown"];

/// Offence groups hidden from the offence-group picker.
pub const HIDDEN_OFFENCE_GROUPS: &[&str] = &["Nfib Fraud"];

/// The offence category a ranking is computed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategorySelection {
    /// Aggregate across every offence group.
    Overall,
    /// Restrict to a single offence group.
    Group(String),
}

impl CategorySelection {
    /// Interprets a raw request value.
    ///
    /// Missing, blank and [`OVERALL_CATEGORY`] values all select
    /// [`CategorySelection::Overall`]. Anything else is taken as an exact
    /// offence group name (surrounding whitespace removed).
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("" | OVERALL_CATEGORY) => Self::Overall,
            Some(group) => Self::Group(group.to_string()),
        }
    }

    /// Returns the offence group to filter on, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::Overall => None,
            Self::Group(group) => Some(group),
        }
    }

    /// Human-readable label for responses and messages.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Overall => OVERALL_LABEL,
            Self::Group(group) => group,
        }
    }
}

impl std::fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalizes an offence group or subgroup name to title case.
///
/// The source spreadsheet mixes `"THEFT"` and `"Theft"` across refreshes.
/// Every alphabetic character that follows a non-alphabetic one (or starts
/// the string) is uppercased and every other letter lowercased, so
/// `"VIOLENCE AGAINST THE PERSON"` becomes `"Violence Against The Person"`.
#[must_use]
pub fn title_case_offence(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;

    for c in name.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}
