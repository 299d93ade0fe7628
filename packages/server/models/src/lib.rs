#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the London crime server.
//!
//! Query parameter names are the ones the dashboard frontend already
//! sends, so they stay `snake_case` on the wire. Analytics results are
//! served directly from `london_crime_analytics_models`.

use serde::{Deserialize, Serialize};

/// Filter parameters shared by the summary, totals, time-series and
/// breakdown endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrimeQueryParams {
    /// Inclusive lower period bound.
    pub start_date: Option<String>,
    /// Inclusive upper period bound.
    pub end_date: Option<String>,
    /// Exact area name.
    pub borough: Option<String>,
    /// Single offence group. Takes precedence over `offence_groups`.
    pub offence_group: Option<String>,
    /// Comma-separated offence groups.
    pub offence_groups: Option<String>,
    pub offence_subgroup: Option<String>,
    pub area_type: Option<String>,
}

/// Query parameters for the borough ranking endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingQueryParams {
    /// Free-text UK postcode.
    pub postcode: Option<String>,
    /// Offence group, or `OVERALL`.
    pub offence_group: Option<String>,
}

/// Query parameters for the boroughs endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoroughsQueryParams {
    pub area_type: Option<String>,
}

/// Query parameters for the offence subgroups endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubgroupsQueryParams {
    pub offence_group: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crime_params_accept_partial_input() {
        let params: CrimeQueryParams =
            serde_json::from_str(r#"{"borough":"Camden","offence_groups":"Theft,Robbery"}"#)
                .unwrap();
        assert_eq!(params.borough.as_deref(), Some("Camden"));
        assert_eq!(params.offence_groups.as_deref(), Some("Theft,Robbery"));
        assert!(params.start_date.is_none());
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_value(ApiError::new("Please provide a postcode.")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "Please provide a postcode." })
        );
    }
}
