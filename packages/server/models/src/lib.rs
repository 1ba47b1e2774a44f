#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the risk map server.
//!
//! Render descriptors and tables are serialized straight from the
//! analytics models; the types here cover the query strings and the
//! small selector responses around them.

use chrono::NaiveDate;
use risk_map_analytics_models::DateSource;
use risk_map_geography_models::{Region, RegionEntry};
use serde::{Deserialize, Serialize};

/// Response of the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` when the server answers.
    pub healthy: bool,
    /// Server crate version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

/// A catalog region as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRegion {
    /// Region identifier.
    pub id: Region,
    /// Canonical name used by the data tables.
    pub name: String,
    /// Label used by the boundary collection.
    pub boundary_label: String,
}

impl From<&RegionEntry> for ApiRegion {
    fn from(entry: &RegionEntry) -> Self {
        Self {
            id: entry.region,
            name: entry.name.to_string(),
            boundary_label: entry.boundary_label.to_string(),
        }
    }
}

/// Query parameters for the render and table endpoints.
///
/// Values arrive as strings and are validated by the server so a bad
/// value produces a readable 400 rather than an extractor error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQueryParams {
    /// View mode (`ALL`, `BY_YEAR`, `BY_DAY`, `PREDICTION`). Defaults to
    /// `ALL`.
    pub view: Option<String>,
    /// Selected year.
    pub year: Option<String>,
    /// Selected day as `YYYY-MM-DD`.
    pub date: Option<String>,
}

/// Query parameters for the years endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearsQueryParams {
    /// `incidents` or `predictions`. Defaults to `incidents`.
    pub source: Option<String>,
}

/// Query parameters for the dates endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatesQueryParams {
    /// `incidents` or `predictions`. Defaults to `incidents`.
    pub source: Option<String>,
    /// Year to list; defaults to the latest year of `source`.
    pub year: Option<String>,
}

/// Year selector options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiYears {
    /// Table the years come from.
    pub source: DateSource,
    /// Available years, ascending.
    pub years: Vec<i32>,
    /// Preselected year: the latest one.
    pub default_year: Option<i32>,
}

/// Date selector options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDates {
    /// Table the dates come from.
    pub source: DateSource,
    /// Year the dates belong to, if any year is available.
    pub year: Option<i32>,
    /// Dates with data, ascending.
    pub dates: Vec<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_serializes_camel_case() {
        let region = ApiRegion::from(Region::Jeju.entry());
        let json = serde_json::to_value(&region).unwrap();

        assert_eq!(json["id"], "JEJU");
        assert_eq!(json["boundaryLabel"], "Jeju");
        assert_eq!(json["name"], Region::Jeju.name());
    }

    #[test]
    fn dates_serialize_as_iso_days() {
        let dates = ApiDates {
            source: DateSource::Predictions,
            year: Some(2024),
            dates: vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()],
        };
        let json = serde_json::to_value(&dates).unwrap();

        assert_eq!(json["source"], "predictions");
        assert_eq!(json["dates"][0], "2024-01-01");
    }
}
