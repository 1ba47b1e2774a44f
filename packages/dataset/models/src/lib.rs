#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed incident, indicator and prediction records.
//!
//! Records are produced once by the loader and never mutated afterwards.
//! Each table keeps a sorted list of the distinct dates it contains, which
//! bounds the date selector and backs the "no data for period" check.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use risk_map_geography_models::Region;
use serde::{Deserialize, Serialize};

/// A record that belongs to a single calendar day.
pub trait Dated {
    /// The normalized (time-of-day stripped) date of the record.
    fn date(&self) -> NaiveDate;
}

/// A single geolocated incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Day the incident occurred.
    pub occurred_at: NaiveDate,
    /// Latitude in decimal degrees. Always finite.
    pub latitude: f64,
    /// Longitude in decimal degrees. Always finite.
    pub longitude: f64,
}

impl IncidentRecord {
    /// Human-readable coordinate label used in marker popups.
    #[must_use]
    pub fn location_label(&self) -> String {
        format!("lat: {}, lon: {}", self.latitude, self.longitude)
    }
}

impl Dated for IncidentRecord {
    fn date(&self) -> NaiveDate {
        self.occurred_at
    }
}

/// One row of stress indicators.
///
/// Climate and social stress are per region; a region missing from the
/// map had an empty cell (or no column) in the source row. Financial
/// stress is a single shared value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorRecord {
    /// Observation day.
    pub observed_at: NaiveDate,
    /// Climate stress by region.
    pub climate_stress: BTreeMap<Region, f64>,
    /// Social stress by region.
    pub social_stress: BTreeMap<Region, f64>,
    /// Financial stress shared by all regions.
    pub financial_stress: Option<f64>,
}

impl IndicatorRecord {
    /// Creates an empty row for the given day.
    #[must_use]
    pub const fn new(observed_at: NaiveDate) -> Self {
        Self {
            observed_at,
            climate_stress: BTreeMap::new(),
            social_stress: BTreeMap::new(),
            financial_stress: None,
        }
    }

    /// Climate stress for `region`, if present.
    #[must_use]
    pub fn climate(&self, region: Region) -> Option<f64> {
        self.climate_stress.get(&region).copied()
    }

    /// Social stress for `region`, if present.
    #[must_use]
    pub fn social(&self, region: Region) -> Option<f64> {
        self.social_stress.get(&region).copied()
    }
}

impl Dated for IndicatorRecord {
    fn date(&self) -> NaiveDate {
        self.observed_at
    }
}

/// A model-provided crime probability for one region on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    /// Day the prediction applies to.
    pub predicted_at: NaiveDate,
    /// Region label as written in the prediction table.
    pub region: String,
    /// Probability in `[0, 1]`.
    pub crime_probability: f64,
}

impl PredictionRecord {
    /// Whether this row belongs to `region` (canonical name comparison).
    #[must_use]
    pub fn is_for(&self, region: Region) -> bool {
        self.region.trim() == region.name()
    }
}

impl Dated for PredictionRecord {
    fn date(&self) -> NaiveDate {
        self.predicted_at
    }
}

/// An immutable table of dated records plus its sorted distinct dates.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedTable<T> {
    records: Vec<T>,
    dates: Vec<NaiveDate>,
}

impl<T> Default for DatedTable<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            dates: Vec::new(),
        }
    }
}

impl<T: Dated> FromIterator<T> for DatedTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T: Dated> DatedTable<T> {
    /// Builds a table, keeping records in their original order.
    #[must_use]
    pub fn new(records: Vec<T>) -> Self {
        let dates: BTreeSet<NaiveDate> = records.iter().map(Dated::date).collect();
        Self {
            records,
            dates: dates.into_iter().collect(),
        }
    }

    /// All records in table order.
    #[must_use]
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct dates.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Sorted distinct years.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.dates.iter().map(Datelike::year).collect();
        years.dedup();
        years
    }

    /// Sorted distinct dates falling in `year`.
    #[must_use]
    pub fn dates_in_year(&self, year: i32) -> &[NaiveDate] {
        let start = self.dates.partition_point(|d| d.year() < year);
        let end = self.dates.partition_point(|d| d.year() <= year);
        &self.dates[start..end]
    }

    /// Whether any record falls on `date`.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    /// Records whose date falls in `year`, in table order.
    #[must_use]
    pub fn in_year(&self, year: i32) -> Vec<&T> {
        self.records
            .iter()
            .filter(|r| r.date().year() == year)
            .collect()
    }

    /// Records falling on `date`, in table order.
    #[must_use]
    pub fn on_date(&self, date: NaiveDate) -> Vec<&T> {
        self.records.iter().filter(|r| r.date() == date).collect()
    }

    /// Every record, in table order.
    #[must_use]
    pub fn all(&self) -> Vec<&T> {
        self.records.iter().collect()
    }
}

/// The three loaded tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    /// Geolocated incidents.
    pub incidents: DatedTable<IncidentRecord>,
    /// Stress indicators (already limited to the historical cutoff year).
    pub indicators: DatedTable<IndicatorRecord>,
    /// Per-region crime probabilities.
    pub predictions: DatedTable<PredictionRecord>,
}
