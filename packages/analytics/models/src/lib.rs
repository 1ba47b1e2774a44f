#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View requests, risk metrics and render descriptor types.
//!
//! Everything here is plain data. The analytics crate produces these
//! values; the server and CLI serialize them as camelCase JSON.

pub mod render;
pub mod tables;

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which slice of the data the map shows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ViewMode {
    /// Every historical record.
    All,
    /// One historical year.
    ByYear,
    /// One historical day.
    ByDay,
    /// Model-provided probabilities for a year or a day.
    Prediction,
}

impl ViewMode {
    /// Whether this mode shows probabilities instead of risk scores.
    #[must_use]
    pub const fn is_prediction(self) -> bool {
        matches!(self, Self::Prediction)
    }
}

/// Which table's dates back a year or date selector.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DateSource {
    /// Incident dates (historical selectors).
    Incidents,
    /// Prediction dates.
    Predictions,
}

/// Time span a metric is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Granularity {
    /// A multi-day period (all data or a year); records are averaged.
    Period,
    /// A single day; the first record is used.
    Day,
}

/// The user's selection: a mode plus an optional year and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    /// View mode.
    pub mode: ViewMode,
    /// Selected year.
    pub year: Option<i32>,
    /// Selected day.
    pub date: Option<NaiveDate>,
}

impl ViewRequest {
    /// Every historical record.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            mode: ViewMode::All,
            year: None,
            date: None,
        }
    }

    /// One historical year.
    #[must_use]
    pub const fn by_year(year: i32) -> Self {
        Self {
            mode: ViewMode::ByYear,
            year: Some(year),
            date: None,
        }
    }

    /// One historical day.
    #[must_use]
    pub fn by_day(date: NaiveDate) -> Self {
        Self {
            mode: ViewMode::ByDay,
            year: Some(date.year()),
            date: Some(date),
        }
    }

    /// Yearly mean prediction.
    #[must_use]
    pub const fn prediction_year(year: i32) -> Self {
        Self {
            mode: ViewMode::Prediction,
            year: Some(year),
            date: None,
        }
    }

    /// Single-day prediction.
    #[must_use]
    pub fn prediction_day(date: NaiveDate) -> Self {
        Self {
            mode: ViewMode::Prediction,
            year: Some(date.year()),
            date: Some(date),
        }
    }

    /// Granularity the scorer should use for this request.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        match (self.mode, self.date) {
            (ViewMode::ByDay, _) | (ViewMode::Prediction, Some(_)) => Granularity::Day,
            _ => Granularity::Period,
        }
    }

    /// The selected year, falling back to the year of the selected date.
    #[must_use]
    pub fn effective_year(&self) -> Option<i32> {
        self.year.or_else(|| self.date.map(|d| d.year()))
    }
}

/// Named map colors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MapColor {
    /// Safe / few markers.
    Green,
    /// Watch.
    Lime,
    /// Caution.
    Yellow,
    /// Alert / moderate markers.
    Orange,
    /// Danger / many markers.
    Red,
    /// No data.
    Gray,
    /// Polygon outlines.
    Black,
}

/// Severity tier of a region, least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskTier {
    /// Lowest tier.
    Safe,
    /// Only reachable from a probability.
    Watch,
    /// Middle tier.
    Caution,
    /// High tier.
    Alert,
    /// Highest tier.
    Danger,
}

impl RiskTier {
    /// Tier for a crime probability.
    #[must_use]
    pub fn from_probability(p: f64) -> Self {
        if p < 0.3 {
            Self::Safe
        } else if p < 0.5 {
            Self::Watch
        } else if p < 0.7 {
            Self::Caution
        } else if p < 0.85 {
            Self::Alert
        } else {
            Self::Danger
        }
    }

    /// Tier for a historical risk score. The score ladder has no
    /// [`Self::Watch`] step.
    #[must_use]
    pub const fn from_score(score: RiskScore) -> Self {
        match score.value() {
            0 => Self::Safe,
            1 => Self::Caution,
            2 => Self::Alert,
            _ => Self::Danger,
        }
    }

    /// Fill color of the tier.
    #[must_use]
    pub const fn color(self) -> MapColor {
        match self {
            Self::Safe => MapColor::Green,
            Self::Watch => MapColor::Lime,
            Self::Caution => MapColor::Yellow,
            Self::Alert => MapColor::Orange,
            Self::Danger => MapColor::Red,
        }
    }
}

/// Fill color for a region without data.
pub const NEUTRAL_COLOR: MapColor = MapColor::Gray;

/// Number of stress thresholds a region exceeded, `0..=3`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Largest possible score.
    pub const MAX: u8 = 3;

    /// Creates a score, capping at [`Self::MAX`].
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(if value > Self::MAX { Self::MAX } else { value })
    }

    /// The score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Severity tier.
    #[must_use]
    pub const fn tier(self) -> RiskTier {
        RiskTier::from_score(self)
    }
}

/// A crime probability in `[0, 1]`, or unknown when no prediction row
/// matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskProbability(Option<f64>);

impl RiskProbability {
    /// No prediction available.
    pub const UNKNOWN: Self = Self(None);

    /// A known probability, clamped into `[0, 1]`. Non-finite input is
    /// unknown.
    #[must_use]
    pub fn new(p: f64) -> Self {
        if p.is_finite() {
            Self(Some(p.clamp(0.0, 1.0)))
        } else {
            Self(None)
        }
    }

    /// The probability, if known.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        self.0
    }

    /// Severity tier, if known.
    #[must_use]
    pub fn tier(self) -> Option<RiskTier> {
        self.0.map(RiskTier::from_probability)
    }
}

/// The metric shown for one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum RegionMetric {
    /// Historical risk score.
    Score(RiskScore),
    /// Predicted crime probability.
    Probability(RiskProbability),
}

impl RegionMetric {
    /// Default metric for a region no data matched.
    #[must_use]
    pub const fn empty(mode: ViewMode) -> Self {
        if mode.is_prediction() {
            Self::Probability(RiskProbability::UNKNOWN)
        } else {
            Self::Score(RiskScore::new(0))
        }
    }

    /// Severity tier, if known.
    #[must_use]
    pub fn tier(self) -> Option<RiskTier> {
        match self {
            Self::Score(score) => Some(score.tier()),
            Self::Probability(p) => p.tier(),
        }
    }

    /// Choropleth fill color.
    #[must_use]
    pub fn fill_color(self) -> MapColor {
        self.tier().map_or(NEUTRAL_COLOR, RiskTier::color)
    }

    /// Tooltip line describing the value, e.g. `risk score: 2`.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::Score(score) => format!("risk score: {}", score.value()),
            Self::Probability(p) => match p.value() {
                Some(v) => format!("crime probability: {v:.3}"),
                None => "crime probability: none".to_string(),
            },
        }
    }
}

/// Incident density bucket, which picks the marker color.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum MarkerDensity {
    /// Fewer than 100 incidents.
    Few,
    /// Fewer than 500 incidents.
    Moderate,
    /// 500 or more incidents.
    Many,
}

impl MarkerDensity {
    /// Bucket for a total incident count.
    #[must_use]
    pub const fn for_count(count: usize) -> Self {
        if count < 100 {
            Self::Few
        } else if count < 500 {
            Self::Moderate
        } else {
            Self::Many
        }
    }

    /// Marker color.
    #[must_use]
    pub const fn color(self) -> MapColor {
        match self {
            Self::Few => MapColor::Green,
            Self::Moderate => MapColor::Orange,
            Self::Many => MapColor::Red,
        }
    }
}
