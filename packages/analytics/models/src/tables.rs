//! Per-region tables shown under the map.

use serde::{Deserialize, Serialize};

/// Placeholder for a region without a prediction.
pub const NO_DATA: &str = "no data";

/// Score breakdown for one region.
///
/// Period components are the share of records exceeding each threshold,
/// so they are fractional; day components are 0 or 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScoreRow {
    /// Canonical region name.
    pub region: String,
    /// Climate component.
    pub climate: f64,
    /// Social component.
    pub social: f64,
    /// Financial component.
    pub financial: f64,
    /// Sum of the components, capped at 3.
    pub total: f64,
}

impl RiskScoreRow {
    /// A row of zeros.
    #[must_use]
    pub fn empty(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            climate: 0.0,
            social: 0.0,
            financial: 0.0,
            total: 0.0,
        }
    }
}

/// Crime probability for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRow {
    /// Canonical region name.
    pub region: String,
    /// Probability, if any row matched.
    pub probability: Option<f64>,
    /// Probability to three decimals, or [`NO_DATA`].
    pub display: String,
}

impl PredictionRow {
    /// Builds a row, formatting the probability for display.
    #[must_use]
    pub fn new(region: impl Into<String>, probability: Option<f64>) -> Self {
        let display = probability.map_or_else(|| NO_DATA.to_string(), |p| format!("{p:.3}"));
        Self {
            region: region.into(),
            probability,
            display,
        }
    }
}

/// The table shown under the map: score breakdown for historical modes,
/// probabilities for prediction mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "camelCase")]
pub enum RegionTable {
    /// Historical score breakdown.
    RiskScores(Vec<RiskScoreRow>),
    /// Predicted probabilities.
    Predictions(Vec<PredictionRow>),
}

impl RegionTable {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::RiskScores(rows) => rows.len(),
            Self::Predictions(rows) => rows.len(),
        }
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
