//! Per-region tables shown under the map.

use risk_map_analytics_models::Granularity;
use risk_map_analytics_models::tables::{PredictionRow, RegionTable, RiskScoreRow};
use risk_map_dataset_models::{IndicatorRecord, PredictionRecord};
use risk_map_geography_models::RegionCatalog;

use crate::score::{Criteria, hit_rates, probability};
use crate::view::ScoringSubset;

/// Rounds to two decimals, half to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Score breakdown for every catalog region.
///
/// Over a period each component is the share of records exceeding its
/// threshold and the total is their sum capped at 3, both to two
/// decimals. Over a day the components of the first record are used.
#[must_use]
pub fn risk_score_table(
    subset: &[&IndicatorRecord],
    catalog: &RegionCatalog,
    granularity: Granularity,
) -> Vec<RiskScoreRow> {
    catalog
        .regions()
        .map(|region| {
            let components = match (granularity, subset.first()) {
                (_, None) => return RiskScoreRow::empty(region.name()),
                (Granularity::Day, Some(first)) => {
                    Criteria::evaluate(first, region).as_components()
                }
                (Granularity::Period, Some(_)) => hit_rates(subset, region),
            };
            let [climate, social, financial] = components;
            RiskScoreRow {
                region: region.name().to_string(),
                climate: round2(climate),
                social: round2(social),
                financial: round2(financial),
                total: round2((climate + social + financial).min(3.0)),
            }
        })
        .collect()
}

/// Probability for every catalog region, formatted for display.
#[must_use]
pub fn prediction_table(
    subset: &[&PredictionRecord],
    catalog: &RegionCatalog,
    granularity: Granularity,
) -> Vec<PredictionRow> {
    catalog
        .regions()
        .map(|region| {
            PredictionRow::new(
                region.name(),
                probability(subset, region, granularity).value(),
            )
        })
        .collect()
}

/// The table matching the kind of `scoring` subset.
#[must_use]
pub fn region_table(
    scoring: &ScoringSubset<'_>,
    catalog: &RegionCatalog,
    granularity: Granularity,
) -> RegionTable {
    match scoring {
        ScoringSubset::Indicators(rows) => {
            RegionTable::RiskScores(risk_score_table(rows, catalog, granularity))
        }
        ScoringSubset::Predictions(rows) => {
            RegionTable::Predictions(prediction_table(rows, catalog, granularity))
        }
    }
}
