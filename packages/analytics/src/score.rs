//! Risk scoring.
//!
//! A historical risk score counts how many of three stress thresholds a
//! region exceeds. Over a single day the first record is used directly;
//! over a period the per-threshold hit rates are summed and rounded. A
//! missing value never exceeds a threshold.

use std::collections::BTreeMap;

use risk_map_analytics_models::{Granularity, RegionMetric, RiskProbability, RiskScore};
use risk_map_dataset_models::{IndicatorRecord, PredictionRecord};
use risk_map_geography_models::{Region, RegionCatalog};

use crate::view::ScoringSubset;

/// Climate stress must exceed this.
pub const CLIMATE_THRESHOLD: f64 = 13.0;
/// Social stress must reach this.
pub const SOCIAL_THRESHOLD: f64 = 0.7;
/// Financial stress must reach this.
pub const FINANCIAL_THRESHOLD: f64 = 2.0;

/// Which thresholds one record exceeds for one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Criteria {
    /// Climate stress above [`CLIMATE_THRESHOLD`].
    pub climate: bool,
    /// Social stress at or above [`SOCIAL_THRESHOLD`].
    pub social: bool,
    /// Financial stress at or above [`FINANCIAL_THRESHOLD`].
    pub financial: bool,
}

impl Criteria {
    /// Evaluates `record` for `region`.
    #[must_use]
    pub fn evaluate(record: &IndicatorRecord, region: Region) -> Self {
        Self {
            climate: record.climate(region).is_some_and(|v| v > CLIMATE_THRESHOLD),
            social: record.social(region).is_some_and(|v| v >= SOCIAL_THRESHOLD),
            financial: record
                .financial_stress
                .is_some_and(|v| v >= FINANCIAL_THRESHOLD),
        }
    }

    /// Number of thresholds exceeded.
    #[must_use]
    pub const fn count(self) -> u8 {
        self.climate as u8 + self.social as u8 + self.financial as u8
    }

    /// The three hits as `0.0`/`1.0` in climate, social, financial order.
    #[must_use]
    pub fn as_components(self) -> [f64; 3] {
        [
            f64::from(u8::from(self.climate)),
            f64::from(u8::from(self.social)),
            f64::from(u8::from(self.financial)),
        ]
    }
}

/// Share of `subset` exceeding each threshold, in climate, social,
/// financial order. All zeros for an empty subset.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hit_rates(subset: &[&IndicatorRecord], region: Region) -> [f64; 3] {
    if subset.is_empty() {
        return [0.0; 3];
    }

    let mut hits = [0_usize; 3];
    for record in subset {
        let criteria = Criteria::evaluate(record, region);
        hits[0] += usize::from(criteria.climate);
        hits[1] += usize::from(criteria.social);
        hits[2] += usize::from(criteria.financial);
    }

    let n = subset.len() as f64;
    hits.map(|h| h as f64 / n)
}

/// Risk score of `region` over `subset`.
///
/// [`Granularity::Day`] scores the first record. [`Granularity::Period`]
/// sums the hit rates and rounds half to even. An empty subset scores 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score(subset: &[&IndicatorRecord], region: Region, granularity: Granularity) -> RiskScore {
    match granularity {
        Granularity::Day => subset.first().map_or_else(RiskScore::default, |record| {
            RiskScore::new(Criteria::evaluate(record, region).count())
        }),
        Granularity::Period => {
            let total: f64 = hit_rates(subset, region).iter().sum();
            RiskScore::new(total.round_ties_even().clamp(0.0, f64::from(RiskScore::MAX)) as u8)
        }
    }
}

/// Crime probability of `region` over `subset`.
///
/// [`Granularity::Day`] takes the first matching row; duplicate rows for
/// the same region and day are assumed not to occur.
/// [`Granularity::Period`] averages every matching row. Unknown when no
/// row matches.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn probability(
    subset: &[&PredictionRecord],
    region: Region,
    granularity: Granularity,
) -> RiskProbability {
    let mut matching = subset.iter().filter(|r| r.is_for(region));

    match granularity {
        Granularity::Day => matching
            .next()
            .map_or(RiskProbability::UNKNOWN, |r| {
                RiskProbability::new(r.crime_probability)
            }),
        Granularity::Period => {
            let (sum, count) = matching.fold((0.0, 0_usize), |(sum, count), r| {
                (sum + r.crime_probability, count + 1)
            });
            if count == 0 {
                RiskProbability::UNKNOWN
            } else {
                RiskProbability::new(sum / count as f64)
            }
        }
    }
}

/// Risk score for every catalog region.
#[must_use]
pub fn score_regions(
    subset: &[&IndicatorRecord],
    catalog: &RegionCatalog,
    granularity: Granularity,
) -> BTreeMap<Region, RiskScore> {
    catalog
        .regions()
        .map(|region| (region, score(subset, region, granularity)))
        .collect()
}

/// Crime probability for every catalog region.
#[must_use]
pub fn probability_regions(
    subset: &[&PredictionRecord],
    catalog: &RegionCatalog,
    granularity: Granularity,
) -> BTreeMap<Region, RiskProbability> {
    catalog
        .regions()
        .map(|region| (region, probability(subset, region, granularity)))
        .collect()
}

/// The choropleth metric for every catalog region.
#[must_use]
pub fn region_metrics(
    scoring: &ScoringSubset<'_>,
    catalog: &RegionCatalog,
    granularity: Granularity,
) -> BTreeMap<Region, RegionMetric> {
    match scoring {
        ScoringSubset::Indicators(rows) => score_regions(rows, catalog, granularity)
            .into_iter()
            .map(|(region, s)| (region, RegionMetric::Score(s)))
            .collect(),
        ScoringSubset::Predictions(rows) => probability_regions(rows, catalog, granularity)
            .into_iter()
            .map(|(region, p)| (region, RegionMetric::Probability(p)))
            .collect(),
    }
}
