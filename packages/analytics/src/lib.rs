#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Risk map core.
//!
//! [`view::resolve`] slices the loaded tables for a [`ViewRequest`],
//! [`score`] turns the slice into one metric per region, and
//! [`render::build`] assembles the map description. [`dashboard::Dashboard`]
//! ties the three together and adds the coarser-scope retry and selector
//! options. Every function here is pure; nothing is cached or persisted.

pub mod dashboard;
pub mod render;
pub mod score;
pub mod tables;
pub mod view;

use risk_map_analytics_models::{ViewMode, ViewRequest};
use thiserror::Error;

/// Errors that can occur while rendering a view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The mode needs a year and none was given.
    #[error("{mode} view requires a year")]
    MissingYear {
        /// Requested mode.
        mode: ViewMode,
    },

    /// The mode needs a date and none was given.
    #[error("{mode} view requires a date")]
    MissingDate {
        /// Requested mode.
        mode: ViewMode,
    },

    /// Prediction view was requested without a year or a date.
    #[error("PREDICTION view requires a year or a date")]
    MissingSelection,

    /// A historical year beyond the last year with indicator data.
    #[error("year {year} is after the last historical year {cutoff}")]
    YearOutOfRange {
        /// Requested year.
        year: i32,
        /// Last historical year.
        cutoff: i32,
    },

    /// Nothing to show even after retrying at the coarser scope.
    #[error("no data for {year}")]
    NoDataForPeriod {
        /// Year that was tried.
        year: i32,
    },
}

impl ViewError {
    /// Checks that `request` carries the selections its mode needs.
    ///
    /// # Errors
    ///
    /// Returns the first missing selection.
    pub const fn check(request: &ViewRequest) -> Result<(), Self> {
        match request.mode {
            ViewMode::All => Ok(()),
            ViewMode::ByYear => match request.year {
                Some(_) => Ok(()),
                None => Err(Self::MissingYear { mode: request.mode }),
            },
            ViewMode::ByDay => match request.date {
                Some(_) => Ok(()),
                None => Err(Self::MissingDate { mode: request.mode }),
            },
            ViewMode::Prediction => match (request.year, request.date) {
                (None, None) => Err(Self::MissingSelection),
                _ => Ok(()),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use risk_map_dataset_models::{
        Datasets, DatedTable, IncidentRecord, IndicatorRecord, PredictionRecord,
    };
    use risk_map_geography_models::Region;

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn incident(date: NaiveDate, latitude: f64, longitude: f64) -> IncidentRecord {
        IncidentRecord {
            occurred_at: date,
            latitude,
            longitude,
        }
    }

    /// An indicator row with Seoul climate/social values and a shared
    /// financial value.
    pub fn indicator(
        date: NaiveDate,
        climate: Option<f64>,
        social: Option<f64>,
        financial: Option<f64>,
    ) -> IndicatorRecord {
        let mut row = IndicatorRecord::new(date);
        if let Some(v) = climate {
            row.climate_stress.insert(Region::Seoul, v);
        }
        if let Some(v) = social {
            row.social_stress.insert(Region::Seoul, v);
        }
        row.financial_stress = financial;
        row
    }

    pub fn prediction(date: NaiveDate, region: Region, p: f64) -> PredictionRecord {
        PredictionRecord {
            predicted_at: date,
            region: region.name().to_string(),
            crime_probability: p,
        }
    }

    /// Small fixture: incidents in 2020 and 2021, indicators in 2020 and
    /// 2021, predictions in 2024.
    pub fn datasets() -> Datasets {
        Datasets {
            incidents: DatedTable::new(vec![
                incident(day(2020, 3, 1), 37.0, 127.0),
                incident(day(2020, 3, 1), 37.2, 127.2),
                incident(day(2020, 7, 9), 35.0, 129.0),
                incident(day(2021, 1, 2), 33.5, 126.5),
            ]),
            indicators: DatedTable::new(vec![
                indicator(day(2020, 3, 1), Some(14.0), Some(0.8), Some(2.5)),
                indicator(day(2020, 7, 9), Some(10.0), Some(0.1), Some(1.0)),
                indicator(day(2021, 1, 2), Some(20.0), None, Some(3.0)),
            ]),
            predictions: DatedTable::new(vec![
                prediction(day(2024, 1, 1), Region::Seoul, 0.2),
                prediction(day(2024, 6, 1), Region::Seoul, 0.4),
                prediction(day(2024, 9, 1), Region::Seoul, 0.9),
                prediction(day(2024, 1, 1), Region::Busan, 0.75),
            ]),
        }
    }
}
