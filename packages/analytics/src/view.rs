//! View resolution: which records a request covers, and the map title.

use chrono::NaiveDate;
use risk_map_analytics_models::{Granularity, ViewMode, ViewRequest};
use risk_map_dataset_models::{Datasets, IncidentRecord, IndicatorRecord, PredictionRecord};

use crate::ViewError;

/// Records the choropleth is computed from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringSubset<'a> {
    /// Indicator rows (historical modes).
    Indicators(Vec<&'a IndicatorRecord>),
    /// Prediction rows (prediction mode).
    Predictions(Vec<&'a PredictionRecord>),
}

impl ScoringSubset<'_> {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Indicators(rows) => rows.len(),
            Self::Predictions(rows) => rows.len(),
        }
    }

    /// Whether the subset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The records a request covers.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSlice<'a> {
    /// Incidents to draw as markers, in table order. Always empty in
    /// prediction mode.
    pub incidents: Vec<&'a IncidentRecord>,
    /// Records feeding the choropleth.
    pub scoring: ScoringSubset<'a>,
    /// How the scorer treats `scoring`.
    pub granularity: Granularity,
    /// Map title.
    pub title: String,
}

/// Result of resolving a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    /// The request maps onto data.
    Resolved(ViewSlice<'a>),
    /// The selected day is not in the date index for `year`. The caller
    /// should retry at the coarser scope for the same year.
    NoDataForPeriod {
        /// Year of the selection.
        year: i32,
    },
}

fn day_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Title for a request.
///
/// # Errors
///
/// Returns [`ViewError`] if the request lacks the selection its mode
/// needs.
pub fn title(request: &ViewRequest) -> Result<String, ViewError> {
    ViewError::check(request)?;
    Ok(match (request.mode, request.year, request.date) {
        (ViewMode::All, _, _) => "full-data map".to_string(),
        (ViewMode::ByYear, Some(year), _) => format!("{year} map"),
        (ViewMode::ByDay, _, Some(date)) => format!("{} map", day_label(date)),
        (ViewMode::Prediction, _, Some(date)) => format!("{} prediction map", day_label(date)),
        (ViewMode::Prediction, Some(year), None) => format!("{year} prediction map"),
        (mode, _, _) => return Err(ViewError::MissingYear { mode }),
    })
}

/// Slices `datasets` for `request`.
///
/// `BY_DAY` and dated `PREDICTION` requests report
/// [`Resolution::NoDataForPeriod`] when the selected day is not among the
/// dates of its year (incident dates and prediction dates respectively).
/// Other empty selections resolve to empty subsets.
///
/// # Errors
///
/// Returns [`ViewError`] if the request lacks the selection its mode
/// needs.
pub fn resolve<'a>(
    request: &ViewRequest,
    datasets: &'a Datasets,
) -> Result<Resolution<'a>, ViewError> {
    let title = title(request)?;
    let granularity = request.granularity();

    let slice = match (request.mode, request.year, request.date) {
        (ViewMode::All, _, _) => ViewSlice {
            incidents: datasets.incidents.all(),
            scoring: ScoringSubset::Indicators(datasets.indicators.all()),
            granularity,
            title,
        },
        (ViewMode::ByYear, Some(year), _) => ViewSlice {
            incidents: datasets.incidents.in_year(year),
            scoring: ScoringSubset::Indicators(datasets.indicators.in_year(year)),
            granularity,
            title,
        },
        (ViewMode::ByDay, year, Some(date)) => {
            let year = year.unwrap_or_else(|| chrono::Datelike::year(&date));
            if !has_day(datasets.incidents.dates_in_year(year), date) {
                log::debug!("No incidents on {date} in {year}");
                return Ok(Resolution::NoDataForPeriod { year });
            }
            ViewSlice {
                incidents: datasets.incidents.on_date(date),
                scoring: ScoringSubset::Indicators(datasets.indicators.on_date(date)),
                granularity,
                title,
            }
        }
        (ViewMode::Prediction, year, Some(date)) => {
            let year = year.unwrap_or_else(|| chrono::Datelike::year(&date));
            if !has_day(datasets.predictions.dates_in_year(year), date) {
                log::debug!("No predictions on {date} in {year}");
                return Ok(Resolution::NoDataForPeriod { year });
            }
            ViewSlice {
                incidents: Vec::new(),
                scoring: ScoringSubset::Predictions(datasets.predictions.on_date(date)),
                granularity,
                title,
            }
        }
        (ViewMode::Prediction, Some(year), None) => ViewSlice {
            incidents: Vec::new(),
            scoring: ScoringSubset::Predictions(datasets.predictions.in_year(year)),
            granularity,
            title,
        },
        (mode, _, _) => return Err(ViewError::MissingYear { mode }),
    };

    Ok(Resolution::Resolved(slice))
}

fn has_day(dates: &[NaiveDate], date: NaiveDate) -> bool {
    dates.binary_search(&date).is_ok()
}
