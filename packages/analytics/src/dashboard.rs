//! Caller-side orchestration: selector options, the coarser-scope retry,
//! and one-call rendering.

use chrono::{Datelike as _, NaiveDate};
use risk_map_analytics_models::render::RenderDescriptor;
use risk_map_analytics_models::tables::RegionTable;
use risk_map_analytics_models::{DateSource, ViewMode, ViewRequest};
use risk_map_dataset_models::Datasets;
use risk_map_geography_models::{BoundaryFeature, RegionCatalog};
use serde::{Deserialize, Serialize};

use crate::view::{Resolution, ViewSlice, resolve};
use crate::{ViewError, render, score, tables};

/// A request that was answered at a coarser scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fallback {
    /// What was asked for.
    pub requested: ViewRequest,
    /// Notice to show the user, e.g. `no data for 2019`.
    pub notice: String,
}

/// A rendered map plus how the request was answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rendered {
    /// The map.
    pub descriptor: RenderDescriptor,
    /// The request that produced the map.
    pub applied: ViewRequest,
    /// Present when the original request had no data.
    pub fallback: Option<Fallback>,
}

/// A per-region table plus how the request was answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTable {
    /// The table.
    pub table: RegionTable,
    /// The request that produced the table.
    pub applied: ViewRequest,
    /// Present when the original request had no data.
    pub fallback: Option<Fallback>,
}

/// The coarser request to retry with when `request` has no data.
const fn coarser(request: &ViewRequest, year: i32) -> Option<ViewRequest> {
    match request.mode {
        ViewMode::ByDay => Some(ViewRequest::by_year(year)),
        ViewMode::Prediction if request.date.is_some() => Some(ViewRequest::prediction_year(year)),
        _ => None,
    }
}

/// Read-only view over the loaded tables.
#[derive(Debug, Clone, Copy)]
pub struct Dashboard<'a> {
    datasets: &'a Datasets,
    catalog: RegionCatalog,
    cutoff_year: i32,
}

impl<'a> Dashboard<'a> {
    /// Creates a dashboard over `datasets`. Historical selectors stop at
    /// `cutoff_year`.
    #[must_use]
    pub const fn new(datasets: &'a Datasets, catalog: RegionCatalog, cutoff_year: i32) -> Self {
        Self {
            datasets,
            catalog,
            cutoff_year,
        }
    }

    /// The region catalog.
    #[must_use]
    pub const fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    /// Last historical year.
    #[must_use]
    pub const fn cutoff_year(&self) -> i32 {
        self.cutoff_year
    }

    /// Incident years up to the cutoff, ascending.
    #[must_use]
    pub fn historical_years(&self) -> Vec<i32> {
        self.datasets
            .incidents
            .years()
            .into_iter()
            .filter(|y| *y <= self.cutoff_year)
            .collect()
    }

    /// Prediction years, ascending.
    #[must_use]
    pub fn prediction_years(&self) -> Vec<i32> {
        self.datasets.predictions.years()
    }

    /// Year options for `source`.
    #[must_use]
    pub fn years(&self, source: DateSource) -> Vec<i32> {
        match source {
            DateSource::Incidents => self.historical_years(),
            DateSource::Predictions => self.prediction_years(),
        }
    }

    /// Default year for `source`: the latest available.
    #[must_use]
    pub fn default_year(&self, source: DateSource) -> Option<i32> {
        self.years(source).last().copied()
    }

    /// Date options for `source` in `year`, ascending.
    #[must_use]
    pub fn dates_in_year(&self, source: DateSource, year: i32) -> &'a [NaiveDate] {
        match source {
            DateSource::Incidents => self.datasets.incidents.dates_in_year(year),
            DateSource::Predictions => self.datasets.predictions.dates_in_year(year),
        }
    }

    /// Fills in the default year for a `BY_YEAR` request without a year
    /// or a `PREDICTION` request without a year or date. Other requests
    /// are returned unchanged.
    #[must_use]
    pub fn with_default_year(&self, mut request: ViewRequest) -> ViewRequest {
        if request.year.is_some() || request.date.is_some() {
            return request;
        }
        request.year = match request.mode {
            ViewMode::ByYear => self.default_year(DateSource::Incidents),
            ViewMode::Prediction => self.default_year(DateSource::Predictions),
            ViewMode::All | ViewMode::ByDay => None,
        };
        request
    }

    fn check_year(&self, request: &ViewRequest) -> Result<(), ViewError> {
        if request.mode.is_prediction() {
            return Ok(());
        }
        match request.effective_year() {
            Some(year) if year > self.cutoff_year => Err(ViewError::YearOutOfRange {
                year,
                cutoff: self.cutoff_year,
            }),
            _ => Ok(()),
        }
    }

    /// Resolves `request`, retrying once at the coarser scope when the
    /// selected day has no data.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the request is incomplete or out of range,
    /// or if the coarser scope has no data either.
    pub fn resolve(
        &self,
        request: &ViewRequest,
    ) -> Result<(ViewRequest, ViewSlice<'a>, Option<Fallback>), ViewError> {
        self.check_year(request)?;

        match resolve(request, self.datasets)? {
            Resolution::Resolved(slice) => Ok((*request, slice, None)),
            Resolution::NoDataForPeriod { year } => {
                let retry = coarser(request, year).ok_or(ViewError::NoDataForPeriod { year })?;
                let notice = format!("no data for {year}");
                log::info!("{} {notice}; showing {} instead", request.mode, retry.mode);

                match resolve(&retry, self.datasets)? {
                    Resolution::Resolved(slice) => Ok((
                        retry,
                        slice,
                        Some(Fallback {
                            requested: *request,
                            notice,
                        }),
                    )),
                    Resolution::NoDataForPeriod { year } => {
                        Err(ViewError::NoDataForPeriod { year })
                    }
                }
            }
        }
    }

    /// Renders the map for `request` against `features`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the request cannot be resolved.
    pub fn render(
        &self,
        request: &ViewRequest,
        features: &[BoundaryFeature],
    ) -> Result<Rendered, ViewError> {
        let (applied, slice, fallback) = self.resolve(request)?;
        let metrics = score::region_metrics(&slice.scoring, &self.catalog, slice.granularity);

        let mut descriptor = render::build(
            applied.mode,
            &slice.title,
            &slice.incidents,
            &metrics,
            &self.catalog,
            features,
        );

        if applied.mode == ViewMode::All {
            let count = self
                .datasets
                .incidents
                .records()
                .iter()
                .filter(|r| r.occurred_at.year() <= self.cutoff_year)
                .count();
            descriptor.summary = render::summary(applied.mode, count);
        }

        Ok(Rendered {
            descriptor,
            applied,
            fallback,
        })
    }

    /// The per-region table for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the request cannot be resolved.
    pub fn region_table(&self, request: &ViewRequest) -> Result<RenderedTable, ViewError> {
        let (applied, slice, fallback) = self.resolve(request)?;
        Ok(RenderedTable {
            table: tables::region_table(&slice.scoring, &self.catalog, slice.granularity),
            applied,
            fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use risk_map_analytics_models::render::Viewport;
    use risk_map_analytics_models::{Granularity, MapColor};
    use risk_map_dataset_models::{DatedTable, IncidentRecord};

    use super::*;
    use crate::test_support::{datasets, day, incident};

    fn features() -> Vec<BoundaryFeature> {
        ["Seoul", "Busan", "Jeju"]
            .into_iter()
            .map(BoundaryFeature::new)
            .collect()
    }

    #[test]
    fn selector_options_follow_data() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2020);

        assert_eq!(dashboard.historical_years(), vec![2020]);
        assert_eq!(dashboard.prediction_years(), vec![2024]);
        assert_eq!(dashboard.default_year(DateSource::Predictions), Some(2024));
        assert_eq!(
            dashboard.dates_in_year(DateSource::Incidents, 2020),
            &[day(2020, 3, 1), day(2020, 7, 9)]
        );
        assert_eq!(dashboard.dates_in_year(DateSource::Predictions, 2024).len(), 3);
    }

    #[test]
    fn absent_day_falls_back_to_year() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2023);

        let rendered = dashboard
            .render(&ViewRequest::by_day(day(2020, 3, 2)), &features())
            .unwrap();

        assert_eq!(rendered.applied, ViewRequest::by_year(2020));
        assert_eq!(rendered.descriptor.title, "2020 map");
        let fallback = rendered.fallback.unwrap();
        assert_eq!(fallback.notice, "no data for 2020");
        assert_eq!(fallback.requested.mode, ViewMode::ByDay);
    }

    #[test]
    fn absent_prediction_day_falls_back_to_year() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2023);

        let rendered = dashboard
            .render(&ViewRequest::prediction_day(day(2024, 12, 25)), &features())
            .unwrap();

        assert_eq!(rendered.applied, ViewRequest::prediction_year(2024));
        assert_eq!(rendered.descriptor.title, "2024 prediction map");
        assert!(rendered.fallback.is_some());
    }

    #[test]
    fn yearly_prediction_colors_by_mean_probability() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2023);

        let rendered = dashboard
            .render(&ViewRequest::prediction_year(2024), &features())
            .unwrap();
        let choropleth = &rendered.descriptor.choropleth;

        // Seoul: mean(0.2, 0.4, 0.9) = 0.5
        assert_eq!(choropleth[0].fill_color, MapColor::Yellow);
        assert_eq!(choropleth[1].fill_color, MapColor::Orange);
        assert_eq!(choropleth[2].fill_color, MapColor::Gray);
        assert!(!rendered.descriptor.marker_layer.visible);
        assert_eq!(rendered.descriptor.summary.incident_count, None);
    }

    #[test]
    fn single_day_with_all_thresholds_is_danger() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2023);

        let rendered = dashboard
            .render(&ViewRequest::by_day(day(2020, 3, 1)), &features())
            .unwrap();

        assert!(rendered.fallback.is_none());
        assert_eq!(rendered.descriptor.choropleth[0].fill_color, MapColor::Red);
        assert_eq!(rendered.descriptor.marker_layer.points.len(), 2);
        assert_eq!(rendered.descriptor.summary.incident_count, Some(2));
    }

    #[test]
    fn full_data_summary_counts_up_to_cutoff() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2020);

        let rendered = dashboard.render(&ViewRequest::all(), &features()).unwrap();

        assert_eq!(rendered.descriptor.marker_layer.point_count, 4);
        assert_eq!(rendered.descriptor.summary.incident_count, Some(3));
        assert_eq!(rendered.descriptor.viewport.zoom, Viewport::FOCUSED_ZOOM);
    }

    #[test]
    fn historical_year_after_cutoff_is_rejected() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2020);

        let err = dashboard
            .render(&ViewRequest::by_year(2021), &features())
            .unwrap_err();
        assert_eq!(
            err,
            ViewError::YearOutOfRange {
                year: 2021,
                cutoff: 2020
            }
        );
    }

    #[test]
    fn over_one_thousand_incidents_are_truncated() {
        let data = Datasets {
            incidents: DatedTable::new(
                (0..1200)
                    .map(|_| incident(day(2022, 5, 5), 37.5, 127.0))
                    .collect::<Vec<IncidentRecord>>(),
            ),
            ..Datasets::default()
        };
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2023);

        let rendered = dashboard
            .render(&ViewRequest::by_year(2022), &features())
            .unwrap();
        let layer = &rendered.descriptor.marker_layer;

        assert_eq!(layer.points.len(), 1000);
        assert_eq!(layer.overflow_count, 200);
        assert_eq!(layer.color, Some(MapColor::Red));
        assert_eq!(
            rendered.descriptor.choropleth[0].fill_color,
            MapColor::Green
        );
    }

    #[test]
    fn region_table_uses_applied_request() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2023);

        let rendered = dashboard
            .region_table(&ViewRequest::by_day(day(2021, 1, 2)))
            .unwrap();
        assert!(rendered.fallback.is_none());
        assert_eq!(rendered.applied.granularity(), Granularity::Day);
        match rendered.table {
            RegionTable::RiskScores(rows) => {
                // 2021-01-02: climate 20, social missing, financial 3.0
                assert!((rows[0].total - 2.0).abs() < f64::EPSILON);
            }
            RegionTable::Predictions(_) => panic!("expected score table"),
        }
    }

    #[test]
    fn default_year_is_the_latest_available() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2020);
        let bare = |mode| ViewRequest {
            mode,
            year: None,
            date: None,
        };

        assert_eq!(
            dashboard.with_default_year(bare(ViewMode::ByYear)),
            ViewRequest::by_year(2020)
        );
        assert_eq!(
            dashboard.with_default_year(bare(ViewMode::Prediction)),
            ViewRequest::prediction_year(2024)
        );
        assert_eq!(dashboard.with_default_year(bare(ViewMode::ByDay)).year, None);

        let explicit = ViewRequest::prediction_day(day(2024, 1, 1));
        assert_eq!(dashboard.with_default_year(explicit), explicit);
    }

    #[test]
    fn incomplete_request_is_an_error() {
        let data = datasets();
        let dashboard = Dashboard::new(&data, RegionCatalog::standard(), 2023);
        let request = ViewRequest {
            mode: ViewMode::Prediction,
            year: None,
            date: None,
        };
        assert_eq!(
            dashboard.render(&request, &features()).unwrap_err(),
            ViewError::MissingSelection
        );
    }
}
