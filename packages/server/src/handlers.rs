//! HTTP request handlers for the API endpoints.

use std::str::FromStr as _;
use std::sync::Arc;

use actix_web::{HttpResponse, web};
use chrono::{Datelike as _, NaiveDate};
use risk_map_analytics::dashboard::Dashboard;
use risk_map_analytics_models::{DateSource, ViewMode, ViewRequest};
use risk_map_dataset::LoadedDatasets;
use risk_map_server_models::{
    ApiDates, ApiHealth, ApiRegion, ApiYears, DatesQueryParams, ViewQueryParams,
    YearsQueryParams,
};

use crate::{AppState, ServerError};

type HandlerResult = Result<HttpResponse, ServerError>;

/// Health check endpoint.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Returns the region catalog in canonical order.
pub async fn regions(state: web::Data<AppState>) -> HttpResponse {
    let regions: Vec<ApiRegion> = state
        .catalog
        .regions()
        .map(|region| ApiRegion::from(region.entry()))
        .collect();
    HttpResponse::Ok().json(regions)
}

/// Returns the year selector options for a table.
pub async fn years(
    state: web::Data<AppState>,
    params: web::Query<YearsQueryParams>,
) -> HandlerResult {
    let source = parse_source(params.source.as_deref())?;
    let loaded = load_datasets(&state).await?;
    let dashboard = dashboard(&state, &loaded);

    Ok(HttpResponse::Ok().json(ApiYears {
        source,
        years: dashboard.years(source),
        default_year: dashboard.default_year(source),
    }))
}

/// Returns the date selector options for a table and year.
pub async fn dates(
    state: web::Data<AppState>,
    params: web::Query<DatesQueryParams>,
) -> HandlerResult {
    let source = parse_source(params.source.as_deref())?;
    let year = parse_year(params.year.as_deref())?;
    let loaded = load_datasets(&state).await?;
    let dashboard = dashboard(&state, &loaded);

    let year = year.or_else(|| dashboard.default_year(source));
    let dates = year.map_or_else(Vec::new, |y| dashboard.dates_in_year(source, y).to_vec());

    Ok(HttpResponse::Ok().json(ApiDates {
        source,
        year,
        dates,
    }))
}

/// Renders the map descriptor for a view.
///
/// Fails with 503 when the boundary collection cannot be fetched; no
/// partial map is returned.
pub async fn render(
    state: web::Data<AppState>,
    params: web::Query<ViewQueryParams>,
) -> HandlerResult {
    let request = view_request(&params, ViewMode::All)?;
    let loaded = load_datasets(&state).await?;
    let boundaries = state.boundaries().await?;

    let rendered = dashboard(&state, &loaded).render(&request, boundaries.features())?;
    Ok(HttpResponse::Ok().json(rendered))
}

/// Returns the risk score table for a historical view.
pub async fn risk_table(
    state: web::Data<AppState>,
    params: web::Query<ViewQueryParams>,
) -> HandlerResult {
    let request = view_request(&params, ViewMode::All)?;
    if request.mode.is_prediction() {
        return Err(ServerError::bad_request(
            "risk score table is only available for historical views",
        ));
    }
    let loaded = load_datasets(&state).await?;

    let table = dashboard(&state, &loaded).region_table(&request)?;
    Ok(HttpResponse::Ok().json(table))
}

/// Returns the prediction table for a year or a day.
///
/// Without a year or date the latest prediction year is used.
pub async fn prediction_table(
    state: web::Data<AppState>,
    params: web::Query<ViewQueryParams>,
) -> HandlerResult {
    let request = view_request(&params, ViewMode::Prediction)?;
    if !request.mode.is_prediction() {
        return Err(ServerError::bad_request(format!(
            "prediction table is not available for {} views",
            request.mode
        )));
    }
    let loaded = load_datasets(&state).await?;
    let dashboard = dashboard(&state, &loaded);

    let table = dashboard.region_table(&dashboard.with_default_year(request))?;
    Ok(HttpResponse::Ok().json(table))
}

/// Returns the boundary collection with a `canonicalName` property added
/// to every feature.
pub async fn boundaries(state: web::Data<AppState>) -> HandlerResult {
    let collection = state.boundaries().await?;
    Ok(HttpResponse::Ok().json(collection.annotated(&state.catalog)))
}

async fn load_datasets(state: &web::Data<AppState>) -> Result<Arc<LoadedDatasets>, ServerError> {
    let state = state.clone();
    web::block(move || state.datasets()).await?
}

fn dashboard<'a>(state: &AppState, loaded: &'a LoadedDatasets) -> Dashboard<'a> {
    Dashboard::new(&loaded.datasets, state.catalog, state.cutoff_year())
}

/// Trims a query value, treating blank as absent.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_source(value: Option<&str>) -> Result<DateSource, ServerError> {
    non_blank(value).map_or(Ok(DateSource::Incidents), |v| {
        DateSource::from_str(v).map_err(|_| {
            ServerError::bad_request(format!(
                "unknown source '{v}', expected incidents or predictions"
            ))
        })
    })
}

fn parse_year(value: Option<&str>) -> Result<Option<i32>, ServerError> {
    non_blank(value)
        .map(|v| {
            v.parse::<i32>()
                .map_err(|_| ServerError::bad_request(format!("invalid year '{v}'")))
        })
        .transpose()
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, ServerError> {
    non_blank(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| {
                ServerError::bad_request(format!("invalid date '{v}', expected YYYY-MM-DD"))
            })
        })
        .transpose()
}

/// Builds a view request from query parameters.
///
/// A date without a year selects the date's year. `ALL` ignores both.
fn view_request(
    params: &ViewQueryParams,
    default_mode: ViewMode,
) -> Result<ViewRequest, ServerError> {
    let mode = non_blank(params.view.as_deref()).map_or(Ok(default_mode), |v| {
        ViewMode::from_str(v)
            .map_err(|_| ServerError::bad_request(format!("unknown view mode '{v}'")))
    })?;

    if mode == ViewMode::All {
        return Ok(ViewRequest::all());
    }

    let date = parse_date(params.date.as_deref())?;
    let year = parse_year(params.year.as_deref())?.or_else(|| date.map(|d| d.year()));

    Ok(ViewRequest { mode, year, date })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use actix_web::http::StatusCode;
    use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
    use actix_web::{App, web};
    use risk_map_config::DashboardConfig;

    use super::*;
    use crate::configure;

    const INCIDENTS: &str = "날짜,위도,경도\n\
        2021-05-01,37.55,126.98\n\
        2021-05-01,37.56,126.99\n\
        2022-01-15,35.10,129.04\n\
        not-a-date,37.0,127.0\n";

    const INDICATORS: &str = "date,기후스트레스:서울특별시,사회스트레스:서울특별시,금융스트레스\n\
        2021-05-01,14,0.8,2.5\n\
        2022-01-15,1,0.1,0.5\n";

    const PREDICTIONS: &str = "date,도단위,crime_probability\n\
        2024-01-01,서울특별시,0.2\n\
        2024-06-01,서울특별시,0.4\n\
        2024-09-01,서울특별시,0.9\n\
        2024-01-01,부산광역시,0.75\n";

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "NAME_1": "Seoul" },
                "geometry": { "type": "Point", "coordinates": [126.98, 37.55] }
            },
            {
                "type": "Feature",
                "properties": { "NAME_1": "Busan" },
                "geometry": { "type": "Point", "coordinates": [129.04, 35.10] }
            }
        ]
    }"#;

    /// Writes UTF-8 fixtures to a fresh temp directory and returns a
    /// config pointing at them.
    fn fixture_config(name: &str) -> DashboardConfig {
        let dir = std::env::temp_dir().join(format!("risk_map_server_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let write = |file: &str, text: &str| -> PathBuf {
            let path = dir.join(file);
            std::fs::write(&path, text).unwrap();
            path
        };

        let mut config = DashboardConfig::default();
        config.data.incidents = write("incidents.csv", INCIDENTS);
        config.data.indicators = write("indicators.csv", INDICATORS);
        config.data.predictions = write("predictions.csv", PREDICTIONS);
        config.data.encoding = "utf-8".to_string();
        config.data.historical_cutoff_year = 2022;
        config.boundary.file = Some(write("provinces.geojson", BOUNDARIES));
        config
    }

    fn state(name: &str) -> web::Data<AppState> {
        web::Data::new(AppState::from_config(fixture_config(name)).unwrap())
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = init_service(App::new().configure(configure)).await;
        let resp = call_service(&app, TestRequest::get().uri("/api/health").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn regions_lists_catalog() {
        let app = init_service(App::new().app_data(state("regions")).configure(configure)).await;
        let resp = call_service(&app, TestRequest::get().uri("/api/regions").to_request()).await;

        let body: Vec<ApiRegion> = read_body_json(resp).await;
        assert_eq!(body.len(), 17);
        assert_eq!(body[0].boundary_label, "Seoul");
    }

    #[actix_web::test]
    async fn years_and_dates_follow_data() {
        let app = init_service(App::new().app_data(state("years")).configure(configure)).await;

        let resp = call_service(&app, TestRequest::get().uri("/api/years").to_request()).await;
        let years: ApiYears = read_body_json(resp).await;
        assert_eq!(years.years, vec![2021, 2022]);
        assert_eq!(years.default_year, Some(2022));

        let resp = call_service(
            &app,
            TestRequest::get()
                .uri("/api/dates?source=predictions")
                .to_request(),
        )
        .await;
        let dates: ApiDates = read_body_json(resp).await;
        assert_eq!(dates.year, Some(2024));
        assert_eq!(dates.dates.len(), 3);
    }

    #[actix_web::test]
    async fn unknown_source_is_bad_request() {
        let app = init_service(App::new().app_data(state("source")).configure(configure)).await;
        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/years?source=weather").to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("weather"));
    }

    #[actix_web::test]
    async fn render_by_day_returns_descriptor() {
        let app = init_service(App::new().app_data(state("render")).configure(configure)).await;
        let resp = call_service(
            &app,
            TestRequest::get()
                .uri("/api/render?view=by_day&date=2021-05-01")
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["descriptor"]["title"], "2021-05-01 map");
        assert_eq!(body["descriptor"]["markerLayer"]["pointCount"], 2);
        assert_eq!(body["descriptor"]["choropleth"][0]["fillColor"], "red");
        assert!(body["fallback"].is_null());
    }

    #[actix_web::test]
    async fn render_absent_day_reports_fallback() {
        let app = init_service(App::new().app_data(state("fallback")).configure(configure)).await;
        let resp = call_service(
            &app,
            TestRequest::get()
                .uri("/api/render?view=BY_DAY&date=2021-05-02")
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["descriptor"]["title"], "2021 map");
        assert_eq!(body["fallback"]["notice"], "no data for 2021");
    }

    #[actix_web::test]
    async fn render_missing_year_is_bad_request() {
        let app = init_service(App::new().app_data(state("missing")).configure(configure)).await;
        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/render?view=BY_YEAR").to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn render_without_boundaries_fails_closed() {
        let mut config = fixture_config("no_boundaries");
        config.boundary.file = Some(std::env::temp_dir().join("risk_map_server_absent.geojson"));
        let state = web::Data::new(AppState::from_config(config).unwrap());
        let app = init_service(App::new().app_data(state).configure(configure)).await;

        let resp = call_service(&app, TestRequest::get().uri("/api/render").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn risk_table_rejects_prediction_view() {
        let app = init_service(App::new().app_data(state("risk")).configure(configure)).await;

        let resp = call_service(
            &app,
            TestRequest::get()
                .uri("/api/tables/risk?view=PREDICTION&year=2024")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = call_service(
            &app,
            TestRequest::get()
                .uri("/api/tables/risk?view=BY_YEAR&year=2021")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["table"]["kind"], "riskScores");
        assert_eq!(body["table"]["rows"][0]["total"], 3.0);
    }

    #[actix_web::test]
    async fn prediction_table_defaults_to_latest_year() {
        let app = init_service(App::new().app_data(state("prediction")).configure(configure)).await;
        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/tables/prediction").to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["applied"]["year"], 2024);
        let rows = body["table"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 17);
        assert_eq!(rows[0]["display"], "0.500");
        let busan = rows
            .iter()
            .find(|r| r["region"] == "부산광역시")
            .unwrap();
        assert_eq!(busan["display"], "0.750");
    }

    #[actix_web::test]
    async fn boundaries_carry_canonical_names() {
        let app = init_service(App::new().app_data(state("boundaries")).configure(configure)).await;
        let resp = call_service(&app, TestRequest::get().uri("/api/boundaries").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(
            body["features"][0]["properties"]["canonicalName"],
            "서울특별시"
        );
    }

    #[test]
    fn date_query_implies_year() {
        let params = ViewQueryParams {
            view: Some("prediction".to_string()),
            year: None,
            date: Some("2024-06-01".to_string()),
        };
        let request = view_request(&params, ViewMode::All).unwrap();
        assert_eq!(request.year, Some(2024));
        assert_eq!(request.mode, ViewMode::Prediction);
    }

    #[test]
    fn malformed_date_is_rejected() {
        let params = ViewQueryParams {
            view: Some("BY_DAY".to_string()),
            year: None,
            date: Some("2024/06/01".to_string()),
        };
        assert!(matches!(
            view_request(&params, ViewMode::All),
            Err(ServerError::BadRequest { .. })
        ));
    }
}
