#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the risk map dashboard.
//!
//! Serves render descriptors, region tables and selector options as JSON.
//! The three data tables and the boundary collection are loaded once and
//! memoized; every request recomputes its descriptor from those shared
//! read-only values.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, ResponseError, middleware, web};
use risk_map_analytics::ViewError;
use risk_map_config::{ConfigError, DashboardConfig};
use risk_map_dataset::cache::DatasetCache;
use risk_map_dataset::{DatasetError, DatasetPaths, LoadOptions, LoadedDatasets};
use risk_map_geography::fetch::BoundaryCache;
use risk_map_geography::{BoundaryCollection, BoundarySource, GeoError};
use risk_map_geography_models::RegionCatalog;
use risk_map_server_models::ApiError;
use thiserror::Error;

/// Errors surfaced by the API.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A data table could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The boundary collection could not be fetched or parsed.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// The request cannot be answered.
    #[error(transparent)]
    View(#[from] ViewError),

    /// A query parameter is malformed.
    #[error("Bad request: {message}")]
    BadRequest {
        /// What was wrong with the request.
        message: String,
    },

    /// A blocking load was cancelled.
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] BlockingError),

    /// Binding or running the HTTP server failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::View(ViewError::NoDataForPeriod { .. }) => StatusCode::NOT_FOUND,
            Self::View(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Dataset(_) | Self::Geo(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Blocking(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        } else {
            log::debug!("Rejected request: {self}");
        }
        HttpResponse::build(status).json(ApiError {
            error: self.to_string(),
        })
    }
}

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Loaded configuration.
    pub config: DashboardConfig,
    /// Region catalog used for every render.
    pub catalog: RegionCatalog,
    paths: DatasetPaths,
    datasets: DatasetCache,
    boundary_source: BoundarySource,
    boundaries: BoundaryCache,
}

impl AppState {
    /// Builds state from `config` without touching the data yet.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Dataset`] if the configured delimiter is
    /// unusable.
    pub fn from_config(config: DashboardConfig) -> Result<Self, ServerError> {
        let options = LoadOptions::from_config(&config)?;
        Ok(Self {
            catalog: RegionCatalog::standard(),
            paths: DatasetPaths::from_config(&config),
            datasets: DatasetCache::new(options),
            boundary_source: BoundarySource::from_config(&config.boundary),
            boundaries: BoundaryCache::new(config.boundary.timeout()),
            config,
        })
    }

    /// Last historical year.
    #[must_use]
    pub const fn cutoff_year(&self) -> i32 {
        self.config.data.historical_cutoff_year
    }

    /// The three tables, loaded on first use and reloaded when a file's
    /// content changes. Blocks on file I/O.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Dataset`] if a table cannot be loaded.
    pub fn datasets(&self) -> Result<Arc<LoadedDatasets>, ServerError> {
        Ok(self.datasets.load(&self.paths)?)
    }

    /// The boundary collection, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Geo`] if the fetch or parse fails.
    pub async fn boundaries(&self) -> Result<Arc<BoundaryCollection>, ServerError> {
        Ok(self
            .boundaries
            .get(&self.boundary_source, &self.config.boundary.label_property)
            .await?)
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/regions", web::get().to(handlers::regions))
            .route("/years", web::get().to(handlers::years))
            .route("/dates", web::get().to(handlers::dates))
            .route("/render", web::get().to(handlers::render))
            .route("/tables/risk", web::get().to(handlers::risk_table))
            .route("/tables/prediction", web::get().to(handlers::prediction_table))
            .route("/boundaries", web::get().to(handlers::boundaries)),
    );
}

/// Starts the server with `config`.
///
/// Binds to `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default
/// `8080`). The data tables are loaded before binding so a missing file
/// stops startup; a boundary fetch failure is only logged and retried on
/// the next request that needs it.
///
/// # Errors
///
/// Returns [`ServerError`] if the data cannot be loaded or the server
/// fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: DashboardConfig) -> Result<(), ServerError> {
    let state = web::Data::new(AppState::from_config(config)?);

    log::info!("Loading datasets...");
    let warm = state.clone();
    let loaded = web::block(move || warm.datasets()).await??;
    log::info!(
        "Loaded {} incidents, {} indicator rows, {} predictions",
        loaded.datasets.incidents.len(),
        loaded.datasets.indicators.len(),
        loaded.datasets.predictions.len(),
    );

    match state.boundaries().await {
        Ok(collection) => log::info!("Loaded {} boundary features", collection.len()),
        Err(e) => log::warn!("Boundary collection unavailable: {e}"),
    }

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
