#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the risk map dashboard.
//!
//! Every subcommand except `serve` loads the configured tables, answers
//! one request and prints the result as JSON on stdout. Logs go to
//! stderr, controlled by `RUST_LOG`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use risk_map_analytics::dashboard::Dashboard;
use risk_map_analytics_models::{DateSource, ViewMode, ViewRequest};
use risk_map_config::DashboardConfig;
use risk_map_dataset::{DatasetPaths, LoadOptions, LoadedDatasets, load_datasets};
use risk_map_geography::BoundarySource;
use risk_map_geography::fetch::fetch_boundaries;
use risk_map_geography_models::RegionCatalog;
use risk_map_server_models::{ApiDates, ApiRegion, ApiYears};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "risk_map", about = "Regional crime-risk map dashboard")]
struct Cli {
    /// Configuration file (defaults to the embedded configuration)
    #[arg(long, global = true, env = "RISK_MAP_CONFIG")]
    config: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

/// View selection shared by `render` and `tables`.
#[derive(clap::Args, Debug, Clone)]
struct ViewArgs {
    /// View mode: ALL, BY_YEAR, BY_DAY or PREDICTION
    #[arg(long, default_value = "ALL")]
    view: ViewMode,
    /// Selected year. `BY_YEAR` and `PREDICTION` default to the latest
    /// available year.
    #[arg(long)]
    year: Option<i32>,
    /// Selected day (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl ViewArgs {
    fn request(&self) -> ViewRequest {
        if self.view == ViewMode::All {
            return ViewRequest::all();
        }
        ViewRequest {
            mode: self.view,
            year: self
                .year
                .or_else(|| self.date.map(|d| chrono::Datelike::year(&d))),
            date: self.date,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the map render descriptor for a view
    Render {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the per-region table for a view (risk scores for historical
    /// views, probabilities for prediction)
    Tables {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List the years available in a table
    Years {
        /// incidents or predictions
        #[arg(long, default_value = "incidents")]
        source: DateSource,
    },
    /// List the dates available in a table for a year
    Dates {
        /// incidents or predictions
        #[arg(long, default_value = "incidents")]
        source: DateSource,
        /// Year to list (defaults to the latest)
        #[arg(long)]
        year: Option<i32>,
    },
    /// List the region catalog
    Regions,
    /// Start the HTTP API server
    Serve,
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), serde_json::Error> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}

fn load(config: &DashboardConfig) -> Result<LoadedDatasets, Box<dyn std::error::Error>> {
    let options = LoadOptions::from_config(config)?;
    Ok(load_datasets(&DatasetPaths::from_config(config), &options)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = DashboardConfig::load(cli.config.as_deref())?;
    let catalog = RegionCatalog::standard();
    let cutoff = config.data.historical_cutoff_year;

    match cli.command {
        Commands::Serve => {
            // The server runs on actix's own runtime, kept off this one.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(risk_map_server::run_server(config))
            })
            .await??;
        }
        Commands::Regions => {
            let regions: Vec<ApiRegion> = catalog
                .regions()
                .map(|region| ApiRegion::from(region.entry()))
                .collect();
            print_json(&regions, cli.compact)?;
        }
        Commands::Years { source } => {
            let loaded = load(&config)?;
            let dashboard = Dashboard::new(&loaded.datasets, catalog, cutoff);
            print_json(
                &ApiYears {
                    source,
                    years: dashboard.years(source),
                    default_year: dashboard.default_year(source),
                },
                cli.compact,
            )?;
        }
        Commands::Dates { source, year } => {
            let loaded = load(&config)?;
            let dashboard = Dashboard::new(&loaded.datasets, catalog, cutoff);
            let year = year.or_else(|| dashboard.default_year(source));
            print_json(
                &ApiDates {
                    source,
                    year,
                    dates: year
                        .map_or_else(Vec::new, |y| dashboard.dates_in_year(source, y).to_vec()),
                },
                cli.compact,
            )?;
        }
        Commands::Tables { view } => {
            let loaded = load(&config)?;
            let dashboard = Dashboard::new(&loaded.datasets, catalog, cutoff);
            let request = dashboard.with_default_year(view.request());
            print_json(&dashboard.region_table(&request)?, cli.compact)?;
        }
        Commands::Render { view } => {
            let loaded = load(&config)?;
            let dashboard = Dashboard::new(&loaded.datasets, catalog, cutoff);
            let request = dashboard.with_default_year(view.request());

            let source = BoundarySource::from_config(&config.boundary);
            let boundaries = fetch_boundaries(
                &source,
                &config.boundary.label_property,
                config.boundary.timeout(),
            )
            .await?;

            let rendered = dashboard.render(&request, boundaries.features())?;
            if let Some(fallback) = &rendered.fallback {
                log::warn!("{}", fallback.notice);
            }
            print_json(&rendered, cli.compact)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn view_mode_parses_case_insensitively() {
        let cli = Cli::try_parse_from([
            "risk_map",
            "render",
            "--view",
            "by_day",
            "--date",
            "2021-05-01",
        ])
        .unwrap();
        let Commands::Render { view } = cli.command else {
            panic!("expected render");
        };
        let request = view.request();

        assert_eq!(request.mode, ViewMode::ByDay);
        assert_eq!(request.year, Some(2021));
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2021, 5, 1));
    }

    #[test]
    fn all_view_ignores_selection() {
        let cli = Cli::try_parse_from(["risk_map", "tables", "--year", "2020"]).unwrap();
        let Commands::Tables { view } = cli.command else {
            panic!("expected tables");
        };
        assert_eq!(view.request(), ViewRequest::all());
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Cli::try_parse_from(["risk_map", "years", "--source", "weather"]).is_err());
    }
}
