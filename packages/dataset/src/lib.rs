#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loader for the incident, indicator and prediction tables.
//!
//! Each table is read from disk, decoded from its configured legacy
//! encoding, and parsed into a dated table. Rows that fail to parse are
//! dropped and counted; a missing required column fails the whole load.
//! [`cache::DatasetCache`] memoizes loads by path and content hash.

pub mod cache;
pub mod decode;
pub mod parsing;
pub mod tables;

use std::fmt;
use std::path::{Path, PathBuf};

use risk_map_config::{ColumnConfig, ConfigError, DashboardConfig};
use risk_map_dataset_models::Datasets;
use thiserror::Error;

/// Errors that can occur while loading the tables.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A table file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configured encoding label is not recognized.
    #[error("Unknown text encoding '{label}'")]
    UnknownEncoding {
        /// Label as configured.
        label: String,
    },

    /// The CSV reader failed on the header row.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header.
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn {
        /// Table that was being parsed.
        table: TableKind,
        /// Column name that was looked up.
        column: String,
    },

    /// The configuration could not be turned into load options.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Identifies one of the three tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    /// Geolocated incidents.
    Incidents,
    /// Stress indicators.
    Indicators,
    /// Crime probabilities.
    Predictions,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Incidents => "incident",
            Self::Indicators => "indicator",
            Self::Predictions => "prediction",
        })
    }
}

/// Row counts for one parsed table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Data rows seen (header excluded).
    pub rows_read: usize,
    /// Rows kept.
    pub rows_kept: usize,
    /// Rows dropped because a cell failed to parse.
    pub rows_dropped: usize,
    /// Rows excluded on purpose (indicator rows after the cutoff year).
    pub rows_excluded: usize,
}

/// Parsing options shared by the three tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Encoding label, resolved through [`decode::resolve_encoding`].
    pub encoding: String,
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Column names.
    pub columns: ColumnConfig,
    /// Last indicator year kept.
    pub cutoff_year: i32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: "windows-949".to_string(),
            delimiter: b',',
            columns: ColumnConfig::default(),
            cutoff_year: 2023,
        }
    }
}

impl LoadOptions {
    /// Builds options from the dashboard configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Config`] if the delimiter is not a single
    /// ASCII byte.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, DatasetError> {
        Ok(Self {
            encoding: config.data.encoding.clone(),
            delimiter: config.data.delimiter_byte()?,
            columns: config.columns.clone(),
            cutoff_year: config.data.historical_cutoff_year,
        })
    }
}

/// Locations of the three tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatasetPaths {
    /// Incident table.
    pub incidents: PathBuf,
    /// Indicator table.
    pub indicators: PathBuf,
    /// Prediction table.
    pub predictions: PathBuf,
}

impl DatasetPaths {
    /// Paths named by the dashboard configuration.
    #[must_use]
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            incidents: config.data.incidents.clone(),
            indicators: config.data.indicators.clone(),
            predictions: config.data.predictions.clone(),
        }
    }
}

/// Per-table row counts of one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Incident table counts.
    pub incidents: TableStats,
    /// Indicator table counts.
    pub indicators: TableStats,
    /// Prediction table counts.
    pub predictions: TableStats,
}

/// The three tables plus the counts produced while loading them.
#[derive(Debug, Clone, Default)]
pub struct LoadedDatasets {
    /// The tables.
    pub datasets: Datasets,
    /// Row counts per table.
    pub report: LoadReport,
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, DatasetError> {
    std::fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn log_stats(kind: TableKind, path: &Path, stats: &TableStats) {
    log::info!(
        "Loaded {kind} table {}: {} rows kept of {} ({} dropped, {} excluded)",
        path.display(),
        stats.rows_kept,
        stats.rows_read,
        stats.rows_dropped,
        stats.rows_excluded,
    );
}

/// Decodes and parses the three tables from already-read bytes.
///
/// # Errors
///
/// Returns [`DatasetError`] if the encoding is unknown or a table is
/// missing a required column.
pub fn parse_datasets(
    paths: &DatasetPaths,
    bytes: [&[u8]; 3],
    options: &LoadOptions,
) -> Result<LoadedDatasets, DatasetError> {
    let encoding = decode::resolve_encoding(&options.encoding)?;
    let [incident_bytes, indicator_bytes, prediction_bytes] = bytes;

    let text = decode::decode(incident_bytes, encoding, &paths.incidents.display().to_string());
    let (incidents, incident_stats) = tables::parse_incidents(&text, options)?;
    log_stats(TableKind::Incidents, &paths.incidents, &incident_stats);

    let text = decode::decode(
        indicator_bytes,
        encoding,
        &paths.indicators.display().to_string(),
    );
    let (indicators, indicator_stats) = tables::parse_indicators(&text, options)?;
    log_stats(TableKind::Indicators, &paths.indicators, &indicator_stats);

    let text = decode::decode(
        prediction_bytes,
        encoding,
        &paths.predictions.display().to_string(),
    );
    let (predictions, prediction_stats) = tables::parse_predictions(&text, options)?;
    log_stats(TableKind::Predictions, &paths.predictions, &prediction_stats);

    Ok(LoadedDatasets {
        datasets: Datasets {
            incidents,
            indicators,
            predictions,
        },
        report: LoadReport {
            incidents: incident_stats,
            indicators: indicator_stats,
            predictions: prediction_stats,
        },
    })
}

/// Reads and parses the three tables, uncached.
///
/// # Errors
///
/// Returns [`DatasetError`] naming the file if any table cannot be read,
/// or if parsing fails.
pub fn load_datasets(
    paths: &DatasetPaths,
    options: &LoadOptions,
) -> Result<LoadedDatasets, DatasetError> {
    let incidents = read_file(&paths.incidents)?;
    let indicators = read_file(&paths.indicators)?;
    let predictions = read_file(&paths.predictions)?;
    parse_datasets(
        paths,
        [
            incidents.as_slice(),
            indicators.as_slice(),
            predictions.as_slice(),
        ],
        options,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use super::DatasetPaths;

    pub const INCIDENTS: &str = "날짜,위도,경도\n\
        2021-05-01,37.55,126.98\n\
        2021-05-01,35.10,129.04\n\
        2022-01-15,37.45,126.70\n\
        bad-date,37.0,127.0\n";

    pub const INDICATORS: &str = "date,기후스트레스:서울특별시,사회스트레스:서울특별시,금융스트레스\n\
        2021-05-01,14,0.8,2.5\n\
        2024-01-01,14,0.8,2.5\n";

    pub const PREDICTIONS: &str = "date,도단위,crime_probability\n\
        2024-01-01,서울특별시,0.2\n\
        2024-06-01,서울특별시,0.4\n";

    /// Writes the three fixtures encoded in the Korean code page into a
    /// fresh temp directory.
    pub fn write_fixtures(name: &str) -> DatasetPaths {
        let dir = std::env::temp_dir().join(format!("risk_map_dataset_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let write = |file: &str, text: &str| -> PathBuf {
            let path = dir.join(file);
            let (bytes, _, _) = encoding_rs::EUC_KR.encode(text);
            std::fs::write(&path, bytes).unwrap();
            path
        };

        DatasetPaths {
            incidents: write("incidents.csv", INCIDENTS),
            indicators: write("indicators.csv", INDICATORS),
            predictions: write("predictions.csv", PREDICTIONS),
        }
    }
}
