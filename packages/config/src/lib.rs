#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard configuration.
//!
//! A single TOML document describes where the three tables live, how they
//! are encoded, which columns hold which values, and where the boundary
//! collection is fetched from. The default document is embedded at compile
//! time; a file named by `--config` or the `RISK_MAP_CONFIG` environment
//! variable replaces it. Missing sections and keys fall back to the
//! defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "RISK_MAP_CONFIG";

/// Default configuration, embedded at compile time.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../default.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration document is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset locations and decoding.
    pub data: DataConfig,
    /// Column names in the three tables.
    pub columns: ColumnConfig,
    /// Boundary collection source.
    pub boundary: BoundaryConfig,
}

/// Dataset locations and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Incident table path.
    pub incidents: PathBuf,
    /// Indicator table path.
    pub indicators: PathBuf,
    /// Prediction table path.
    pub predictions: PathBuf,
    /// WHATWG encoding label of the three tables (e.g. `windows-949`).
    pub encoding: String,
    /// Field delimiter.
    pub delimiter: char,
    /// Last year kept from the indicator table; also bounds the historical
    /// year selector.
    pub historical_cutoff_year: i32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            incidents: PathBuf::from("data/15~25년도 이상동기(도단위추가)_with_coords_openai.csv"),
            indicators: PathBuf::from("data/지표데이터(4대범죄추가계산).csv"),
            predictions: PathBuf::from("data/crime_predictions_2024_2025_binary_risk.csv"),
            encoding: "windows-949".to_string(),
            delimiter: ',',
            historical_cutoff_year: 2023,
        }
    }
}

impl DataConfig {
    /// The delimiter as the single byte the CSV reader expects.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the delimiter is not ASCII.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigError::Invalid {
                message: format!("delimiter '{}' is not a single ASCII byte", self.delimiter),
            })
    }
}

/// Column names in the three tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Incident date column.
    pub incident_date: String,
    /// Incident latitude column.
    pub incident_latitude: String,
    /// Incident longitude column.
    pub incident_longitude: String,
    /// Indicator date column.
    pub indicator_date: String,
    /// Prefix of per-region climate stress columns (`<prefix><region>`).
    pub climate_prefix: String,
    /// Prefix of per-region social stress columns (`<prefix><region>`).
    pub social_prefix: String,
    /// Shared financial stress column.
    pub financial: String,
    /// Prediction date column.
    pub prediction_date: String,
    /// Prediction region column.
    pub prediction_region: String,
    /// Prediction probability column.
    pub prediction_probability: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            incident_date: "날짜".to_string(),
            incident_latitude: "위도".to_string(),
            incident_longitude: "경도".to_string(),
            indicator_date: "date".to_string(),
            climate_prefix: "기후스트레스:".to_string(),
            social_prefix: "사회스트레스:".to_string(),
            financial: "금융스트레스".to_string(),
            prediction_date: "date".to_string(),
            prediction_region: "도단위".to_string(),
            prediction_probability: "crime_probability".to_string(),
        }
    }
}

/// Boundary collection source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Remote `GeoJSON` URL.
    pub url: String,
    /// Local `GeoJSON` file. Takes precedence over `url` when set.
    pub file: Option<PathBuf>,
    /// Feature property holding the region label.
    pub label_property: String,
    /// Fetch timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            url: "https://raw.githubusercontent.com/southkorea/southkorea-maps/master/gadm/json/skorea-provinces-geo.json".to_string(),
            file: None,
            label_property: "NAME_1".to_string(),
            timeout_secs: 5,
        }
    }
}

impl BoundaryConfig {
    /// Fetch timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DashboardConfig {
    /// Parses a configuration document and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document does not parse or a value
    /// is unusable.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded document is invalid, which
    /// indicates a development error.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Loads configuration from `path`, then `RISK_MAP_CONFIG`, then the
    /// embedded default, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the selected source cannot be read or
    /// parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR)
            && !env_path.trim().is_empty()
        {
            return Self::from_file(Path::new(env_path.trim()));
        }
        log::debug!("Using embedded default config");
        Self::embedded()
    }

    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.data.delimiter_byte()?;
        if self.data.encoding.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "data.encoding must not be empty".to_string(),
            });
        }
        if self.boundary.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "boundary.timeout_secs must be at least 1".to_string(),
            });
        }
        if self.boundary.file.is_none() && self.boundary.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "boundary.url or boundary.file must be set".to_string(),
            });
        }
        if self.boundary.label_property.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "boundary.label_property must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_matches_defaults() {
        let embedded = DashboardConfig::embedded().unwrap();
        assert_eq!(embedded, DashboardConfig::default());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config = DashboardConfig::from_toml_str(
            r#"
            [data]
            historical_cutoff_year = 2022

            [boundary]
            file = "fixtures/provinces.geojson"
            "#,
        )
        .unwrap();

        assert_eq!(config.data.historical_cutoff_year, 2022);
        assert_eq!(config.data.encoding, "windows-949");
        assert_eq!(config.columns, ColumnConfig::default());
        assert_eq!(
            config.boundary.file.as_deref(),
            Some(Path::new("fixtures/provinces.geojson"))
        );
        assert_eq!(config.boundary.label_property, "NAME_1");
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        let err = DashboardConfig::from_toml_str("[data]\ndelimiter = \"；\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_zero_timeout() {
        let err =
            DashboardConfig::from_toml_str("[boundary]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_unknown_types() {
        let err = DashboardConfig::from_toml_str("[data]\nhistorical_cutoff_year = \"soon\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = std::env::temp_dir().join("risk_map_config_test_missing.toml");
        let _ = std::fs::remove_file(&path);
        let err = DashboardConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("risk_map_config_test_missing.toml"));
    }

    #[test]
    fn tab_delimiter_is_accepted() {
        let config = DashboardConfig::from_toml_str("[data]\ndelimiter = \"\\t\"\n").unwrap();
        assert_eq!(config.data.delimiter_byte().unwrap(), b'\t');
    }
}
