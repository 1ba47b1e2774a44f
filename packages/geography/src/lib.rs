#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region boundary collection.
//!
//! Fetches the province-level `GeoJSON` `FeatureCollection` over HTTP (with
//! a bounded timeout) or reads it from a local file, and reduces each
//! feature to the region label the choropleth joins on. Fetches are
//! memoized per source by [`fetch::BoundaryCache`].

pub mod boundary;
pub mod fetch;

use std::fmt;
use std::path::PathBuf;

use risk_map_config::BoundaryConfig;
use thiserror::Error;

pub use boundary::BoundaryCollection;

/// Errors that can occur while obtaining boundaries.
#[derive(Debug, Error)]
pub enum GeoError {
    /// HTTP request failed (including timeouts).
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        /// URL that was requested.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// Local boundary file could not be read.
    #[error("Failed to read boundary file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Where the boundary collection comes from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoundarySource {
    /// Remote `GeoJSON` document.
    Url(String),
    /// Local `GeoJSON` file.
    File(PathBuf),
}

impl BoundarySource {
    /// Picks the configured source; a local file wins over the URL.
    #[must_use]
    pub fn from_config(config: &BoundaryConfig) -> Self {
        config
            .file
            .as_ref()
            .map_or_else(|| Self::Url(config.url.clone()), |path| Self::File(path.clone()))
    }
}

impl fmt::Display for BoundarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
