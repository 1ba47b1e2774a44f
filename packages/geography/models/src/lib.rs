#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative region catalog and boundary feature types.
//!
//! These types are shared by the dataset loader (stress columns are keyed
//! by region), the boundary provider and the render pipeline.

pub mod regions;

use serde::{Deserialize, Serialize};

pub use regions::{REGION_TABLE, Region, RegionCatalog, RegionEntry};

/// A single polygon feature of the boundary collection, reduced to the
/// label the choropleth needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryFeature {
    /// Raw region label as spelled by the boundary provider (e.g. "Seoul").
    pub label: String,
}

impl BoundaryFeature {
    /// Creates a feature with the given raw label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Resolves the canonical region name for this feature through the
    /// catalog. Unmapped labels pass through.
    #[must_use]
    pub fn canonical_name<'a>(&'a self, catalog: &RegionCatalog) -> &'a str {
        catalog.canonical_name(&self.label)
    }

    /// Resolves the catalog region for this feature. The label may be the
    /// English boundary label or the canonical name itself.
    #[must_use]
    pub fn region(&self, catalog: &RegionCatalog) -> Option<Region> {
        catalog.resolve(&self.label)
    }
}
