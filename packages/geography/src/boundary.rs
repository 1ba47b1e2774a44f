//! Parsed boundary collection.

use std::str::FromStr as _;

use geojson::{FeatureCollection, GeoJson};
use risk_map_geography_models::{BoundaryFeature, RegionCatalog};

use crate::GeoError;

/// Property added by [`BoundaryCollection::annotated`] holding the
/// canonical region name.
pub const CANONICAL_NAME_PROPERTY: &str = "canonicalName";

/// A boundary `FeatureCollection` plus the label of each feature.
#[derive(Debug, Clone)]
pub struct BoundaryCollection {
    features: Vec<BoundaryFeature>,
    collection: FeatureCollection,
    label_property: String,
}

impl BoundaryCollection {
    /// Parses a `GeoJSON` document.
    ///
    /// Features whose `label_property` is absent or not a string carry no
    /// label the choropleth can join on and are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the text is not `GeoJSON` or is not a
    /// `FeatureCollection`.
    pub fn parse(text: &str, label_property: &str) -> Result<Self, GeoError> {
        let geojson = GeoJson::from_str(text)?;
        let collection = FeatureCollection::try_from(geojson)?;

        let mut features = Vec::with_capacity(collection.features.len());
        let mut kept = Vec::with_capacity(collection.features.len());

        for (idx, feature) in collection.features.iter().enumerate() {
            match feature
                .property(label_property)
                .and_then(serde_json::Value::as_str)
            {
                Some(label) => {
                    features.push(BoundaryFeature::new(label));
                    kept.push(feature.clone());
                }
                None => {
                    log::warn!("Boundary feature {idx} has no string '{label_property}' property");
                }
            }
        }

        if features.is_empty() {
            return Err(GeoError::Conversion {
                message: format!("no boundary feature carries a '{label_property}' label"),
            });
        }

        Ok(Self {
            features,
            collection: FeatureCollection {
                bbox: collection.bbox,
                features: kept,
                foreign_members: collection.foreign_members,
            },
            label_property: label_property.to_string(),
        })
    }

    /// Labels in document order.
    #[must_use]
    pub fn features(&self) -> &[BoundaryFeature] {
        &self.features
    }

    /// Number of labeled features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether there are no labeled features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Property the labels were read from.
    #[must_use]
    pub fn label_property(&self) -> &str {
        &self.label_property
    }

    /// The underlying collection (labeled features only).
    #[must_use]
    pub const fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// A copy of the collection with each feature's canonical region name
    /// stored under [`CANONICAL_NAME_PROPERTY`], so a map client can join
    /// choropleth entries to polygons.
    #[must_use]
    pub fn annotated(&self, catalog: &RegionCatalog) -> FeatureCollection {
        let mut collection = self.collection.clone();
        for (feature, boundary) in collection.features.iter_mut().zip(&self.features) {
            feature.set_property(
                CANONICAL_NAME_PROPERTY,
                boundary.canonical_name(catalog).to_string(),
            );
        }
        collection
    }
}
