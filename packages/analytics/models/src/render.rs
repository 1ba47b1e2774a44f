//! Format-agnostic description of one rendered map.

use risk_map_geography_models::Region;
use serde::{Deserialize, Serialize};

use crate::{MapColor, MarkerDensity, RegionMetric, ViewMode};

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLon {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Initial map center and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Map center.
    pub center: LatLon,
    /// Zoom level.
    pub zoom: u8,
}

impl Viewport {
    /// Center of the peninsula, used when no incidents are shown.
    pub const DEFAULT_CENTER: LatLon = LatLon {
        latitude: 36.5,
        longitude: 127.5,
    };
    /// Zoom showing the whole country.
    pub const DEFAULT_ZOOM: u8 = 7;
    /// Zoom used when centered on the incident subset.
    pub const FOCUSED_ZOOM: u8 = 8;

    /// A viewport focused on `center`.
    #[must_use]
    pub const fn focused(center: LatLon) -> Self {
        Self {
            center,
            zoom: Self::FOCUSED_ZOOM,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: Self::DEFAULT_CENTER,
            zoom: Self::DEFAULT_ZOOM,
        }
    }
}

/// A single incident marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Popup text (date and coordinates).
    pub popup: String,
}

/// Clustered incident markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerLayer {
    /// Whether the layer is shown.
    pub visible: bool,
    /// Markers, at most the display cap, in table order.
    pub points: Vec<MarkerPoint>,
    /// Density bucket of the full subset.
    pub density: Option<MarkerDensity>,
    /// Marker color for `density`.
    pub color: Option<MapColor>,
    /// Incidents in the full subset.
    pub point_count: usize,
    /// Incidents not drawn because of the cap.
    pub overflow_count: usize,
    /// Informational notice when markers were truncated.
    pub notice: Option<String>,
}

impl MarkerLayer {
    /// A hidden, empty layer.
    #[must_use]
    pub const fn hidden() -> Self {
        Self {
            visible: false,
            points: Vec::new(),
            density: None,
            color: None,
            point_count: 0,
            overflow_count: 0,
            notice: None,
        }
    }
}

/// One region polygon of the choropleth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethEntry {
    /// Label as spelled by the boundary collection.
    pub label: String,
    /// Canonical region name (the label itself when unmapped).
    pub canonical_name: String,
    /// Catalog region, if the label is mapped.
    pub region: Option<Region>,
    /// Metric the color is derived from.
    pub metric: RegionMetric,
    /// Fill color.
    pub fill_color: MapColor,
    /// Two-line tooltip.
    pub tooltip: String,
}

/// Polygon styling shared by every choropleth entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethStyle {
    /// Outline color.
    pub outline_color: MapColor,
    /// Outline weight in pixels.
    pub weight: u8,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f64,
}

impl Default for ChoroplethStyle {
    fn default() -> Self {
        Self {
            outline_color: MapColor::Black,
            weight: 1,
            fill_opacity: 0.3,
        }
    }
}

/// One color swatch of the legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    /// Swatch color.
    pub color: MapColor,
    /// Label next to the swatch.
    pub label: String,
}

impl LegendEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(color: MapColor, label: impl Into<String>) -> Self {
        Self {
            color,
            label: label.into(),
        }
    }
}

/// A titled group of legend entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendSection {
    /// Section heading.
    pub title: String,
    /// Swatches, least to most severe.
    pub entries: Vec<LegendEntry>,
    /// Annotation after the heading, e.g. `not shown`.
    pub note: Option<String>,
}

/// Map legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    /// Legend heading.
    pub title: String,
    /// Choropleth color ladder.
    pub choropleth: LegendSection,
    /// Marker color ladder.
    pub markers: LegendSection,
}

/// Caption shown under the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Incident count (historical modes only).
    pub incident_count: Option<usize>,
    /// Caption text.
    pub caption: String,
}

/// Everything a presentation layer needs to draw one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderDescriptor {
    /// Map title.
    pub title: String,
    /// Mode the map was rendered in.
    pub mode: ViewMode,
    /// Initial viewport.
    pub viewport: Viewport,
    /// Incident markers.
    pub marker_layer: MarkerLayer,
    /// Region polygons in boundary collection order.
    pub choropleth: Vec<ChoroplethEntry>,
    /// Polygon styling.
    pub style: ChoroplethStyle,
    /// Legend.
    pub legend: Legend,
    /// Caption under the map.
    pub summary: Summary,
}
