//! Render descriptor building.

use std::collections::BTreeMap;

use risk_map_analytics_models::render::{
    ChoroplethEntry, ChoroplethStyle, LatLon, Legend, LegendEntry, LegendSection, MarkerLayer,
    MarkerPoint, RenderDescriptor, Summary, Viewport,
};
use risk_map_analytics_models::{MapColor, MarkerDensity, RegionMetric, ViewMode};
use risk_map_dataset_models::IncidentRecord;
use risk_map_geography_models::{BoundaryFeature, Region, RegionCatalog};

/// Most markers drawn on one map.
pub const MAX_MARKERS: usize = 1000;

fn popup(record: &IncidentRecord) -> String {
    format!(
        "date: {}\nlocation: {}",
        record.occurred_at.format("%Y-%m-%d"),
        record.location_label()
    )
}

/// Builds the marker layer from the full incident subset.
///
/// Hidden and empty in prediction mode. Otherwise the first
/// [`MAX_MARKERS`] incidents are drawn, colored by the size of the whole
/// subset.
#[must_use]
pub fn marker_layer(mode: ViewMode, incidents: &[&IncidentRecord]) -> MarkerLayer {
    if mode.is_prediction() {
        return MarkerLayer::hidden();
    }

    let point_count = incidents.len();
    let overflow_count = point_count.saturating_sub(MAX_MARKERS);
    let density = (point_count > 0).then(|| MarkerDensity::for_count(point_count));

    MarkerLayer {
        visible: true,
        points: incidents
            .iter()
            .take(MAX_MARKERS)
            .map(|r| MarkerPoint {
                latitude: r.latitude,
                longitude: r.longitude,
                popup: popup(r),
            })
            .collect(),
        density,
        color: density.map(MarkerDensity::color),
        point_count,
        overflow_count,
        notice: (overflow_count > 0)
            .then(|| format!("showing {MAX_MARKERS} of {point_count} incidents")),
    }
}

/// One choropleth entry per boundary feature, in feature order.
///
/// Labels the catalog cannot map pass through with the mode's empty
/// metric.
#[must_use]
pub fn choropleth(
    mode: ViewMode,
    metrics: &BTreeMap<Region, RegionMetric>,
    catalog: &RegionCatalog,
    features: &[BoundaryFeature],
) -> Vec<ChoroplethEntry> {
    features
        .iter()
        .map(|feature| {
            let region = feature.region(catalog);
            let metric = region
                .and_then(|r| metrics.get(&r).copied())
                .unwrap_or_else(|| RegionMetric::empty(mode));
            ChoroplethEntry {
                label: feature.label.clone(),
                canonical_name: feature.canonical_name(catalog).to_string(),
                region,
                metric,
                fill_color: metric.fill_color(),
                tooltip: format!("{}\n{}", feature.label, metric.describe()),
            }
        })
        .collect()
}

/// Legend for `mode`.
#[must_use]
pub fn legend(mode: ViewMode) -> Legend {
    let prediction = mode.is_prediction();

    let choropleth_entries = if prediction {
        vec![
            LegendEntry::new(MapColor::Green, "safe (<0.3)"),
            LegendEntry::new(MapColor::Lime, "watch (0.3~0.5)"),
            LegendEntry::new(MapColor::Yellow, "caution (0.5~0.7)"),
            LegendEntry::new(MapColor::Orange, "alert (0.7~0.85)"),
            LegendEntry::new(MapColor::Red, "danger (≥0.85)"),
        ]
    } else {
        vec![
            LegendEntry::new(MapColor::Green, "0: safe"),
            LegendEntry::new(MapColor::Yellow, "1: caution"),
            LegendEntry::new(MapColor::Orange, "2: warning"),
            LegendEntry::new(MapColor::Red, "3: danger"),
        ]
    };

    Legend {
        title: if prediction {
            "Legend (prediction)".to_string()
        } else {
            "Legend".to_string()
        },
        choropleth: LegendSection {
            title: "risk choropleth".to_string(),
            entries: choropleth_entries,
            note: None,
        },
        markers: LegendSection {
            title: "incident markers".to_string(),
            entries: vec![
                LegendEntry::new(MarkerDensity::Few.color(), "few (<100)"),
                LegendEntry::new(MarkerDensity::Moderate.color(), "moderate (<500)"),
                LegendEntry::new(MarkerDensity::Many.color(), "many (≥500)"),
            ],
            note: prediction.then(|| "not shown".to_string()),
        },
    }
}

/// Default viewport, or the mean incident position at a closer zoom when
/// any incidents are selected.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn viewport(incidents: &[&IncidentRecord]) -> Viewport {
    if incidents.is_empty() {
        return Viewport::default();
    }

    let n = incidents.len() as f64;
    let (lat, lon) = incidents.iter().fold((0.0, 0.0), |(lat, lon), r| {
        (lat + r.latitude, lon + r.longitude)
    });
    let center = LatLon {
        latitude: lat / n,
        longitude: lon / n,
    };

    if center.latitude.is_finite() && center.longitude.is_finite() {
        Viewport::focused(center)
    } else {
        Viewport::default()
    }
}

/// Caption under the map. Historical modes report `incident_count`.
#[must_use]
pub fn summary(mode: ViewMode, incident_count: usize) -> Summary {
    if mode.is_prediction() {
        Summary {
            incident_count: None,
            caption: "prediction mode: choropleth from crime probability".to_string(),
        }
    } else {
        Summary {
            incident_count: Some(incident_count),
            caption: format!("incidents: {incident_count}"),
        }
    }
}

/// Assembles the render descriptor.
///
/// The summary counts `incidents`; callers that report a different count
/// replace it.
#[must_use]
pub fn build(
    mode: ViewMode,
    title: &str,
    incidents: &[&IncidentRecord],
    metrics: &BTreeMap<Region, RegionMetric>,
    catalog: &RegionCatalog,
    features: &[BoundaryFeature],
) -> RenderDescriptor {
    let incidents: &[&IncidentRecord] = if mode.is_prediction() { &[] } else { incidents };

    RenderDescriptor {
        title: title.to_string(),
        mode,
        viewport: viewport(incidents),
        marker_layer: marker_layer(mode, incidents),
        choropleth: choropleth(mode, metrics, catalog, features),
        style: ChoroplethStyle::default(),
        legend: legend(mode),
        summary: summary(mode, incidents.len()),
    }
}
