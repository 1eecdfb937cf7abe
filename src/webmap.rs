use crate::types::{Classified, Region};
use anyhow::{Context, Result};
use geo::bounding_rect::BoundingRect;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use std::fs;
use std::path::Path;

/// Writes the self-contained interactive map: one HTML file embedding
/// three GeoJSON layers (all regions, high-density, growth-ready) in
/// geographic coordinates, each with a single declarative style.
/// Hover text comes from a per-feature `tooltip` property rather than
/// per-region styling callbacks.
pub fn write_interactive_map(classified: &Classified, zoom: u8, path: &Path) -> Result<()> {
    println!("Writing interactive map to {:?}...", path);

    let base = layer_to_feature_collection(&classified.all, false);
    let high = layer_to_feature_collection(&classified.high_density, true);
    let growth = layer_to_feature_collection(&classified.growth_ready, true);

    let (center_lat, center_lon) = map_center(&classified.all);

    let html = render_html(
        &serde_json::to_string(&base)?,
        &serde_json::to_string(&high)?,
        &serde_json::to_string(&growth)?,
        center_lat,
        center_lon,
        zoom,
    );

    fs::write(path, html)
        .with_context(|| format!("Failed to write interactive map to {:?}", path))?;

    Ok(())
}

/// Serializes a whole layer at once. Regions whose geometry is empty
/// are dropped here rather than producing broken features.
fn layer_to_feature_collection(regions: &[Region], with_tooltip: bool) -> FeatureCollection {
    let features = regions
        .iter()
        .filter(|r| !r.geometry.0.is_empty())
        .map(|r| {
            let mut properties = JsonObject::new();
            properties.insert("code".to_string(), r.code.clone().into());
            properties.insert("density".to_string(), r.density.into());
            if with_tooltip {
                properties.insert("tooltip".to_string(), r.tooltip().into());
            }
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::from(&r.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Centre of the collection's geographic bounding box. Falls back to
/// the middle of Australia when nothing is drawable.
fn map_center(regions: &[Region]) -> (f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for region in regions {
        let Some(rect) = region.geometry.bounding_rect() else { continue };
        min_x = min_x.min(rect.min().x);
        min_y = min_y.min(rect.min().y);
        max_x = max_x.max(rect.max().x);
        max_y = max_y.max(rect.max().y);
    }

    if min_x.is_finite() {
        ((min_y + max_y) / 2.0, (min_x + max_x) / 2.0)
    } else {
        (-25.0, 135.0)
    }
}

fn render_html(
    base_json: &str,
    high_json: &str,
    growth_json: &str,
    center_lat: f64,
    center_lon: f64,
    zoom: u8,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>High-Density Areas and Growth-Ready Hot Zones</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([{center_lat}, {center_lon}], {zoom});
L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);

var layerStyles = {{
  base: {{ color: 'grey', weight: 1, fillOpacity: 0.2 }},
  highDensity: {{ color: 'purple', fillColor: 'purple', weight: 1, fillOpacity: 0.7 }},
  growthReady: {{ color: 'red', fillColor: 'red', weight: 1, fillOpacity: 0.6 }}
}};

function addLayer(data, style) {{
  L.geoJSON(data, {{
    style: style,
    onEachFeature: function (feature, layer) {{
      if (feature.properties && feature.properties.tooltip) {{
        layer.bindTooltip(feature.properties.tooltip);
      }}
    }}
  }}).addTo(map);
}}

addLayer({base_json}, layerStyles.base);
addLayer({high_json}, layerStyles.highDensity);
addLayer({growth_json}, layerStyles.growthReady);
</script>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn region(code: &str, density: f64) -> Region {
        let square = polygon![
            (x: 150.0, y: -34.0),
            (x: 151.0, y: -34.0),
            (x: 151.0, y: -33.0),
            (x: 150.0, y: -33.0),
        ];
        Region {
            code: code.to_string(),
            area_sq_km: 10.0,
            dwelling_count: density * 10.0,
            density,
            geometry: MultiPolygon::new(vec![square]),
        }
    }

    #[test]
    fn tooltip_formats_density_to_one_decimal() {
        let r = region("101021007", 123.456);
        assert_eq!(r.tooltip(), "101021007: 123.5 dwellings/km²");
    }

    #[test]
    fn layers_carry_tooltip_properties_only_when_asked() {
        let regions = vec![region("A", 50.0)];

        let base = layer_to_feature_collection(&regions, false);
        let props = base.features[0].properties.as_ref().unwrap();
        assert!(props.get("tooltip").is_none());
        assert_eq!(props.get("code").unwrap(), "A");

        let high = layer_to_feature_collection(&regions, true);
        let props = high.features[0].properties.as_ref().unwrap();
        assert!(props.get("tooltip").is_some());
    }

    #[test]
    fn empty_geometries_are_dropped_from_layers() {
        let mut r = region("A", 50.0);
        r.geometry = MultiPolygon::new(vec![]);
        let fc = layer_to_feature_collection(&[r], true);
        assert!(fc.features.is_empty());
    }

    #[test]
    fn map_center_is_the_bbox_middle() {
        let (lat, lon) = map_center(&[region("A", 50.0)]);
        assert!((lat - -33.5).abs() < 1e-9);
        assert!((lon - 150.5).abs() < 1e-9);
    }

    #[test]
    fn written_file_is_self_contained_html() {
        let classified = Classified {
            all: vec![region("A", 500.0), region("B", 50.0)],
            high_density: vec![region("A", 500.0)],
            growth_ready: vec![region("B", 50.0)],
        };
        let path = std::env::temp_dir().join("sa2-growthmap-test-map.html");

        write_interactive_map(&classified, 4, &path).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("leaflet"));
        assert!(html.contains("FeatureCollection"));
        assert!(html.contains("B: 50.0 dwellings/km²"));
    }
}
