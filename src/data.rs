use crate::config::AppConfig;
use crate::types::Region;
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use shapefile::Reader;
use std::collections::HashMap;
use std::fs::File;

/// Loads boundaries and census counts, joins them on the normalized
/// SA2 code and computes dwelling density per region.
///
/// Inner-join semantics: a region present in only one source is
/// silently dropped, as are rows whose count or area fails numeric
/// coercion and regions with a non-positive area. Those drops are
/// data-cleaning policy, not errors.
pub fn load_regions(config: &AppConfig) -> Result<Vec<Region>> {
    println!("Loading data...");

    let counts = load_census_counts(config)?;
    println!("Loaded census counts for {} regions", counts.len());

    let extension = config.input.boundaries.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Boundary file has no extension"))?;

    let regions = match extension.as_str() {
        "shp" => load_shapefile_and_join(config, &counts)?,
        "json" | "geojson" => load_geojson_and_join(config, &counts)?,
        _ => return Err(anyhow!("Unsupported boundary format: {}", extension)),
    };

    println!("Joined geometry and counts for {} regions", regions.len());

    Ok(regions)
}

/// Reads the census CSV into a code -> dwelling-count map. Codes are
/// stringified and whitespace-trimmed; rows with a non-numeric or
/// missing count are dropped.
fn load_census_counts(config: &AppConfig) -> Result<HashMap<String, f64>> {
    let file = File::open(&config.input.census_csv)
        .with_context(|| format!("Failed to open CSV file: {:?}", config.input.census_csv))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);
    let headers = rdr.headers()?.clone();

    let join_col_idx = headers.iter().position(|h| h == config.input.join_column_csv)
        .ok_or_else(|| anyhow!("Join column '{}' not found in CSV", config.input.join_column_csv))?;
    let count_col_idx = headers.iter().position(|h| h == config.input.count_column)
        .ok_or_else(|| anyhow!("Count column '{}' not found in CSV", config.input.count_column))?;

    let mut counts = HashMap::new();

    for result in rdr.records() {
        let record = result?;
        let code = record.get(join_col_idx).unwrap_or("").trim().to_string();
        if code.is_empty() {
            continue;
        }

        // Non-numeric counts are dropped, not raised.
        let count: f64 = match record.get(count_col_idx).map(str::trim) {
            Some(v) => match v.parse() {
                Ok(n) => n,
                Err(_) => continue,
            },
            None => continue,
        };

        counts.insert(code, count);
    }

    Ok(counts)
}

fn make_region(code: String, area_sq_km: f64, count: f64, geometry: MultiPolygon<f64>) -> Option<Region> {
    // Zero-area regions are excluded before division so density is
    // always finite.
    if area_sq_km <= 0.0 {
        return None;
    }
    Some(Region {
        density: count / area_sq_km,
        code,
        area_sq_km,
        dwelling_count: count,
        geometry,
    })
}

fn load_shapefile_and_join(
    config: &AppConfig,
    counts: &HashMap<String, f64>,
) -> Result<Vec<Region>> {
    let mut reader = Reader::from_path(&config.input.boundaries)
        .with_context(|| format!("Failed to open Shapefile: {:?}", config.input.boundaries))?;

    let mut regions = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let code_value = record.get(&config.input.join_column_shape)
            .ok_or_else(|| anyhow!("Join column '{}' not found in Shapefile", config.input.join_column_shape))?;

        let code = match code_value {
            shapefile::dbase::FieldValue::Character(Some(s)) => s.trim().to_string(),
            shapefile::dbase::FieldValue::Character(None)
            | shapefile::dbase::FieldValue::Numeric(None) => continue, // Skip if null
            shapefile::dbase::FieldValue::Numeric(Some(n)) => n.to_string(),
            _ => return Err(anyhow!("Shapefile join column must be a string or number")),
        };

        let area = match record.get(&config.input.area_column) {
            Some(shapefile::dbase::FieldValue::Numeric(Some(n))) => *n,
            Some(shapefile::dbase::FieldValue::Float(Some(f))) => *f as f64,
            Some(shapefile::dbase::FieldValue::Character(Some(s))) => match s.trim().parse() {
                Ok(n) => n,
                Err(_) => continue,
            },
            // Column exists but this row's value is null.
            Some(_) => continue,
            None => return Err(anyhow!("Area column '{}' not found in Shapefile", config.input.area_column)),
        };

        // Inner join: boundary rows without census data are dropped.
        let Some(&count) = counts.get(&code) else { continue };

        let geometry = match shape {
            shapefile::Shape::Polygon(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?;
                geo_polygon
            }
            shapefile::Shape::PolygonM(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?;
                geo_polygon
            }
            shapefile::Shape::PolygonZ(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?;
                geo_polygon
            }
            _ => continue, // Skip non-polygon shapes
        };

        if let Some(region) = make_region(code, area, count, geometry) {
            regions.push(region);
        }
    }

    Ok(regions)
}

fn load_geojson_and_join(
    config: &AppConfig,
    counts: &HashMap<String, f64>,
) -> Result<Vec<Region>> {
    use std::io::BufReader;
    use geojson::GeoJson;

    println!("Loading GeoJSON from {:?}...", config.input.boundaries);
    let file = File::open(&config.input.boundaries)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", config.input.boundaries))?;
    let reader = BufReader::new(file);

    // Parse the GeoJSON. warning: this loads the whole file into memory.
    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut regions = Vec::new();

    for feature in collection.features {
        let props = feature.properties.as_ref();

        let code = match props.and_then(|p| p.get(&config.input.join_column_shape)) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => continue, // Skip if no code or not string/number
        };

        let area = match props.and_then(|p| p.get(&config.input.area_column)) {
            Some(serde_json::Value::Number(n)) => match n.as_f64() {
                Some(a) => a,
                None => continue,
            },
            Some(serde_json::Value::String(s)) => match s.trim().parse() {
                Ok(a) => a,
                Err(_) => continue,
            },
            _ => continue,
        };

        let Some(&count) = counts.get(&code) else { continue };

        let geometry = match feature.geometry {
            Some(geo) => {
                let valid_geo: geo::Geometry<f64> = geo.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;

                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue, // Skip points/lines
                }
            }
            None => continue,
        };

        if let Some(region) = make_region(code, area, count, geometry) {
            regions.push(region);
        }
    }

    Ok(regions)
}
