use crate::config::AnalysisConfig;
use crate::projection;
use crate::types::Region;
use geo::bounding_rect::BoundingRect;
use geo::intersects::Intersects;
use geo::{BooleanOps, MultiPolygon};
use geo_buffer::buffer_multi_polygon;
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use std::collections::HashSet;

// RTree entry pointing back into the projected region list.
struct RegionIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for RegionIndex {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Resolves growth-ready hot zones around the high-density partition.
///
/// All geometric work happens in projected meters: each high-density
/// region is buffered outward by `buffer_distance_m`, the buffers are
/// unioned, and every region intersecting that union becomes a
/// candidate. Candidates already in the high-density partition are
/// removed by region code, then the inclusive density band
/// `[min_density, max_density]` is applied. Returned regions keep
/// their original geographic geometry.
pub fn resolve_growth_zones(
    all: &[Region],
    high_density: &[Region],
    params: &AnalysisConfig,
) -> Vec<Region> {
    if high_density.is_empty() {
        return Vec::new();
    }

    println!(
        "Buffering {} high-density regions by {} m...",
        high_density.len(),
        params.buffer_distance_m
    );

    let buffer_union: Option<MultiPolygon<f64>> = high_density
        .par_iter()
        .map(|r| {
            let projected = projection::project_geometry(&r.geometry);
            buffer_multi_polygon(&projected, params.buffer_distance_m)
        })
        .reduce_with(|a, b| a.union(&b));

    let Some(buffer_union) = buffer_union else {
        return Vec::new();
    };
    let Some(buffer_bbox) = buffer_union.bounding_rect() else {
        return Vec::new();
    };

    // Projected copies of every region, indexed for the bbox prefilter.
    let projected: Vec<MultiPolygon<f64>> = all
        .par_iter()
        .map(|r| projection::project_geometry(&r.geometry))
        .collect();

    let tree_items: Vec<RegionIndex> = projected
        .iter()
        .enumerate()
        .filter_map(|(index, geometry)| {
            let rect = geometry.bounding_rect()?;
            Some(RegionIndex {
                index,
                aabb: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    let tree = RTree::bulk_load(tree_items);

    let high_codes: HashSet<&str> = high_density.iter().map(|r| r.code.as_str()).collect();

    let query_aabb = AABB::from_corners(
        [buffer_bbox.min().x, buffer_bbox.min().y],
        [buffer_bbox.max().x, buffer_bbox.max().y],
    );

    let mut candidate_indices: Vec<usize> = tree
        .locate_in_envelope_intersecting(&query_aabb)
        .filter(|item| projected[item.index].intersects(&buffer_union))
        .map(|item| item.index)
        .collect();
    candidate_indices.sort_unstable();

    let growth: Vec<Region> = candidate_indices
        .into_iter()
        .map(|i| &all[i])
        .filter(|r| !high_codes.contains(r.code.as_str()))
        .filter(|r| r.density >= params.min_density && r.density <= params.max_density)
        .cloned()
        .collect();

    println!("{} growth-ready hot zones", growth.len());

    growth
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    // Unit squares in degrees; near the equator 0.05° of longitude is
    // roughly 5.5 km in Web Mercator, well inside the 10 km buffer.
    fn square_region(code: &str, density: f64, x0: f64, y0: f64) -> Region {
        let square = polygon![
            (x: x0, y: y0),
            (x: x0 + 0.5, y: y0),
            (x: x0 + 0.5, y: y0 + 0.5),
            (x: x0, y: y0 + 0.5),
        ];
        Region {
            code: code.to_string(),
            area_sq_km: 1.0,
            dwelling_count: density,
            density,
            geometry: MultiPolygon::new(vec![square]),
        }
    }

    fn default_params() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn nearby_region_within_band_is_growth_ready() {
        let a = square_region("A", 500.0, 0.0, 0.0);
        let b = square_region("B", 50.0, 0.55, 0.0); // 0.05° gap to A
        let all = vec![a.clone(), b.clone()];

        let growth = resolve_growth_zones(&all, &[a], &default_params());
        assert_eq!(growth.len(), 1);
        assert_eq!(growth[0].code, "B");
    }

    #[test]
    fn high_density_regions_are_excluded_by_code() {
        // A intersects its own buffer but must never appear.
        let a = square_region("A", 500.0, 0.0, 0.0);
        let all = vec![a.clone()];

        let growth = resolve_growth_zones(&all, &[a], &default_params());
        assert!(growth.is_empty());
    }

    #[test]
    fn density_band_overrides_adjacency() {
        // C is adjacent to the buffer but too sparse to be a realistic
        // growth target.
        let a = square_region("A", 500.0, 0.0, 0.0);
        let b = square_region("B", 50.0, 0.55, 0.0);
        let c = square_region("C", 5.0, -0.55, 0.0);
        let all = vec![a.clone(), b.clone(), c.clone()];

        let growth = resolve_growth_zones(&all, &[a], &default_params());
        let codes: Vec<&str> = growth.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B"]);
    }

    #[test]
    fn too_dense_candidates_are_excluded() {
        let a = square_region("A", 500.0, 0.0, 0.0);
        let b = square_region("B", 250.0, 0.55, 0.0); // above max_density
        let all = vec![a.clone(), b.clone()];

        let growth = resolve_growth_zones(&all, &[a], &default_params());
        assert!(growth.is_empty());
    }

    #[test]
    fn far_away_regions_never_qualify() {
        let a = square_region("A", 500.0, 0.0, 0.0);
        let d = square_region("D", 50.0, 10.0, 10.0); // ~1000 km away
        let all = vec![a.clone(), d.clone()];

        let growth = resolve_growth_zones(&all, &[a], &default_params());
        assert!(growth.is_empty());
    }

    #[test]
    fn empty_high_density_partition_yields_no_zones() {
        let b = square_region("B", 50.0, 0.0, 0.0);
        let growth = resolve_growth_zones(&[b], &[], &default_params());
        assert!(growth.is_empty());
    }

    #[test]
    fn every_result_is_in_band_and_intersects_the_buffer() {
        let params = default_params();
        let a = square_region("A", 500.0, 0.0, 0.0);
        // Six coincident squares next to A, densities 0..=300 in steps
        // of 60; only 60, 120 and 180 fall inside the default band.
        let regions: Vec<Region> = (0..6)
            .map(|i| square_region(&format!("R{}", i), (i as f64) * 60.0, 0.55, 0.0))
            .chain(std::iter::once(a.clone()))
            .collect();

        let growth = resolve_growth_zones(&regions, &[a.clone()], &params);
        assert_eq!(growth.len(), 3);

        let buffer = buffer_multi_polygon(
            &projection::project_geometry(&a.geometry),
            params.buffer_distance_m,
        );
        for r in &growth {
            assert!(r.density >= params.min_density && r.density <= params.max_density);
            assert!(projection::project_geometry(&r.geometry).intersects(&buffer));
        }
    }
}
