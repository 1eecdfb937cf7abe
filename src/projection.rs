use geo::{Coord, MapCoords, MultiPolygon};
use std::f64::consts::PI;

// Spherical Web Mercator (EPSG:3857) radius in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// lon/lat degrees -> projected meters.
pub fn to_mercator(c: Coord<f64>) -> Coord<f64> {
    let x = EARTH_RADIUS_M * c.x.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + c.y.to_radians() / 2.0).tan().ln();
    Coord { x, y }
}

/// projected meters -> lon/lat degrees.
pub fn to_geographic(c: Coord<f64>) -> Coord<f64> {
    let lon = (c.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    Coord { x: lon, y: lat }
}

/// Reprojects a geographic multipolygon into meters for buffering and
/// intersection tests.
pub fn project_geometry(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    geometry.map_coords(to_mercator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_coordinates() {
        // Sydney-ish, Perth-ish, and a point near the equator.
        let points = [
            Coord { x: 151.2, y: -33.9 },
            Coord { x: 115.9, y: -31.9 },
            Coord { x: 135.0, y: -0.5 },
        ];
        for p in points {
            let back = to_geographic(to_mercator(p));
            assert!((back.x - p.x).abs() < 1e-9, "lon drifted: {:?}", back);
            assert!((back.y - p.y).abs() < 1e-9, "lat drifted: {:?}", back);
        }
    }

    #[test]
    fn equator_x_scale_matches_earth_radius() {
        let projected = to_mercator(Coord { x: 180.0, y: 0.0 });
        assert!((projected.x - EARTH_RADIUS_M * PI).abs() < 1e-3);
        assert!(projected.y.abs() < 1e-9);
    }
}
