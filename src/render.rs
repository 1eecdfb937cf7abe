use crate::projection;
use crate::types::{Classified, Region};
use anyhow::{Context, Result, anyhow};
use geo::bounding_rect::BoundingRect;
use geo::{MultiPolygon, Rect};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use std::path::Path;

const MARGIN_PX: f64 = 20.0;

const BASE_FILL: &str = "#d3d3d3"; // light grey
const HIGH_FILL: &str = "#800080"; // purple
const GROWTH_FILL: &str = "#ff0000"; // red
const EDGE: &str = "#000000";

/// Renders the three-layer overview plot: every region in light grey,
/// high-density regions in purple, growth-ready hot zones in red.
/// Drawing happens in projected meters so shapes keep their relative
/// distances.
pub fn render_static_plot(classified: &Classified, size: u32, path: &Path) -> Result<()> {
    println!("Rendering static plot ({}x{}) to {:?}...", size, size, path);

    let projected_all: Vec<MultiPolygon<f64>> = classified
        .all
        .iter()
        .map(|r| projection::project_geometry(&r.geometry))
        .collect();

    let bbox = overall_bbox(&projected_all)
        .ok_or_else(|| anyhow!("No drawable geometry in the region collection"))?;
    let transform = PlotTransform::fit(bbox, size);

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));

    let edge = hex_to_rgba(EDGE);
    for geometry in &projected_all {
        draw_multi_polygon(&mut canvas, geometry, &transform, hex_to_rgba(BASE_FILL), edge);
    }
    draw_layer(&mut canvas, &classified.high_density, &transform, hex_to_rgba(HIGH_FILL), edge);
    draw_layer(&mut canvas, &classified.growth_ready, &transform, hex_to_rgba(GROWTH_FILL), edge);

    canvas
        .save(path)
        .with_context(|| format!("Failed to save static plot to {:?}", path))?;

    Ok(())
}

fn draw_layer(
    canvas: &mut RgbaImage,
    regions: &[Region],
    transform: &PlotTransform,
    fill: Rgba<u8>,
    edge: Rgba<u8>,
) {
    for region in regions {
        let projected = projection::project_geometry(&region.geometry);
        draw_multi_polygon(canvas, &projected, transform, fill, edge);
    }
}

fn draw_multi_polygon(
    canvas: &mut RgbaImage,
    geometry: &MultiPolygon<f64>,
    transform: &PlotTransform,
    fill: Rgba<u8>,
    edge: Rgba<u8>,
) {
    for polygon in geometry {
        let points = ring_to_points(polygon.exterior(), transform);
        // imageproc rejects rings that repeat the closing point or
        // degenerate to fewer than 3 vertices.
        if points.len() >= 3 {
            draw_polygon_mut(canvas, &points, fill);
        }
        draw_ring_edges(canvas, &points, edge);
    }
}

fn draw_ring_edges(canvas: &mut RgbaImage, points: &[Point<i32>], edge: Rgba<u8>) {
    if points.len() < 2 {
        return;
    }
    for pair in points.windows(2) {
        draw_line_segment_mut(
            canvas,
            (pair[0].x as f32, pair[0].y as f32),
            (pair[1].x as f32, pair[1].y as f32),
            edge,
        );
    }
    let first = points[0];
    let last = points[points.len() - 1];
    draw_line_segment_mut(
        canvas,
        (last.x as f32, last.y as f32),
        (first.x as f32, first.y as f32),
        edge,
    );
}

fn ring_to_points(ring: &geo::LineString<f64>, transform: &PlotTransform) -> Vec<Point<i32>> {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(ring.0.len());
    for coord in &ring.0 {
        let p = transform.to_pixel(coord.x, coord.y);
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    // Drop the duplicated closing vertex.
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn overall_bbox(geometries: &[MultiPolygon<f64>]) -> Option<Rect<f64>> {
    let mut merged: Option<Rect<f64>> = None;
    for geometry in geometries {
        let Some(rect) = geometry.bounding_rect() else { continue };
        merged = Some(match merged {
            None => rect,
            Some(m) => Rect::new(
                geo::Coord {
                    x: m.min().x.min(rect.min().x),
                    y: m.min().y.min(rect.min().y),
                },
                geo::Coord {
                    x: m.max().x.max(rect.max().x),
                    y: m.max().y.max(rect.max().y),
                },
            ),
        });
    }
    merged
}

/// Maps projected meters onto the square canvas, preserving aspect
/// ratio and flipping y (image rows grow downward).
struct PlotTransform {
    min_x: f64,
    max_y: f64,
    scale: f64,
}

impl PlotTransform {
    fn fit(bbox: Rect<f64>, size: u32) -> Self {
        let usable = f64::from(size) - 2.0 * MARGIN_PX;
        let width = (bbox.max().x - bbox.min().x).max(f64::EPSILON);
        let height = (bbox.max().y - bbox.min().y).max(f64::EPSILON);
        PlotTransform {
            min_x: bbox.min().x,
            max_y: bbox.max().y,
            scale: (usable / width).min(usable / height),
        }
    }

    fn to_pixel(&self, x: f64, y: f64) -> Point<i32> {
        let px = MARGIN_PX + (x - self.min_x) * self.scale;
        let py = MARGIN_PX + (self.max_y - y) * self.scale;
        Point::new(px.round() as i32, py.round() as i32)
    }
}

fn hex_to_rgba(hex: &str) -> Rgba<u8> {
    let hex = hex.trim_start_matches('#');
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
    Rgba([r, g, b, 255])
}
