use crate::types::Region;

/// Splits regions into the high-density partition and the remainder.
///
/// The threshold is the density value at `quantile` (linear
/// interpolation over the full density column); ties at the threshold
/// are high-density. The two partitions are disjoint and cover the
/// input.
pub fn classify_regions(regions: &[Region], quantile: f64) -> (Vec<Region>, Vec<Region>) {
    let densities: Vec<f64> = regions.iter().map(|r| r.density).collect();

    let threshold = match density_quantile(&densities, quantile) {
        Some(t) => t,
        None => return (Vec::new(), regions.to_vec()),
    };

    println!(
        "High-density threshold at quantile {}: {:.1} dwellings/km²",
        quantile, threshold
    );

    let (high, other): (Vec<Region>, Vec<Region>) = regions
        .iter()
        .cloned()
        .partition(|r| r.density >= threshold);

    println!(
        "{} high-density regions, {} others",
        high.len(),
        other.len()
    );

    (high, other)
}

/// Linear-interpolation quantile over an unsorted sample. Returns None
/// for an empty sample.
pub fn density_quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let fraction = position - lower as f64;

    if lower + 1 < sorted.len() {
        Some(sorted[lower] + fraction * (sorted[lower + 1] - sorted[lower]))
    } else {
        Some(sorted[lower])
    }
}
