use geo::MultiPolygon;

/// One SA2 statistical region after the census join.
///
/// `density` is dwellings per square kilometre, computed once at join
/// time. Regions with a non-positive area never make it this far.
#[derive(Debug, Clone)]
pub struct Region {
    pub code: String,
    pub area_sq_km: f64,
    pub dwelling_count: f64,
    pub density: f64,
    pub geometry: MultiPolygon<f64>,
}

/// The three-way split the renderers consume. `high_density` and
/// `growth_ready` are disjoint by region code; together with `other`
/// they cover the full joined collection.
#[derive(Debug, Clone)]
pub struct Classified {
    pub all: Vec<Region>,
    pub high_density: Vec<Region>,
    pub growth_ready: Vec<Region>,
}

impl Region {
    pub fn tooltip(&self) -> String {
        format!("{}: {:.1} dwellings/km²", self.code, self.density)
    }
}
