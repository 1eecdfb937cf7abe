use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// SA2 boundary file (.shp or .geojson).
    pub boundaries: PathBuf,
    /// Census attribute CSV.
    pub census_csv: PathBuf,
    pub join_column_shape: String,
    pub join_column_csv: String,
    /// Boundary attribute holding the region area in km².
    pub area_column: String,
    /// CSV column holding the dwelling count.
    pub count_column: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Density quantile above which a region counts as high-density.
    pub density_quantile: f64,
    /// Buffer radius around high-density regions, in metres.
    pub buffer_distance_m: f64,
    /// Inclusive density band for growth-ready candidates.
    pub min_density: f64,
    pub max_density: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            density_quantile: 0.70,
            buffer_distance_m: 10_000.0,
            min_density: 10.0,
            max_density: 200.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Self-contained interactive map HTML.
    pub map_html: PathBuf,
    /// Static overview plot. Skipped when unset.
    pub static_plot: Option<PathBuf>,
    #[serde(default = "default_plot_size")]
    pub plot_size: u32,
    #[serde(default = "default_zoom")]
    pub map_zoom: u8,
}

fn default_plot_size() -> u32 {
    1200
}

fn default_zoom() -> u8 {
    4
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
