pub mod types;
pub mod config;
pub mod data;
pub mod processing;
pub mod projection;
pub mod growth;
pub mod render;
pub mod webmap;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use types::Classified;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the density analysis and render the map artifacts
    Analyze {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze { config } => {
            println!("Analyzing with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // 1. Load and join boundary + census data
            let regions = data::load_regions(&app_config)?;

            // 2. Classify by density quantile
            let (high_density, _other) =
                processing::classify_regions(&regions, app_config.analysis.density_quantile);

            // 3. Resolve growth-ready hot zones around the high-density set
            let growth_ready =
                growth::resolve_growth_zones(&regions, &high_density, &app_config.analysis);

            let classified = Classified {
                all: regions,
                high_density,
                growth_ready,
            };

            // 4. Render artifacts
            if let Some(plot_path) = &app_config.output.static_plot {
                render::render_static_plot(&classified, app_config.output.plot_size, plot_path)?;
            }
            webmap::write_interactive_map(
                &classified,
                app_config.output.map_zoom,
                &app_config.output.map_html,
            )?;

            println!("Analysis complete!");
        }
    }

    Ok(())
}
