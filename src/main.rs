use anyhow::Context;
use clap::Parser;
use rewards_eda::config::Config;
use rewards_eda::logging;
use rewards_eda::pipeline::run_pipeline;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "rewards_eda")]
#[command(about = "Exploratory data analysis for rewards receipts, brands and users")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML config file (defaults to ./eda.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding receipts.json, brands.json and users.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Root directory for per-table results
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Create missing per-table output directories
    #[arg(long)]
    create_output_dirs: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.paths.data_dir = data_dir;
    }
    if let Some(output_dir) = cli.output_dir {
        config.paths.output_dir = output_dir;
    }
    if cli.create_output_dirs {
        config.paths.create_output_dirs = true;
    }

    match run_pipeline(&config) {
        Ok(result) => {
            for table in &result.tables {
                info!(
                    table = %table.name,
                    rows = table.rows,
                    columns = table.columns,
                    "Saved {}",
                    table.artifacts.csv.display()
                );
            }
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}
