// Per-table artifacts: CSV export, HTML profile and missing-data plots

pub mod export;
pub mod missing;
pub mod profile;
pub mod render;
pub mod stats;

use crate::config::Config;
use crate::error::{EdaError, Result};
use crate::table::Table;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

pub use export::write_csv;
pub use missing::{analyze_missing, MissingSummary};
pub use profile::{profile_table, write_profile, TableProfile};
pub use render::render_missing_plots;

const PROFILE_SUFFIX: &str = "_profile_output.html";
const PLOTS_SUFFIX: &str = "_missingno_output.png";

/// Files written for one table
#[derive(Debug, Clone, Serialize)]
pub struct TableArtifacts {
    pub csv: PathBuf,
    pub profile: PathBuf,
    pub plots: PathBuf,
}

impl TableArtifacts {
    pub fn in_dir(dir: &Path, table_name: &str) -> Self {
        Self {
            csv: dir.join(format!("{table_name}.csv")),
            profile: dir.join(format!("{table_name}{PROFILE_SUFFIX}")),
            plots: dir.join(format!("{table_name}{PLOTS_SUFFIX}")),
        }
    }
}

/// Export, profile and plot one table into `<output_dir>/<table name>/`.
///
/// Steps run in that order; a failure stops the table at that step.
#[instrument(skip_all, fields(table = %table.name()))]
pub fn analyze_and_save(table: &Table, config: &Config) -> Result<TableArtifacts> {
    let dir = config.table_dir(table.name());
    ensure_dir(&dir, config.paths.create_output_dirs)?;
    let artifacts = TableArtifacts::in_dir(&dir, table.name());

    debug!(">>> saving {}", artifacts.csv.display());
    write_csv(table, &artifacts.csv)?;

    debug!(">>> profiling {}", artifacts.profile.display());
    let profile = profile_table(table, &config.profile)?;
    write_profile(&profile, &artifacts.profile)?;

    debug!(">>> plotting missing data {}", artifacts.plots.display());
    let summary = analyze_missing(table)?;
    render_missing_plots(&summary, &artifacts.plots, &config.render)?;

    Ok(artifacts)
}

fn ensure_dir(dir: &Path, create: bool) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if create {
        return fs::create_dir_all(dir).map_err(|e| EdaError::io(dir, e));
    }
    Err(EdaError::io(
        dir,
        io::Error::new(io::ErrorKind::NotFound, "output directory does not exist"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use tempfile::tempdir;

    fn sample_table() -> Table {
        let rows: Vec<Map<String, Value>> = vec![
            json!({"name": "a", "score": 1.5}),
            json!({"name": "b", "score": null}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        Table::from_rows("scores", rows).unwrap()
    }

    fn config_for(output: &Path, create: bool) -> Config {
        let mut config = Config::default();
        config.paths.output_dir = output.to_path_buf();
        config.paths.create_output_dirs = create;
        config.render.width = 200;
        config.render.height = 100;
        config
    }

    #[test]
    fn test_artifact_names() {
        let artifacts = TableArtifacts::in_dir(Path::new("out/brands"), "brands");
        assert_eq!(artifacts.csv, Path::new("out/brands/brands.csv"));
        assert_eq!(
            artifacts.profile,
            Path::new("out/brands/brands_profile_output.html")
        );
        assert_eq!(
            artifacts.plots,
            Path::new("out/brands/brands_missingno_output.png")
        );
    }

    #[test]
    fn test_writes_all_three_files() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path(), true);
        let artifacts = analyze_and_save(&sample_table(), &config).unwrap();
        assert!(artifacts.csv.is_file());
        assert!(artifacts.profile.is_file());
        assert!(artifacts.plots.is_file());
    }

    #[test]
    fn test_missing_directory_fails_without_create() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path(), false);
        let err = analyze_and_save(&sample_table(), &config).unwrap_err();
        assert!(matches!(err, EdaError::Io { .. }));
        assert!(!dir.path().join("scores").exists());
    }

    #[test]
    fn test_existing_directory_is_used() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("scores")).unwrap();
        let config = config_for(dir.path(), false);
        let artifacts = analyze_and_save(&sample_table(), &config).unwrap();
        assert!(artifacts.csv.is_file());
    }
}
