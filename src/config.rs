use crate::error::{EdaError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "eda.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub profile: ProfileConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding receipts.json, brands.json and users.json
    pub data_dir: PathBuf,
    /// Root for the per-table result directories
    pub output_dir: PathBuf,
    /// Create `<output_dir>/<table>` when missing instead of failing
    pub create_output_dirs: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("eda_results"),
            create_output_dirs: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Skip pairwise correlations
    pub minimal: bool,
    /// Most frequent values listed per text column
    pub top_values: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            minimal: true,
            top_values: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 2400,
            height: 1200,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `eda.toml` in the working
    /// directory is used if present, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EdaError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.render.width < 2 || self.render.height < 2 {
            return Err(EdaError::Config(format!(
                "render size {}x{} is too small for a 2x2 grid",
                self.render.width, self.render.height
            )));
        }
        Ok(())
    }

    /// Directory that receives every artifact for one table
    pub fn table_dir(&self, table_name: &str) -> PathBuf {
        self.paths.output_dir.join(table_name)
    }
}
