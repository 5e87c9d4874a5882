// Pipeline ingestion: reading newline-delimited JSON datasets

use crate::config::PathsConfig;
use crate::constants::{BRANDS_FILE, RECEIPTS_FILE, USERS_FILE};
use crate::error::{EdaError, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, instrument};

/// The three raw datasets, each in file order
#[derive(Debug, Clone, Default)]
pub struct RawDatasets {
    pub receipts: Vec<Value>,
    pub brands: Vec<Value>,
    pub users: Vec<Value>,
}

/// Parse a newline-delimited JSON file into one record per line.
///
/// Every line must hold one JSON document; a blank line is malformed. A final
/// trailing newline does not count as an extra line.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_json_lines(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path).map_err(|e| EdaError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| EdaError::io(path, e))?;
        let record = serde_json::from_str(&line).map_err(|source| EdaError::JsonLine {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }

    debug!("Loaded {} records", records.len());
    Ok(records)
}

/// Load receipts, brands and users from the configured data directory
pub fn load_datasets(paths: &PathsConfig) -> Result<RawDatasets> {
    debug!("> \"{}\"", RECEIPTS_FILE);
    let receipts = load_json_lines(&paths.data_dir.join(RECEIPTS_FILE))?;

    debug!("> \"{}\"", BRANDS_FILE);
    let brands = load_json_lines(&paths.data_dir.join(BRANDS_FILE))?;

    debug!("> \"{}\"", USERS_FILE);
    let users = load_json_lines(&paths.data_dir.join(USERS_FILE))?;

    Ok(RawDatasets {
        receipts,
        brands,
        users,
    })
}
