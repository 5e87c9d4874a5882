use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdaError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path} at line {line}: {source}")]
    JsonLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dataframe operation failed: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Table '{table}' has {actual} columns but {expected} names were supplied")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Table '{table}' would contain column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("Table '{table}' has column '{column}' with no entry in its schema")]
    UnmappedColumn { table: String, column: String },

    #[error("Table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("Column '{column}' row {row}: '{value}' is not an epoch-millisecond timestamp")]
    InvalidTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl EdaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EdaError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EdaError>;
