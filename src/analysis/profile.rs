//! Descriptive profile of a table, rendered to a self-contained HTML report
//! through the `profile.html` template.
//!
//! The report covers table-level counts and per-column statistics chosen by
//! the column type. Minimal mode skips pairwise correlations.

use crate::analysis::stats::{as_float, pearson};
use crate::config::ProfileConfig;
use crate::error::{EdaError, Result};
use crate::table::{timestamp_from_millis, Table, TIMESTAMP_FORMAT};
use askama::Template;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct TableProfile {
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub row_count: usize,
    pub column_count: usize,
    pub missing_cells: usize,
    pub missing_cells_pct: f64,
    pub duplicate_rows: usize,
    pub columns: Vec<ColumnProfile>,
    pub correlations: Option<CorrelationMatrix>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Text,
    Timestamp,
    Empty,
}

impl ColumnKind {
    fn label(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "Numeric",
            ColumnKind::Boolean => "Boolean",
            ColumnKind::Text => "Text",
            ColumnKind::Timestamp => "Timestamp",
            ColumnKind::Empty => "Empty",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub count: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub distinct: usize,
    pub distinct_pct: f64,
    pub details: ColumnDetails,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnDetails {
    Numeric(NumericStats),
    Boolean { true_count: usize, false_count: usize },
    Text(TextStats),
    Timestamp { min: String, max: String },
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: Option<f64>,
    pub median: f64,
    pub zeros: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextStats {
    pub min_length: usize,
    pub max_length: usize,
    pub mean_length: f64,
    pub top_values: Vec<ValueCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn profile_table(table: &Table, settings: &ProfileConfig) -> Result<TableProfile> {
    let frame = table.frame();
    let row_count = frame.height();
    let columns = frame
        .get_columns()
        .iter()
        .map(|column| profile_column(column.as_materialized_series(), settings))
        .collect::<Result<Vec<_>>>()?;

    let missing_cells: usize = columns.iter().map(|c| c.missing).sum();
    let total_cells = row_count * frame.width();

    let correlations = if settings.minimal {
        None
    } else {
        Some(numeric_correlations(frame, &columns)?)
    };

    Ok(TableProfile {
        name: table.name().to_string(),
        generated_at: Utc::now(),
        row_count,
        column_count: frame.width(),
        missing_cells,
        missing_cells_pct: pct(missing_cells, total_cells),
        duplicate_rows: count_duplicate_rows(frame)?,
        columns,
        correlations,
    })
}

fn profile_column(series: &Series, settings: &ProfileConfig) -> Result<ColumnProfile> {
    let missing = series.null_count();
    let count = series.len() - missing;
    let distinct = series.drop_nulls().n_unique()?;

    let kind = column_kind(series);
    let details = match kind {
        ColumnKind::Numeric => {
            numeric_stats(series)?.map_or(ColumnDetails::None, ColumnDetails::Numeric)
        }
        ColumnKind::Boolean => {
            let true_count = series.bool()?.num_trues();
            ColumnDetails::Boolean {
                true_count,
                false_count: count - true_count,
            }
        }
        ColumnKind::Timestamp => {
            let millis = series.cast(&DataType::Int64)?;
            let millis = millis.i64()?;
            let min = millis.min().and_then(timestamp_from_millis);
            let max = millis.max().and_then(timestamp_from_millis);
            match (min, max) {
                (Some(min), Some(max)) => ColumnDetails::Timestamp {
                    min: min.format(TIMESTAMP_FORMAT).to_string(),
                    max: max.format(TIMESTAMP_FORMAT).to_string(),
                },
                _ => ColumnDetails::None,
            }
        }
        ColumnKind::Text => {
            let texts = series.cast(&DataType::String)?;
            ColumnDetails::Text(text_stats(texts.str()?, settings.top_values))
        }
        ColumnKind::Empty => ColumnDetails::None,
    };

    Ok(ColumnProfile {
        name: series.name().to_string(),
        kind,
        count,
        missing,
        missing_pct: pct(missing, series.len()),
        distinct,
        distinct_pct: pct(distinct, count),
        details,
    })
}

fn column_kind(series: &Series) -> ColumnKind {
    if series.null_count() == series.len() {
        return ColumnKind::Empty;
    }
    match series.dtype() {
        DataType::Int64 | DataType::Float64 => ColumnKind::Numeric,
        DataType::Boolean => ColumnKind::Boolean,
        DataType::Datetime(_, _) => ColumnKind::Timestamp,
        _ => ColumnKind::Text,
    }
}

fn numeric_stats(series: &Series) -> Result<Option<NumericStats>> {
    let Some(values) = as_float(series)? else {
        return Ok(None);
    };
    let (Some(min), Some(max), Some(mean), Some(median)) =
        (values.min(), values.max(), values.mean(), values.median())
    else {
        return Ok(None);
    };
    let present = values.len() - values.null_count();

    Ok(Some(NumericStats {
        min,
        max,
        mean,
        // Sample deviation needs two values
        std: if present > 1 { values.std(1) } else { None },
        median,
        zeros: values.equal(0.0).num_trues(),
    }))
}

fn text_stats(texts: &StringChunked, top_n: usize) -> TextStats {
    let lengths: Vec<usize> = texts.into_iter().flatten().map(|t| t.chars().count()).collect();
    let mean_length = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for text in texts.into_iter().flatten() {
        *counts.entry(text).or_insert(0) += 1;
    }
    let mut top: Vec<(&str, usize)> = counts.into_iter().collect();
    // Most frequent first, ties broken alphabetically for stable output
    top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    top.truncate(top_n);

    TextStats {
        min_length: lengths.iter().copied().min().unwrap_or(0),
        max_length: lengths.iter().copied().max().unwrap_or(0),
        mean_length,
        top_values: top
            .into_iter()
            .map(|(value, count)| ValueCount {
                value: value.to_string(),
                count,
            })
            .collect(),
    }
}

fn numeric_correlations(frame: &DataFrame, columns: &[ColumnProfile]) -> Result<CorrelationMatrix> {
    let mut names = Vec::new();
    let mut values = Vec::new();
    for (column, profile) in frame.get_columns().iter().zip(columns) {
        if profile.kind != ColumnKind::Numeric {
            continue;
        }
        if let Some(floats) = as_float(column.as_materialized_series())? {
            names.push(profile.name.clone());
            values.push(floats);
        }
    }

    let mut matrix = vec![vec![None; values.len()]; values.len()];
    for (a, xs) in values.iter().enumerate() {
        for (b, ys) in values.iter().enumerate() {
            matrix[a][b] = pearson(xs, ys)?;
        }
    }

    Ok(CorrelationMatrix {
        columns: names,
        values: matrix,
    })
}

fn count_duplicate_rows(frame: &DataFrame) -> Result<usize> {
    if frame.width() == 0 || frame.height() == 0 {
        return Ok(0);
    }
    let unique = frame.unique_stable(None, UniqueKeepStrategy::First, None)?;
    Ok(frame.height() - unique.height())
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Write the profile as HTML to `path`
pub fn write_profile(profile: &TableProfile, path: &Path) -> Result<()> {
    let html = ProfileTemplate::new(profile)?.render()?;
    fs::write(path, html).map_err(|e| EdaError::io(path, e))
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate<'a> {
    profile: &'a TableProfile,
    generated: String,
    overview: Vec<Stat>,
    columns: Vec<ColumnView<'a>>,
    correlations: Option<CorrelationView>,
    /// Profile as JSON, with `</` escaped so it cannot close the script tag
    payload: String,
}

struct Stat {
    label: &'static str,
    value: String,
    warn: bool,
}

impl Stat {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            warn: false,
        }
    }
}

struct ColumnView<'a> {
    name: &'a str,
    kind: &'static str,
    stats: Vec<Stat>,
    top_values: &'a [ValueCount],
}

struct CorrelationView {
    columns: Vec<String>,
    rows: Vec<CorrelationRow>,
}

struct CorrelationRow {
    name: String,
    cells: Vec<String>,
}

impl<'a> ProfileTemplate<'a> {
    fn new(profile: &'a TableProfile) -> Result<Self> {
        let overview = vec![
            Stat::new("Rows", profile.row_count.to_string()),
            Stat::new("Columns", profile.column_count.to_string()),
            Stat::new(
                "Missing cells",
                format!("{} ({:.1}%)", profile.missing_cells, profile.missing_cells_pct),
            ),
            Stat::new("Duplicate rows", profile.duplicate_rows.to_string()),
        ];

        let payload = serde_json::to_string(profile)?.replace("</", "<\\/");

        Ok(Self {
            profile,
            generated: profile.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            overview,
            columns: profile.columns.iter().map(ColumnView::new).collect(),
            correlations: profile.correlations.as_ref().map(CorrelationView::new),
            payload,
        })
    }
}

impl<'a> ColumnView<'a> {
    fn new(column: &'a ColumnProfile) -> Self {
        let mut stats = vec![
            Stat::new("Count", column.count.to_string()),
            Stat {
                label: "Missing",
                value: format!("{} ({:.1}%)", column.missing, column.missing_pct),
                warn: column.missing > 0,
            },
            Stat::new(
                "Distinct",
                format!("{} ({:.1}%)", column.distinct, column.distinct_pct),
            ),
        ];
        let mut top_values: &[ValueCount] = &[];

        match &column.details {
            ColumnDetails::Numeric(numeric) => {
                stats.push(Stat::new("Min", format_number(numeric.min)));
                stats.push(Stat::new("Max", format_number(numeric.max)));
                stats.push(Stat::new("Mean", format_number(numeric.mean)));
                let std = numeric.std.map(format_number).unwrap_or_else(|| "n/a".to_string());
                stats.push(Stat::new("Std. deviation", std));
                stats.push(Stat::new("Median", format_number(numeric.median)));
                stats.push(Stat::new("Zeros", numeric.zeros.to_string()));
            }
            ColumnDetails::Boolean {
                true_count,
                false_count,
            } => {
                stats.push(Stat::new("True", true_count.to_string()));
                stats.push(Stat::new("False", false_count.to_string()));
            }
            ColumnDetails::Timestamp { min, max } => {
                stats.push(Stat::new("Earliest", min.as_str()));
                stats.push(Stat::new("Latest", max.as_str()));
            }
            ColumnDetails::Text(text) => {
                stats.push(Stat::new(
                    "Length (min / mean / max)",
                    format!(
                        "{} / {:.1} / {}",
                        text.min_length, text.mean_length, text.max_length
                    ),
                ));
                top_values = &text.top_values;
            }
            ColumnDetails::None => {}
        }

        Self {
            name: &column.name,
            kind: column.kind.label(),
            stats,
            top_values,
        }
    }
}

impl CorrelationView {
    fn new(matrix: &CorrelationMatrix) -> Self {
        let rows = matrix
            .columns
            .iter()
            .zip(&matrix.values)
            .map(|(name, values)| CorrelationRow {
                name: name.clone(),
                cells: values
                    .iter()
                    .map(|v| v.map(|v| format!("{v:.3}")).unwrap_or_default())
                    .collect(),
            })
            .collect();
        Self {
            columns: matrix.columns.clone(),
            rows,
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
