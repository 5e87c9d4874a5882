use crate::error::{EdaError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Rendering used for timestamps in CSV output and the profile report
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Column type of converted timestamp columns
pub fn timestamp_type() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

/// Interpret `millis` as milliseconds since the Unix epoch
pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// A named dataframe with an explicit column order
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    frame: DataFrame,
}

impl Table {
    /// Build a table from flattened rows.
    ///
    /// Columns are the union of row keys in order of first appearance; keys a
    /// row lacks become nulls. Each column takes the narrowest type that holds
    /// all of its values: boolean, integer, float, else string.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Map<String, Value>>) -> Result<Self> {
        let mut keys: IndexSet<&str> = IndexSet::new();
        for row in &rows {
            keys.extend(row.keys().map(String::as_str));
        }

        let columns: Vec<Column> = keys
            .iter()
            .map(|key| {
                let values: Vec<Option<&Value>> = rows.iter().map(|row| row.get(*key)).collect();
                infer_series(key, &values).into_column()
            })
            .collect();

        Ok(Self {
            name: name.into(),
            frame: DataFrame::new(columns)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.frame.get_column_index(column).is_some()
    }

    pub fn column(&self, column: &str) -> Result<&Series> {
        self.frame
            .column(column)
            .map(Column::as_materialized_series)
            .map_err(|_| self.unknown(column))
    }

    /// Append a column computed outside the table
    pub fn push_column(&mut self, series: Series) -> Result<()> {
        if self.has_column(series.name()) {
            return Err(EdaError::DuplicateColumn {
                table: self.name.clone(),
                column: series.name().to_string(),
            });
        }
        if self.frame.width() > 0 && series.len() != self.frame.height() {
            return Err(EdaError::ColumnCountMismatch {
                table: self.name.clone(),
                expected: self.frame.height(),
                actual: series.len(),
            });
        }
        self.frame.with_column(series)?;
        Ok(())
    }

    /// Rename and reorder columns by name.
    ///
    /// `schema` lists `(source column, output column)` pairs in output order.
    /// The data must hold exactly the declared sources: an extra column is
    /// `UnmappedColumn`, an absent one is `ColumnCountMismatch`. A table with
    /// no records has no columns and gets every declared column, empty.
    pub fn apply_schema(&mut self, schema: &[(&str, &str)]) -> Result<()> {
        ensure_unique(&self.name, schema.iter().map(|(source, _)| *source))?;
        ensure_unique(&self.name, schema.iter().map(|(_, target)| *target))?;

        if self.frame.width() == 0 {
            let columns = schema
                .iter()
                .map(|(_, target)| {
                    Series::full_null((*target).into(), self.frame.height(), &DataType::String)
                        .into_column()
                })
                .collect();
            self.frame = DataFrame::new(columns)?;
            return Ok(());
        }

        let sources: HashSet<&str> = schema.iter().map(|(source, _)| *source).collect();
        if let Some(column) = self
            .frame
            .get_columns()
            .iter()
            .find(|c| !sources.contains(c.name().as_str()))
        {
            return Err(EdaError::UnmappedColumn {
                table: self.name.clone(),
                column: column.name().to_string(),
            });
        }
        // Every column is a declared source, so a shorter frame lacks one
        if self.frame.width() != schema.len() {
            return Err(EdaError::ColumnCountMismatch {
                table: self.name.clone(),
                expected: schema.len(),
                actual: self.frame.width(),
            });
        }

        let mut frame = self.frame.select(schema.iter().map(|(source, _)| *source))?;
        frame.set_column_names(schema.iter().map(|(_, target)| *target))?;
        self.frame = frame;
        Ok(())
    }

    /// Rewrite the named columns from epoch milliseconds to timestamps
    pub fn convert_timestamps(&mut self, columns: &[&str]) -> Result<()> {
        for column in columns {
            let series = self.column(column)?;
            if series.dtype() == &timestamp_type() {
                continue;
            }
            let converted = millis_series(column, series)?.cast(&timestamp_type())?;
            self.frame.replace(column, converted)?;
        }
        Ok(())
    }

    fn unknown(&self, column: &str) -> EdaError {
        EdaError::UnknownColumn {
            table: self.name.clone(),
            column: column.to_string(),
        }
    }
}

/// Series for one flattened key; absent keys and JSON nulls are nulls
fn infer_series(name: &str, values: &[Option<&Value>]) -> Series {
    let name = PlSmallStr::from(name);
    let present = || values.iter().flatten().filter(|v| !v.is_null());

    if present().next().is_none() {
        return Series::full_null(name, values.len(), &DataType::String);
    }
    if present().all(|v| v.is_boolean()) {
        let data: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
        return Series::new(name, data);
    }
    if present().all(|v| v.is_i64()) {
        let data: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
        return Series::new(name, data);
    }
    if present().all(|v| v.is_number()) {
        let data: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
        return Series::new(name, data);
    }
    let data: Vec<Option<String>> = values
        .iter()
        .map(|v| match v {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            // Mixed columns and empty containers keep their JSON text
            Some(other) => Some(other.to_string()),
        })
        .collect();
    Series::new(name, data)
}

/// Epoch milliseconds as an `Int64` series; any value that is not a number
/// or numeric text is an error naming its row
fn millis_series(column: &str, series: &Series) -> Result<Series> {
    let invalid = |row: usize, value: String| EdaError::InvalidTimestamp {
        column: column.to_string(),
        row,
        value,
    };

    let millis: Vec<Option<i64>> = match series.dtype() {
        DataType::Int64 => return Ok(series.clone()),
        DataType::Float64 => series
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                None => Ok(None),
                Some(f) => float_to_millis(f)
                    .map(Some)
                    .ok_or_else(|| invalid(row, f.to_string())),
            })
            .collect::<Result<_>>()?,
        DataType::String => {
            let parsed = series.cast(&DataType::Float64)?;
            series
                .str()?
                .into_iter()
                .zip(parsed.f64()?.into_iter())
                .enumerate()
                .map(|(row, pair)| match pair {
                    (None, _) => Ok(None),
                    (Some(text), Some(f)) => float_to_millis(f)
                        .map(Some)
                        .ok_or_else(|| invalid(row, text.to_string())),
                    (Some(text), None) => Err(invalid(row, text.to_string())),
                })
                .collect::<Result<_>>()?
        }
        _ => {
            let present = series.is_not_null();
            if let Some(row) = present.into_iter().position(|p| p == Some(true)) {
                return Err(invalid(row, series.get(row)?.to_string()));
            }
            vec![None; series.len()]
        }
    };
    Ok(Series::new(series.name().clone(), millis))
}

fn float_to_millis(f: f64) -> Option<i64> {
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Some(f.round() as i64)
    } else {
        None
    }
}

fn ensure_unique<'a>(table: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(EdaError::DuplicateColumn {
                table: table.to_string(),
                column: name.to_string(),
            });
        }
    }
    Ok(())
}
