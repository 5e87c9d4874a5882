use crate::error::{EdaError, Result};
use crate::table::{Table, TIMESTAMP_FORMAT};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Write `table` as comma-separated text with a header row.
///
/// Nulls are written as empty fields; timestamps use the table's timestamp
/// format.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|e| EdaError::io(path, e))?;
    let mut frame = table.frame().clone();

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_datetime_format(Some(TIMESTAMP_FORMAT.to_string()))
        .finish(&mut frame)?;

    debug!("Wrote {} rows to {}", table.row_count(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use std::fs;
    use tempfile::tempdir;

    fn table(values: Vec<Value>) -> Table {
        let rows: Vec<Map<String, Value>> = values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        Table::from_rows("t", rows).unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let table = table(vec![
            json!({"id": "a", "qty": 2, "ok": true}),
            json!({"id": "b, c", "ok": false}),
        ]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        write_csv(&table, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,qty,ok");
        assert_eq!(lines[1], "a,2,true");
        // Embedded separator is quoted, missing qty is an empty field
        assert_eq!(lines[2], "\"b, c\",,false");
    }

    #[test]
    fn test_timestamps_use_table_format() {
        let mut table = table(vec![json!({"when": 1609687537858_i64}), json!({"when": 0})]);
        table.convert_timestamps(&["when"]).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        write_csv(&table, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["when", "2021-01-03 15:25:37.858", "1970-01-01 00:00:00"]);
    }

    #[test]
    fn test_empty_table_writes_single_line() {
        let mut table = Table::from_rows("empty", Vec::new()).unwrap();
        table.apply_schema(&[("a", "a"), ("b", "b")]).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_csv(&table, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["a,b"]);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let table = Table::from_rows("t", Vec::new()).unwrap();
        let err = write_csv(&table, &dir.path().join("nope").join("t.csv")).unwrap_err();
        assert!(matches!(err, EdaError::Io { .. }));
    }
}
