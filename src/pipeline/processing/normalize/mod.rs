use polars::prelude::*;
use serde_json::Value;
use tracing::debug;

use crate::constants::{
    BONUS_POINT_REASONS_TABLE, BONUS_POINT_REASON_COLUMNS, BRANDS_TABLE, BRAND_COLUMNS,
    LINE_ITEMS_TABLE, LINE_ITEM_COLUMNS, LINE_ITEM_ID_FIELD, PARTNER_ITEM_ID_KEY,
    RECEIPTS_TABLE, RECEIPT_COLUMNS, RECEIPT_ID_FIELD, RECEIPT_ROOT_KEYS_TO_IGNORE,
    RECEIPT_TIMESTAMP_COLUMNS, USERS_TABLE, USER_COLUMNS, USER_TIMESTAMP_COLUMNS,
};
use crate::error::{EdaError, Result};
use crate::pipeline::processing::flatten::flatten;
use crate::table::Table;

/// How one final table is produced from its source records
#[derive(Debug, Clone, Copy)]
pub struct TableLayout {
    pub name: &'static str,
    /// Top-level keys left out of flattening
    pub root_keys_to_ignore: &'static [&'static str],
    /// `(flattened key, output column)` pairs in output order
    pub columns: &'static [(&'static str, &'static str)],
    /// Output columns holding epoch milliseconds
    pub timestamp_columns: &'static [&'static str],
}

pub const RECEIPTS_LAYOUT: TableLayout = TableLayout {
    name: RECEIPTS_TABLE,
    root_keys_to_ignore: RECEIPT_ROOT_KEYS_TO_IGNORE,
    columns: RECEIPT_COLUMNS,
    timestamp_columns: RECEIPT_TIMESTAMP_COLUMNS,
};

pub const LINE_ITEMS_LAYOUT: TableLayout = TableLayout {
    name: LINE_ITEMS_TABLE,
    root_keys_to_ignore: &[],
    columns: LINE_ITEM_COLUMNS,
    timestamp_columns: &[],
};

pub const USERS_LAYOUT: TableLayout = TableLayout {
    name: USERS_TABLE,
    root_keys_to_ignore: &[],
    columns: USER_COLUMNS,
    timestamp_columns: USER_TIMESTAMP_COLUMNS,
};

pub const BRANDS_LAYOUT: TableLayout = TableLayout {
    name: BRANDS_TABLE,
    root_keys_to_ignore: &[],
    columns: BRAND_COLUMNS,
    timestamp_columns: &[],
};

pub const BONUS_POINT_REASONS_LAYOUT: TableLayout = TableLayout {
    name: BONUS_POINT_REASONS_TABLE,
    root_keys_to_ignore: &[],
    columns: BONUS_POINT_REASON_COLUMNS,
    timestamp_columns: &[],
};

/// Flatten records into a table named after the layout, before any renaming
pub fn flatten_records(layout: &TableLayout, records: &[Value]) -> Result<Table> {
    let rows = records
        .iter()
        .map(|record| flatten(record, layout.root_keys_to_ignore))
        .collect();
    Table::from_rows(layout.name, rows)
}

/// Rename columns by schema, then convert timestamp columns
pub fn normalize_table(layout: &TableLayout, table: &mut Table) -> Result<()> {
    table.apply_schema(layout.columns)?;
    table.convert_timestamps(layout.timestamp_columns)?;
    debug!(
        "Normalized {}: {} rows x {} columns",
        layout.name,
        table.row_count(),
        table.column_count()
    );
    Ok(())
}

/// Flatten and normalize records that need no derived columns
pub fn build_table(layout: &TableLayout, records: &[Value]) -> Result<Table> {
    let mut table = flatten_records(layout, records)?;
    normalize_table(layout, &mut table)?;
    Ok(table)
}

/// Build the line-item table, adding the synthetic `line_item_id` key
pub fn build_line_items_table(line_items: &[Value]) -> Result<Table> {
    let mut table = flatten_records(&LINE_ITEMS_LAYOUT, line_items)?;
    add_line_item_id(&mut table)?;
    normalize_table(&LINE_ITEMS_LAYOUT, &mut table)?;
    Ok(table)
}

/// Append `line_item_id` = receipt id followed by the partner item id.
///
/// A null partner item id contributes the empty string, never a placeholder
/// such as `nan`, so such an item's key is its receipt id alone.
pub fn add_line_item_id(table: &mut Table) -> Result<()> {
    if !table.has_column(RECEIPT_ID_FIELD) {
        // No line items at all: the schema declares the empty columns
        if table.row_count() == 0 {
            return Ok(());
        }
        return Err(EdaError::UnknownColumn {
            table: table.name().to_string(),
            column: RECEIPT_ID_FIELD.to_string(),
        });
    }

    let receipt_ids = table.column(RECEIPT_ID_FIELD)?.cast(&DataType::String)?;
    let partner_ids = match table.column(PARTNER_ITEM_ID_KEY) {
        Ok(series) => series.cast(&DataType::String)?,
        Err(_) => Series::full_null(
            PARTNER_ITEM_ID_KEY.into(),
            table.row_count(),
            &DataType::String,
        ),
    };

    let ids: Vec<String> = receipt_ids
        .str()?
        .into_iter()
        .zip(partner_ids.str()?.into_iter())
        .map(|(receipt, partner)| {
            format!("{}{}", receipt.unwrap_or_default(), partner.unwrap_or_default())
        })
        .collect();

    table.push_column(Series::new(LINE_ITEM_ID_FIELD.into(), ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::timestamp_type;
    use serde_json::{json, Map};

    fn receipt() -> Value {
        json!({
            "_id": {"$oid": "5ff1e1eb0a720f0523000575"},
            "bonusPointsEarned": 500,
            "bonusPointsEarnedReason": "Receipt number 2 completed, bonus point schedule DEFAULT (5cd1b5)",
            "createDate": {"$date": 1609687531000i64},
            "dateScanned": {"$date": 1609687531000i64},
            "finishedDate": {"$date": 1609687531000i64},
            "modifyDate": {"$date": 1609687536000i64},
            "pointsAwardedDate": {"$date": 1609687531000i64},
            "pointsEarned": "500.0",
            "purchaseDate": {"$date": 1609632000000i64},
            "purchasedItemCount": 5,
            "rewardsReceiptItemList": [
                {"barcode": "4011", "description": "ITEM NOT FOUND", "partnerItemId": "1"}
            ],
            "rewardsReceiptStatus": "FINISHED",
            "totalSpent": "26.00",
            "userId": "5ff1e1eacfcf6c399c274ae6"
        })
    }

    /// A line item carrying every declared key, null unless overridden
    fn line_item(fields: Value) -> Value {
        let mut item: Map<String, Value> = LINE_ITEM_COLUMNS
            .iter()
            .filter(|(source, _)| *source != LINE_ITEM_ID_FIELD)
            .map(|(source, _)| (source.to_string(), Value::Null))
            .collect();
        if let Value::Object(fields) = fields {
            item.extend(fields);
        }
        Value::Object(item)
    }

    fn text(table: &Table, column: &str, row: usize) -> Option<String> {
        let series = table.column(column).unwrap().cast(&DataType::String).unwrap();
        series.str().unwrap().get(row).map(str::to_string)
    }

    #[test]
    fn test_receipts_table_renamed_and_converted() {
        let table = build_table(&RECEIPTS_LAYOUT, &[receipt()]).unwrap();
        let expected: Vec<&str> = RECEIPT_COLUMNS.iter().map(|(_, name)| *name).collect();
        assert_eq!(table.columns(), expected);
        assert_eq!(
            text(&table, "receipt_id", 0).as_deref(),
            Some("5ff1e1eb0a720f0523000575")
        );
        let created = table.column("created_date").unwrap();
        assert_eq!(created.dtype(), &timestamp_type());
        let millis = created.cast(&DataType::Int64).unwrap();
        assert_eq!(millis.i64().unwrap().get(0), Some(1609687531000));
        assert_eq!(text(&table, "total_spent", 0).as_deref(), Some("26.00"));
    }

    #[test]
    fn test_receipt_missing_declared_field_fails() {
        let mut record = receipt();
        record.as_object_mut().unwrap().remove("finishedDate");
        match build_table(&RECEIPTS_LAYOUT, &[record]).unwrap_err() {
            EdaError::ColumnCountMismatch {
                table,
                expected,
                actual,
            } => {
                assert_eq!(table, RECEIPTS_TABLE);
                assert_eq!(expected, RECEIPT_COLUMNS.len());
                assert_eq!(actual, RECEIPT_COLUMNS.len() - 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_field_present_in_any_record_is_enough() {
        let mut partial = receipt();
        partial.as_object_mut().unwrap().remove("finishedDate");
        let table = build_table(&RECEIPTS_LAYOUT, &[partial, receipt()]).unwrap();
        assert_eq!(table.column("finished_date").unwrap().null_count(), 1);
    }

    #[test]
    fn test_receipt_key_order_does_not_matter() {
        let mut shuffled = Map::new();
        let original = receipt();
        for (key, value) in original.as_object().unwrap().iter().rev() {
            shuffled.insert(key.clone(), value.clone());
        }
        let table = build_table(&RECEIPTS_LAYOUT, &[Value::Object(shuffled)]).unwrap();
        assert_eq!(table.columns()[0], "receipt_id");
        assert_eq!(
            text(&table, "user_id", 0).as_deref(),
            Some("5ff1e1eacfcf6c399c274ae6")
        );
    }

    #[test]
    fn test_unexpected_receipt_field_fails() {
        let mut record = receipt();
        record["surprise"] = json!(1);
        assert!(matches!(
            build_table(&RECEIPTS_LAYOUT, &[record]),
            Err(EdaError::UnmappedColumn { .. })
        ));
    }

    #[test]
    fn test_line_item_id_concatenates_keys() {
        let items = vec![
            line_item(json!({"barcode": "4011", "partnerItemId": "1", "receipt_id": "r1"})),
            line_item(json!({"barcode": "4012", "receipt_id": "r2"})),
        ];
        let table = build_line_items_table(&items).unwrap();
        assert_eq!(table.column_count(), LINE_ITEM_COLUMNS.len());
        assert_eq!(table.columns().last().unwrap(), "line_item_id");
        assert_eq!(text(&table, "line_item_id", 0).as_deref(), Some("r11"));
        // Null partner item id adds nothing
        assert_eq!(text(&table, "line_item_id", 1).as_deref(), Some("r2"));
        assert_eq!(text(&table, "partner_item_id", 0).as_deref(), Some("1"));
    }

    #[test]
    fn test_incomplete_line_items_fail() {
        let items = vec![json!({"barcode": "4011", "partnerItemId": "1", "receipt_id": "r1"})];
        assert!(matches!(
            build_line_items_table(&items),
            Err(EdaError::ColumnCountMismatch { .. })
        ));
    }

    #[test]
    fn test_no_line_items_gives_empty_table() {
        let table = build_line_items_table(&[]).unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), LINE_ITEM_COLUMNS.len());
    }

    #[test]
    fn test_brands_nested_ref_columns() {
        let brand = json!({
            "_id": {"$oid": "601ac115be37ce2ead437551"},
            "barcode": "511111019862",
            "brandCode": null,
            "category": "Baking",
            "categoryCode": "BAKING",
            "cpg": {"$id": {"$oid": "601ac114be37ce2ead437550"}, "$ref": "Cogs"},
            "name": "test brand @1612366101024",
            "topBrand": false
        });
        let table = build_table(&BRANDS_LAYOUT, &[brand]).unwrap();
        assert_eq!(
            text(&table, "cpg_id", 0).as_deref(),
            Some("601ac114be37ce2ead437550")
        );
        assert_eq!(table.column("top_brand").unwrap().bool().unwrap().get(0), Some(false));
        assert_eq!(table.column("brand_code").unwrap().null_count(), 1);
    }

    #[test]
    fn test_users_timestamps() {
        let user = json!({
            "_id": {"$oid": "5ff1e194b6a9d73a3a9f1052"},
            "active": true,
            "createdDate": {"$date": 1609687444800i64},
            "lastLogin": {"$date": 1609687537858i64},
            "role": "consumer",
            "signUpSource": "Email",
            "state": "WI"
        });
        let table = build_table(&USERS_LAYOUT, &[user]).unwrap();
        let last_login = table.column("last_login").unwrap().cast(&DataType::Int64).unwrap();
        assert_eq!(last_login.i64().unwrap().get(0), Some(1609687537858));
    }
}
