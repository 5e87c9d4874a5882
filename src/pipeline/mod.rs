// Pipeline: ingestion of the raw JSON-lines files, processing into tables and
// the per-table analysis outputs.

pub mod ingestion;
pub mod processing;

use crate::analysis::{analyze_and_save, TableArtifacts};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::ingestion::{load_datasets, RawDatasets};
use crate::pipeline::processing::normalize::{
    BONUS_POINT_REASONS_LAYOUT, BRANDS_LAYOUT, RECEIPTS_LAYOUT, USERS_LAYOUT,
};
use crate::pipeline::processing::{
    build_line_items_table, build_table, extract_bonus_point_reasons, extract_line_items,
};
use crate::table::Table;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Outcome for one finished table
#[derive(Debug, Serialize)]
pub struct TableResult {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub artifacts: TableArtifacts,
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub tables: Vec<TableResult>,
    pub duration_secs: f64,
}

impl PipelineResult {
    pub fn table(&self, name: &str) -> Option<&TableResult> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Build every table from the raw datasets, in output order: receipts,
/// line items, users, brands, bonus point reasons.
pub fn build_tables(raw: &RawDatasets) -> Result<Vec<Table>> {
    info!("Extracting line items and bonus point reasons...");
    let line_items = extract_line_items(&raw.receipts)?;
    let bonus_point_reasons = extract_bonus_point_reasons(&raw.receipts)?;
    debug!(
        "Extracted {} line items and {} bonus point reasons",
        line_items.len(),
        bonus_point_reasons.len()
    );

    info!("Flattening and normalizing tables...");
    Ok(vec![
        build_table(&RECEIPTS_LAYOUT, &raw.receipts)?,
        build_line_items_table(&line_items)?,
        build_table(&USERS_LAYOUT, &raw.users)?,
        build_table(&BRANDS_LAYOUT, &raw.brands)?,
        build_table(&BONUS_POINT_REASONS_LAYOUT, &bonus_point_reasons)?,
    ])
}

/// Run the whole EDA: load, extract, normalize, then export and analyze each
/// table. The first failure aborts the run.
#[instrument(skip_all)]
pub fn run_pipeline(config: &Config) -> Result<PipelineResult> {
    let start = Instant::now();

    info!("----START----- reading and parsing json files...");
    let raw = load_datasets(&config.paths)?;
    info!(
        "Loaded {} receipts, {} brands, {} users",
        raw.receipts.len(),
        raw.brands.len(),
        raw.users.len()
    );

    let tables = build_tables(&raw)?;

    let mut results = Vec::with_capacity(tables.len());
    for table in &tables {
        info!("> {}", table.name());
        let artifacts = analyze_and_save(table, config)?;
        results.push(TableResult {
            name: table.name().to_string(),
            rows: table.row_count(),
            columns: table.column_count(),
            artifacts,
        });
    }

    let duration_secs = start.elapsed().as_secs_f64();
    info!("-----END------ {} tables in {:.2}s", results.len(), duration_secs);
    Ok(PipelineResult {
        tables: results,
        duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        BONUS_POINT_REASONS_TABLE, BRANDS_TABLE, LINE_ITEMS_TABLE, LINE_ITEM_COLUMNS,
        LINE_ITEM_ID_FIELD, RECEIPTS_TABLE, RECEIPT_ID_FIELD, USERS_TABLE,
    };
    use crate::error::EdaError;
    use serde_json::{json, Map, Value};

    /// Every line-item key the schema expects before extraction, all null
    fn item(barcode: &str, partner_item_id: &str) -> Value {
        let mut item: Map<String, Value> = LINE_ITEM_COLUMNS
            .iter()
            .map(|(source, _)| *source)
            .filter(|source| ![RECEIPT_ID_FIELD, LINE_ITEM_ID_FIELD].contains(source))
            .map(|source| (source.to_string(), Value::Null))
            .collect();
        item.insert("barcode".into(), json!(barcode));
        item.insert("partnerItemId".into(), json!(partner_item_id));
        Value::Object(item)
    }

    fn raw() -> RawDatasets {
        RawDatasets {
            receipts: vec![json!({
                "_id": {"$oid": "r1"},
                "bonusPointsEarned": 10,
                "bonusPointsEarnedReason": "reason1, reason2",
                "createDate": {"$date": 1609687531000_i64},
                "dateScanned": {"$date": 1609687531000_i64},
                "finishedDate": null,
                "modifyDate": {"$date": 1609687536000_i64},
                "pointsAwardedDate": null,
                "pointsEarned": "10.0",
                "purchaseDate": {"$date": 1609632000000_i64},
                "purchasedItemCount": 2,
                "rewardsReceiptItemList": [item("111", "1"), item("222", "2")],
                "rewardsReceiptStatus": "FINISHED",
                "totalSpent": "4.00",
                "userId": "u1"
            })],
            brands: vec![json!({
                "_id": {"$oid": "b1"},
                "barcode": "511111019862",
                "brandCode": "TEST",
                "category": "Baking",
                "categoryCode": "BAKING",
                "name": "test brand",
                "cpg": {"$id": {"$oid": "c1"}, "$ref": "Cogs"},
                "topBrand": false
            })],
            users: vec![json!({
                "_id": {"$oid": "u1"},
                "active": true,
                "createdDate": {"$date": 1609687444800_i64},
                "lastLogin": null,
                "role": "consumer",
                "signUpSource": "Email",
                "state": "WI"
            })],
        }
    }

    #[test]
    fn test_build_tables_order_and_counts() {
        let tables = build_tables(&raw()).unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                RECEIPTS_TABLE,
                LINE_ITEMS_TABLE,
                USERS_TABLE,
                BRANDS_TABLE,
                BONUS_POINT_REASONS_TABLE
            ]
        );
        let rows: Vec<usize> = tables.iter().map(|t| t.row_count()).collect();
        assert_eq!(rows, vec![1, 2, 1, 1, 2]);
    }

    #[test]
    fn test_build_tables_empty_input() {
        let tables = build_tables(&RawDatasets::default()).unwrap();
        assert_eq!(tables.len(), 5);
        assert!(tables.iter().all(|t| t.row_count() == 0));
    }

    #[test]
    fn test_build_tables_rejects_incomplete_users() {
        let mut raw = raw();
        raw.users[0].as_object_mut().unwrap().remove("state");
        assert!(matches!(
            build_tables(&raw),
            Err(EdaError::ColumnCountMismatch { .. })
        ));
    }
}
