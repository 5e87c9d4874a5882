use crate::constants::{
    BONUS_REASON_FIELD, BONUS_REASON_KEY, BONUS_REASON_SEPARATOR, ITEM_LIST_KEY, OID_KEY,
    RECEIPT_ID_FIELD, RECEIPT_ID_KEY,
};
use crate::error::{EdaError, Result};
use serde_json::{json, Value};
use tracing::debug;

/// Read the `_id.$oid` identifier of a receipt
pub fn receipt_id(receipt: &Value) -> Result<&str> {
    receipt
        .get(RECEIPT_ID_KEY)
        .and_then(|id| id.get(OID_KEY))
        .and_then(Value::as_str)
        .ok_or_else(|| EdaError::MissingField(format!("{RECEIPT_ID_KEY}.{OID_KEY}")))
}

/// Pull every receipt's item list into one sequence of line items.
///
/// Each item gets a trailing `receipt_id` key. Receipts keep file order and
/// items keep array order. A missing or null item list contributes nothing.
pub fn extract_line_items(receipts: &[Value]) -> Result<Vec<Value>> {
    let mut line_items = Vec::new();

    for receipt in receipts {
        let id = receipt_id(receipt)?;
        let items = match receipt.get(ITEM_LIST_KEY) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(EdaError::MissingField(format!(
                    "{ITEM_LIST_KEY} on receipt {id} is not an array: {other}"
                )))
            }
        };

        for item in items {
            let mut item = item.clone();
            match item.as_object_mut() {
                Some(fields) => {
                    fields.insert(RECEIPT_ID_FIELD.to_string(), Value::String(id.to_string()));
                }
                None => {
                    return Err(EdaError::MissingField(format!(
                        "{ITEM_LIST_KEY} entry on receipt {id} is not an object"
                    )))
                }
            }
            line_items.push(item);
        }
    }

    debug!("Extracted {} line items from {} receipts", line_items.len(), receipts.len());
    Ok(line_items)
}

/// Split every receipt's bonus-point reason string into one record per reason.
///
/// The separator is exactly `", "`, so `"A,B"` stays one reason. Empty tokens
/// are dropped. A missing or null reason contributes nothing; any other
/// non-string value is an error.
pub fn extract_bonus_point_reasons(receipts: &[Value]) -> Result<Vec<Value>> {
    let mut reasons = Vec::new();

    for receipt in receipts {
        let id = receipt_id(receipt)?;
        let text = match receipt.get(BONUS_REASON_KEY) {
            None | Some(Value::Null) => continue,
            Some(Value::String(text)) => text,
            Some(other) => {
                return Err(EdaError::MissingField(format!(
                    "{BONUS_REASON_KEY} on receipt {id} is not a string: {other}"
                )))
            }
        };

        for reason in text.split(BONUS_REASON_SEPARATOR).filter(|r| !r.is_empty()) {
            reasons.push(json!({
                RECEIPT_ID_FIELD: id,
                BONUS_REASON_FIELD: reason,
            }));
        }
    }

    debug!(
        "Extracted {} bonus point reasons from {} receipts",
        reasons.len(),
        receipts.len()
    );
    Ok(reasons)
}
