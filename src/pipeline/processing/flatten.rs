use serde_json::{Map, Value};

/// Joins path segments in flattened keys
pub const SEPARATOR: &str = "_";

/// Collapse a nested JSON value into a single-level map.
///
/// Object keys are joined with `_` and array elements are suffixed with their
/// index, so `{"a": {"b": [1, 2]}}` becomes `{"a_b_0": 1, "a_b_1": 2}`.
/// Scalars and empty containers are leaves. Keys in `root_keys_to_ignore` are
/// skipped at the top level only. Key order follows the input.
pub fn flatten(value: &Value, root_keys_to_ignore: &[&str]) -> Map<String, Value> {
    let mut out = Map::new();
    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                if root_keys_to_ignore.contains(&key.as_str()) {
                    continue;
                }
                flatten_into(child, key.clone(), &mut out);
            }
        }
        other => flatten_into(other, String::new(), &mut out),
    }
    out
}

fn flatten_into(value: &Value, path: String, out: &mut Map<String, Value>) {
    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (key, child) in obj {
                flatten_into(child, join(&path, key), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, join(&path, &index.to_string()), out);
            }
        }
        leaf => {
            out.insert(path, leaf.clone());
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}{SEPARATOR}{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_input_is_unchanged() {
        let input = json!({"name": "Kraft", "topBrand": false, "count": 3, "gone": null});
        let flat = flatten(&input, &[]);
        assert_eq!(Value::Object(flat), input);
    }

    #[test]
    fn test_nested_objects_join_with_underscore() {
        let input = json!({"_id": {"$oid": "abc"}, "cpg": {"$id": {"$oid": "c1"}, "$ref": "Cogs"}});
        let flat = flatten(&input, &[]);
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_id_$oid", "cpg_$id_$oid", "cpg_$ref"]);
        assert_eq!(flat["cpg_$ref"], json!("Cogs"));
    }

    #[test]
    fn test_arrays_are_indexed() {
        let input = json!({"tags": ["a", "b"], "nested": [{"x": 1}, {"x": 2}]});
        let flat = flatten(&input, &[]);
        assert_eq!(flat["tags_0"], json!("a"));
        assert_eq!(flat["tags_1"], json!("b"));
        assert_eq!(flat["nested_1_x"], json!(2));
    }

    #[test]
    fn test_empty_containers_are_leaves() {
        let input = json!({"items": [], "meta": {}});
        let flat = flatten(&input, &[]);
        assert_eq!(flat["items"], json!([]));
        assert_eq!(flat["meta"], json!({}));
    }

    #[test]
    fn test_root_keys_ignored_only_at_top_level() {
        let input = json!({
            "rewardsReceiptItemList": [{"barcode": "1"}],
            "bonusPointsEarnedReason": "r",
            "inner": {"bonusPointsEarnedReason": "kept"}
        });
        let flat = flatten(&input, &["rewardsReceiptItemList", "bonusPointsEarnedReason"]);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["inner_bonusPointsEarnedReason"], json!("kept"));
    }

    #[test]
    fn test_empty_root_object() {
        assert!(flatten(&json!({}), &[]).is_empty());
    }

    #[test]
    fn test_scalar_root() {
        let flat = flatten(&json!(7), &[]);
        assert_eq!(flat[""], json!(7));
    }
}
