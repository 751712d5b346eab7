pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten a nested result into `(dotted.path, value)` rows.
///
/// Arrays of named objects (figures, driver terms) are keyed by their
/// `name`/`label` so each entry gets its own row.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    flatten_into("", value, &mut rows);
    rows
}

fn flatten_into(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                flatten_into(&join(prefix, key), val, rows);
            }
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(|i| entry_name(i).is_some()) => {
            for item in items {
                if let Some((name, val)) = entry_name(item) {
                    rows.push((join(prefix, name), scalar(val)));
                }
            }
        }
        _ => rows.push((prefix.to_string(), scalar(value))),
    }
}

/// `{"name": .., "value": ..}` or `{"label": .., "contribution": ..}`.
fn entry_name(item: &Value) -> Option<(&str, &Value)> {
    let map = item.as_object()?;
    let (name, val) = match (map.get("name"), map.get("label")) {
        (Some(Value::String(name)), _) => (name, map.get("value")?),
        (_, Some(Value::String(label))) => (label, map.get("contribution")?),
        _ => return None,
    };
    Some((name.as_str(), val))
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

pub fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(scalar).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_result() {
        let value = json!({
            "base": {
                "value": "7.00",
                "figures": [{"name": "eva", "value": "560.00", "unit": "money", "decimals": 2}]
            },
            "classification": {"tier": "value_creator_stable", "rule": 1}
        });
        let rows = flatten(&value);
        assert!(rows.contains(&("base.value".into(), "7.00".into())));
        assert!(rows.contains(&("base.figures.eva".into(), "560.00".into())));
        assert!(rows.contains(&("classification.tier".into(), "value_creator_stable".into())));
        assert!(rows.contains(&("classification.rule".into(), "1".into())));
    }

    #[test]
    fn test_flatten_driver_terms_and_plain_arrays() {
        let value = json!({
            "terms": [{"label": "WACC", "contribution": "-5.5"}],
            "tiers": ["a", "b"]
        });
        let rows = flatten(&value);
        assert!(rows.contains(&("terms.WACC".into(), "-5.5".into())));
        assert!(rows.contains(&("tiers".into(), "a, b".into())));
    }
}
