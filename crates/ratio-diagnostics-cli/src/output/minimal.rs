use serde_json::Value;

use super::scalar;

/// Print just the key answer from the output.
///
/// For a diagnostic that is the base ratio and its tier; otherwise the
/// first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let base = result_obj.pointer("/base/value");
    let tier = result_obj.pointer("/classification/tier");
    if let (Some(base), Some(tier)) = (base, tier) {
        println!("{} {}", scalar(base), scalar(tier));
        return;
    }

    match result_obj {
        Value::Object(map) => {
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, scalar(val));
            }
        }
        Value::Array(items) => {
            // Catalogue listings: one key per line
            for item in items {
                match item.get("key") {
                    Some(key) => println!("{}", scalar(key)),
                    None => println!("{}", scalar(item)),
                }
            }
        }
        _ => println!("{}", scalar(result_obj)),
    }
}
