use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = ["net_value", "base_case_value", "estimates", "rmse"];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        // Estimates print one "date price" pair per line
        Value::Array(arr) => arr
            .iter()
            .map(|item| match (item.get("date"), item.get("price")) {
                (Some(date), Some(price)) => {
                    format!("{} {}", format_minimal(date), format_minimal(price))
                }
                _ => format_minimal(item),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_estimates_one_per_line() {
        let estimates = json!([
            {"date": "2024-12-31", "price": "12.9"},
            {"date": "2025-06-30", "price": "10.4"},
        ]);
        assert_eq!(
            format_minimal(&estimates),
            "2024-12-31 12.9\n2025-06-30 10.4"
        );
    }

    #[test]
    fn test_plain_scalars() {
        assert_eq!(format_minimal(&json!("72.97")), "72.97");
        assert_eq!(format_minimal(&json!(null)), "null");
    }
}
