use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // Check if "result" key holds the primary data
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        // Scalars first, then each list of records (ledger, fitted values,
        // estimates) as its own table.
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        let mut record_lists: Vec<(&String, &Vec<Value>)> = Vec::new();
        for (key, val) in res_map {
            match val {
                Value::Array(items) if items.first().map_or(false, Value::is_object) => {
                    record_lists.push((key, items));
                }
                _ if key == "matrix" => {}
                _ => builder.push_record([key.as_str(), &format_value(val)]),
            }
        }
        println!("{}", Table::from(builder));

        if let Some(grid) = sensitivity_grid(res_map) {
            println!("\nNet value by {}:", grid.0);
            println!("{}", grid.1);
        }

        for (key, items) in record_lists {
            println!("\n{}:", key);
            print_array_table(items);
        }
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Render a sensitivity matrix with variable_1 values down the side and
/// variable_2 values across the top.
fn sensitivity_grid(res_map: &Map<String, Value>) -> Option<(String, Table)> {
    let matrix = res_map.get("matrix")?.as_array()?;
    let rows = res_map.get("variable_1_values")?.as_array()?;
    let var1 = res_map.get("variable_1_name")?.as_str()?;
    let cols: Vec<Value> = res_map
        .get("variable_2_values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let var2 = res_map.get("variable_2_name").and_then(Value::as_str);

    let mut builder = Builder::default();
    let mut header = vec![format!("{var1} \\ {}", var2.unwrap_or("net_value"))];
    if cols.is_empty() {
        header.push("net_value".to_string());
    } else {
        header.extend(cols.iter().map(format_value));
    }
    builder.push_record(header);

    for (row_value, row) in rows.iter().zip(matrix) {
        let mut record = vec![format_value(row_value)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(|c| match c {
                Value::Null => "failed".to_string(),
                other => format_value(other),
            }));
        }
        builder.push_record(record);
    }

    let label = match var2 {
        Some(v2) => format!("{var1} x {v2}"),
        None => var1.to_string(),
    };
    Some((label, Table::from(builder)))
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
