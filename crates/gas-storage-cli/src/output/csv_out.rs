use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    if let Err(e) = write_csv(&mut wtr, value).and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                // A ledger or list of estimates is the useful table; fall back
                // to field/value pairs for scalar-only results.
                if let Some(records) = first_record_list(result) {
                    write_array_csv(wtr, records)
                } else if let Some(grid) = sensitivity_rows(result) {
                    grid.iter().try_for_each(|row| wtr.write_record(row))
                } else {
                    write_pairs(wtr, result)
                }
            }
            _ => write_pairs(wtr, map),
        },
        Value::Array(arr) => write_array_csv(wtr, arr),
        _ => wtr.write_record([&format_csv_value(value)]),
    }
}

fn first_record_list(result: &Map<String, Value>) -> Option<&[Value]> {
    result.values().find_map(|val| match val {
        Value::Array(items) if items.first().map_or(false, Value::is_object) => {
            Some(items.as_slice())
        }
        _ => None,
    })
}

/// Long-format rows of a sensitivity matrix: one row per grid point.
fn sensitivity_rows(result: &Map<String, Value>) -> Option<Vec<Vec<String>>> {
    let matrix = result.get("matrix")?.as_array()?;
    let rows = result.get("variable_1_values")?.as_array()?;
    let var1 = result.get("variable_1_name")?.as_str()?;
    // A one-way sweep still serialises an empty variable_2_values list.
    let var2 = result.get("variable_2_name").and_then(Value::as_str);
    let cols = var2.and(result.get("variable_2_values").and_then(Value::as_array));

    let mut header = vec![var1.to_string()];
    if let Some(v2) = var2 {
        header.push(v2.to_string());
    }
    header.push("net_value".to_string());

    let mut out = vec![header];
    for (row_value, row) in rows.iter().zip(matrix) {
        let Some(cells) = row.as_array() else { continue };
        for (j, cell) in cells.iter().enumerate() {
            let mut record = vec![format_csv_value(row_value)];
            if let Some(cols) = cols {
                record.push(cols.get(j).map(format_csv_value).unwrap_or_default());
            }
            record.push(format_csv_value(cell));
            out.push(record);
        }
    }
    Some(out)
}

fn write_pairs<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &format_csv_value(val)])?;
    }
    Ok(())
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        wtr.write_record(&headers)?;

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                wtr.write_record(&row)?;
            }
        }
    } else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
