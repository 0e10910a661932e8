use serde::Serialize;
use serde_json::{json, Value};
use std::io::Read;

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print an API result: pretty JSON, or one line per row in text mode
pub fn output_value<T: Serialize>(output_format: &OutputFormat, value: &T) -> anyhow::Result<()> {
    let value = serde_json::to_value(value)?;
    match (output_format, &value) {
        (OutputFormat::Json, _) => println!("{}", serde_json::to_string_pretty(&value)?),
        (OutputFormat::Text, Value::Array(rows)) if rows.is_empty() => println!("(none)"),
        (OutputFormat::Text, Value::Array(rows)) => {
            for row in rows {
                println!("{}", summarize(row));
            }
        }
        (OutputFormat::Text, other) => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

/// `id  name-ish` line for a row
fn summarize(row: &Value) -> String {
    let id = row.get("id").and_then(Value::as_str).unwrap_or("-");
    let label = ["name", "service_name", "email", "registration"]
        .iter()
        .find_map(|key| row.get(*key).and_then(Value::as_str))
        .unwrap_or("");
    let when = match (row.get("booking_date"), row.get("start_time")) {
        (Some(Value::String(date)), Some(Value::String(time))) => format!("  {} {}", date, time),
        _ => String::new(),
    };
    format!("{}  {}{}", id, label, when)
}

/// Request body for create/update commands, read from stdin
pub fn read_json_stdin() -> anyhow::Result<Value> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    if input.trim().is_empty() {
        anyhow::bail!("Expected a JSON body on stdin");
    }
    Ok(serde_json::from_str(&input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_summarize_by_best_label() {
        let site = json!({ "id": "s1", "name": "North Park" });
        assert_eq!(summarize(&site), "s1  North Park");

        let booking = json!({
            "id": "b1",
            "service_name": "Day Care",
            "booking_date": "2026-05-04",
            "start_time": "09:00:00"
        });
        assert_eq!(summarize(&booking), "b1  Day Care  2026-05-04 09:00:00");
    }
}
