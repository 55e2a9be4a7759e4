use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Arrays longer than this are summarised instead of printed in full.
const MAX_INLINE_ITEMS: usize = 12;

/// Format output as tables using the tabled crate.
///
/// Scalar fields go into one Field/Value table; every array of objects
/// (rankings, sweep rows, scenario rows) gets a table of its own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_object_sections(result);
                print_envelope_notes(map);
            } else {
                print_object_sections(value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_object_sections(value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", format_value(value));
        return;
    };

    let (tables, scalars): (Vec<_>, Vec<_>) = map.iter().partition(|(_, v)| is_object_array(v));

    if !scalars.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in scalars {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (key, val) in tables {
        if let Value::Array(arr) = val {
            println!("\n{}:", key);
            print_array_table(arr);
        }
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
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

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn is_object_array(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.first().is_some_and(Value::is_object))
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

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

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) if arr.len() > MAX_INLINE_ITEMS => format!("[{} values]", arr.len()),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(12.3456)), "12.35");
        assert_eq!(format_value(&json!(7)), "7");
        assert_eq!(format_value(&Value::Null), "-");
        assert_eq!(format_value(&json!([1, 2])), "1, 2");
        assert_eq!(format_value(&json!(vec![0.0; 60])), "[60 values]");
    }

    #[test]
    fn test_object_array_detection() {
        assert!(is_object_array(&json!([{"a": 1}])));
        assert!(!is_object_array(&json!([1, 2])));
        assert!(!is_object_array(&json!([])));
    }
}
