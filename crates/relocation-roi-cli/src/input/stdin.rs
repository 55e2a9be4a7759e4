use serde_json::Value;
use std::io::{self, Read};

/// Calculation-input overrides piped on stdin, as JSON or YAML.
/// Returns None when stdin is a terminal or nothing was piped.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_overrides(&buffer)
}

/// JSON is tried first; anything else must parse as a YAML mapping.
fn parse_overrides(text: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(Some(value));
    }
    match serde_yaml::from_str::<Value>(trimmed) {
        Ok(value @ Value::Object(_)) => Ok(Some(value)),
        Ok(_) => Err("Piped calculation input must be a JSON or YAML object".into()),
        Err(e) => Err(format!("Failed to parse calculation input from stdin: {e}").into()),
    }
}
