use serde_json::Value;

/// Print a command result: indented on a terminal, one line per result when
/// piped so it can feed `jq` or another `roi` invocation.
pub fn print_json(value: &Value) {
    match render(value, atty::is(atty::Stream::Stdout)) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

fn render(value: &Value, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_piped_output_is_single_line() {
        let value = json!({"result": {"roi": 120.5, "recommendation": "BUY"}});
        let compact = render(&value, false).unwrap();
        assert!(!compact.contains('\n'));
        assert!(render(&value, true).unwrap().contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&compact).unwrap(), value);
    }
}
