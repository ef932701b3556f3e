//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{BionicArgs, OutputFormat};
use crate::error::Result;
use crate::pipeline::ProcessingSummary;

/// Result of one CLI run.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessReport {
    pub input: String,
    pub output: String,
    #[serde(flatten)]
    pub summary: ProcessingSummary,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &BionicArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &BionicArgs) -> Result<()> {
    if args.verbosity() == 0 {
        return Ok(());
    }

    println!("{message}");
    println!();

    let value = serde_json::to_value(result)?;
    for line in human_lines(&value, "") {
        println!("{line}");
    }
    Ok(())
}

/// `key: value` lines; nested objects are indented under their key.
fn human_lines(value: &serde_json::Value, indent: &str) -> Vec<String> {
    match value {
        serde_json::Value::Object(obj) => {
            let mut lines = Vec::new();
            for (key, val) in obj {
                let label = key.replace('_', " ");
                match val {
                    serde_json::Value::Object(_) => {
                        lines.push(format!("{indent}{label}:"));
                        lines.extend(human_lines(val, &format!("{indent}  ")));
                    }
                    _ => lines.push(format!("{indent}{label}: {}", format_value(val))),
                }
            }
            lines
        }
        _ => vec![format!("{indent}{}", format_value(value))],
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &BionicArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        serde_json::Value::Object(_) => "{...}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("hello")), "hello");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!([1, 2, 3])), "[1, 2, 3]");
    }

    #[test]
    fn test_human_lines() {
        let value = json!({
            "documents": 2,
            "stats": { "text_runs": 10 }
        });
        assert_eq!(
            human_lines(&value, ""),
            vec!["documents: 2", "stats:", "  text runs: 10"]
        );
    }

    #[test]
    fn test_report_json_is_flat() {
        let report = ProcessReport {
            input: "a.epub".to_string(),
            output: "a_bionic.epub".to_string(),
            summary: ProcessingSummary {
                documents: 3,
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["documents"], 3);
        assert_eq!(value["input"], "a.epub");
        assert_eq!(value["stats"]["text_runs"], 0);
    }
}
