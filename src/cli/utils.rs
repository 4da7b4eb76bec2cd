use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an API payload. Text mode pretty-prints it too; there is no
/// generic tabular form for arbitrary records.
pub fn output_value(output_format: OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Text => match value {
            Value::Null => println!("(no content)"),
            other => println!("{}", serde_json::to_string_pretty(other)?),
        },
    }
    Ok(())
}

/// Use the provided password or read one line from stdin.
pub fn resolve_password(provided: Option<String>) -> anyhow::Result<String> {
    resolve_secret(provided, "Password")
}

/// Use the provided value or prompt for it with `label`.
pub fn resolve_secret(provided: Option<String>, label: &str) -> anyhow::Result<String> {
    if let Some(value) = provided {
        return Ok(value);
    }

    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(value)
}

/// Parse a JSON argument given on the command line.
pub fn parse_json_arg(raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("Invalid JSON argument: {}", e))
}
