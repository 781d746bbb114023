//! JSON I/O handling for CLI
//!
//! - Input: one JSON document from a file or stdin
//! - Output: one JSON object on stdout per invocation
//! - UTF-8 only

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON document from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_document(&input, "stdin")
}

/// Read a JSON document from a file
pub fn read_json_file(path: &Path) -> CliResult<Value> {
    let input = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_document(&input, &path.display().to_string())
}

fn parse_document(input: &str, source: &str) -> CliResult<Value> {
    if input.trim().is_empty() {
        return Err(CliError::io_error(format!("Empty input on {}", source)));
    }
    Ok(serde_json::from_str(input)?)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_to(&mut io::stdout().lock(), &success(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_to(&mut io::stdout().lock(), &failure(code, message))
}

fn success(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

fn failure(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

fn write_to<W: Write>(writer: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, response)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_shapes() {
        let mut out = Vec::new();
        write_to(&mut out, &success(json!(["courses"]))).unwrap();
        write_to(&mut out, &failure("INSIGHT_MALFORMED_QUERY", "Missing WHERE")).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0], json!({"status": "ok", "data": ["courses"]}));
        assert_eq!(
            lines[1],
            json!({"status": "error", "code": "INSIGHT_MALFORMED_QUERY", "message": "Missing WHERE"})
        );
    }

    #[test]
    fn test_parse_document() {
        assert!(parse_document("  \n", "stdin").is_err());
        assert!(parse_document("{\"WHERE\": ", "stdin").is_err());
        assert_eq!(parse_document("{\n  \"a\": 1\n}", "stdin").unwrap(), json!({"a": 1}));
    }
}
