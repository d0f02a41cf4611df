//! Configuration parser: HCL and JSON text into a nested key-value document

use crate::error::ParseError;
use serde_json::{Map, Value};

/// A parsed file. Blocks nest by type, then by each label.
pub type Document = Map<String, Value>;

/// Parse one configuration file. Pure: no I/O.
///
/// `path` selects the syntax (`.json` suffix means Terraform JSON) and is
/// carried into the error.
pub fn parse(path: &str, text: &str) -> Result<Document, ParseError> {
    if path.ends_with(".json") {
        parse_json(path, text)
    } else {
        parse_hcl(path, text)
    }
}

fn parse_hcl(path: &str, text: &str) -> Result<Document, ParseError> {
    let body = hcl::parse(text).map_err(|e| hcl_error(path, e))?;
    let value: Value = hcl::from_body(body).map_err(|e| hcl_error(path, e))?;
    into_document(path, value)
}

fn parse_json(path: &str, text: &str) -> Result<Document, ParseError> {
    if text.trim().is_empty() {
        return Ok(Document::new());
    }
    let value: Value = serde_json::from_str(text).map_err(|e| ParseError {
        path: path.to_string(),
        line: Some(e.line()),
        column: Some(e.column()),
        message: e.to_string(),
    })?;
    into_document(path, value)
}

fn into_document(path: &str, value: Value) -> Result<Document, ParseError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Document::new()),
        other => Err(ParseError {
            path: path.to_string(),
            line: None,
            column: None,
            message: format!("expected an object at the top level, found {}", json_type(&other)),
        }),
    }
}

fn hcl_error(path: &str, err: hcl::Error) -> ParseError {
    let (line, column) = match &err {
        hcl::Error::Parse(parse) => {
            let location = parse.location();
            (Some(location.line()), Some(location.column()))
        }
        _ => (None, None),
    };
    ParseError {
        path: path.to_string(),
        line,
        column,
        message: err.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
