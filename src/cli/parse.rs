//! Value parsers for clap arguments and JSON payload loading

use std::fs;

use serde_json::Value;

use crosswork_core::error::{CoreError, Result};
use crosswork_core::model::{AssignmentType, EvaluatorRole, SchoolStage, SubmissionMode};

pub fn parse_school_stage(s: &str) -> std::result::Result<SchoolStage, String> {
    s.parse().map_err(|e: CoreError| e.to_string())
}

pub fn parse_assignment_type(s: &str) -> std::result::Result<AssignmentType, String> {
    s.parse().map_err(|e: CoreError| e.to_string())
}

pub fn parse_submission_mode(s: &str) -> std::result::Result<SubmissionMode, String> {
    s.parse().map_err(|e: CoreError| e.to_string())
}

pub fn parse_evaluator_role(s: &str) -> std::result::Result<EvaluatorRole, String> {
    s.parse().map_err(|e: CoreError| e.to_string())
}

/// Parse a structured payload argument: `@path` reads a JSON file,
/// anything else is parsed as inline JSON
pub fn json_payload(raw: &str) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            CoreError::UsageError(format!("cannot read payload file {}: {}", path, e))
        })?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text)
        .map_err(|e| CoreError::UsageError(format!("invalid JSON payload: {}", e)))
}

/// Like [`json_payload`], but requires a JSON object and returns its map
pub fn json_object_payload(raw: &str) -> Result<serde_json::Map<String, Value>> {
    match json_payload(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::UsageError(format!(
            "payload must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
