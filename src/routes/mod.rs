//! Route modules for the PDF engine server

pub mod admin;
pub mod files;
pub mod health;
pub mod jobs;
pub mod operations;

use axum::body::Bytes;
use serde_json::Value;

use crate::error::{AppError, Result};

/// Parse an optional JSON request body; an empty body is `null`
pub(crate) fn json_body(body: &Bytes) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_parameter("body", format!("Malformed JSON: {}", e)))
}
