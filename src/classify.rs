//! Response classification: file or error?
//!
//! The backend answers success and failure on the same endpoint, and either
//! kind of body may be binary or text. Success is decided by status alone;
//! for failures, `content-type` picks one of two explicit branches:
//!
//! ```text
//! status < 400  ──▶ Success(body, filename)
//! status ≥ 400 ─┬─ JSON ──▶ details | error | "Unknown server error"
//!               └─ other ─▶ first 500 chars of text | "Server error (status N)"
//! ```
//!
//! A failure body is never saved as a file, and a binary body is never shown
//! as an error message.

use crate::filename::resolve_filename;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Longest plain-text error message relayed to the user, in characters.
pub const MAX_TEXT_ERROR_CHARS: usize = 500;

pub const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";
pub const INVALID_JSON_ERROR: &str = "Server returned an error (invalid JSON).";

/// An HTTP response as received, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The classified result of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResponseOutcome {
    /// A deliverable file.
    Success {
        #[serde(skip)]
        payload: Bytes,
        filename: String,
    },
    /// A message for the user.
    Failure { status: u16, message: String },
}

/// The two ways a failure body can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorBody {
    Json,
    Text,
}

impl ErrorBody {
    fn from_headers(headers: &HeaderMap) -> Self {
        let essence = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if essence == "application/json" || essence.ends_with("+json") {
            ErrorBody::Json
        } else {
            ErrorBody::Text
        }
    }
}

/// Classify `response`, naming a successful payload after the
/// `content-disposition` header or `fallback_name`.
pub fn classify(response: RawResponse, fallback_name: &str) -> ResponseOutcome {
    let RawResponse {
        status,
        headers,
        body,
    } = response;

    if status < 400 {
        let filename = resolve_filename(&headers, fallback_name);
        debug!("HTTP {status}: {} bytes as '{filename}'", body.len());
        return ResponseOutcome::Success {
            payload: body,
            filename,
        };
    }

    let message = match ErrorBody::from_headers(&headers) {
        ErrorBody::Json => json_error_message(&body),
        ErrorBody::Text => text_error_message(status, &body),
    };
    debug!("HTTP {status}: {message}");
    ResponseOutcome::Failure { status, message }
}

fn json_error_message(body: &[u8]) -> String {
    let parsed = std::str::from_utf8(body)
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(text).ok());

    let Some(value) = parsed else {
        return INVALID_JSON_ERROR.to_string();
    };

    field_message(&value, "details")
        .or_else(|| field_message(&value, "error"))
        .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string())
}

/// A present, non-empty field as display text.
fn field_message(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text_error_message(status: u16, body: &[u8]) -> String {
    let text = std::str::from_utf8(body).unwrap_or("").trim();
    if text.is_empty() {
        format!("Server error (status {status})")
    } else {
        text.chars().take(MAX_TEXT_ERROR_CHARS).collect()
    }
}
