//! Classify responses and pull the remote store's own message out of error bodies.

use serde::Deserialize;

/// Status meaning "resource absent" on a probe.
pub const STATUS_NOT_FOUND: u32 = 404;

/// Outcome class of a received response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    NotFound,
    Failure,
}

pub fn classify_status(status: u32) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        STATUS_NOT_FOUND => StatusClass::NotFound,
        _ => StatusClass::Failure,
    }
}

/// Error body shape of the contents API: `{"message": "...", "errors": [...]}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

/// Extract a human-readable message from an error body.
///
/// Returns `None` when the body is not the expected JSON shape; the caller then
/// reports the bare status.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let mut message = parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "No message".to_string());
    match parsed.errors {
        Some(serde_json::Value::Null) | None => {}
        Some(errors) => message.push_str(&format!(" ({})", errors)),
    }
    Some(message)
}
