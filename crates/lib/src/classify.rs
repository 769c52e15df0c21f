//! Turns raw service responses into a [`Classification`].
//!
//! This is the only place in the crate that inspects response text. Structured
//! error codes win when the service provides them; the substring checks below
//! are a compatibility shim for responses that carry only a message.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::{
    constant::{error_code, INSUFFICIENT_FEE_MARKER, LENGTH_MARKER, MATCHER_FEE_MARKER},
    types::{Rejection, RejectionStage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Success,
    InsufficientFee,
    ValidationError,
    UnknownError,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Success => "SUCCESS",
            Classification::InsufficientFee => "INSUFFICIENT_FEE",
            Classification::ValidationError => "VALIDATION_ERROR",
            Classification::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(name)
    }
}

/// Classifies a rejection from its optional service code and message.
pub fn classify_error(code: Option<i64>, message: &str) -> Classification {
    if message.contains(INSUFFICIENT_FEE_MARKER) || message.contains(MATCHER_FEE_MARKER) {
        return Classification::InsufficientFee;
    }

    match code {
        Some(error_code::INVALID_NAME)
        | Some(error_code::INVALID_ADDRESS)
        | Some(error_code::CUSTOM_VALIDATION) => return Classification::ValidationError,
        Some(error_code::STATE_CHECK_FAILED) if message.to_lowercase().contains("fee") => {
            return Classification::InsufficientFee
        }
        _ => {}
    }

    if message.contains(LENGTH_MARKER) {
        Classification::ValidationError
    } else {
        Classification::UnknownError
    }
}

/// Extracts an error from a response body, if the body describes one.
///
/// Recognised shapes: `{"error": <code>, "message": ...}`,
/// `{"status": "OrderRejected" | "...Error", "message": ...}` and bodies whose
/// text carries the legacy `error`/`ERROR` markers.
pub fn extract_error(body: &Value) -> Option<(Option<i64>, String)> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());

    if let Some(error) = body.get("error") {
        return Some((error.as_i64(), message));
    }

    if let Some(status) = body.get("status").and_then(Value::as_str) {
        if status.ends_with("Rejected") || status.ends_with("Error") {
            return Some((None, message));
        }
        if status.ends_with("Accepted") || status.ends_with("Canceled") {
            return None;
        }
    }

    // A body carrying a transaction id is a success payload.
    if body.get("id").is_some() {
        return None;
    }

    // Legacy marker scan, scoped to top-level string fields.
    let flagged = body.as_object().is_some_and(|fields| {
        fields.iter().any(|(key, value)| {
            key == "error"
                || value.as_str().is_some_and(|s| s.contains("error") || s.contains("ERROR"))
        })
    });
    flagged.then_some((None, message))
}

pub fn rejection_from_body(stage: RejectionStage, body: &Value) -> Option<Rejection> {
    extract_error(body).map(|(code, message)| Rejection {
        stage,
        classification: classify_error(code, &message),
        code,
        message,
    })
}

pub fn rejection_from_text(stage: RejectionStage, text: &str) -> Rejection {
    match serde_json::from_str::<Value>(text) {
        Ok(body) => rejection_from_body(stage, &body).unwrap_or_else(|| Rejection {
            stage,
            classification: classify_error(None, text),
            code: None,
            message: text.to_string(),
        }),
        Err(_) => Rejection {
            stage,
            classification: classify_error(None, text),
            code: None,
            message: text.to_string(),
        },
    }
}
