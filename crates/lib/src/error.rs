use std::time::Duration;
use thiserror::Error;

use crate::{sanitize_error, types::Rejection};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuiteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request {} ({}): {}", .0.stage, .0.classification, .0.message)]
    Rejected(Rejection),

    #[error("Settlement timeout: {what} not observed within {}s", .waited.as_secs_f64())]
    SettlementTimeout { what: String, waited: Duration },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl From<reqwest::Error> for SuiteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SuiteError::MalformedResponse(sanitize_error!(e))
        } else {
            SuiteError::Network(sanitize_error!(e))
        }
    }
}

impl From<serde_json::Error> for SuiteError {
    fn from(e: serde_json::Error) -> Self {
        SuiteError::Serialization(sanitize_error!(e))
    }
}

impl From<toml::de::Error> for SuiteError {
    fn from(e: toml::de::Error) -> Self {
        SuiteError::Config(sanitize_error!(e))
    }
}

impl From<std::io::Error> for SuiteError {
    fn from(e: std::io::Error) -> Self {
        SuiteError::Config(sanitize_error!(e))
    }
}
