//! Error types for the booker suite runner
//!
//! Transport failures and HTTP status outcomes are kept apart: a 403 or a
//! 404 is a valid, inspectable response, while a refused connection is not.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the booker suite runner
#[derive(Error, Debug)]
pub enum Error {
    // === Transport Errors ===
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    // === HTTP Status Errors ===
    #[error("{method} {url} returned unexpected status {status}: {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    // === Booking API Errors ===
    #[error("Authentication rejected: {0}. Check [credentials] in the config file")]
    AuthRejected(String),

    // === Suite Errors ===
    #[error("Step requires '{key}' but no earlier step produced it")]
    MissingState { key: String },

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    #[error("{failed} of {total} suites failed")]
    SuitesFailed { failed: usize, total: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify a reqwest failure as a timeout or a generic transport error
    pub fn transport(url: &str, source: reqwest::Error, timeout: Duration) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Create an unexpected status error
    pub fn unexpected_status(method: &str, url: &str, status: u16, body: &str) -> Self {
        Self::UnexpectedStatus {
            method: method.to_string(),
            url: url.to_string(),
            status,
            body: body.to_string(),
        }
    }

    /// Create a missing state error
    pub fn missing_state(key: impl std::fmt::Display) -> Self {
        Self::MissingState {
            key: key.to_string(),
        }
    }

    /// Whether the failure happened below HTTP (no response was received)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}
