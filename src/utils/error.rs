//! Error types for the strata collector
//!
//! This module defines the error kinds that flow through the collection loop.
//! Callers decide between abandoning an attempt and abandoning the whole run
//! by matching on [`CollectError`] variants, never on message text.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a single request against the platform API
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP client error (connection refused, DNS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success status code
    #[error("Server returned status {0}")]
    Status(u16),

    /// Response body was not valid JSON
    #[error("Decoding error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest embeds the request URL in its message, and the URL carries the API key
        let err = err.without_url();
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Http(err)
        }
    }
}

/// Errors raised by the durable checkpoint store
#[derive(Error, Debug)]
pub enum StorageError {
    /// File system failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State could not be (de)serialized
    #[error("Serialization error on {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors propagated out of the collection loop
#[derive(Error, Debug)]
pub enum CollectError {
    /// The daily budget cannot cover the requested operation
    #[error("Quota limit reached: used {used}/{limit}, requested {requested}")]
    QuotaExceeded { used: u64, requested: u64, limit: u64 },

    /// Transport failures survived every retry attempt
    #[error("Request to {endpoint} failed after {attempts} attempts: {source}")]
    RequestFailed {
        endpoint: &'static str,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The platform answered with a body we could not interpret
    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse {
        endpoint: &'static str,
        reason: String,
    },

    /// Checkpoint or quota state could not be persisted
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CollectError {
    /// Whether this failure ends the whole run rather than a single attempt
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::Storage(_))
    }
}
