//! Error types for searchsim-core operations.
//!
//! Navigation never produces an error: out-of-range pages, unknown tabs and
//! unknown result ids are resolved in place. What remains is loading inputs
//! (datasets, config) and the tracking transport, whose failures stop at the
//! tracking client boundary.

use std::path::PathBuf;

/// All errors that can occur while loading inputs for a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    // ─────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Dataset not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Duplicate result id in dataset: {0}")]
    DuplicateResultId(String),

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid tracking endpoint: {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using SimError.
pub type Result<T> = std::result::Result<T, SimError>;

/// Failures of a single tracking delivery.
///
/// These are logged and discarded by `TrackingClient`; they only surface to
/// callers that use a `Transport` directly.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to reach tracking sink: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Tracking sink rejected event with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Tracking sink response was not understood: {0}")]
    BadResponse(String),

    #[error("Tracking transport unavailable: {0}")]
    Unavailable(String),
}

// Conversion for string error compatibility
impl From<SimError> for String {
    fn from(err: SimError) -> String {
        err.to_string()
    }
}
