//! Error taxonomy for a synchronisation run.
//!
//! Every error aborts the run: nothing is retried and nothing is skipped.
//! A re-run is always safe because reconciliation is recomputed from the
//! remote listing each time.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reconciling or uploading fonts.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Transport {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not recognize the mimetype for {}", .0.display())]
    UnrecognizedMimeType(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid credentials: expected \"user:pass\"")]
    InvalidCredentials,

    #[error("invalid collection url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest error: {0}")]
    Config(String),
}

impl SyncError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
