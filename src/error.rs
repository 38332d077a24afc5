// src/error.rs
// =============================================================================
// Errors that end a run.
//
// Individual links never produce one of these: a dead link is a result, not
// an error. Only problems with our own inputs and outputs (the catalog file,
// writing the report) are fatal.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentinelError {
    /// The catalog file does not exist or cannot be read
    #[error("cannot read catalog {}: {source}", .path.display())]
    CatalogMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file exists but is not a valid catalog document
    #[error("malformed catalog {}: {source}", .path.display())]
    CatalogMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
