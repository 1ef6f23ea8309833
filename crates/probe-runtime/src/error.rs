//! Error types for the runtime crate.

use probe_planner::SpecError;
use thiserror::Error;

/// Failures to get a response for a single call. These end up in the call's
/// record, never abort a run.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, timeout or protocol failure.
    #[error("{0}")]
    Request(String),

    /// The request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Body(String),

    /// A file parameter's placeholder could not be read.
    #[error("failed to read upload {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end a run before any call record is produced.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
