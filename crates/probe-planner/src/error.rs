//! Error types for the planner crate.

use thiserror::Error;

/// Errors that make a spec unusable. Any of these is fatal to a run.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The spec location is neither a URL nor a readable path.
    #[error("invalid spec location {location}: {reason}")]
    InvalidLocation { location: String, reason: String },

    /// The HTTP fetch failed before a response arrived.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Reading a local spec file failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is neither JSON nor YAML.
    #[error("{location} is not a JSON or YAML document: {reason}")]
    Parse { location: String, reason: String },

    /// The document has no `paths` object.
    #[error("{0} has no paths object")]
    MissingPaths(String),

    /// A `$ref` points at nothing.
    #[error("unresolved reference {reference} in {document}")]
    UnresolvedRef { reference: String, document: String },

    /// Inlining references would exceed the node budget.
    #[error("dereferencing {document} exceeds {limit} nodes")]
    TooLarge { document: String, limit: usize },
}

/// Errors from value synthesis. Callers fall back to a literal value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FakeError {
    /// The schema gives nothing to generate from.
    #[error("cannot synthesize a value for schema: {0}")]
    Unsupported(String),

    /// Nesting exceeded the configured depth.
    #[error("schema nesting exceeds depth {0}")]
    TooDeep(usize),
}
