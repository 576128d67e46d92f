//! Load-boundary errors
//!
//! Capability records are validated into strict types when the store
//! loads, so malformed data is rejected here and never reaches the
//! decision path.

/// Errors raised while loading and validating capability records.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("capability store unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("capability record {path} malformed: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no capability records present in {0}")]
    NoRecords(String),

    #[error("duplicate capability id {0}")]
    DuplicateId(String),

    #[error("capability {0} allows no actions")]
    EmptyActions(String),

    #[error("capability {0} carries a protocol caveat but does not allow transform")]
    ProtocolWithoutTransform(String),
}
