//! Error types for the core crate.
//!
//! Only ingestion can fail: search and conversation operations are total
//! over valid input.

use thiserror::Error;

/// A corpus-level failure. Aborts the ingest and leaves the previously
/// published snapshot in place.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("corpus source {0} is not available")]
    SourceUnavailable(String),

    #[error("failed to read corpus {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open archive {source_name}: {reason}")]
    Archive { source_name: String, reason: String },
}

/// Returned when a message role is neither `user` nor `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown message role: {0:?}")]
pub struct UnknownRole(pub String);
