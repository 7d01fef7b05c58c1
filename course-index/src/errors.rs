//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for course-index operations.
///
/// Propagation policy: ingestion errors abort the single document's
/// ingestion; retrieval errors either degrade or propagate per caller
/// configuration; reconciliation errors for an individual orphan are logged
/// and skipped.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Empty/malformed document text. Fail fast, no partial writes.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Raw embedding provider failure (transport, decode, timeout).
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// Embedding failed for a chunk of a document; the whole document's
    /// ingestion is aborted to keep its chunk set all-or-nothing.
    #[error("embedding failed for document {document_id}: {reason}")]
    EmbeddingFailed {
        document_id: String,
        reason: String,
    },

    /// Connection/transport failure to the vector index. Retryable by the
    /// caller with backoff.
    #[error("vector index unavailable: {0}")]
    Unavailable(String),

    /// Retrieval requested for an unpublished or unknown unit. Surfaced
    /// directly to the end user, not retried.
    #[error("unit '{unit_name}' is not available in course {course_id}")]
    UnitNotAvailable {
        course_id: String,
        unit_name: String,
    },

    /// Mismatch between a vector's length and the index's declared
    /// dimension.
    #[error("vector dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Failure reported by the external metadata store.
    #[error("metadata store error: {0}")]
    Metadata(String),
}
