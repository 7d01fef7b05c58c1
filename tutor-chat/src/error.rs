//! Typed error for the tutor-chat crate.

use course_index::IndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The vector index could not be reached during retrieval. Retryable;
    /// callers may opt in to the general-knowledge fallback instead.
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Non-transport retrieval failures (unknown unit, embedding failure).
    /// `UnitNotAvailable` inside is a user error and is surfaced directly.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The text-generation call exceeded its bound. Surfaced as a
    /// user-visible "try again" failure; no partial answer is returned.
    #[error("generation timed out")]
    GenerationTimeout,

    /// Any other generation failure; no partial output is returned.
    #[error("generation failed: {0}")]
    Generation(String),
}
