//! Vector index seam.
//!
//! The index manager owns collection lifecycle and point CRUD. The trait
//! keeps the ingestion pipeline, reconciler and retriever independent of
//! the concrete Qdrant client, so they can be exercised against an
//! in-memory index in tests.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::IndexError;
use crate::record::{ChunkPoint, SearchHit};
use crate::scope::RetrievalScope;

/// What `ensure_collection` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// No collection existed; one was created.
    Created,
    /// A collection with the requested dimension already existed.
    Kept,
    /// A collection existed with a different dimension and was destroyed
    /// and recreated. All previously ingested chunks are gone; callers must
    /// schedule a full re-ingestion.
    Rebuilt { previous_dimension: usize },
}

/// Health/diagnostics snapshot of the index.
#[derive(Clone, Debug, Serialize)]
pub struct IndexStats {
    pub point_count: u64,
    pub dimension: usize,
    pub status: String,
}

/// Collection lifecycle and point CRUD.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Ensures a collection with the given vector dimension exists.
    ///
    /// A dimension conflict triggers an explicit, logged, **destructive**
    /// rebuild. This is a full-reindex trigger, not a silent migration.
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on transport failures.
    async fn ensure_collection(&self, dimension: usize) -> Result<EnsureOutcome, IndexError>;

    /// Upserts a batch of chunk points; idempotent by `chunk_id`,
    /// overwrites on collision. Returns the number of points written.
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on transport failures.
    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<usize, IndexError>;

    /// Deletes all chunks belonging to one document and returns how many
    /// were removed. Zero is a valid result, not an error.
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on transport failures.
    async fn delete_by_document(&self, document_id: &str) -> Result<u64, IndexError>;

    /// Top-`limit` similarity search restricted to the given scope.
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on transport failures.
    async fn search(
        &self,
        vector: Vec<f32>,
        scope: &RetrievalScope,
        limit: u64,
    ) -> Result<Vec<SearchHit>, IndexError>;

    /// Collects the distinct `document_id`s stored under a course via a
    /// bounded paginated scan. Used by the reconciler and diagnostics only.
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on transport failures.
    async fn scroll_document_ids(&self, course_id: &str) -> Result<HashSet<String>, IndexError>;

    /// Returns point count, configured dimension and collection status.
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on transport failures.
    async fn stats(&self) -> Result<IndexStats, IndexError>;
}
