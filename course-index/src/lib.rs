//! Document ingestion, vector indexing and scoped retrieval for the
//! tutoring backend.
//!
//! This crate provides a clean API to:
//! - Ingest uploaded course documents (sanitize → chunk → embed → upsert)
//! - Keep the vector index consistent with the metadata store (reconciler)
//! - Retrieve top-K context under unit-scoped or additive retrieval policies
//!
//! The design is flat (no deep nesting) and splits responsibilities into
//! focused modules.

pub mod chunker;
pub mod config;
pub mod embed;
pub mod errors;
mod filters;
pub mod index;
pub mod ingest;
pub mod metadata;
pub mod qdrant;
pub mod reconcile;
pub mod record;
pub mod retrieve;
pub mod sanitize;
pub mod scope;

#[cfg(test)]
pub(crate) mod testutil;

pub use chunker::{ChunkParams, chunk_text};
pub use config::{DistanceKind, IndexConfig};
pub use embed::{EmbeddingsProvider, llm::LlmEmbedder};
pub use errors::IndexError;
pub use index::{EnsureOutcome, IndexStats, VectorIndex};
pub use ingest::IngestReport;
pub use metadata::{CourseStore, CourseUnits, UnitInfo, http::HttpCourseStore};
pub use qdrant::QdrantIndex;
pub use reconcile::ReconcileReport;
pub use record::{ChunkPoint, ChunkRecord, DocumentRef, SearchHit};
pub use retrieve::{Citation, RetrievedContext};
pub use scope::RetrievalScope;

use tracing::trace;

/// High-level facade that wires configuration and the Qdrant index.
///
/// Constructed once at startup and shared (read-only) across concurrent
/// requests; ingestion, retrieval and reconciliation are independent
/// operations with no shared mutable state beyond the connection handle.
pub struct CourseIndex {
    cfg: IndexConfig,
    index: QdrantIndex,
}

impl CourseIndex {
    /// Constructs a new facade from the given configuration.
    ///
    /// # Errors
    /// Returns [`IndexError::Config`] for invalid config and
    /// [`IndexError::Unavailable`] if the client initialization fails.
    pub fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        trace!("CourseIndex::new collection={}", cfg.collection);
        let index = QdrantIndex::new(&cfg)?;
        Ok(Self { cfg, index })
    }

    /// Read access to the effective configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.cfg
    }

    /// The underlying index as its seam trait, for callers that compose
    /// their own pipelines (e.g. the chat orchestrator).
    pub fn vector_index(&self) -> &dyn VectorIndex {
        &self.index
    }

    /// Ingests one uploaded document. See [`ingest::ingest`].
    ///
    /// # Errors
    /// Propagates `InvalidInput`, `EmbeddingFailed` and `Unavailable`.
    pub async fn ingest_document(
        &self,
        document: &DocumentRef,
        raw_text: &str,
        embedder: &dyn EmbeddingsProvider,
    ) -> Result<IngestReport, IndexError> {
        let params = ingest::IngestParams {
            chunking: self.cfg.chunking.clone(),
            upsert_batch: self.cfg.upsert_batch,
            embedding_dim: self.cfg.embedding_dim,
        };
        ingest::ingest(document, raw_text, &params, embedder, &self.index).await
    }

    /// Deletes all chunks of a removed document; returns the count
    /// (zero when the document had no chunks).
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on index failures.
    pub async fn delete_document(&self, document_id: &str) -> Result<u64, IndexError> {
        self.index.delete_by_document(document_id).await
    }

    /// Runs one advisory reconciliation pass for a course.
    /// See [`reconcile::reconcile`].
    ///
    /// # Errors
    /// Propagates `Metadata` and `Unavailable`.
    pub async fn reconcile_course(
        &self,
        course_id: &str,
        store: &dyn CourseStore,
    ) -> Result<ReconcileReport, IndexError> {
        reconcile::reconcile(course_id, store, &self.index).await
    }

    /// Retrieves context for one chat turn. `top_k = None` uses the
    /// configured default. See [`retrieve::retrieve`].
    ///
    /// # Errors
    /// Propagates `UnitNotAvailable`, `Embedding` and `Unavailable`.
    pub async fn retrieve(
        &self,
        query: &str,
        course_id: &str,
        unit_name: &str,
        top_k: Option<u64>,
        store: &dyn CourseStore,
        embedder: &dyn EmbeddingsProvider,
    ) -> Result<RetrievedContext, IndexError> {
        retrieve::retrieve(
            query,
            course_id,
            unit_name,
            top_k.unwrap_or(self.cfg.top_k),
            self.cfg.embedding_dim,
            store,
            embedder,
            &self.index,
        )
        .await
    }

    /// Ensures the collection exists with the given dimension. Exposed for
    /// operators reconciling the index after an embedding model change;
    /// a conflicting dimension triggers the destructive rebuild.
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on index failures.
    pub async fn ensure_collection(&self, dimension: usize) -> Result<EnsureOutcome, IndexError> {
        self.index.ensure_collection(dimension).await
    }

    /// Point count, dimension and status for health/diagnostics endpoints.
    ///
    /// # Errors
    /// Returns [`IndexError::Unavailable`] on index failures.
    pub async fn stats(&self) -> Result<IndexStats, IndexError> {
        self.index.stats().await
    }
}
