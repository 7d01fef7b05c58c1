//! Facade exposed to the surrounding HTTP layer.
//!
//! [`TutorCore`] owns the shared collaborators (the LLM profiles handle,
//! the metadata store client and the vector index) as explicitly
//! constructed, injected dependencies (initialize once, share the handle
//! across concurrent requests; no module-level singletons). The HTTP layer
//! calls one method per route:
//!
//! - `ingest_document`  — a course document was uploaded
//! - `delete_document`  — a document was removed
//! - `chat`             — one user message
//! - `reconcile_course` — administrative cleanup trigger
//! - `index_stats`      — health/diagnostics

use std::sync::Arc;

use course_index::{
    CourseIndex, CourseStore, DocumentRef, IndexConfig, IndexError, IndexStats, IngestReport,
    LlmEmbedder, ReconcileReport,
};
use llm_service::{HealthStatus, LlmProfiles};
use thiserror::Error;
use tracing::info;
use tutor_chat::{ChatAnswer, ChatConfig, ChatError, ChatOptions, ChatTurn};

/// Top-level error for facade operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("llm service error: {0}")]
    Llm(#[from] llm_service::LlmError),
}

/// Outcome of a document deletion.
#[derive(Clone, Copy, Debug)]
pub struct DeleteReport {
    pub deleted_chunks: u64,
}

/// The application core shared by all request handlers.
pub struct TutorCore {
    llm: Arc<LlmProfiles>,
    store: Arc<dyn CourseStore>,
    index: CourseIndex,
    embedder: LlmEmbedder,
    chat_cfg: ChatConfig,
}

impl TutorCore {
    /// Wires the core from its injected collaborators.
    ///
    /// # Errors
    /// Returns [`CoreError::Index`] if the index client cannot be built.
    pub fn new(
        llm: Arc<LlmProfiles>,
        store: Arc<dyn CourseStore>,
        index_cfg: IndexConfig,
    ) -> Result<Self, CoreError> {
        let chat_cfg = ChatConfig {
            top_k: index_cfg.top_k,
            embedding_dim: index_cfg.embedding_dim,
            ..ChatConfig::default()
        };
        let index = CourseIndex::new(index_cfg)?;
        let embedder = LlmEmbedder::new(llm.clone());

        info!("tutor core initialized");
        Ok(Self {
            llm,
            store,
            index,
            embedder,
            chat_cfg,
        })
    }

    /// Ingests one uploaded document into the vector index.
    ///
    /// # Errors
    /// Propagates ingestion failures; on `EmbeddingFailed` no chunks of the
    /// document were stored.
    pub async fn ingest_document(
        &self,
        document: &DocumentRef,
        raw_text: &str,
    ) -> Result<IngestReport, CoreError> {
        Ok(self
            .index
            .ingest_document(document, raw_text, &self.embedder)
            .await?)
    }

    /// Removes all chunks of a deleted document.
    ///
    /// # Errors
    /// Returns [`CoreError::Index`] on index failures.
    pub async fn delete_document(&self, document_id: &str) -> Result<DeleteReport, CoreError> {
        let deleted_chunks = self.index.delete_document(document_id).await?;
        Ok(DeleteReport { deleted_chunks })
    }

    /// Answers one user message with retrieval-grounded generation.
    ///
    /// # Errors
    /// Propagates [`ChatError`] per its failure semantics.
    pub async fn chat(
        &self,
        query: &str,
        course_id: &str,
        unit_name: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> Result<ChatAnswer, CoreError> {
        Ok(tutor_chat::chat_turn(
            query,
            course_id,
            unit_name,
            history,
            options,
            &self.chat_cfg,
            self.store.as_ref(),
            &self.embedder,
            self.index.vector_index(),
            self.llm.as_ref(),
        )
        .await?)
    }

    /// Runs one advisory reconciliation pass for a course.
    ///
    /// # Errors
    /// Returns [`CoreError::Index`] when the store or the index scan fails.
    pub async fn reconcile_course(&self, course_id: &str) -> Result<ReconcileReport, CoreError> {
        Ok(self
            .index
            .reconcile_course(course_id, self.store.as_ref())
            .await?)
    }

    /// Index snapshot for health/diagnostics endpoints.
    ///
    /// # Errors
    /// Returns [`CoreError::Index`] on index failures.
    pub async fn index_stats(&self) -> Result<IndexStats, CoreError> {
        Ok(self.index.stats().await?)
    }

    /// Health snapshot of the LLM collaborators.
    pub async fn llm_health(&self) -> Vec<HealthStatus> {
        self.llm.health_all().await
    }
}
