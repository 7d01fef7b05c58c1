//! End-to-end ingestion pipeline for one document:
//! sanitize → chunk → embed → upsert into the vector index.
//!
//! Chunk sets are all-or-nothing per document: every chunk is embedded
//! before anything is written, so an embedding failure aborts the whole
//! document and leaves zero of its chunks in the index. This keeps
//! retrieval behavior predictable after partial failures.

use tracing::{debug, info, warn};

use crate::chunker::{ChunkParams, chunk_text};
use crate::embed::EmbeddingsProvider;
use crate::errors::IndexError;
use crate::index::VectorIndex;
use crate::record::{ChunkPoint, ChunkRecord, DocumentRef};
use crate::sanitize::sanitize_text;

/// Outcome of one document's ingestion.
#[derive(Clone, Copy, Debug)]
pub struct IngestReport {
    /// Chunks produced and embedded.
    pub chunks_processed: usize,
    /// Chunks actually written to the index.
    pub chunks_stored: usize,
}

/// Ingestion knobs resolved from [`crate::config::IndexConfig`].
#[derive(Clone, Debug)]
pub struct IngestParams {
    pub chunking: ChunkParams,
    pub upsert_batch: usize,
    /// Expected embedding dimension; mismatching vectors are logged as
    /// warnings but do not abort ingestion.
    pub embedding_dim: Option<usize>,
}

/// Ingests one document's raw text.
///
/// # Errors
/// - [`IndexError::InvalidInput`] for empty/degenerate text (no partial writes)
/// - [`IndexError::EmbeddingFailed`] when any chunk's embedding fails
///   (the whole document is aborted; nothing was written)
/// - [`IndexError::Unavailable`] for index transport failures
pub async fn ingest(
    document: &DocumentRef,
    raw_text: &str,
    params: &IngestParams,
    embedder: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
) -> Result<IngestReport, IndexError> {
    let text = sanitize_text(raw_text);
    let chunks = chunk_text(&text, &params.chunking)?;
    let total = chunks.len();
    debug!(
        document_id = %document.document_id,
        course_id = %document.course_id,
        chunks = total,
        "document chunked"
    );

    // Embed everything before the first write. One request per chunk; the
    // first failure aborts the document.
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);
    for (i, chunk) in chunks.iter().enumerate() {
        let vector = embedder.embed(chunk).await.map_err(|e| {
            warn!(
                document_id = %document.document_id,
                chunk_index = i,
                error = %e,
                "embedding failed; aborting document ingestion"
            );
            IndexError::EmbeddingFailed {
                document_id: document.document_id.clone(),
                reason: e.to_string(),
            }
        })?;
        if vector.is_empty() {
            return Err(IndexError::EmbeddingFailed {
                document_id: document.document_id.clone(),
                reason: "provider returned an empty vector".into(),
            });
        }
        if let Some(want) = params.embedding_dim {
            if vector.len() != want {
                warn!(
                    document_id = %document.document_id,
                    chunk_index = i,
                    got = vector.len(),
                    want,
                    "embedding dimension differs from configured index dimension"
                );
            }
        }
        vectors.push(vector);
    }

    let dimension = params
        .embedding_dim
        .or_else(|| vectors.first().map(Vec::len))
        .unwrap_or_default();
    index.ensure_collection(dimension).await?;

    let points: Vec<ChunkPoint> = chunks
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (text, vector))| ChunkPoint {
            record: ChunkRecord::new(document, i, total, text),
            file_name: document.file_name.clone(),
            vector,
        })
        .collect();

    let mut stored = 0usize;
    for batch in points.chunks(params.upsert_batch.max(1)) {
        stored += index.upsert(batch.to_vec()).await?;
    }

    info!(
        document_id = %document.document_id,
        chunks_processed = total,
        chunks_stored = stored,
        "document ingested"
    );
    Ok(IngestReport {
        chunks_processed: total,
        chunks_stored: stored,
    })
}
