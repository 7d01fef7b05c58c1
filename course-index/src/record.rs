//! Core data models used by the library.
//!
//! Payload fields coming back from the vector index are loosely typed; they
//! are decoded best-effort at the index boundary into the strongly-typed
//! [`SearchHit`] rather than trusted implicitly.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only view of a document record owned by the external metadata
/// store. Created/deleted by the document-management collaborator; this
/// crate only observes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentRef {
    pub document_id: String,
    pub course_id: String,
    pub unit_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub document_type: String,
}

/// A chunk derived from one document, the unit of embedding and retrieval.
///
/// Chunks are immutable once written; a document update is modeled as
/// delete-all-chunks-for-document followed by re-ingestion, never in-place
/// mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Globally unique id, generated at ingestion.
    pub chunk_id: String,
    /// Back-reference to the owning document (non-owning).
    pub document_id: String,
    pub course_id: String,
    pub unit_name: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub text: String,
    /// RFC3339 UTC creation timestamp.
    pub created_at: String,
}

impl ChunkRecord {
    /// Creates a fresh record for one chunk of `document`.
    pub fn new(document: &DocumentRef, chunk_index: usize, total_chunks: usize, text: String) -> Self {
        Self {
            chunk_id: Uuid::new_v4().to_string(),
            document_id: document.document_id.clone(),
            course_id: document.course_id.clone(),
            unit_name: document.unit_name.clone(),
            chunk_index,
            total_chunks,
            text,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// A chunk together with its embedding vector and the denormalized source
/// file name. This is what actually gets upserted into the vector index.
#[derive(Clone, Debug)]
pub struct ChunkPoint {
    pub record: ChunkRecord,
    pub file_name: String,
    pub vector: Vec<f32>,
}

/// A single retrieval hit with similarity score and citation fields.
/// Ephemeral, never persisted.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub chunk_id: String,
    /// Similarity score, higher is better.
    pub score: f32,
    pub document_id: String,
    pub file_name: String,
    pub unit_name: String,
    pub text: String,
}

impl SearchHit {
    /// Decodes a hit from a loosely-typed payload, filling missing fields
    /// with empty strings.
    pub fn from_payload(chunk_id: String, score: f32, payload: &serde_json::Value) -> Self {
        let field = |key: &str| {
            payload
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Self {
            chunk_id,
            score,
            document_id: field("document_id"),
            file_name: field("file_name"),
            unit_name: field("unit_name"),
            text: field("text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentRef {
        DocumentRef {
            document_id: "doc-1".into(),
            course_id: "course-1".into(),
            unit_name: "Unit 1".into(),
            file_name: "notes.pdf".into(),
            mime_type: "application/pdf".into(),
            document_type: "lecture_notes".into(),
        }
    }

    #[test]
    fn new_record_copies_document_scope() {
        let r = ChunkRecord::new(&doc(), 2, 5, "body".into());
        assert_eq!(r.document_id, "doc-1");
        assert_eq!(r.course_id, "course-1");
        assert_eq!(r.unit_name, "Unit 1");
        assert_eq!(r.chunk_index, 2);
        assert_eq!(r.total_chunks, 5);
        assert!(!r.chunk_id.is_empty());
    }

    #[test]
    fn fresh_chunk_ids_are_unique() {
        let a = ChunkRecord::new(&doc(), 0, 1, "x".into());
        let b = ChunkRecord::new(&doc(), 0, 1, "x".into());
        assert_ne!(a.chunk_id, b.chunk_id);
    }

    #[test]
    fn hit_decodes_partial_payload() {
        let payload = serde_json::json!({
            "document_id": "doc-9",
            "unit_name": "Unit 2",
            "text": "chunk body"
        });
        let hit = SearchHit::from_payload("c1".into(), 0.9, &payload);
        assert_eq!(hit.document_id, "doc-9");
        assert_eq!(hit.unit_name, "Unit 2");
        assert_eq!(hit.file_name, "");
        assert_eq!(hit.text, "chunk body");
    }
}
