//! Retrieval: scope computation, query embedding, scoped search and
//! citation building.

use tracing::{debug, warn};

use crate::embed::EmbeddingsProvider;
use crate::errors::IndexError;
use crate::index::VectorIndex;
use crate::metadata::CourseStore;
use crate::record::SearchHit;
use crate::scope::{RetrievalScope, compute_scope};

/// A display citation for one retrieved chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct Citation {
    pub unit_name: String,
    pub file_name: String,
    pub score: f32,
}

/// The retrieval result for one chat turn.
#[derive(Clone, Debug)]
pub struct RetrievedContext {
    /// Ranked hits, duplicates from the same file kept: chunks at
    /// different positions carry different content for the prompt.
    pub hits: Vec<SearchHit>,
    /// Citations de-duplicated by (unit, file) for display purposes.
    pub citations: Vec<Citation>,
    /// The scope actually used, for transparency/debugging.
    pub scope: RetrievalScope,
}

/// Retrieves the top-`top_k` chunks for `query` under the course's
/// retrieval policy.
///
/// # Errors
/// - [`IndexError::UnitNotAvailable`] for an unpublished/unknown unit
/// - [`IndexError::Embedding`] if the query embedding fails
/// - [`IndexError::Unavailable`] if the index cannot be reached
pub async fn retrieve(
    query: &str,
    course_id: &str,
    unit_name: &str,
    top_k: u64,
    expected_dim: Option<usize>,
    store: &dyn CourseStore,
    embedder: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
) -> Result<RetrievedContext, IndexError> {
    let course = store.course_units(course_id).await?;
    let scope = compute_scope(course_id, unit_name, &course)?;
    debug!(
        course_id,
        unit_name,
        additive = course.additive_retrieval,
        scope_units = scope.units.len(),
        "retrieval scope computed"
    );

    let vector = embedder.embed(query).await?;
    if let Some(want) = expected_dim {
        if vector.len() != want {
            warn!(
                got = vector.len(),
                want,
                "query embedding dimension differs from configured index dimension"
            );
        }
    }

    let hits = index.search(vector, &scope, top_k).await?;
    let citations = build_citations(&hits);

    debug!(hits = hits.len(), citations = citations.len(), "retrieved");
    Ok(RetrievedContext {
        hits,
        citations,
        scope,
    })
}

/// De-duplicates citations by (unit, file), keeping the first (highest
/// scoring) occurrence. The hit list itself is left untouched.
fn build_citations(hits: &[SearchHit]) -> Vec<Citation> {
    let mut seen: Vec<(String, String)> = Vec::new();
    let mut out = Vec::new();
    for h in hits {
        let key = (h.unit_name.clone(), h.file_name.clone());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(Citation {
            unit_name: h.unit_name.clone(),
            file_name: h.file_name.clone(),
            score: h.score,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkParams;
    use crate::ingest::{IngestParams, ingest};
    use crate::testutil::{MemoryIndex, StaticCourseStore, StaticEmbedder, document, long_text};

    fn params() -> IngestParams {
        IngestParams {
            chunking: ChunkParams {
                chunk_size: 300,
                overlap: 60,
                min_chunk_size: 30,
            },
            upsert_batch: 8,
            embedding_dim: Some(4),
        }
    }

    async fn seed_unit(index: &MemoryIndex, doc_id: &str, unit: &str) {
        let doc = document(doc_id, "course-1", unit);
        ingest(&doc, &long_text(), &params(), &StaticEmbedder::new(4), index)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn single_unit_scope_only_returns_that_unit() {
        let index = MemoryIndex::new();
        seed_unit(&index, "doc-u1", "U1").await;
        seed_unit(&index, "doc-u2", "U2").await;

        let store = StaticCourseStore::with_units(
            "course-1",
            &[("U1", true), ("U2", true)],
            false,
        );
        let ctx = retrieve(
            "what is a derivative?",
            "course-1",
            "U1",
            12,
            Some(4),
            &store,
            &StaticEmbedder::new(4),
            &index,
        )
        .await
        .unwrap();

        assert!(!ctx.hits.is_empty());
        assert!(ctx.hits.iter().all(|h| h.unit_name == "U1"));
        assert_eq!(ctx.scope.units, vec!["U1"]);
    }

    #[tokio::test]
    async fn additive_scope_spans_prior_units_but_not_unpublished() {
        let index = MemoryIndex::new();
        seed_unit(&index, "doc-u1", "U1").await;
        seed_unit(&index, "doc-u2", "U2").await;
        seed_unit(&index, "doc-u3", "U3").await;

        let store = StaticCourseStore::with_units(
            "course-1",
            &[("U1", true), ("U2", true), ("U3", false)],
            true,
        );
        let ctx = retrieve(
            "integration by parts",
            "course-1",
            "U2",
            50,
            Some(4),
            &store,
            &StaticEmbedder::new(4),
            &index,
        )
        .await
        .unwrap();

        let units: std::collections::HashSet<_> =
            ctx.hits.iter().map(|h| h.unit_name.as_str()).collect();
        assert!(units.contains("U1"));
        assert!(units.contains("U2"));
        assert!(!units.contains("U3"), "unpublished unit must never leak");
        assert_eq!(ctx.scope.units, vec!["U1", "U2"]);
    }

    #[tokio::test]
    async fn unknown_unit_fails_with_unit_not_available() {
        let index = MemoryIndex::new();
        let store =
            StaticCourseStore::with_units("course-1", &[("U1", true)], false);
        let err = retrieve(
            "anything",
            "course-1",
            "U7",
            12,
            Some(4),
            &store,
            &StaticEmbedder::new(4),
            &index,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IndexError::UnitNotAvailable { .. }));
    }

    #[tokio::test]
    async fn respects_top_k_limit() {
        let index = MemoryIndex::new();
        seed_unit(&index, "doc-u1", "U1").await;

        let store = StaticCourseStore::with_units("course-1", &[("U1", true)], false);
        let ctx = retrieve(
            "limits",
            "course-1",
            "U1",
            3,
            Some(4),
            &store,
            &StaticEmbedder::new(4),
            &index,
        )
        .await
        .unwrap();
        assert!(ctx.hits.len() <= 3);
    }

    #[test]
    fn citations_are_deduplicated_but_hits_are_not() {
        let hit = |unit: &str, file: &str, score: f32| SearchHit {
            chunk_id: format!("{unit}-{file}-{score}"),
            score,
            document_id: "d".into(),
            file_name: file.into(),
            unit_name: unit.into(),
            text: "t".into(),
        };
        let hits = vec![
            hit("U1", "a.pdf", 0.9),
            hit("U1", "a.pdf", 0.8),
            hit("U2", "b.pdf", 0.7),
        ];
        let citations = build_citations(&hits);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].file_name, "a.pdf");
        assert!((citations[0].score - 0.9).abs() < f32::EPSILON);
    }
}
