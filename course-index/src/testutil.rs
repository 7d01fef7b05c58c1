//! In-memory fakes shared by the crate's tests. No network anywhere.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::embed::EmbeddingsProvider;
use crate::errors::IndexError;
use crate::index::{EnsureOutcome, IndexStats, VectorIndex};
use crate::metadata::{CourseStore, CourseUnits, UnitInfo};
use crate::record::{ChunkPoint, DocumentRef, SearchHit};
use crate::scope::RetrievalScope;

/* ---------------- documents & text ---------------- */

pub fn document(document_id: &str, course_id: &str, unit_name: &str) -> DocumentRef {
    DocumentRef {
        document_id: document_id.to_string(),
        course_id: course_id.to_string(),
        unit_name: unit_name.to_string(),
        file_name: format!("{document_id}.pdf"),
        mime_type: "application/pdf".into(),
        document_type: "lecture_notes".into(),
    }
}

pub fn long_text() -> String {
    (0..40)
        .map(|i| format!("Sentence number {:04} of the lecture notes.", i))
        .collect::<Vec<_>>()
        .join(" ")
}

/* ---------------- embedders ---------------- */

/// Deterministic embedder: the vector is derived from a hash of the text,
/// so equal texts embed equally and different texts differ.
pub struct StaticEmbedder {
    dim: usize,
}

impl StaticEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

fn text_vector(text: &str, dim: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut h = DefaultHasher::new();
    text.hash(&mut h);
    let seed = h.finish();
    (0..dim)
        .map(|i| (((seed.rotate_left(i as u32 * 7)) & 0xFFFF) as f32) / 65535.0 + 0.01)
        .collect()
}

impl EmbeddingsProvider for StaticEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>,
    > {
        let v = text_vector(text, self.dim);
        Box::pin(async move { Ok(v) })
    }
}

/// Embedder that succeeds `ok_calls` times, then fails every call.
pub struct FlakyEmbedder {
    ok_calls: usize,
    calls: AtomicUsize,
    dim: usize,
}

impl FlakyEmbedder {
    pub fn fail_after(ok_calls: usize, dim: usize) -> Self {
        Self {
            ok_calls,
            calls: AtomicUsize::new(0),
            dim,
        }
    }
}

impl EmbeddingsProvider for FlakyEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>,
    > {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if n < self.ok_calls {
            Ok(text_vector(text, self.dim))
        } else {
            Err(IndexError::Embedding("simulated provider outage".into()))
        };
        Box::pin(async move { result })
    }
}

/* ---------------- metadata store ---------------- */

pub struct StaticCourseStore {
    course_id: String,
    documents: Vec<String>,
    units: CourseUnits,
}

impl StaticCourseStore {
    pub fn with_documents(course_id: &str, documents: &[&str]) -> Self {
        Self {
            course_id: course_id.to_string(),
            documents: documents.iter().map(|s| s.to_string()).collect(),
            units: CourseUnits {
                units: Vec::new(),
                additive_retrieval: false,
            },
        }
    }

    pub fn with_units(course_id: &str, units: &[(&str, bool)], additive: bool) -> Self {
        Self {
            course_id: course_id.to_string(),
            documents: Vec::new(),
            units: CourseUnits {
                units: units
                    .iter()
                    .map(|(name, published)| UnitInfo {
                        name: name.to_string(),
                        is_published: *published,
                    })
                    .collect(),
                additive_retrieval: additive,
            },
        }
    }
}

#[async_trait]
impl CourseStore for StaticCourseStore {
    async fn document_ids_for_course(&self, course_id: &str) -> Result<Vec<String>, IndexError> {
        if course_id != self.course_id {
            return Ok(Vec::new());
        }
        Ok(self.documents.clone())
    }

    async fn course_units(&self, course_id: &str) -> Result<CourseUnits, IndexError> {
        if course_id != self.course_id {
            return Err(IndexError::Metadata(format!("unknown course {course_id}")));
        }
        Ok(self.units.clone())
    }
}

/* ---------------- vector index ---------------- */

#[derive(Default)]
struct MemState {
    dimension: Option<usize>,
    points: HashMap<String, ChunkPoint>,
}

/// In-memory [`VectorIndex`] with the same lifecycle semantics as the
/// Qdrant adapter, including the destructive dimension rebuild.
#[derive(Default)]
pub struct MemoryIndex {
    state: Mutex<MemState>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self) -> usize {
        self.state.lock().unwrap().points.len()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.state.lock().unwrap().dimension
    }

    pub fn document_ids(&self, course_id: &str) -> HashSet<String> {
        self.state
            .lock()
            .unwrap()
            .points
            .values()
            .filter(|p| p.record.course_id == course_id)
            .map(|p| p.record.document_id.clone())
            .collect()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<EnsureOutcome, IndexError> {
        let mut state = self.state.lock().unwrap();
        match state.dimension {
            None => {
                state.dimension = Some(dimension);
                Ok(EnsureOutcome::Created)
            }
            Some(have) if have == dimension => Ok(EnsureOutcome::Kept),
            Some(have) => {
                state.points.clear();
                state.dimension = Some(dimension);
                Ok(EnsureOutcome::Rebuilt {
                    previous_dimension: have,
                })
            }
        }
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<usize, IndexError> {
        let mut state = self.state.lock().unwrap();
        let count = points.len();
        for p in points {
            state.points.insert(p.record.chunk_id.clone(), p);
        }
        Ok(count)
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<u64, IndexError> {
        let mut state = self.state.lock().unwrap();
        let before = state.points.len();
        state.points.retain(|_, p| p.record.document_id != document_id);
        Ok((before - state.points.len()) as u64)
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        scope: &RetrievalScope,
        limit: u64,
    ) -> Result<Vec<SearchHit>, IndexError> {
        let state = self.state.lock().unwrap();
        let mut scored: Vec<SearchHit> = state
            .points
            .values()
            .filter(|p| p.record.course_id == scope.course_id)
            .filter(|p| scope.units.is_empty() || scope.units.contains(&p.record.unit_name))
            .map(|p| SearchHit {
                chunk_id: p.record.chunk_id.clone(),
                score: dot(&vector, &p.vector),
                document_id: p.record.document_id.clone(),
                file_name: p.file_name.clone(),
                unit_name: p.record.unit_name.clone(),
                text: p.record.text.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit as usize);
        Ok(scored)
    }

    async fn scroll_document_ids(&self, course_id: &str) -> Result<HashSet<String>, IndexError> {
        Ok(self.document_ids(course_id))
    }

    async fn stats(&self) -> Result<IndexStats, IndexError> {
        let state = self.state.lock().unwrap();
        Ok(IndexStats {
            point_count: state.points.len() as u64,
            dimension: state.dimension.unwrap_or(0),
            status: if state.dimension.is_some() {
                "Green".into()
            } else {
                "absent".into()
            },
        })
    }
}
