//! Thin adapter around `qdrant-client` implementing [`VectorIndex`].
//!
//! This facade concentrates all Qdrant interactions behind a minimal API,
//! hiding away the verbose builder pattern and keeping the rest of the
//! crate decoupled from `qdrant-client`. The connection handle is safe for
//! concurrent use by multiple logical operations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use qdrant_client::qdrant::{
    CollectionInfo, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
    PointStruct, PointsIdsList, ScrollPointsBuilder, SearchPointsBuilder, Value as QValue,
    VectorParamsBuilder, point_id::PointIdOptions, vectors_config,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{DistanceKind, IndexConfig};
use crate::errors::IndexError;
use crate::filters;
use crate::index::{EnsureOutcome, IndexStats, VectorIndex};
use crate::record::{ChunkPoint, SearchHit};
use crate::scope::RetrievalScope;

/// Page size for scroll scans.
const SCROLL_PAGE: u32 = 256;

/// Iteration cap for scroll pagination, bounding full scans against a
/// misbehaving index.
const MAX_SCROLL_PAGES: usize = 64;

/// Qdrant-backed vector index.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
}

impl QdrantIndex {
    /// Creates a new index handle from the given configuration.
    ///
    /// Uses the builder-based API of `qdrant-client` and supports optional
    /// API key authentication. Does not touch any collections.
    ///
    /// # Errors
    /// Returns [`IndexError::Config`] for invalid config and
    /// [`IndexError::Unavailable`] if the client cannot be constructed.
    pub fn new(cfg: &IndexConfig) -> Result<Self, IndexError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| IndexError::Unavailable(format!("client build: {e}")))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
        })
    }

    async fn create_collection(&self, dimension: usize) -> Result<(), IndexError> {
        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, distance)),
            )
            .await
            .map_err(|e| IndexError::Unavailable(format!("create_collection: {e}")))?;

        info!(
            collection = %self.collection,
            dimension,
            "collection created"
        );
        Ok(())
    }

    /// Paginated, capped scroll collecting raw points under `filter`.
    async fn scroll_pages(
        &self,
        filter: Filter,
        with_payload: bool,
    ) -> Result<Vec<(Option<PointId>, HashMap<String, QValue>)>, IndexError> {
        let mut out = Vec::new();
        let mut offset: Option<PointId> = None;

        for page in 0..MAX_SCROLL_PAGES {
            let mut builder = ScrollPointsBuilder::new(&self.collection)
                .filter(filter.clone())
                .limit(SCROLL_PAGE)
                .with_payload(with_payload)
                .with_vectors(false);
            if let Some(off) = offset.take() {
                builder = builder.offset(off);
            }

            let resp = self
                .client
                .scroll(builder)
                .await
                .map_err(|e| IndexError::Unavailable(format!("scroll: {e}")))?;

            out.extend(resp.result.into_iter().map(|p| (p.id, p.payload)));
            offset = resp.next_page_offset;

            if offset.is_none() {
                break;
            }
            if page + 1 == MAX_SCROLL_PAGES {
                warn!(
                    collection = %self.collection,
                    pages = MAX_SCROLL_PAGES,
                    "scroll page cap reached; scan may be partial"
                );
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<EnsureOutcome, IndexError> {
        if dimension == 0 {
            return Err(IndexError::DimensionMismatch { got: 0, want: 1 });
        }

        match self.client.collection_info(&self.collection).await {
            Ok(resp) => {
                let existing = resp.result.as_ref().and_then(configured_dimension);
                match existing {
                    Some(have) if have == dimension as u64 => {
                        debug!(collection = %self.collection, dimension, "collection already exists");
                        Ok(EnsureOutcome::Kept)
                    }
                    Some(have) => {
                        // Full-reindex trigger: the index is not migratable
                        // in place. This wipes every course's chunks.
                        let mismatch = IndexError::DimensionMismatch {
                            got: dimension,
                            want: have as usize,
                        };
                        warn!(
                            collection = %self.collection,
                            existing_dimension = have,
                            requested_dimension = dimension,
                            error = %mismatch,
                            "rebuilding collection destructively; all stored chunks are dropped"
                        );
                        self.client
                            .delete_collection(&self.collection)
                            .await
                            .map_err(|e| {
                                IndexError::Unavailable(format!("delete_collection: {e}"))
                            })?;
                        self.create_collection(dimension).await?;
                        Ok(EnsureOutcome::Rebuilt {
                            previous_dimension: have as usize,
                        })
                    }
                    None => {
                        warn!(
                            collection = %self.collection,
                            "collection exists but vector params could not be read; keeping it"
                        );
                        Ok(EnsureOutcome::Kept)
                    }
                }
            }
            Err(err) => {
                debug!(
                    collection = %self.collection,
                    error = %err,
                    "collection not found, will be created"
                );
                self.create_collection(dimension).await?;
                Ok(EnsureOutcome::Created)
            }
        }
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<usize, IndexError> {
        if points.is_empty() {
            debug!("no points provided for upsert");
            return Ok(0);
        }

        let mut structs: Vec<PointStruct> = Vec::with_capacity(points.len());
        for p in &points {
            structs.push(to_point_struct(p)?);
        }
        let count = structs.len();

        self.client
            .upsert_points(qdrant_client::qdrant::UpsertPointsBuilder::new(
                &self.collection,
                structs,
            ))
            .await
            .map_err(|e| IndexError::Unavailable(format!("upsert_points: {e}")))?;

        debug!(collection = %self.collection, count, "upserted points");
        Ok(count)
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<u64, IndexError> {
        let found = self
            .scroll_pages(filters::document_filter(document_id), false)
            .await?;
        let ids: Vec<PointId> = found.into_iter().filter_map(|(id, _)| id).collect();

        if ids.is_empty() {
            debug!(document_id, "no chunks found for document");
            return Ok(0);
        }
        let count = ids.len() as u64;

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList { ids })
                    .wait(true),
            )
            .await
            .map_err(|e| IndexError::Unavailable(format!("delete_points: {e}")))?;

        info!(document_id, deleted = count, "deleted document chunks");
        Ok(count)
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        scope: &RetrievalScope,
        limit: u64,
    ) -> Result<Vec<SearchHit>, IndexError> {
        debug!(
            collection = %self.collection,
            course_id = %scope.course_id,
            units = scope.units.len(),
            limit,
            "searching"
        );

        let builder = SearchPointsBuilder::new(&self.collection, vector, limit)
            .with_payload(true)
            .filter(filters::scope_filter(scope));

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| IndexError::Unavailable(format!("search_points: {e}")))?;

        let hits = res
            .result
            .into_iter()
            .map(|sp| {
                let id = sp.id.and_then(point_id_string).unwrap_or_default();
                let payload = payload_to_json(sp.payload);
                SearchHit::from_payload(id, sp.score, &payload)
            })
            .collect();

        Ok(hits)
    }

    async fn scroll_document_ids(&self, course_id: &str) -> Result<HashSet<String>, IndexError> {
        let found = self
            .scroll_pages(filters::course_filter(course_id), true)
            .await?;

        let mut ids = HashSet::new();
        for (_, payload) in found {
            if let Some(doc_id) = payload
                .get("document_id")
                .and_then(|v| v.clone().into_json().as_str().map(str::to_string))
            {
                ids.insert(doc_id);
            }
        }

        debug!(course_id, distinct_documents = ids.len(), "scrolled course");
        Ok(ids)
    }

    async fn stats(&self) -> Result<IndexStats, IndexError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| IndexError::Unavailable(format!("collection_exists: {e}")))?;
        if !exists {
            return Ok(IndexStats {
                point_count: 0,
                dimension: 0,
                status: "absent".into(),
            });
        }

        let resp = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| IndexError::Unavailable(format!("collection_info: {e}")))?;

        let info = resp
            .result
            .ok_or_else(|| IndexError::Unavailable("empty collection_info result".into()))?;

        Ok(IndexStats {
            point_count: info.points_count.unwrap_or(0),
            dimension: configured_dimension(&info).unwrap_or(0) as usize,
            status: format!("{:?}", info.status()),
        })
    }
}

/* ---------------- payload & id helpers ---------------- */

/// Builds the stored payload for one chunk point.
///
/// We serialize to JSON and then `try_into()` → `Payload` as recommended by
/// the client.
fn to_point_struct(p: &ChunkPoint) -> Result<PointStruct, IndexError> {
    let as_json = json!({
        "chunk_id": p.record.chunk_id,
        "document_id": p.record.document_id,
        "course_id": p.record.course_id,
        "unit_name": p.record.unit_name,
        "chunk_index": p.record.chunk_index as i64,
        "total_chunks": p.record.total_chunks as i64,
        "file_name": p.file_name,
        "text": p.record.text,
        "created_at": p.record.created_at,
    });
    let payload: Payload = as_json
        .try_into()
        .map_err(|e| IndexError::Unavailable(format!("payload convert: {e}")))?;

    Ok(PointStruct::new(
        p.record.chunk_id.clone(),
        p.vector.clone(),
        payload,
    ))
}

/// Converts a Qdrant payload map into a JSON object for best-effort
/// decoding at the index boundary.
fn payload_to_json(payload: HashMap<String, QValue>) -> serde_json::Value {
    let mut m = serde_json::Map::with_capacity(payload.len());
    for (k, v) in payload {
        m.insert(k, v.into_json());
    }
    serde_json::Value::Object(m)
}

/// Extracts a point id in stable string form.
fn point_id_string(pid: PointId) -> Option<String> {
    match pid.point_id_options {
        Some(PointIdOptions::Uuid(s)) => Some(s),
        Some(PointIdOptions::Num(n)) => Some(n.to_string()),
        None => None,
    }
}

/// Reads the configured vector dimension out of collection info.
fn configured_dimension(info: &CollectionInfo) -> Option<u64> {
    let params = info.config.as_ref()?.params.as_ref()?;
    match params.vectors_config.as_ref()?.config.as_ref()? {
        vectors_config::Config::Params(p) => Some(p.size),
        _ => None,
    }
}
