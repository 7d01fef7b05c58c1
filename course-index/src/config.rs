//! Runtime and collection configuration.

use crate::chunker::ChunkParams;
use crate::errors::IndexError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

/// Configuration for ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Upsert batch size (typical range: 64..512).
    pub upsert_batch: usize,
    /// Expected embedding dimensionality, when known up front.
    /// Mismatching vectors are logged, not rejected.
    pub embedding_dim: Option<usize>,
    /// Chunking parameters used by the ingestion pipeline.
    pub chunking: ChunkParams,
    /// Default number of chunks returned per retrieval.
    pub top_k: u64,
}

impl IndexConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            upsert_batch: 128,
            embedding_dim: None,
            chunking: ChunkParams::default(),
            top_k: 12,
        }
    }

    /// Builds the config from environment variables with defaults.
    ///
    /// Recognized variables: `QDRANT_URL`, `QDRANT_API_KEY`,
    /// `QDRANT_COLLECTION`, `QDRANT_BATCH_SIZE`, `EMBEDDING_DIM`,
    /// `CHUNK_SIZE`, `CHUNK_OVERLAP`, `MIN_CHUNK_SIZE`, `RETRIEVAL_TOP_K`.
    pub fn from_env() -> Self {
        let mut cfg = Self::new_default(
            env_or("QDRANT_URL", "http://127.0.0.1:6334"),
            env_or("QDRANT_COLLECTION", "course_chunks"),
        );
        cfg.qdrant_api_key = std::env::var("QDRANT_API_KEY").ok().filter(|s| !s.is_empty());
        if let Some(n) = parse_env("QDRANT_BATCH_SIZE") {
            cfg.upsert_batch = n;
        }
        cfg.embedding_dim = parse_env("EMBEDDING_DIM");
        if let Some(n) = parse_env("CHUNK_SIZE") {
            cfg.chunking.chunk_size = n;
        }
        if let Some(n) = parse_env("CHUNK_OVERLAP") {
            cfg.chunking.overlap = n;
        }
        if let Some(n) = parse_env("MIN_CHUNK_SIZE") {
            cfg.chunking.min_chunk_size = n;
        }
        if let Some(n) = parse_env("RETRIEVAL_TOP_K") {
            cfg.top_k = n;
        }
        cfg
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(IndexError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(IndexError::Config("collection is empty".into()));
        }
        if self.upsert_batch == 0 {
            return Err(IndexError::Config("upsert_batch must be > 0".into()));
        }
        if self.top_k == 0 {
            return Err(IndexError::Config("top_k must be > 0".into()));
        }
        self.chunking.validate()
    }
}

fn env_or(k: &str, dflt: &str) -> String {
    std::env::var(k)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| dflt.to_string())
}

fn parse_env<T: std::str::FromStr>(k: &str) -> Option<T> {
    std::env::var(k).ok().and_then(|v| v.parse().ok())
}
