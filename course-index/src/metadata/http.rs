//! HTTP client for the metadata store.
//!
//! The store exposes two read-only queries consumed by this crate:
//! - `GET {base}/courses/{course_id}/document-ids` → `["doc-1", ...]`
//! - `GET {base}/courses/{course_id}/units` →
//!   `{ "units": [{"name": "...", "is_published": true}], "additive_retrieval": false }`

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::IndexError;
use crate::metadata::{CourseStore, CourseUnits};

/// Reqwest-backed [`CourseStore`] client.
#[derive(Debug)]
pub struct HttpCourseStore {
    client: reqwest::Client,
    base: String,
}

impl HttpCourseStore {
    /// Builds a client for the given base URL.
    ///
    /// # Errors
    /// Returns [`IndexError::Config`] for an invalid URL and
    /// [`IndexError::Metadata`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, IndexError> {
        let base = base_url.trim().trim_end_matches('/').to_string();
        if base.is_empty() || !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(IndexError::Config(format!(
                "invalid metadata store url: {base_url}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| IndexError::Metadata(format!("client build: {e}")))?;

        Ok(Self { client, base })
    }

    /// Builds the client from `METADATA_URL` (and optional
    /// `METADATA_TIMEOUT_SECS`).
    ///
    /// # Errors
    /// Returns [`IndexError::Config`] when `METADATA_URL` is missing or invalid.
    pub fn from_env() -> Result<Self, IndexError> {
        let url = std::env::var("METADATA_URL")
            .map_err(|_| IndexError::Config("METADATA_URL is not set".into()))?;
        let timeout = std::env::var("METADATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        Self::new(&url, timeout)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, IndexError> {
        debug!(%url, "GET metadata store");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IndexError::Metadata(format!("transport: {e}")))?;

        if !resp.status().is_success() {
            return Err(IndexError::Metadata(format!(
                "HTTP {} from {url}",
                resp.status()
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| IndexError::Metadata(format!("decode: {e}")))
    }
}

#[async_trait]
impl CourseStore for HttpCourseStore {
    async fn document_ids_for_course(&self, course_id: &str) -> Result<Vec<String>, IndexError> {
        self.get_json(format!("{}/courses/{}/document-ids", self.base, course_id))
            .await
    }

    async fn course_units(&self, course_id: &str) -> Result<CourseUnits, IndexError> {
        self.get_json(format!("{}/courses/{}/units", self.base, course_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_url() {
        let err = HttpCourseStore::new("localhost:9000", 5).unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn trims_trailing_slash() {
        let store = HttpCourseStore::new("http://meta.local/", 5).unwrap();
        assert_eq!(store.base, "http://meta.local");
    }
}
