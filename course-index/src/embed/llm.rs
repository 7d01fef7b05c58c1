//! Embedding provider backed by the shared LLM service.

use std::sync::Arc;

use llm_service::LlmProfiles;

use crate::embed::EmbeddingsProvider;
use crate::errors::IndexError;

/// Embedding provider over the shared [`LlmProfiles`] handle.
///
/// The handle is constructed once by the application and shared across
/// concurrent requests; this wrapper only adapts its error type.
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmProfiles>,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmProfiles>) -> Self {
        Self { svc }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>,
    > {
        Box::pin(async move {
            self.svc
                .embed(text)
                .await
                .map_err(|e| IndexError::Embedding(e.to_string()))
        })
    }
}
