//! Embedding provider seam.
//!
//! Async is required because real providers (Ollama, OpenAI) perform HTTP
//! requests. Implement this trait to plug in another embedding backend.

use crate::errors::IndexError;
use std::{future::Future, pin::Pin};

/// Provider interface for embedding generation.
///
/// One text in, one vector out; batch callers issue one request per chunk.
pub trait EmbeddingsProvider: Send + Sync {
    /// Async embedding function.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>>;
}

pub mod llm;
