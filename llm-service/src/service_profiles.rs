//! Shared LLM service with two active profiles: **generation** and **embedding**.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - Every outward call is bounded by a fixed ceiling
//!   ([`CALL_CEILING`]); an expired call is reported as
//!   [`LlmError::Timeout`] and never retried here.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::RwLock;
use tracing::warn;

use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
use crate::error_handler::LlmError;
use crate::generation::GenerationOutcome;
use crate::health_service::{HealthService, HealthStatus};
use crate::services::{ollama_service::OllamaService, open_ai_service::OpenAiService};

/// Hard ceiling for a single generation or embedding call.
///
/// Calls exceeding this bound are abandoned and reported as a timeout, not
/// retried silently.
pub const CALL_CEILING: Duration = Duration::from_secs(120);

/// Shared service that manages the two logical LLM profiles used by the
/// tutoring backend: **generation** and **embedding**.
///
/// Internally, it caches Ollama/OpenAI clients keyed by their configuration
/// to avoid recreating HTTP clients on each call.
pub struct LlmProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,

    health: HealthService,
}

impl LlmProfiles {
    /// Creates a new service with the two profiles.
    ///
    /// # Errors
    /// Returns [`LlmError`] if a profile config is invalid or the health
    /// checker's HTTP client cannot be built.
    pub fn new(
        generation: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, LlmError> {
        generation.validate()?;
        embedding.validate()?;

        Ok(Self {
            generation,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds both profiles from environment variables.
    ///
    /// # Errors
    /// Returns [`LlmError`] for missing/invalid variables.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(
            LlmModelConfig::generation_from_env()?,
            LlmModelConfig::embedding_from_env()?,
            None,
        )
    }

    /// Generates text using the **generation** profile.
    ///
    /// # Arguments
    /// - `prompt`: input text prompt.
    /// - `system`: optional system instruction.
    ///
    /// # Errors
    /// Returns [`LlmError`] if generation fails, or [`LlmError::Timeout`]
    /// when the fixed call ceiling expires.
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<GenerationOutcome, LlmError> {
        let fut = self.generate_with(&self.generation, prompt, system);
        match tokio::time::timeout(CALL_CEILING, fut).await {
            Ok(res) => res,
            Err(_) => {
                warn!(ceiling_secs = CALL_CEILING.as_secs(), "generation call abandoned");
                Err(LlmError::Timeout(CALL_CEILING))
            }
        }
    }

    /// Computes embeddings using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`LlmError`] if embedding fails, or [`LlmError::Timeout`]
    /// when the fixed call ceiling expires.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, LlmError> {
        let fut = self.embed_with(&self.embedding, input);
        match tokio::time::timeout(CALL_CEILING, fut).await {
            Ok(res) => res,
            Err(_) => {
                warn!(ceiling_secs = CALL_CEILING.as_secs(), "embedding call abandoned");
                Err(LlmError::Timeout(CALL_CEILING))
            }
        }
    }

    /// Returns a health snapshot for all distinct profiles.
    ///
    /// If the embedding profile equals the generation profile, it is checked
    /// only once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::<LlmModelConfig>::with_capacity(2);
        list.push(self.generation.clone());
        if self.embedding != self.generation {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(generation, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.generation, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn generate_with(
        &self,
        cfg: &LlmModelConfig,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<GenerationOutcome, LlmError> {
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                cli.generate(prompt, system).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.generate(prompt, system).await
            }
        }
    }

    async fn embed_with(&self, cfg: &LlmModelConfig, input: &str) -> Result<Vec<f32>, LlmError> {
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                cli.embeddings(input).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.embeddings(input).await
            }
        }
    }

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, LlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, LlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}
