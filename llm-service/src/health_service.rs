//! Universal health service for LLM backends (Ollama, OpenAI).
//!
//! This module exposes lightweight health checks for supported providers:
//! - Ollama: `GET {endpoint}/api/tags`
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a
//! diagnostics endpoint. [`HealthService::check`] is resilient and never
//! fails (errors are mapped to `ok=false`).

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{LlmError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Ollama", "OpenAI").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    #[inline]
    fn ok(cfg: &LlmModelConfig, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok: true,
            latency_ms,
            message: message.into(),
        }
    }

    #[inline]
    fn fail(cfg: &LlmModelConfig, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok: false,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A universal health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`LlmError::Transport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Checks health for a single LLM config, routing to the provider-specific probe.
    ///
    /// This method is **resilient**: it never returns an error. Any failure
    /// is converted to `HealthStatus { ok: false, message: ... }`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            warn!(
                provider = ?cfg.provider,
                endpoint = %cfg.endpoint,
                "invalid endpoint (empty or missing http/https)"
            );
            return HealthStatus::fail(cfg, 0, "invalid endpoint");
        }

        let base = endpoint.trim_end_matches('/');
        let url = match cfg.provider {
            LlmProvider::Ollama => format!("{}/api/tags", base),
            LlmProvider::OpenAI => format!("{}/v1/models", base),
        };

        let started = Instant::now();
        let mut req = self.client.get(&url);
        if cfg.provider == LlmProvider::OpenAI {
            if let Some(key) = &cfg.api_key {
                req = req.header(header::AUTHORIZATION, format!("Bearer {}", key));
            }
        }

        debug!(provider = ?cfg.provider, %url, "health probe");
        match req.send().await {
            Ok(resp) if resp.status().is_success() => {
                HealthStatus::ok(cfg, started.elapsed().as_millis(), "reachable")
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                HealthStatus::fail(
                    cfg,
                    started.elapsed().as_millis(),
                    format!("HTTP {}: {}", status, make_snippet(&body)),
                )
            }
            Err(e) => HealthStatus::fail(
                cfg,
                started.elapsed().as_millis(),
                format!("transport error: {e}"),
            ),
        }
    }

    /// Checks a list of configs sequentially and returns their statuses.
    pub async fn check_many(&self, cfgs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(cfgs.len());
        for cfg in cfgs {
            out.push(self.check(cfg).await);
        }
        out
    }
}
