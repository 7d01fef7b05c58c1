use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{LlmError, env_opt_f32, env_opt_u32, env_or, must_env};

/// Configuration for a single LLM model invocation profile.
///
/// One instance describes one (provider, model, endpoint) triple together
/// with its sampling and transport knobs. The tutoring backend uses two of
/// these: a generation profile and an embedding profile.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend (e.g., Ollama, OpenAI).
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"llama3.1"`, `"gpt-4o-mini"`).
    pub model: String,

    /// Inference endpoint (local server or remote API URL).
    pub endpoint: String,

    /// Optional API key for authentication (e.g., OpenAI).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (low values for factual consistency).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds) for the HTTP client.
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Builds the **generation** profile from environment variables.
    ///
    /// Required: `LLM_PROVIDER`, `LLM_ENDPOINT`, `GENERATION_MODEL`.
    /// Optional: `LLM_API_KEY`, `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`,
    /// `LLM_TOP_P`, `LLM_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// Returns [`LlmError`] for missing/invalid variables.
    pub fn generation_from_env() -> Result<Self, LlmError> {
        Self::from_env_with_model("GENERATION_MODEL")
    }

    /// Builds the **embedding** profile from environment variables.
    ///
    /// Same variables as [`Self::generation_from_env`], except the model is
    /// read from `EMBEDDING_MODEL`.
    ///
    /// # Errors
    /// Returns [`LlmError`] for missing/invalid variables.
    pub fn embedding_from_env() -> Result<Self, LlmError> {
        Self::from_env_with_model("EMBEDDING_MODEL")
    }

    fn from_env_with_model(model_var: &'static str) -> Result<Self, LlmError> {
        let provider_raw = env_or("LLM_PROVIDER", "ollama");
        let provider = LlmProvider::parse(&provider_raw)
            .ok_or_else(|| LlmError::UnsupportedProvider(provider_raw))?;

        let endpoint = must_env("LLM_ENDPOINT")?;
        let model = must_env(model_var)?;

        let cfg = Self {
            provider,
            model,
            endpoint,
            api_key: std::env::var("LLM_API_KEY").ok().filter(|s| !s.is_empty()),
            max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
            // Low temperature keeps grounded answers factually consistent.
            temperature: env_opt_f32("LLM_TEMPERATURE")?.or(Some(0.2)),
            top_p: env_opt_f32("LLM_TOP_P")?,
            timeout_secs: env_opt_u32("LLM_TIMEOUT_SECS")?.map(u64::from),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates endpoint scheme and model name.
    ///
    /// # Errors
    /// Returns [`LlmError::InvalidEndpoint`] or [`LlmError::EmptyModel`].
    pub fn validate(&self) -> Result<(), LlmError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(LlmError::InvalidEndpoint(self.endpoint.clone()));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::EmptyModel);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3.1".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: Some(512),
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn validate_accepts_http_endpoint() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_scheme() {
        let mut cfg = base();
        cfg.endpoint = "localhost:11434".into();
        assert!(matches!(cfg.validate(), Err(LlmError::InvalidEndpoint(_))));
    }

    #[test]
    fn validate_rejects_empty_model() {
        let mut cfg = base();
        cfg.model = "  ".into();
        assert!(matches!(cfg.validate(), Err(LlmError::EmptyModel)));
    }
}
