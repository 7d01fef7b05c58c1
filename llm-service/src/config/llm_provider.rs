/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// This enum distinguishes between different backends such as local Ollama
/// or OpenAI-compatible HTTP APIs.
///
/// Adding more providers in the future (e.g., Anthropic Claude, Mistral API)
/// can be done by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI-compatible chat/embeddings API.
    OpenAI,
}

impl LlmProvider {
    /// Parses a provider name as it appears in environment configuration.
    ///
    /// Accepted values (case-insensitive): `ollama`, `openai`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAI),
            _ => None,
        }
    }
}
