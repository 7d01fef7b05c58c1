//! Typed generation outcome shared by both providers.
//!
//! The chat orchestrator treats [`FinishReason::Length`] as the
//! authoritative truncation signal; everything else falls through to its
//! heuristic tail check.

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// The model finished naturally.
    Stop,
    /// Generation hit the token/length limit; the content is truncated.
    Length,
    /// Any other provider-specific reason, kept verbatim.
    Other(String),
}

impl FinishReason {
    /// Maps a provider's raw finish/done reason onto the typed enum.
    ///
    /// Ollama reports `done_reason: "stop" | "length" | ...`;
    /// OpenAI reports `finish_reason: "stop" | "length" | ...`.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stop" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Result of a single non-streaming generation call.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The generated text.
    pub content: String,
    /// Finish reason when the provider reported one.
    pub finish_reason: Option<FinishReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_reasons() {
        assert_eq!(FinishReason::from_provider("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_provider("length"), FinishReason::Length);
        assert_eq!(
            FinishReason::from_provider("max_tokens"),
            FinishReason::Length
        );
    }

    #[test]
    fn preserves_unknown_reasons() {
        assert_eq!(
            FinishReason::from_provider("content_filter"),
            FinishReason::Other("content_filter".into())
        );
    }
}
