//! Unified error handling for `llm-service`.
//!
//! A single top-level [`LlmError`] covers configuration, transport, protocol
//! and timeout failures for both providers. Small helpers for reading and
//! validating environment variables return the unified [`Result`] alias.
//!
//! All messages include the suffix `[LLM Service]` to simplify attribution
//! in logs.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Top-level error for the `llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// Required environment variable is missing or empty.
    #[error("[LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ports, limits, timeouts).
    #[error("[LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_PROVIDER`.
    #[error("[LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The provider in the config does not match the service being built.
    #[error("[LLM Service] invalid provider for this service")]
    InvalidProvider,

    /// Invalid endpoint (empty or missing http/https).
    #[error("[LLM Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Model name was empty or invalid.
    #[error("[LLM Service] model name must not be empty")]
    EmptyModel,

    /// Transport/HTTP client error.
    #[error("[LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("[LLM Service] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body.
        snippet: String,
    },

    /// Unexpected/invalid JSON response.
    #[error("[LLM Service] failed to decode response: {0}")]
    Decode(String),

    /// Chat completion returned no usable choices.
    #[error("[LLM Service] empty choices in completion response")]
    EmptyChoices,

    /// Operation exceeded the fixed call ceiling.
    #[error("[LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Trims an upstream body to a log-friendly snippet.
pub fn make_snippet(body: &str) -> String {
    body.chars().take(240).collect()
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`LlmError::MissingVar`] if the variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LlmError::MissingVar(name)),
    }
}

/// Fetches an environment variable with a fallback default.
pub fn env_or(name: &str, dflt: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| dflt.to_string())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`LlmError::InvalidNumber`] if the variable is set but not a
/// valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            v.parse::<u32>()
                .map(Some)
                .map_err(|_| LlmError::InvalidNumber {
                    var: name,
                    reason: "expected u32",
                })
        }
        _ => Ok(None),
    }
}

/// Parses an optional `f32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`LlmError::InvalidNumber`] if the variable is set but not a
/// valid `f32`.
pub fn env_opt_f32(name: &'static str) -> Result<Option<f32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            v.parse::<f32>()
                .map(Some)
                .map_err(|_| LlmError::InvalidNumber {
                    var: name,
                    reason: "expected f32",
                })
        }
        _ => Ok(None),
    }
}
