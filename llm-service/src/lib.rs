//! Shared LLM service with two active profiles: **generation** and **embedding**.
//!
//! This crate wraps the two external collaborators of the tutoring backend,
//! the text-generation model and the embedding model, behind a narrow
//! request/response contract:
//!
//! - [`LlmProfiles::generate`] → [`GenerationOutcome`] (content + finish reason)
//! - [`LlmProfiles::embed`] → `Vec<f32>`
//!
//! Both calls are timeout-bounded by a fixed ceiling; an expired call is
//! reported as [`LlmError::Timeout`] and never retried silently.

pub mod config;
pub mod error_handler;
pub mod generation;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::LlmError;
pub use generation::{FinishReason, GenerationOutcome};
pub use health_service::{HealthService, HealthStatus};
pub use service_profiles::LlmProfiles;
