use std::sync::Arc;

use course_index::{HttpCourseStore, IndexConfig};
use llm_service::LlmProfiles;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tutor_core::TutorCore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if present.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,course_index=info,tutor_chat=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(llm_service::telemetry::layer())
        .init();

    let llm = Arc::new(LlmProfiles::from_env()?);
    let store = Arc::new(HttpCourseStore::from_env()?);
    let core = TutorCore::new(llm, store, IndexConfig::from_env())?;

    // Startup diagnostics: probe the external collaborators once so a
    // misconfigured deployment fails loudly instead of on the first chat.
    for status in core.llm_health().await {
        tracing::info!(
            provider = %status.provider,
            endpoint = %status.endpoint,
            ok = status.ok,
            latency_ms = status.latency_ms,
            message = %status.message,
            "llm profile health"
        );
    }

    match core.index_stats().await {
        Ok(stats) => tracing::info!(
            points = stats.point_count,
            dimension = stats.dimension,
            status = %stats.status,
            "vector index ready"
        ),
        Err(err) => tracing::warn!(error = %err, "vector index not reachable"),
    }

    Ok(())
}
