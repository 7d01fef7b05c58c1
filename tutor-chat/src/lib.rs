//! Grounded chat orchestration for the tutoring backend.
//!
//! State machine per chat turn:
//! `Retrieving -> Generating -> (Truncated? -> Continuing)* -> Done`.
//!
//! Retrieval failures caused by an unreachable index surface as a
//! retryable [`ChatError::RetrievalUnavailable`], or degrade to an
//! ungrounded "general knowledge" answer when the caller opts in.
//! Generation failures surface with no partial output. Continuation calls
//! are bounded by [`MAX_CONTINUATIONS`] so a pathologically non-terminating
//! generation cannot grow latency or cost without limit.

mod api_types;
mod error;
pub mod prompt;
pub mod truncation;

pub use api_types::{ChatAnswer, ChatConfig, ChatOptions, ChatTurn, Role};
pub use error::ChatError;

use std::{future::Future, pin::Pin};

use course_index::{
    CourseStore, EmbeddingsProvider, IndexError, RetrievalScope, VectorIndex,
};
use llm_service::{GenerationOutcome, LlmError, LlmProfiles};
use tracing::{debug, info, warn};

/// Upper bound on continuation calls per chat turn.
pub const MAX_CONTINUATIONS: usize = 2;

/// Generation seam; implemented by [`LlmProfiles`] and by scripted fakes in
/// tests.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationOutcome, LlmError>> + Send + 'a>>;
}

impl TextGenerator for LlmProfiles {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationOutcome, LlmError>> + Send + 'a>> {
        Box::pin(LlmProfiles::generate(self, prompt, system))
    }
}

/// Runs one full chat turn: retrieve, generate, continue while truncated.
///
/// # Errors
/// - [`ChatError::RetrievalUnavailable`] when the index is unreachable and
///   fallback is not enabled
/// - [`ChatError::Index`] for other retrieval failures (e.g. the unit is
///   not available, a user error)
/// - [`ChatError::GenerationTimeout`] / [`ChatError::Generation`] from the
///   text-generation collaborator, with no partial output
#[allow(clippy::too_many_arguments)]
pub async fn chat_turn(
    query: &str,
    course_id: &str,
    unit_name: &str,
    history: &[ChatTurn],
    opts: &ChatOptions,
    cfg: &ChatConfig,
    store: &dyn CourseStore,
    embedder: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
    generator: &dyn TextGenerator,
) -> Result<ChatAnswer, ChatError> {
    let top_k = opts.top_k.unwrap_or(cfg.top_k);

    let retrieved = course_index::retrieve::retrieve(
        query,
        course_id,
        unit_name,
        top_k,
        cfg.embedding_dim,
        store,
        embedder,
        index,
    )
    .await;

    let (hits, citations, scope, system) = match retrieved {
        Ok(ctx) => (ctx.hits, ctx.citations, ctx.scope, prompt::SYSTEM_PROMPT),
        Err(IndexError::Unavailable(reason)) if opts.general_knowledge_fallback => {
            warn!(
                course_id,
                error = %reason,
                "index unreachable; degrading to general-knowledge answer"
            );
            (
                Vec::new(),
                Vec::new(),
                RetrievalScope::empty(course_id),
                prompt::GENERAL_SYSTEM_PROMPT,
            )
        }
        Err(IndexError::Unavailable(reason)) => {
            return Err(ChatError::RetrievalUnavailable(reason));
        }
        Err(e) => return Err(ChatError::Index(e)),
    };

    let user_prompt = prompt::build_prompt(query, &hits, history, cfg.max_ctx_chars);
    let (text, continuations) = run_generation(&user_prompt, system, generator).await?;

    info!(
        course_id,
        unit_name,
        continuations,
        citations = citations.len(),
        scope_units = scope.units.len(),
        "chat turn complete"
    );
    Ok(ChatAnswer {
        text,
        citations,
        retrieval_scope: scope,
    })
}

/// The generation half of the turn: one base call, then bounded
/// continuations while the accumulated answer still looks truncated.
async fn run_generation(
    user_prompt: &str,
    system: &str,
    generator: &dyn TextGenerator,
) -> Result<(String, usize), ChatError> {
    let first = generator
        .generate(user_prompt, Some(system))
        .await
        .map_err(map_generation_error)?;

    let mut text = first.content;
    let mut reason = first.finish_reason;
    let mut continuations = 0usize;

    while truncation::is_truncated(&text, reason.as_ref()) && continuations < MAX_CONTINUATIONS {
        debug!(continuations, len = text.len(), "answer looks truncated; continuing");
        let continuation_prompt = prompt::build_continuation_prompt(&text);
        let outcome = generator
            .generate(&continuation_prompt, Some(system))
            .await
            .map_err(map_generation_error)?;
        text.push_str(&outcome.content);
        reason = outcome.finish_reason;
        continuations += 1;
    }

    Ok((text, continuations))
}

fn map_generation_error(e: LlmError) -> ChatError {
    match e {
        LlmError::Timeout(_) => ChatError::GenerationTimeout,
        other => ChatError::Generation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use course_index::{
        ChunkPoint, CourseUnits, EnsureOutcome, IndexStats, SearchHit, UnitInfo,
    };
    use llm_service::FinishReason;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /* ---------------- scripted generator ---------------- */

    struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<GenerationOutcome, LlmError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<Result<GenerationOutcome, LlmError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        /// Generator that reports `Length` on every call, forever.
        fn always_truncated() -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
            _system: Option<&'a str>,
        ) -> Pin<Box<dyn Future<Output = Result<GenerationOutcome, LlmError>> + Send + 'a>>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let outcome = next.unwrap_or_else(|| {
                Ok(GenerationOutcome {
                    content: "more ".into(),
                    finish_reason: Some(FinishReason::Length),
                })
            });
            Box::pin(async move { outcome })
        }
    }

    fn outcome(content: &str, reason: Option<FinishReason>) -> Result<GenerationOutcome, LlmError> {
        Ok(GenerationOutcome {
            content: content.into(),
            finish_reason: reason,
        })
    }

    /* ---------------- generation state machine ---------------- */

    #[tokio::test]
    async fn clean_finish_makes_no_continuation_calls() {
        let generator = ScriptedGenerator::new(vec![outcome(
            "The answer is 42.",
            Some(FinishReason::Stop),
        )]);
        let (text, continuations) = run_generation("q", "sys", &generator).await.unwrap();
        assert_eq!(text, "The answer is 42.");
        assert_eq!(continuations, 0);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn truncated_then_clean_concatenates_with_one_continuation() {
        let generator = ScriptedGenerator::new(vec![
            outcome("First half of the answer ", Some(FinishReason::Length)),
            outcome("and the second half.", Some(FinishReason::Stop)),
        ]);
        let (text, continuations) = run_generation("q", "sys", &generator).await.unwrap();
        assert_eq!(text, "First half of the answer and the second half.");
        assert_eq!(continuations, 1);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn continuations_are_bounded_even_when_generator_never_finishes() {
        let generator = ScriptedGenerator::always_truncated();
        let (_, continuations) = run_generation("q", "sys", &generator).await.unwrap();
        assert_eq!(continuations, MAX_CONTINUATIONS);
        assert_eq!(generator.calls(), 1 + MAX_CONTINUATIONS);
    }

    #[tokio::test]
    async fn heuristic_truncation_triggers_continuation_without_finish_reason() {
        let cut_off = "word ".repeat(80) + "stops mid";
        let generator = ScriptedGenerator::new(vec![
            outcome(&cut_off, None),
            outcome(" sentence, properly finished.", None),
        ]);
        let (text, continuations) = run_generation("q", "sys", &generator).await.unwrap();
        assert!(text.ends_with("properly finished."));
        assert_eq!(continuations, 1);
    }

    #[tokio::test]
    async fn generation_timeout_surfaces_without_partial_output() {
        let generator = ScriptedGenerator::new(vec![Err(LlmError::Timeout(
            Duration::from_secs(120),
        ))]);
        let err = run_generation("q", "sys", &generator).await.unwrap_err();
        assert!(matches!(err, ChatError::GenerationTimeout));
    }

    #[tokio::test]
    async fn mid_continuation_failure_drops_the_whole_answer() {
        let generator = ScriptedGenerator::new(vec![
            outcome("part one ", Some(FinishReason::Length)),
            Err(LlmError::EmptyChoices),
        ]);
        let err = run_generation("q", "sys", &generator).await.unwrap_err();
        assert!(matches!(err, ChatError::Generation(_)));
    }

    /* ---------------- chat turn wiring ---------------- */

    struct StubStore;

    #[async_trait]
    impl CourseStore for StubStore {
        async fn document_ids_for_course(&self, _: &str) -> Result<Vec<String>, IndexError> {
            Ok(Vec::new())
        }
        async fn course_units(&self, _: &str) -> Result<CourseUnits, IndexError> {
            Ok(CourseUnits {
                units: vec![UnitInfo {
                    name: "U1".into(),
                    is_published: true,
                }],
                additive_retrieval: false,
            })
        }
    }

    struct StubEmbedder;

    impl EmbeddingsProvider for StubEmbedder {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
            Box::pin(async { Ok(vec![0.1, 0.2, 0.3]) })
        }
    }

    /// Index stub: either serves one fixed hit or fails as unreachable.
    struct StubIndex {
        unreachable: bool,
    }

    #[async_trait]
    impl VectorIndex for StubIndex {
        async fn ensure_collection(&self, _: usize) -> Result<EnsureOutcome, IndexError> {
            Ok(EnsureOutcome::Kept)
        }
        async fn upsert(&self, _: Vec<ChunkPoint>) -> Result<usize, IndexError> {
            Ok(0)
        }
        async fn delete_by_document(&self, _: &str) -> Result<u64, IndexError> {
            Ok(0)
        }
        async fn search(
            &self,
            _: Vec<f32>,
            _: &RetrievalScope,
            _: u64,
        ) -> Result<Vec<SearchHit>, IndexError> {
            if self.unreachable {
                return Err(IndexError::Unavailable("connection refused".into()));
            }
            Ok(vec![SearchHit {
                chunk_id: "c1".into(),
                score: 0.9,
                document_id: "d1".into(),
                file_name: "notes.pdf".into(),
                unit_name: "U1".into(),
                text: "Derivatives measure instantaneous change.".into(),
            }])
        }
        async fn scroll_document_ids(&self, _: &str) -> Result<HashSet<String>, IndexError> {
            Ok(HashSet::new())
        }
        async fn stats(&self) -> Result<IndexStats, IndexError> {
            Ok(IndexStats {
                point_count: 0,
                dimension: 3,
                status: "Green".into(),
            })
        }
    }

    #[tokio::test]
    async fn grounded_turn_returns_citations_and_scope() {
        let generator =
            ScriptedGenerator::new(vec![outcome("It measures change (Unit 1).", Some(FinishReason::Stop))]);
        let answer = chat_turn(
            "What is a derivative?",
            "course-1",
            "U1",
            &[],
            &ChatOptions::default(),
            &ChatConfig::default(),
            &StubStore,
            &StubEmbedder,
            &StubIndex { unreachable: false },
            &generator,
        )
        .await
        .unwrap();

        assert_eq!(answer.text, "It measures change (Unit 1).");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].file_name, "notes.pdf");
        assert_eq!(answer.retrieval_scope.units, vec!["U1"]);
    }

    #[tokio::test]
    async fn unreachable_index_fails_without_fallback() {
        let generator = ScriptedGenerator::new(vec![]);
        let err = chat_turn(
            "q",
            "course-1",
            "U1",
            &[],
            &ChatOptions::default(),
            &ChatConfig::default(),
            &StubStore,
            &StubEmbedder,
            &StubIndex { unreachable: true },
            &generator,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ChatError::RetrievalUnavailable(_)));
        assert_eq!(generator.calls(), 0, "no generation without retrieval");
    }

    #[tokio::test]
    async fn unreachable_index_degrades_when_fallback_enabled() {
        let generator = ScriptedGenerator::new(vec![outcome(
            "From general knowledge: it measures change.",
            Some(FinishReason::Stop),
        )]);
        let opts = ChatOptions {
            general_knowledge_fallback: true,
            ..Default::default()
        };
        let answer = chat_turn(
            "q",
            "course-1",
            "U1",
            &[],
            &opts,
            &ChatConfig::default(),
            &StubStore,
            &StubEmbedder,
            &StubIndex { unreachable: true },
            &generator,
        )
        .await
        .unwrap();

        assert!(answer.citations.is_empty());
        assert!(answer.retrieval_scope.units.is_empty());
        assert_eq!(answer.retrieval_scope.course_id, "course-1");
    }

    #[tokio::test]
    async fn unknown_unit_surfaces_as_user_error() {
        let generator = ScriptedGenerator::new(vec![]);
        let err = chat_turn(
            "q",
            "course-1",
            "U9",
            &[],
            &ChatOptions::default(),
            &ChatConfig::default(),
            &StubStore,
            &StubEmbedder,
            &StubIndex { unreachable: false },
            &generator,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Index(IndexError::UnitNotAvailable { .. })
        ));
    }
}
