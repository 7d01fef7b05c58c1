//! Public API types re-used by the facade and the HTTP layer.

use course_index::{Citation, RetrievalScope};

/// Options that control one chat turn.
#[derive(Clone, Debug, Default)]
pub struct ChatOptions {
    /// Override for the number of chunks retrieved. `None` uses the
    /// configured default.
    pub top_k: Option<u64>,
    /// When true, an unreachable vector index degrades the turn to an
    /// ungrounded "general knowledge" answer instead of failing.
    pub general_knowledge_fallback: bool,
}

/// Static configuration for the orchestrator, resolved once at startup.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Default retrieval depth when the caller does not override it.
    pub top_k: u64,
    /// Expected embedding dimension; mismatches are logged, not fatal.
    pub embedding_dim: Option<usize>,
    /// Character budget for the context block in the prompt.
    pub max_ctx_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: 12,
            embedding_dim: None,
            max_ctx_chars: 8000,
        }
    }
}

/// Who said a prior turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Student,
    Tutor,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Tutor => "Tutor",
        }
    }
}

/// One prior exchange turn, serialized into the prompt when continuing a
/// conversation.
#[derive(Clone, Debug)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Final answer for one chat turn.
#[derive(Clone, Debug)]
pub struct ChatAnswer {
    /// Accumulated answer text (base generation plus continuations).
    pub text: String,
    /// Citations for the retrieved context; empty in fallback mode.
    pub citations: Vec<Citation>,
    /// The retrieval scope actually used, for transparency/debugging.
    pub retrieval_scope: RetrievalScope,
}
