//! Truncation detection for generated answers.
//!
//! The check is load-bearing for the continuation state machine and is
//! deliberately explicit rather than hidden inside retry logic:
//!
//! 1. A length-limited finish reason from the generator is authoritative.
//! 2. Only when no explicit reason is available, a heuristic fallback
//!    applies: a response longer than [`MIN_HEURISTIC_LEN`] that does not
//!    end in sentence-terminal punctuation is treated as cut off.

use llm_service::FinishReason;

/// Responses at or below this length are never considered truncated by the
/// heuristic; short answers legitimately end without punctuation.
pub const MIN_HEURISTIC_LEN: usize = 300;

/// Characters that count as a sentence-terminal tail.
const TERMINALS: [char; 8] = ['.', '!', '?', '。', '！', '？', ')', '"'];

/// Decides whether `content` looks cut off.
pub fn is_truncated(content: &str, finish_reason: Option<&FinishReason>) -> bool {
    match finish_reason {
        Some(FinishReason::Length) => true,
        Some(_) => false,
        None => tail_heuristic(content),
    }
}

fn tail_heuristic(content: &str) -> bool {
    let trimmed = content.trim_end();
    if trimmed.len() <= MIN_HEURISTIC_LEN {
        return false;
    }
    !trimmed.chars().last().is_some_and(|c| TERMINALS.contains(&c))
}
