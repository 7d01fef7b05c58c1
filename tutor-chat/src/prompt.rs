//! Prompt builder: short system messages + labeled context block.

use course_index::SearchHit;

use crate::api_types::ChatTurn;

/// System instructions for grounded answers.
///
/// Keep this short: it consistently improves steering without wasting tokens.
pub const SYSTEM_PROMPT: &str = r#"
You are a patient course tutor. Answer ONLY from the supplied course material.
Cite the unit a statement comes from, like (Unit 2). If the material does not
cover the question, say so instead of guessing.
"#;

/// System instructions for the opt-in general-knowledge fallback, used when
/// the course material cannot be retrieved.
pub const GENERAL_SYSTEM_PROMPT: &str = r#"
You are a patient course tutor. Course material is temporarily unavailable, so
answer from general knowledge, say that you could not consult the course
material, and keep the answer brief.
"#;

/// How much of the accumulated answer is echoed into a continuation prompt.
pub const CONTINUATION_TAIL_CHARS: usize = 200;

/// Build the user prompt: context block (budgeted), serialized history,
/// then the question.
///
/// Context hits keep their ranking order. Each is labeled with its unit and
/// file so the model can cite sources.
pub fn build_prompt(
    question: &str,
    hits: &[SearchHit],
    history: &[ChatTurn],
    max_ctx_chars: usize,
) -> String {
    let mut out = String::new();

    if !hits.is_empty() {
        out.push_str("Course material:\n");
        let mut budget = max_ctx_chars;

        for (i, h) in hits.iter().enumerate() {
            let header = format!("==[{}]== {} :: {}\n", i + 1, h.unit_name, h.file_name);
            let text = h.text.trim();

            if header.len() >= budget {
                break;
            }
            out.push_str(&header);
            budget -= header.len();

            let take = budget.saturating_sub(2);
            if text.len() > take {
                out.push_str(safe_truncate(text, take));
                out.push_str("\n…\n");
                break;
            } else {
                out.push_str(text);
                out.push('\n');
                budget -= text.len() + 1;
            }
        }
        out.push('\n');
    }

    if !history.is_empty() {
        out.push_str("Conversation so far:\n");
        for turn in history {
            out.push_str(turn.role.label());
            out.push_str(": ");
            out.push_str(turn.content.trim());
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("Question:\n");
    out.push_str(question.trim());
    out.push('\n');
    out
}

/// Build the prompt for one bounded continuation call: echo the tail of the
/// accumulated answer and ask the model to pick up where it stopped.
pub fn build_continuation_prompt(accumulated: &str) -> String {
    let tail = last_chars(accumulated, CONTINUATION_TAIL_CHARS);
    format!(
        "Your previous answer was cut off. It currently ends with:\n\
         ...{tail}\n\n\
         Continue the answer from exactly that point. Do not repeat anything \
         already written, do not restart the answer."
    )
}

/// Last `n` bytes of `s`, snapped to a char boundary.
fn last_chars(s: &str, n: usize) -> &str {
    if s.len() <= n {
        return s;
    }
    let mut start = s.len() - n;
    while start < s.len() && !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

fn safe_truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::Role;

    fn hit(unit: &str, file: &str, text: &str) -> SearchHit {
        SearchHit {
            chunk_id: "c".into(),
            score: 0.9,
            document_id: "d".into(),
            file_name: file.into(),
            unit_name: unit.into(),
            text: text.into(),
        }
    }

    #[test]
    fn prompt_labels_context_with_unit_and_file() {
        let hits = vec![hit("Unit 1", "notes.pdf", "The derivative measures change.")];
        let prompt = build_prompt("What is a derivative?", &hits, &[], 4000);
        assert!(prompt.contains("==[1]== Unit 1 :: notes.pdf"));
        assert!(prompt.contains("The derivative measures change."));
        assert!(prompt.ends_with("What is a derivative?\n"));
    }

    #[test]
    fn prompt_serializes_history_in_order() {
        let history = vec![
            ChatTurn {
                role: Role::Student,
                content: "What is a limit?".into(),
            },
            ChatTurn {
                role: Role::Tutor,
                content: "A limit describes approach.".into(),
            },
        ];
        let prompt = build_prompt("And continuity?", &[], &history, 4000);
        let student = prompt.find("Student: What is a limit?").unwrap();
        let tutor = prompt.find("Tutor: A limit describes approach.").unwrap();
        assert!(student < tutor);
    }

    #[test]
    fn prompt_without_context_has_no_material_block() {
        let prompt = build_prompt("Hi", &[], &[], 4000);
        assert!(!prompt.contains("Course material:"));
    }

    #[test]
    fn context_respects_char_budget() {
        let hits: Vec<SearchHit> = (0..10)
            .map(|i| hit("U1", "f.pdf", &"x".repeat(500 + i)))
            .collect();
        let prompt = build_prompt("q", &hits, &[], 1000);
        // Budget covers the first hit and change, never all ten.
        assert!(prompt.len() < 1500);
        assert!(prompt.contains("==[1]=="));
        assert!(!prompt.contains("==[4]=="));
    }

    #[test]
    fn continuation_prompt_echoes_the_tail() {
        let acc = "a".repeat(400) + " ends here";
        let prompt = build_continuation_prompt(&acc);
        assert!(prompt.contains("ends here"));
        assert!(!prompt.contains(&"a".repeat(300)));
        assert!(prompt.contains("Do not repeat"));
    }

    #[test]
    fn continuation_tail_is_char_boundary_safe() {
        let acc = "é".repeat(300);
        let prompt = build_continuation_prompt(&acc);
        assert!(prompt.contains("é"));
    }
}
