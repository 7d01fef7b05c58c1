//! Sliding-window text chunker with sentence-aligned cuts.
//!
//! Splits sanitized document text into overlapping segments:
//!
//! 1. Advance a window of `chunk_size` characters.
//! 2. Before cutting, search the trailing 20% of the window for the last
//!    sentence-terminal punctuation and prefer that boundary, so chunks
//!    avoid mid-sentence cuts.
//! 3. Rewind the next window start by `overlap` characters to retain
//!    context continuity between adjacent chunks.
//!
//! Degenerate inputs (empty, whitespace-only, shorter than
//! `min_chunk_size`) fail with `InvalidInput` rather than producing zero
//! chunks silently. A hard iteration cap guards against a window that
//! stops advancing on pathological input.

use tracing::{debug, warn};

use crate::errors::IndexError;

/// Sentence-terminal characters considered as preferred cut points.
const SENTENCE_ENDS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Chunking parameters for the ingestion pipeline.
#[derive(Clone, Debug)]
pub struct ChunkParams {
    /// Target window size in bytes (UTF-8 boundary safe).
    pub chunk_size: usize,
    /// Overlap carried between adjacent chunks.
    pub overlap: usize,
    /// Inputs shorter than this are rejected; all chunks except possibly
    /// the last are at least this long.
    pub min_chunk_size: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            overlap: 200,
            min_chunk_size: 120,
        }
    }
}

impl ChunkParams {
    /// Validates the parameter combination.
    ///
    /// The bounds keep the sentence-aligned cut (which lands in the last
    /// 20% of the window) from ever producing an undersized non-final
    /// chunk or a non-advancing window.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.chunk_size == 0 {
            return Err(IndexError::Config("chunk_size must be > 0".into()));
        }
        if self.overlap > self.chunk_size / 2 {
            return Err(IndexError::Config(
                "overlap must not exceed half of chunk_size".into(),
            ));
        }
        if self.min_chunk_size == 0 || self.min_chunk_size > self.chunk_size * 4 / 5 {
            return Err(IndexError::Config(
                "min_chunk_size must be in 1..=chunk_size*4/5".into(),
            ));
        }
        Ok(())
    }
}

/// Splits sanitized text into an ordered list of non-empty segments.
///
/// # Errors
/// Returns [`IndexError::InvalidInput`] for empty/whitespace-only input or
/// input shorter than `min_chunk_size`, and [`IndexError::Config`] for an
/// invalid parameter combination.
pub fn chunk_text(text: &str, params: &ChunkParams) -> Result<Vec<String>, IndexError> {
    params.validate()?;

    if text.trim().is_empty() {
        return Err(IndexError::InvalidInput("document text is empty".into()));
    }
    if text.len() < params.min_chunk_size {
        return Err(IndexError::InvalidInput(format!(
            "document text is shorter than the minimum chunk size ({} < {})",
            text.len(),
            params.min_chunk_size
        )));
    }

    let len = text.len();
    let step = params.chunk_size - params.overlap;
    let max_iterations = 4 * len / step.max(1) + 16;

    let mut chunks: Vec<String> = Vec::new();
    let mut start = 0usize;
    let mut iterations = 0usize;

    while start < len {
        iterations += 1;
        if iterations > max_iterations {
            warn!(
                iterations,
                start,
                len,
                "chunker iteration cap reached; stopping early"
            );
            break;
        }

        let hard_end = floor_char_boundary(text, (start + params.chunk_size).min(len));
        let end = if hard_end < len {
            sentence_cut(text, start, hard_end)
        } else {
            hard_end
        };

        let piece = &text[start..end];
        if !piece.trim().is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= len {
            break;
        }

        let mut next = floor_char_boundary(text, end.saturating_sub(params.overlap));
        if next <= start {
            // Force forward progress even if the overlap rewinds past the
            // previous start.
            next = end;
        }
        start = next;
    }

    if chunks.is_empty() {
        return Err(IndexError::InvalidInput(
            "chunking produced no non-empty segments".into(),
        ));
    }

    debug!(
        chunks = chunks.len(),
        chunk_size = params.chunk_size,
        overlap = params.overlap,
        "chunked document text"
    );
    Ok(chunks)
}

/// Looks for the last sentence-terminal character in the trailing 20% of
/// the window `[start..hard_end)` and returns the byte index just past it.
/// Falls back to `hard_end` when the tail holds no sentence end.
fn sentence_cut(text: &str, start: usize, hard_end: usize) -> usize {
    let window = &text[start..hard_end];
    let tail_start = floor_char_boundary(window, window.len() - window.len() / 5);
    let tail = &window[tail_start..];

    match tail
        .char_indices()
        .filter(|(_, c)| SENTENCE_ENDS.contains(c))
        .last()
    {
        Some((i, c)) => start + tail_start + i + c.len_utf8(),
        None => hard_end,
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
