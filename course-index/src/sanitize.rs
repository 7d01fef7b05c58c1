//! Text sanitation applied before chunking.
//!
//! Uploaded course material arrives as extracted text from heterogeneous
//! sources (PDF extracts, slide notes, pasted markdown). Sanitation keeps
//! only printable content: line endings are normalized to `\n` and control
//! characters other than `\n`/`\t` are stripped.

/// Normalizes line endings and strips control characters.
///
/// `\r\n` and bare `\r` become `\n`; `\n` and `\t` are preserved; every
/// other control character is dropped. The output is trimmed of leading and
/// trailing whitespace.
pub fn sanitize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\n' | '\t' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_crlf_and_cr() {
        assert_eq!(sanitize_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(sanitize_text("a\u{0000}b\u{0007}c"), "abc");
    }

    #[test]
    fn keeps_tabs_and_newlines() {
        assert_eq!(sanitize_text("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn trims_outer_whitespace() {
        assert_eq!(sanitize_text("  hello  \n"), "hello");
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(sanitize_text(" \r\n \t "), "");
    }
}
