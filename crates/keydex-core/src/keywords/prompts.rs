//! Prompt construction for keyword generation.

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the generation prompt: the instruction template followed by the
/// (truncated) input text.
pub fn build_keyword_prompt(template: &str, text: &str, max_chars: usize) -> String {
    let text = truncate_chars(text, max_chars);
    format!("{template}{text}")
}
