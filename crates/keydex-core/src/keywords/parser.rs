//! Keyword response parsing.
//!
//! The generation service answers in free text. Parsing is kept behind
//! [`KeywordParser`] so the line format can change (or be replaced by a
//! structured output mode) without touching the pipeline.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::config::{MAX_KEYWORD_CHARS, MIN_KEYWORD_CHARS};

/// A marker-prefixed line: `- keyword`.
const DASH_LINE_PATTERN: &str = r"(?m)^[ \t]*-[ \t]*(.+)$";

/// Turns a raw service response into an ordered list of normalized keywords.
pub trait KeywordParser: Send + Sync {
    fn parse(&self, response: &str) -> Vec<String>;
}

/// Parses `- keyword` lines, one keyword per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct DashListParser;

impl DashListParser {
    pub fn new() -> Self {
        Self
    }
}

fn dash_line() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(DASH_LINE_PATTERN).ok())
        .as_ref()
}

impl KeywordParser for DashListParser {
    fn parse(&self, response: &str) -> Vec<String> {
        let Some(re) = dash_line() else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        re.captures_iter(response)
            .filter_map(|cap| cap.get(1))
            .filter_map(|m| normalize_keyword(m.as_str()))
            .filter(|kw| seen.insert(kw.clone()))
            .collect()
    }
}

/// Normalize a keyword candidate.
///
/// Lower-cases, collapses internal whitespace, strips leading and trailing
/// whitespace and ASCII punctuation. Returns `None` when the result is shorter
/// than [`MIN_KEYWORD_CHARS`] or longer than [`MAX_KEYWORD_CHARS`].
/// Normalizing an already normalized keyword returns it unchanged.
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let lowered = raw.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());

    let len = trimmed.chars().count();
    if (MIN_KEYWORD_CHARS..=MAX_KEYWORD_CHARS).contains(&len) {
        Some(trimmed.to_string())
    } else {
        None
    }
}
