//! Keyword generation.
//!
//! - [`KeywordClient`] - builds the prompt, calls a [`Generator`] with retry
//!   and backoff, parses the answer
//! - [`KeywordParser`] / [`DashListParser`] - response parsing rule
//! - [`normalize_keyword`] - the normalization every stored keyword goes through
//!
//! [`Generator`]: crate::llm::Generator

mod client;
mod parser;
mod prompts;

pub use client::{KeywordClient, RetryPolicy};
pub use parser::{normalize_keyword, DashListParser, KeywordParser};
pub use prompts::{build_keyword_prompt, truncate_chars};

use async_trait::async_trait;

use crate::llm::LLMError;

/// Converts a block of text into a small ordered set of keywords.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// Extract keywords from `text`.
    ///
    /// Never returns an empty success: a response without any usable
    /// keyword is reported as [`LLMError::NoKeywordsExtracted`].
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>, LLMError>;
}
