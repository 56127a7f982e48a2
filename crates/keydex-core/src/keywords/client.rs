use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::parser::{DashListParser, KeywordParser};
use super::prompts::build_keyword_prompt;
use super::KeywordExtractor;
use crate::config::{
    LLMConfig, DEFAULT_BACKOFF_MS, DEFAULT_KEYWORD_PROMPT, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_INPUT_CHARS,
};
use crate::llm::{Generator, LLMError};

/// Bounded retry with linearly increasing backoff.
///
/// After failed attempt `n` the client waits `n * backoff` before attempt
/// `n + 1`, so the defaults wait 1s then 2s across three attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included. Never less than 1.
    pub max_attempts: u32,
    /// Backoff unit.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_millis(DEFAULT_BACKOFF_MS))
    }
}

/// Keyword client over any [`Generator`].
pub struct KeywordClient<G: Generator> {
    generator: G,
    parser: Box<dyn KeywordParser>,
    retry: RetryPolicy,
    template: String,
    max_input_chars: usize,
}

impl<G: Generator> KeywordClient<G> {
    /// Creates a client with the default prompt, parser and retry policy.
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            parser: Box::new(DashListParser::new()),
            retry: RetryPolicy::default(),
            template: DEFAULT_KEYWORD_PROMPT.to_string(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Creates a client with retry and truncation taken from the `[llm]` section.
    pub fn from_config(generator: G, config: &LLMConfig) -> Self {
        Self::new(generator)
            .with_retry(RetryPolicy::new(config.max_attempts, config.backoff()))
            .with_max_input_chars(config.max_input_chars)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_parser(mut self, parser: Box<dyn KeywordParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Calls the generator, retrying transient failures.
    ///
    /// Returns the last error once attempts are exhausted. Non-retryable
    /// errors are returned immediately.
    async fn generate_with_retry(&self, prompt: &str) -> Result<String, LLMError> {
        let mut attempt = 1;

        loop {
            match self.generator.generate(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    debug!(
                        model = self.generator.model(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "keyword request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<G: Generator> KeywordExtractor for KeywordClient<G> {
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>, LLMError> {
        let prompt = build_keyword_prompt(&self.template, text, self.max_input_chars);
        let response = self.generate_with_retry(&prompt).await?;

        // A well-formed answer with no usable lines is a prompt/format mismatch,
        // not a file without keywords. Not retried.
        let keywords = self.parser.parse(&response);
        if keywords.is_empty() {
            return Err(LLMError::NoKeywordsExtracted);
        }

        Ok(keywords)
    }
}
