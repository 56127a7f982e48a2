mod error;
mod ollama;

pub use error::LLMError;
pub use ollama::OllamaClient;

use async_trait::async_trait;
use std::sync::Arc;

/// A text generation backend.
///
/// This is the transport seam of the keyword pipeline: the keyword client
/// builds prompts and parses answers, a `Generator` only moves one prompt to
/// the service and one answer back. Tests swap in scripted generators.
///
/// # Example
///
/// ```ignore
/// use keydex_core::llm::{Generator, OllamaClient};
///
/// let llm = OllamaClient::new("http://localhost:11434", "gemma:2b");
/// let answer = llm.generate("List three fruits").await?;
/// ```
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send one prompt and return the raw response text.
    async fn generate(&self, prompt: &str) -> Result<String, LLMError>;

    /// Model name used for requests.
    fn model(&self) -> &str;
}

#[async_trait]
impl Generator for Box<dyn Generator> {
    async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
        (**self).generate(prompt).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Arc<G> {
    async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
        (**self).generate(prompt).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}
