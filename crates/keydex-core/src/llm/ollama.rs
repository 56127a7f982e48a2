use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::{Generator, LLMError};
use crate::config::{LLMConfig, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS};

/// Client for an Ollama-style `/api/generate` endpoint.
///
/// Sends non-streaming requests:
///
/// ```text
/// POST {base_url}/api/generate
/// { "model": "...", "prompt": "...", "stream": false, "options": { "temperature": 0.3 } }
/// ```
///
/// and expects `{ "response": "..." }` back, or `{ "error": "..." }`.
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    client: Client,
}

impl OllamaClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `base_url` - The service root (e.g., "http://localhost:11434")
    /// * `model` - The model name (e.g., "gemma:2b", "llama3")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout,
            client: http_client_or_default(timeout),
        }
    }

    /// Creates a client from the `[llm]` config section.
    pub fn from_config(config: &LLMConfig) -> Result<Self, LLMError> {
        if config.base_url.trim().is_empty() {
            return Err(LLMError::MissingConfig("llm.base_url".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(LLMError::MissingConfig("llm.model".to_string()));
        }

        // The per-attempt timeout is mandatory on this path.
        let client = build_http_client(config.timeout()).map_err(|e| {
            LLMError::ServiceUnavailable(format!("cannot build HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout(),
            client,
        })
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = http_client_or_default(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send_request(&self, prompt: &str) -> Result<String, LLMError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let url = format!("{}/api/generate", self.base_url);

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::ServiceUnavailable(format!(
                "status {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let body = response.text().await?;
        parse_envelope(&body)
    }
}

fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

fn http_client_or_default(timeout: Duration) -> Client {
    build_http_client(timeout).unwrap_or_else(|e| {
        warn!(error = %e, timeout_secs = timeout.as_secs(), "HTTP client build failed, requests have no timeout");
        Client::new()
    })
}

/// Decode a generate response body into its text.
fn parse_envelope(body: &str) -> Result<String, LLMError> {
    let envelope: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| LLMError::ServiceError(format!("undecodable response: {e}")))?;

    if let Some(error) = envelope.error.filter(|e| !e.is_empty()) {
        return Err(LLMError::ServiceError(error));
    }

    envelope
        .response
        .ok_or_else(|| LLMError::ServiceError("response field missing".to_string()))
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
        self.send_request(prompt).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new("http://localhost:5051", "gemma:2b");
        assert_eq!(client.base_url, "http://localhost:5051");
        assert_eq!(client.model(), "gemma:2b");
        assert_eq!(client.temperature(), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_url_trailing_slash_removed() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_from_config_rejects_empty_model() {
        let config = LLMConfig {
            model: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            OllamaClient::from_config(&config),
            Err(LLMError::MissingConfig(_))
        ));
    }

    #[test]
    fn test_from_config_applies_settings() {
        let config = LLMConfig {
            temperature: 0.1,
            timeout_secs: 5,
            ..Default::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.temperature(), 0.1);
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = LLMConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..Default::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "prompt": "p",
                "stream": false,
                "options": { "temperature": 0.5 }
            })
        );
    }

    #[test]
    fn test_envelope_success() {
        let text = parse_envelope(r#"{"response": "- a\n- b", "done": true}"#).unwrap();
        assert_eq!(text, "- a\n- b");
    }

    #[test]
    fn test_envelope_error_field() {
        let err = parse_envelope(r#"{"error": "model not found"}"#).unwrap_err();
        assert!(matches!(err, LLMError::ServiceError(ref m) if m == "model not found"));
    }

    #[test]
    fn test_envelope_malformed() {
        let err = parse_envelope(r#"{"response": test sample}"#).unwrap_err();
        assert!(matches!(err, LLMError::ServiceError(_)));
    }

    #[test]
    fn test_envelope_empty_error_is_ignored() {
        let text = parse_envelope(r#"{"response": "- x", "error": ""}"#).unwrap();
        assert_eq!(text, "- x");
    }
}
