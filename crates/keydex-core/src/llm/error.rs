use thiserror::Error;

/// Errors that can occur while talking to the keyword service.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Transport failure or non-success HTTP status.
    #[error("Keyword service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service answered, but with an undecodable payload or an explicit error.
    #[error("Keyword service error: {0}")]
    ServiceError(String),

    /// The response parsed, but no keyword line survived normalization.
    #[error("No keywords extracted from service response")]
    NoKeywordsExtracted,

    /// The request was abandoned because the run was cancelled.
    #[error("Keyword request cancelled")]
    Cancelled,

    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

impl LLMError {
    /// Only transient, service-side failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LLMError::ServiceUnavailable(_) | LLMError::ServiceError(_)
        )
    }
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        LLMError::ServiceUnavailable(err.to_string())
    }
}
