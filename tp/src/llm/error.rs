//! Completion-service error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a completion service
///
/// Every variant is a transport-level or service-level failure. Malformed
/// plan text is NOT an error at this layer; the planner degrades to a
/// fallback plan instead. Display strings keep the upstream message
/// intact because PlanError passes them through untouched.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The service returned 429; retry_after comes from its header or a
    /// 60 second default
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Non-success HTTP status with the raw response body
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Connection or protocol failure below the HTTP layer
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered but the payload made no sense
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The configured request deadline elapsed
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Request body serialization failed
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Check if retrying the same request could plausibly succeed
    ///
    /// Retryable API statuses are request timeout (408) and the 5xx range,
    /// which covers Anthropic's 529 overloaded status. The provider clients
    /// use this to drive their backoff loops.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } | LlmError::Network(_) | LlmError::Timeout(_) => true,
            LlmError::ApiError { status, .. } => matches!(status, 408 | 500..=599),
            LlmError::InvalidResponse(_) | LlmError::Json(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
