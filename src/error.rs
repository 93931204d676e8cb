// src/error.rs
use reqwest::StatusCode;

/// Failure of one model call, classified so the fallback loop can decide
/// between retrying, moving to the next model, or giving up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed model response: {0}")]
    Malformed(String),

    #[error("Model API error: {0}")]
    Request(String),
}

const RATE_LIMIT_MARKERS: &[&str] = &["resource_exhausted", "rate limit", "too many requests", "quota"];
const UNAVAILABLE_MARKERS: &[&str] = &["not_found", "not found", "not supported", "unsupported"];

impl ModelError {
    /// Classify a non-2xx provider response.
    pub fn classify(status: StatusCode, body: &str) -> Self {
        let detail = format!("{} {}", status, body.trim());
        let lowered = body.to_lowercase();

        if status == StatusCode::TOO_MANY_REQUESTS
            || RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m))
        {
            ModelError::RateLimited(detail)
        } else if status == StatusCode::NOT_FOUND
            || UNAVAILABLE_MARKERS.iter().any(|m| lowered.contains(m))
        {
            ModelError::Unavailable(detail)
        } else {
            ModelError::Request(detail)
        }
    }

    pub fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Request(format!("Request timed out: {}", err))
        } else {
            ModelError::Request(format!("HTTP request failed: {}", err))
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ModelError::RateLimited(_))
    }
}
