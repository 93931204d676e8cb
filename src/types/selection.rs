// src/types/selection.rs
use serde::{Deserialize, Serialize};

pub const NO_PROFILES_FOUND: &str = "No profiles found";
pub const SEARCH_FAILED: &str = "Search Failed";
pub const AI_ERROR: &str = "AI Error";
pub const NOT_PROCESSED: &str = "Not Processed";
pub const SKIPPED: &str = "Skipped";

/// Why a company ended without a resolved profile URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SearchFailure,
    NoCandidates,
    ModelPoolExhausted,
    Cancelled,
    EmptyCompany,
}

impl ErrorKind {
    /// Placeholder written in the URL column for this outcome.
    pub fn sentinel(self) -> &'static str {
        match self {
            ErrorKind::SearchFailure => SEARCH_FAILED,
            ErrorKind::NoCandidates => NO_PROFILES_FOUND,
            ErrorKind::ModelPoolExhausted => AI_ERROR,
            ErrorKind::Cancelled => NOT_PROCESSED,
            ErrorKind::EmptyCompany => SKIPPED,
        }
    }
}

/// Outcome of the selection step for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub profile_url: Option<String>,
    pub message: Option<String>,
    pub confidence: Option<u8>,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
    /// Model that produced the answer, when one did.
    pub model: Option<String>,
}

impl SelectionResult {
    pub fn resolved(
        profile_url: String,
        message: Option<String>,
        confidence: Option<u8>,
        model: &str,
    ) -> Self {
        Self {
            profile_url: Some(profile_url),
            message,
            confidence,
            error_kind: None,
            error: None,
            model: Some(model.to_string()),
        }
    }

    pub fn no_candidates() -> Self {
        Self::unresolved(ErrorKind::NoCandidates, None)
    }

    pub fn exhausted(last_error: String) -> Self {
        Self::unresolved(ErrorKind::ModelPoolExhausted, Some(last_error))
    }

    pub fn unresolved(kind: ErrorKind, error: Option<String>) -> Self {
        Self {
            profile_url: None,
            message: None,
            confidence: None,
            error_kind: Some(kind),
            error,
            model: None,
        }
    }

    /// The URL when resolved, otherwise the sentinel for the failure kind.
    pub fn display_value(&self) -> String {
        match (&self.profile_url, self.error_kind) {
            (Some(url), _) => url.clone(),
            (None, Some(kind)) => kind.sentinel().to_string(),
            (None, None) => AI_ERROR.to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.profile_url
            .as_deref()
            .map(looks_like_url)
            .unwrap_or(false)
    }
}

/// Any value in the URL column that is not an http(s) URL is unresolved,
/// whatever the error column says.
pub fn looks_like_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("https://") || value.starts_with("http://")
}
