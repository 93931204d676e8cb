// src/types/search.rs
use serde::{Deserialize, Serialize};

const PROFILE_PATH_MARKER: &str = "linkedin.com/in/";

/// One organic listing returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    /// True when the URL points at a personal profile page rather than a
    /// company page, post, or unrelated site.
    pub fn is_profile(&self) -> bool {
        is_profile_url(&self.url)
    }
}

/// A profile-shaped search result, kept in provider relevance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl Candidate {
    /// Opaque context line handed to the model.
    pub fn context_line(&self) -> String {
        if self.snippet.trim().is_empty() {
            format!("{} - {}", self.title, self.url)
        } else {
            format!("{} - {}\n  {}", self.title, self.url, self.snippet.trim())
        }
    }
}

impl From<SearchResult> for Candidate {
    fn from(result: SearchResult) -> Self {
        Self {
            title: result.title,
            url: result.url,
            snippet: result.snippet,
        }
    }
}

pub fn is_profile_url(url: &str) -> bool {
    url.to_lowercase().contains(PROFILE_PATH_MARKER)
}
