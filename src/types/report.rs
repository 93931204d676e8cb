// src/types/report.rs
use serde::{Deserialize, Serialize};

use super::selection::{looks_like_url, ErrorKind, SelectionResult, NOT_PROCESSED};

pub const CANCELLED_ERROR: &str = "Batch cancelled";

/// One output record per input company. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Best LinkedIn URL")]
    pub best_url: String,
    #[serde(rename = "Message")]
    pub message: Option<String>,
    #[serde(rename = "Confidence")]
    pub confidence: Option<u8>,
    #[serde(rename = "Error")]
    pub error: String,
}

impl ResultRow {
    pub fn from_selection(company: &str, selection: &SelectionResult) -> Self {
        Self {
            company: company.to_string(),
            best_url: selection.display_value(),
            message: selection.message.clone().filter(|m| !m.trim().is_empty()),
            confidence: selection.confidence,
            error: selection.error.clone().unwrap_or_default(),
        }
    }

    pub fn search_failed(company: &str, error: String) -> Self {
        Self::failed(company, ErrorKind::SearchFailure, error)
    }

    pub fn failed(company: &str, kind: ErrorKind, error: String) -> Self {
        Self {
            company: company.to_string(),
            best_url: kind.sentinel().to_string(),
            message: None,
            confidence: None,
            error,
        }
    }

    /// Row for a company the batch never reached.
    pub fn cancelled(company: &str) -> Self {
        Self::failed(company, ErrorKind::Cancelled, CANCELLED_ERROR.to_string())
    }

    pub fn is_cancelled(&self) -> bool {
        self.best_url == NOT_PROCESSED && self.error == CANCELLED_ERROR
    }

    pub fn is_resolved(&self) -> bool {
        looks_like_url(&self.best_url)
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}
