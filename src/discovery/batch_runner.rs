// src/discovery/batch_runner.rs
//! Sequential per-company pipeline: search, then select, one row per company.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::profile_selector::ProfileSelector;
use super::search_client::ProfileSearch;
use crate::types::{ErrorKind, ResultRow};

const DEFAULT_INTER_COMPANY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub company: String,
    pub resolved: bool,
}

pub struct BatchRunner {
    search: Arc<dyn ProfileSearch>,
    selector: ProfileSelector,
    roles: Vec<String>,
    inter_company_delay: Duration,
}

impl BatchRunner {
    pub fn new(search: Arc<dyn ProfileSearch>, selector: ProfileSelector, roles: Vec<String>) -> Self {
        Self {
            search,
            selector,
            roles,
            inter_company_delay: DEFAULT_INTER_COMPANY_DELAY,
        }
    }

    /// Pause between companies, purely to stay under provider rate limits.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_company_delay = delay;
        self
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub async fn lookup(&self, company: &str) -> ResultRow {
        self.lookup_with_roles(company, &self.roles).await
    }

    /// Search then select for one company. Never fails: every outcome is a row.
    pub async fn lookup_with_roles(&self, company: &str, roles: &[String]) -> ResultRow {
        let company = company.trim();
        if company.is_empty() {
            return ResultRow::failed(company, ErrorKind::EmptyCompany, "Empty company name".to_string());
        }

        info!("Processing: {}", company);

        let candidates = match self.search.search(company, roles).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Search failed for {}: {:#}", company, e);
                return ResultRow::search_failed(company, format!("Search error: {:#}", e));
            }
        };

        let selection = self
            .selector
            .select_with_roles(company, &candidates, roles)
            .await;
        ResultRow::from_selection(company, &selection)
    }

    pub async fn run<F>(&self, companies: &[String], on_progress: F) -> Vec<ResultRow>
    where
        F: FnMut(BatchProgress),
    {
        self.run_with(companies, &self.roles, None, on_progress).await
    }

    /// Process companies in input order. Output has exactly one row per input,
    /// in the same order. A raised `cancel` flag stops provider calls; the
    /// companies not reached still get a row.
    pub async fn run_with<F>(
        &self,
        companies: &[String],
        roles: &[String],
        cancel: Option<&AtomicBool>,
        mut on_progress: F,
    ) -> Vec<ResultRow>
    where
        F: FnMut(BatchProgress),
    {
        let total = companies.len();
        let mut rows = Vec::with_capacity(total);
        let mut was_cancelled = false;
        info!("Starting batch of {} companies", total);

        for (index, company) in companies.iter().enumerate() {
            let cancelled = cancel.map(|c| c.load(Ordering::SeqCst)).unwrap_or(false);
            was_cancelled |= cancelled;

            let row = if cancelled {
                ResultRow::cancelled(company.trim())
            } else {
                self.lookup_with_roles(company, roles).await
            };

            let called_providers = !cancelled && !company.trim().is_empty();
            on_progress(BatchProgress {
                processed: index + 1,
                total,
                company: row.company.clone(),
                resolved: row.is_resolved(),
            });
            rows.push(row);

            if called_providers && index + 1 < total && !self.inter_company_delay.is_zero() {
                tokio::time::sleep(self.inter_company_delay).await;
            }
        }

        let resolved = rows.iter().filter(|r| r.is_resolved()).count();
        if was_cancelled {
            warn!("Batch cancelled: {} of {} companies resolved", resolved, total);
        } else {
            info!("Batch finished: {} of {} companies resolved", resolved, total);
        }
        rows
    }
}
