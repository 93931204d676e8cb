// src/discovery/profile_selector.rs
//! Pick one candidate per company with a generative model, walking an ordered
//! list of model names. Rate limits are retried with exponential backoff on
//! the same model; every other failure moves on to the next model.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::model_client::GenerativeModel;
use super::prompt::{build_prompt, PromptInput};
use super::response::{decode, ProfilePick, ResponseFormat};
use crate::core::Persona;
use crate::error::ModelError;
use crate::types::{Candidate, SelectionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per model, first call included.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Wait before `attempt` (2, 3, ...): base, 2*base, 4*base, ...
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Retry,
    NextModel,
}

fn decide(error: &ModelError, attempt: u32, policy: &RetryPolicy) -> Decision {
    if error.is_rate_limited() && attempt < policy.max_attempts {
        Decision::Retry
    } else {
        Decision::NextModel
    }
}

#[derive(Debug)]
enum FallbackState {
    TryModel { index: usize, attempt: u32 },
    RetryWait { index: usize, attempt: u32 },
    Success(SelectionResult),
    Exhausted(String),
}

pub struct ProfileSelector {
    model: Arc<dyn GenerativeModel>,
    models: Vec<String>,
    retry: RetryPolicy,
    format: ResponseFormat,
    outreach_context: Option<String>,
    roles: Vec<String>,
}

impl ProfileSelector {
    pub fn new(model: Arc<dyn GenerativeModel>, models: Vec<String>) -> Self {
        Self {
            model,
            models,
            retry: RetryPolicy::default(),
            format: ResponseFormat::default(),
            outreach_context: None,
            roles: Persona::default().keywords(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_outreach_context(mut self, context: Option<String>) -> Self {
        self.outreach_context = context;
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub async fn select(&self, company: &str, candidates: &[Candidate]) -> SelectionResult {
        self.select_with_roles(company, candidates, &self.roles).await
    }

    pub async fn select_with_roles(
        &self,
        company: &str,
        candidates: &[Candidate],
        roles: &[String],
    ) -> SelectionResult {
        if candidates.is_empty() {
            info!("No candidates for {}, skipping model call", company);
            return SelectionResult::no_candidates();
        }

        let prompt = build_prompt(&PromptInput {
            company,
            candidates,
            roles,
            format: self.format,
            outreach_context: self.outreach_context.as_deref(),
        });

        let mut state = if self.models.is_empty() {
            FallbackState::Exhausted("no models configured".to_string())
        } else {
            FallbackState::TryModel {
                index: 0,
                attempt: 1,
            }
        };

        loop {
            state = match state {
                FallbackState::TryModel { index, attempt } => {
                    let model = &self.models[index];
                    match self.attempt(model, &prompt).await {
                        Ok(pick) => {
                            info!(
                                "{} resolved by {} (attempt {}): {}",
                                company, model, attempt, pick.url
                            );
                            if !candidates.iter().any(|c| c.url == pick.url) {
                                warn!("Model {} chose a URL outside the candidate list for {}", model, company);
                            }
                            FallbackState::Success(SelectionResult::resolved(
                                pick.url,
                                pick.message,
                                pick.confidence,
                                model,
                            ))
                        }
                        Err(err) => {
                            warn!("Model {} attempt {} failed for {}: {}", model, attempt, company, err);
                            match decide(&err, attempt, &self.retry) {
                                Decision::Retry => FallbackState::RetryWait {
                                    index,
                                    attempt: attempt + 1,
                                },
                                Decision::NextModel if index + 1 < self.models.len() => {
                                    FallbackState::TryModel {
                                        index: index + 1,
                                        attempt: 1,
                                    }
                                }
                                Decision::NextModel => FallbackState::Exhausted(err.to_string()),
                            }
                        }
                    }
                }
                FallbackState::RetryWait { index, attempt } => {
                    let delay = self.retry.delay_before(attempt);
                    info!("Rate limited on {}, retrying in {:?}", self.models[index], delay);
                    tokio::time::sleep(delay).await;
                    FallbackState::TryModel { index, attempt }
                }
                FallbackState::Success(result) => return result,
                FallbackState::Exhausted(last_error) => {
                    warn!("All models failed for {}: {}", company, last_error);
                    return SelectionResult::exhausted(format!(
                        "AI API Error: all models failed. Last error: {}",
                        last_error
                    ));
                }
            };
        }
    }

    async fn attempt(&self, model: &str, prompt: &str) -> Result<ProfilePick, ModelError> {
        let payload = self.model.generate(model, prompt, self.format).await?;
        decode(payload, self.format)
    }
}
