// src/discovery/search_client.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::types::{Candidate, SearchResult};

const DEFAULT_SEARCH_URL: &str = "https://google.serper.dev/search";
const PROFILE_SITE: &str = "linkedin.com/in";

/// Finds profile candidates for a company.
#[async_trait]
pub trait ProfileSearch: Send + Sync {
    async fn search(&self, company: &str, roles: &[String]) -> Result<Vec<Candidate>>;
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

pub struct SearchClient {
    client: Client,
    api_key: String,
    search_url: String,
    max_results: u32,
}

impl SearchClient {
    pub fn new(
        api_key: String,
        search_url: Option<String>,
        timeout: Duration,
        max_results: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            search_url: search_url.unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            max_results,
        })
    }

    /// `site:linkedin.com/in "<company>" (Owner OR Founder OR ...)`
    pub fn build_query(company: &str, roles: &[String]) -> String {
        let phrase = company.replace('"', "");
        let phrase = phrase.trim();

        if roles.is_empty() {
            format!("site:{} \"{}\"", PROFILE_SITE, phrase)
        } else {
            format!(
                "site:{} \"{}\" ({})",
                PROFILE_SITE,
                phrase,
                roles.join(" OR ")
            )
        }
    }

    /// One request, no retry. Non-2xx and transport failures are errors.
    pub async fn fetch(&self, query: &str) -> Result<Vec<SearchResult>> {
        let body = serde_json::json!({
            "q": query,
            "num": self.max_results,
        });

        info!("Searching profiles: {}", query);

        let response = self
            .client
            .post(&self.search_url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Search request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Search API error {}: {}", status, error_text);
            anyhow::bail!("Search API returned error {}: {}", status, error_text);
        }

        let data: SerperResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;
        debug!("Search returned {} organic results", data.organic.len());

        Ok(data
            .organic
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
            })
            .collect())
    }
}

#[async_trait]
impl ProfileSearch for SearchClient {
    async fn search(&self, company: &str, roles: &[String]) -> Result<Vec<Candidate>> {
        let query = Self::build_query(company, roles);
        let results = self.fetch(&query).await?;
        let candidates = filter_candidates(results);
        info!("Found {} profile candidates for {}", candidates.len(), company);
        Ok(candidates)
    }
}

/// Keep profile-shaped results only, in provider order. Duplicates stay.
pub fn filter_candidates(results: Vec<SearchResult>) -> Vec<Candidate> {
    results
        .into_iter()
        .filter(SearchResult::is_profile)
        .map(Candidate::from)
        .collect()
}
