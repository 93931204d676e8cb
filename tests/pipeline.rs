//! End-to-end pipeline behaviour with in-memory providers.

use async_trait::async_trait;
use founder_finder::core::csv_io;
use founder_finder::discovery::model_client::{GenerativeModel, ModelPayload};
use founder_finder::discovery::response::ResponseFormat;
use founder_finder::discovery::{BatchProgress, BatchRunner, ProfileSearch, ProfileSelector, RetryPolicy};
use founder_finder::error::ModelError;
use founder_finder::types::selection::{NOT_PROCESSED, NO_PROFILES_FOUND, SEARCH_FAILED, SKIPPED};
use founder_finder::types::{Candidate, ResultRow};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const STRIPE_CEO: &str = "https://www.linkedin.com/in/patrickcollison";

enum SearchOutcome {
    Found(Vec<Candidate>),
    Failed(&'static str),
}

#[derive(Default)]
struct FakeSearch {
    outcomes: HashMap<String, SearchOutcome>,
    calls: Mutex<Vec<String>>,
}

impl FakeSearch {
    fn with(mut self, company: &str, outcome: SearchOutcome) -> Self {
        self.outcomes.insert(company.to_string(), outcome);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileSearch for FakeSearch {
    async fn search(&self, company: &str, _roles: &[String]) -> anyhow::Result<Vec<Candidate>> {
        self.calls.lock().unwrap().push(company.to_string());
        match self.outcomes.get(company) {
            Some(SearchOutcome::Found(candidates)) => Ok(candidates.clone()),
            Some(SearchOutcome::Failed(reason)) => anyhow::bail!("{}", reason),
            None => Ok(vec![]),
        }
    }
}

#[derive(Default)]
struct FakeModel {
    script: Mutex<VecDeque<Result<ModelPayload, ModelError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeModel {
    fn scripted(script: Vec<Result<ModelPayload, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(
        &self,
        model: &str,
        _prompt: &str,
        _format: ResponseFormat,
    ) -> Result<ModelPayload, ModelError> {
        self.calls.lock().unwrap().push(model.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Request("no scripted response".to_string())))
    }
}

fn candidate(url: &str) -> Candidate {
    Candidate {
        title: "Patrick Collison - CEO - Stripe".to_string(),
        url: url.to_string(),
        snippet: "Co-founder and CEO at Stripe".to_string(),
    }
}

fn answer(url: &str, confidence: u8) -> Result<ModelPayload, ModelError> {
    Ok(ModelPayload::Text(
        json!({"url": url, "message": "Hi, loved the latest annual letter", "confidence": confidence})
            .to_string(),
    ))
}

fn models() -> Vec<String> {
    vec![
        "gemini-2.5-flash".to_string(),
        "gemini-2.0-flash".to_string(),
        "gemini-1.5-flash".to_string(),
    ]
}

fn selector(model: Arc<FakeModel>) -> ProfileSelector {
    ProfileSelector::new(model, models()).with_retry(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    })
}

fn runner(search: Arc<FakeSearch>, model: Arc<FakeModel>) -> BatchRunner {
    BatchRunner::new(search, selector(model), vec!["Founder".to_string(), "CEO".to_string()])
        .with_delay(Duration::ZERO)
}

fn companies(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_one_row_per_company_in_input_order() {
    let search = Arc::new(
        FakeSearch::default()
            .with("Stripe", SearchOutcome::Found(vec![candidate(STRIPE_CEO)]))
            .with("Broken", SearchOutcome::Failed("503 Service Unavailable"))
            .with("Acme", SearchOutcome::Found(vec![candidate("https://linkedin.com/in/acme-ceo")])),
    );
    let model = FakeModel::scripted(vec![
        answer(STRIPE_CEO, 95),
        Err(ModelError::Request("boom".to_string())),
        Err(ModelError::Request("boom".to_string())),
        Err(ModelError::Request("boom".to_string())),
    ]);

    let input = companies(&["Stripe", "Broken", "Nobody", "Acme"]);
    let rows = runner(search.clone(), model).run(&input, |_| {}).await;

    assert_eq!(rows.len(), input.len());
    let order: Vec<&str> = rows.iter().map(|r| r.company.as_str()).collect();
    assert_eq!(order, vec!["Stripe", "Broken", "Nobody", "Acme"]);

    assert!(rows[0].is_resolved());
    assert_eq!(rows[1].best_url, SEARCH_FAILED);
    assert_eq!(rows[2].best_url, NO_PROFILES_FOUND);
    assert!(!rows[3].is_resolved());
    assert!(rows[3].error.contains("all models failed"));
    assert_eq!(search.calls(), order);
}

#[tokio::test]
async fn test_search_error_skips_model() {
    let search = Arc::new(FakeSearch::default().with("Broken", SearchOutcome::Failed("timed out")));
    let model = FakeModel::scripted(vec![answer(STRIPE_CEO, 90)]);

    let rows = runner(search, model.clone()).run(&companies(&["Broken"]), |_| {}).await;

    assert_eq!(rows[0].best_url, SEARCH_FAILED);
    assert_eq!(rows[0].error, "Search error: timed out");
    assert_eq!(rows[0].confidence, None);
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_no_candidates_skips_model() {
    let search = Arc::new(FakeSearch::default().with("Empty", SearchOutcome::Found(vec![])));
    let model = FakeModel::scripted(vec![answer(STRIPE_CEO, 90)]);

    let row = runner(search, model.clone()).lookup("Empty").await;

    assert_eq!(row.best_url, NO_PROFILES_FOUND);
    assert!(!row.has_error());
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_rate_limit_retries_before_fallback() {
    let model = FakeModel::scripted(vec![
        Err(ModelError::RateLimited("429 Too Many Requests".to_string())),
        Err(ModelError::RateLimited("RESOURCE_EXHAUSTED".to_string())),
        answer(STRIPE_CEO, 81),
    ]);

    let result = selector(model.clone())
        .select("Stripe", &[candidate(STRIPE_CEO)])
        .await;

    assert_eq!(result.profile_url.as_deref(), Some(STRIPE_CEO));
    assert_eq!(result.confidence, Some(81));
    assert_eq!(result.model.as_deref(), Some("gemini-2.5-flash"));
    assert_eq!(
        model.calls(),
        vec!["gemini-2.5-flash", "gemini-2.5-flash", "gemini-2.5-flash"]
    );
}

#[tokio::test]
async fn test_unavailable_model_is_not_retried() {
    let model = FakeModel::scripted(vec![
        Err(ModelError::Unavailable("404 models/gemini-2.5-flash is not found".to_string())),
        answer(STRIPE_CEO, 70),
    ]);

    let result = selector(model.clone())
        .select("Stripe", &[candidate(STRIPE_CEO)])
        .await;

    assert_eq!(result.profile_url.as_deref(), Some(STRIPE_CEO));
    assert_eq!(result.model.as_deref(), Some("gemini-2.0-flash"));
    assert_eq!(model.calls(), vec!["gemini-2.5-flash", "gemini-2.0-flash"]);
}

#[tokio::test]
async fn test_example_batch() {
    let search = Arc::new(
        FakeSearch::default()
            .with("Stripe", SearchOutcome::Found(vec![candidate(STRIPE_CEO)]))
            .with("NotARealCompany123", SearchOutcome::Found(vec![])),
    );
    let model = FakeModel::scripted(vec![answer(STRIPE_CEO, 97)]);

    let rows = runner(search, model.clone())
        .run(&companies(&["Stripe", "NotARealCompany123"]), |_| {})
        .await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].best_url, STRIPE_CEO);
    assert!(rows[0].error.is_empty());
    assert!(rows[0].confidence.is_some());
    assert_eq!(rows[1].best_url, NO_PROFILES_FOUND);
    assert!(rows[1].error.is_empty());
    assert_eq!(model.calls().len(), 1);
}

#[tokio::test]
async fn test_progress_is_reported_per_company() {
    let search = Arc::new(FakeSearch::default().with("Stripe", SearchOutcome::Found(vec![candidate(STRIPE_CEO)])));
    let model = FakeModel::scripted(vec![answer(STRIPE_CEO, 90)]);

    let mut seen: Vec<BatchProgress> = Vec::new();
    runner(search, model)
        .run(&companies(&["Stripe", "Nobody", "Other"]), |p| seen.push(p))
        .await;

    let counts: Vec<(usize, usize)> = seen.iter().map(|p| (p.processed, p.total)).collect();
    assert_eq!(counts, vec![(1, 3), (2, 3), (3, 3)]);
    assert!(seen[0].resolved);
    assert!(!seen[1].resolved);
}

#[tokio::test]
async fn test_cancel_between_companies_keeps_row_count() {
    let search = Arc::new(FakeSearch::default());
    let model = FakeModel::scripted(vec![]);
    let cancel = AtomicBool::new(false);
    let input = companies(&["First", "Second", "Third"]);
    let roles = vec!["CEO".to_string()];

    let rows = runner(search.clone(), model)
        .run_with(&input, &roles, Some(&cancel), |_| cancel.store(true, Ordering::SeqCst))
        .await;

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].best_url, NO_PROFILES_FOUND);
    assert_eq!(rows[1].best_url, NOT_PROCESSED);
    assert_eq!(rows[2].company, "Third");
    assert_eq!(rows[2].error, "Batch cancelled");
    assert_eq!(search.calls(), vec!["First"]);
}

#[tokio::test]
async fn test_blank_company_is_skipped() {
    let search = Arc::new(FakeSearch::default());
    let model = FakeModel::scripted(vec![]);

    let rows = runner(search.clone(), model).run(&companies(&["  ", "Acme"]), |_| {}).await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].best_url, SKIPPED);
    assert_eq!(rows[0].error, "Empty company name");
    assert_eq!(search.calls(), vec!["Acme"]);
}

#[tokio::test]
async fn test_batch_output_round_trips_through_csv() {
    let search = Arc::new(
        FakeSearch::default()
            .with("Stripe", SearchOutcome::Found(vec![candidate(STRIPE_CEO)]))
            .with("Broken, Inc.", SearchOutcome::Failed("connection reset")),
    );
    let model = FakeModel::scripted(vec![answer(STRIPE_CEO, 64)]);
    let input = companies(&["Stripe", "Broken, Inc.", "Nobody"]);

    let rows = runner(search, model).run(&input, |_| {}).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("founders.csv");
    csv_io::write_rows_to_path(&path, &rows).await.unwrap();

    let reread: Vec<ResultRow> = csv_io::read_rows(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(reread, rows);

    let companies_back = csv_io::read_companies(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(companies_back, input);
}

fn timed_runner(search: Arc<FakeSearch>, model: Arc<FakeModel>) -> BatchRunner {
    let selector = ProfileSelector::new(model, models()).with_retry(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(200),
    });
    BatchRunner::new(search, selector, vec!["CEO".to_string()]).with_delay(Duration::from_millis(300))
}

#[tokio::test(start_paused = true)]
async fn test_backoff_and_inter_company_delay_elapse() {
    let search = Arc::new(
        FakeSearch::default()
            .with("Stripe", SearchOutcome::Found(vec![candidate(STRIPE_CEO)])),
    );
    let model = FakeModel::scripted(vec![
        Err(ModelError::RateLimited("429".to_string())),
        Err(ModelError::RateLimited("429".to_string())),
        answer(STRIPE_CEO, 90),
    ]);
    let input = companies(&["Stripe", "  ", "Acme", "Nobody"]);

    let started = tokio::time::Instant::now();
    let rows = timed_runner(search, model.clone()).run(&input, |_| {}).await;
    let elapsed = started.elapsed();

    assert!(rows[0].is_resolved());
    assert_eq!(model.calls().len(), 3);
    // 200ms + 400ms backoff, then 300ms after "Stripe" and after "Acme".
    // Nothing after the blank row or the last company.
    assert!(elapsed >= Duration::from_millis(1200), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1300), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_no_delay_after_last_company() {
    let search = Arc::new(FakeSearch::default());
    let model = FakeModel::scripted(vec![]);

    let started = tokio::time::Instant::now();
    let rows = timed_runner(search, model).run(&companies(&["Solo"]), |_| {}).await;

    assert_eq!(rows.len(), 1);
    assert!(started.elapsed() < Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_no_delay_after_cancelled_rows() {
    let search = Arc::new(FakeSearch::default());
    let model = FakeModel::scripted(vec![]);
    let cancel = AtomicBool::new(true);
    let roles = vec!["CEO".to_string()];

    let started = tokio::time::Instant::now();
    let rows = timed_runner(search, model)
        .run_with(&companies(&["A", "B", "C"]), &roles, Some(&cancel), |_| {})
        .await;

    assert!(rows.iter().all(|r| r.is_cancelled()));
    assert!(started.elapsed() < Duration::from_millis(300));
}
