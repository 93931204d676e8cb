// src/discovery/mod.rs
pub mod batch_runner;
pub mod model_client;
pub mod profile_selector;
pub mod prompt;
pub mod response;
pub mod search_client;

pub use batch_runner::{BatchProgress, BatchRunner};
pub use model_client::{ChatClient, GeminiClient, GenerativeModel, ModelPayload};
pub use profile_selector::{ProfileSelector, RetryPolicy};
pub use response::{ProfilePick, ResponseFormat};
pub use search_client::{filter_candidates, ProfileSearch, SearchClient};
