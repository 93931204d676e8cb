// src/lib.rs
//! Founder/CEO profile discovery: search a provider for professional-network
//! profiles of a company's leadership, then let a generative model pick one.

pub mod cli;
pub mod core;
pub mod discovery;
pub mod error;
pub mod types;
pub mod web;

pub use discovery::{BatchProgress, BatchRunner, ProfileSelector, SearchClient};
pub use types::{Candidate, ErrorKind, ResultRow, SearchResult, SelectionResult};
pub use web::start_web_server;

/// Uniform logging entry point, forwards to `tracing`.
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}
