// src/types/mod.rs
pub mod report;
pub mod search;
pub mod selection;

pub use report::{ResultRow, CANCELLED_ERROR};
pub use search::{Candidate, SearchResult};
pub use selection::{ErrorKind, SelectionResult};
