//! Document backend integration: ingestion, queries, summaries, and question generation.

pub mod client;
pub mod types;

pub use client::{BackendClient, DocumentBackend};
pub use types::{Answer, BackendError, ErrorKind, Model, QuestionItem, SummarySource};
