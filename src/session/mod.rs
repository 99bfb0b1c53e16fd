//! Orchestrators for the upload, chat, and summary flows.

pub mod chat;
pub mod summary;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod upload;

pub use chat::{ChatSession, DocumentChat, PendingQuery};
pub use summary::{SUMMARY_FALLBACK, Summary, SummaryPipeline};
pub use types::{ChatMessage, Reply, Role, SessionError, Stage, StageError, StageErrors, Turn};
pub use upload::{UploadOrchestrator, UploadState};
