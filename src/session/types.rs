//! State and error types shared by the upload, chat, and summary orchestrators.

use crate::backend::{Answer, BackendError, ErrorKind};
use crate::speech::SpeechError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A step of a flow that can fail independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Sending the document to the ingestion endpoint.
    Upload,
    /// A single chat query.
    Query,
    /// Stage 1 of the summary pipeline.
    Summary,
    /// Stage 2 of the summary pipeline.
    Questions,
    /// Optional speech synthesis of the summary.
    Audio,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::Query => "query",
            Self::Summary => "summary",
            Self::Questions => "questions",
            Self::Audio => "audio",
        })
    }
}

/// User-visible failure of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{stage} failed ({kind}): {message}")]
pub struct StageError {
    /// Stage that failed.
    pub stage: Stage,
    /// Failure classification.
    pub kind: ErrorKind,
    /// Diagnostic text suitable for display.
    pub message: String,
}

impl StageError {
    /// Record a backend failure against `stage`.
    pub fn from_backend(stage: Stage, error: &BackendError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Record a speech synthesis failure.
    pub fn from_speech(error: &SpeechError) -> Self {
        Self {
            stage: Stage::Audio,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Dismissible errors, at most one per stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageErrors {
    entries: Vec<StageError>,
}

impl StageErrors {
    /// Record `error`, replacing any earlier error of the same stage.
    pub fn record(&mut self, error: StageError) {
        self.entries.retain(|existing| existing.stage != error.stage);
        self.entries.push(error);
    }

    /// Remove the error for `stage`, returning it if one was shown.
    pub fn dismiss(&mut self, stage: Stage) -> Option<StageError> {
        let position = self.entries.iter().position(|entry| entry.stage == stage)?;
        Some(self.entries.remove(position))
    }

    /// Current error for `stage`.
    pub fn get(&self, stage: Stage) -> Option<&StageError> {
        self.entries.iter().find(|entry| entry.stage == stage)
    }

    /// All current errors in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &StageError> {
        self.entries.iter()
    }

    /// Whether no error is currently shown.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Errors returned by orchestrator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// An operation needed a document but none was selected.
    #[error("No document selected")]
    NoFileSelected,
    /// Chat was attempted before the document finished processing.
    #[error("Document is not ready for questions yet")]
    NotReady,
    /// Submitted query was blank.
    #[error("Query text is empty")]
    EmptyQuery,
    /// A query is still waiting for its reply.
    #[error("A query is already in flight")]
    QueryInFlight,
    /// Audio was requested without a generated summary.
    #[error("No summary available")]
    NoSummary,
    /// A pending query did not belong to this transcript.
    #[error("Pending query does not match the transcript")]
    UnknownTurn,
    /// A remote stage failed; the error is also kept in the orchestrator's error list.
    #[error(transparent)]
    Stage(#[from] StageError),
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking about the document.
    User,
    /// The backend's reply.
    Assistant,
}

/// Flattened transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Who sent the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Message from the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Message from the assistant.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Settlement state of a user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Waiting for the backend.
    Pending,
    /// Backend answered.
    Answered(Answer),
    /// Backend call failed; the turn keeps the reason.
    Failed(StageError),
}

/// One user question and its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Question as submitted (trimmed).
    pub question: String,
    /// Current reply state.
    pub reply: Reply,
}

impl Turn {
    /// Whether the reply is still outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self.reply, Reply::Pending)
    }
}
