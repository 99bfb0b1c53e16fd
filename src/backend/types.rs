//! Shared types used by the backend client and the orchestrators.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The three failure kinds every remote call is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request never produced a response (connection, DNS, timeout).
    Transport,
    /// The server answered with a non-success status code.
    Status,
    /// The response body did not have the expected shape.
    Malformed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transport => "network error",
            Self::Status => "server error",
            Self::Malformed => "unexpected response",
        })
    }
}

/// Errors returned while interacting with the document backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Backend responded with a non-success status code.
    #[error("Backend responded {status}: {message}")]
    Status {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// The `error` field of the body when present, the raw body otherwise.
        message: String,
    },
    /// Backend responded successfully but the body did not match the expected schema.
    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Classify the error for user-facing reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl(_) | Self::Transport(_) => ErrorKind::Transport,
            Self::Status { .. } => ErrorKind::Status,
            Self::Malformed(_) => ErrorKind::Malformed,
        }
    }
}

/// Backend model selectable for summaries and queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Model {
    /// The hosted Llama model.
    #[default]
    Llama,
    /// The project's custom fine-tuned model.
    Custom,
}

impl Model {
    /// Label shown in menus and sent to the summarization endpoint.
    pub fn label(self) -> &'static str {
        match self {
            Self::Llama => "Llama",
            Self::Custom => "Custom",
        }
    }

    /// Lower-cased identifier sent with chat queries.
    pub fn query_id(self) -> &'static str {
        match self {
            Self::Llama => "llama",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Model {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llama" => Ok(Self::Llama),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

/// Which summarization route a document goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    /// Text-layer PDFs: `/summarize` with a model, then `/generate_questions` with the file.
    Uploaded(Model),
    /// Scanned or handwritten documents: `/summarize_ocr`, then questions from the summary text.
    Ocr,
}

/// Reply to a chat query, normalized across the backend's response shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Text shown as the assistant turn.
    pub text: String,
    /// Source labels of the retrieved context, when the backend reports them.
    pub sources: Vec<String>,
}

/// A generated study question with its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    /// Question text.
    pub question: String,
    /// Answer revealed when the question is expanded.
    pub answer: String,
}

impl QuestionItem {
    /// Build a question item.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct QueryEnvelope {
    pub(crate) response: QueryPayload,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryPayload {
    Text(String),
    Prompt {
        generated_prompt: String,
        #[serde(default)]
        sources: Value,
    },
}

#[derive(Deserialize)]
pub(crate) struct SummaryEnvelope {
    pub(crate) summary: String,
}

/// Normalize a `/query_data` body into an [`Answer`].
pub(crate) fn parse_answer(body: Value) -> Result<Answer, BackendError> {
    let envelope: QueryEnvelope = serde_json::from_value(body).map_err(|error| {
        BackendError::Malformed(format!(
            "expected `response` to be a string or an object with `generated_prompt`: {error}"
        ))
    })?;
    let answer = match envelope.response {
        QueryPayload::Text(text) => Answer {
            text,
            sources: Vec::new(),
        },
        QueryPayload::Prompt {
            generated_prompt,
            sources,
        } => Answer {
            text: generated_prompt,
            sources: source_names(sources),
        },
    };
    Ok(answer)
}

fn source_names(sources: Value) -> Vec<String> {
    let items = match sources {
        Value::Null => return Vec::new(),
        Value::Array(items) => items,
        other => {
            tracing::warn!(sources = %other, "Ignoring non-array `sources` in query response");
            return Vec::new();
        }
    };

    let total = items.len();
    let names: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name),
            _ => None,
        })
        .collect();
    if names.len() < total {
        tracing::warn!(
            received = total,
            kept = names.len(),
            "Dropped non-string source entries"
        );
    }
    names
}

/// Extract the `summary` field of a summarization body.
pub(crate) fn parse_summary(body: Value) -> Result<String, BackendError> {
    let SummaryEnvelope { summary } = serde_json::from_value(body).map_err(|error| {
        BackendError::Malformed(format!("expected a string `summary` field: {error}"))
    })?;
    if summary.trim().is_empty() {
        return Err(BackendError::Malformed("summary is empty".into()));
    }
    Ok(summary)
}

/// Extract the `questions` array, skipping entries without string `question`/`answer` fields.
pub(crate) fn parse_questions(body: Value) -> Result<Vec<QuestionItem>, BackendError> {
    let Some(Value::Array(items)) = body.get("questions") else {
        return Err(BackendError::Malformed(
            "expected `questions` to be an array".into(),
        ));
    };

    let total = items.len();
    let questions: Vec<QuestionItem> = items
        .iter()
        .filter_map(|item| {
            let question = item.get("question")?.as_str()?;
            let answer = item.get("answer")?.as_str()?;
            Some(QuestionItem::new(question, answer))
        })
        .collect();

    if questions.len() < total {
        tracing::warn!(
            received = total,
            kept = questions.len(),
            "Dropped question entries without string question/answer"
        );
    }
    Ok(questions)
}

/// Pull a human-readable message out of an error body.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        None => body.trim().to_string(),
    }
}
