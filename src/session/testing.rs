//! In-memory collaborators for orchestrator tests.

use crate::backend::{
    Answer, BackendError, DocumentBackend, ErrorKind, Model, QuestionItem, SummarySource,
};
use crate::document::UploadedFile;
use crate::speech::{AudioArtifact, SpeechError, SpeechSynthesizer};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Mutex;

pub(crate) fn backend_error(kind: ErrorKind) -> BackendError {
    match kind {
        ErrorKind::Transport => BackendError::InvalidUrl("connection refused".into()),
        ErrorKind::Status => BackendError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "boom".into(),
        },
        ErrorKind::Malformed => BackendError::Malformed("unexpected shape".into()),
    }
}

/// Backend double that records every call as `"<operation>:<argument>"`.
pub(crate) struct FakeBackend {
    calls: Mutex<Vec<String>>,
    ingest_failure: Option<ErrorKind>,
    query_failure: Option<ErrorKind>,
    summary: Result<String, ErrorKind>,
    questions: Result<Vec<QuestionItem>, ErrorKind>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            ingest_failure: None,
            query_failure: None,
            summary: Ok("S".into()),
            questions: Ok(vec![QuestionItem::new("Q1", "A1")]),
        }
    }
}

impl FakeBackend {
    pub(crate) fn fail_ingest(mut self, kind: ErrorKind) -> Self {
        self.ingest_failure = Some(kind);
        self
    }

    pub(crate) fn fail_query(mut self, kind: ErrorKind) -> Self {
        self.query_failure = Some(kind);
        self
    }

    pub(crate) fn with_summary(mut self, summary: Result<&str, ErrorKind>) -> Self {
        self.summary = summary.map(str::to_string);
        self
    }

    pub(crate) fn with_questions(mut self, questions: Result<Vec<QuestionItem>, ErrorKind>) -> Self {
        self.questions = questions;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl DocumentBackend for FakeBackend {
    async fn ingest(&self, file: &UploadedFile) -> Result<(), BackendError> {
        self.record(format!("ingest:{}", file.name()));
        match self.ingest_failure {
            Some(kind) => Err(backend_error(kind)),
            None => Ok(()),
        }
    }

    async fn query(&self, text: &str, model: Option<Model>) -> Result<Answer, BackendError> {
        let model = model.map(Model::query_id).unwrap_or("default");
        self.record(format!("query:{text}@{model}"));
        match self.query_failure {
            Some(kind) => Err(backend_error(kind)),
            None => Ok(Answer {
                text: format!("answer to {text}"),
                sources: Vec::new(),
            }),
        }
    }

    async fn summarize(
        &self,
        file: &UploadedFile,
        source: SummarySource,
    ) -> Result<String, BackendError> {
        let route = match source {
            SummarySource::Uploaded(model) => format!("summarize/{}", model.label()),
            SummarySource::Ocr => "summarize_ocr".to_string(),
        };
        self.record(format!("{route}:{}", file.name()));
        self.summary.clone().map_err(backend_error)
    }

    async fn questions_from_file(
        &self,
        file: &UploadedFile,
    ) -> Result<Vec<QuestionItem>, BackendError> {
        self.record(format!("questions_file:{}", file.name()));
        self.questions.clone().map_err(backend_error)
    }

    async fn questions_from_text(&self, text: &str) -> Result<Vec<QuestionItem>, BackendError> {
        self.record(format!("questions_text:{text}"));
        self.questions.clone().map_err(backend_error)
    }
}

/// Speech double returning the synthesized text as the audio bytes.
#[derive(Default)]
pub(crate) struct FakeSpeech {
    texts: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeSpeech {
    pub(crate) fn failing() -> Self {
        Self {
            texts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.texts.lock().expect("texts lock").clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SpeechError> {
        self.texts.lock().expect("texts lock").push(text.to_string());
        if self.fail {
            return Err(SpeechError::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: "quota exceeded".into(),
            });
        }
        Ok(AudioArtifact::new(text.as_bytes().to_vec(), "audio/mpeg"))
    }
}
