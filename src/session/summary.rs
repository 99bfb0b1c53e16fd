//! Summary, study questions, and optional audio for one document.

use crate::backend::{DocumentBackend, Model, QuestionItem, SummarySource};
use crate::document::UploadedFile;
use crate::markdown::strip_markdown;
use crate::session::types::{SessionError, Stage, StageError, StageErrors};
use crate::speech::{AudioArtifact, SpeechSynthesizer};
use std::collections::BTreeSet;

/// Summary text shown when stage 1 fails.
pub const SUMMARY_FALLBACK: &str = "Failed to generate summary. Please try again.";

/// Outcome of the summarization stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// Markdown summary returned by the backend.
    Generated(String),
    /// Stage 1 failed; [`SUMMARY_FALLBACK`] is displayed instead.
    Fallback,
}

impl Summary {
    /// Text to display.
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Fallback => SUMMARY_FALLBACK,
        }
    }
}

/// Two-stage summary pipeline with an on-demand audio stage.
///
/// The summary and the question list are settled independently: a question failure never
/// discards a summary that was already produced.
#[derive(Debug)]
pub struct SummaryPipeline {
    source: SummarySource,
    file: Option<UploadedFile>,
    summary: Option<Summary>,
    questions: Vec<QuestionItem>,
    expanded: BTreeSet<usize>,
    audio: Option<AudioArtifact>,
    errors: StageErrors,
}

impl SummaryPipeline {
    /// Create a pipeline that summarizes through `source`.
    pub fn new(source: SummarySource) -> Self {
        Self {
            source,
            file: None,
            summary: None,
            questions: Vec::new(),
            expanded: BTreeSet::new(),
            audio: None,
            errors: StageErrors::default(),
        }
    }

    /// Summarization route in use.
    pub fn source(&self) -> SummarySource {
        self.source
    }

    /// Switch the model used by the `/summarize` route; OCR pipelines ignore it.
    pub fn select_model(&mut self, model: Model) {
        if let SummarySource::Uploaded(current) = &mut self.source {
            *current = model;
        }
    }

    /// Select a new document, clearing every result derived from the previous one.
    pub fn select(&mut self, file: UploadedFile) {
        tracing::debug!(file = file.name(), size = file.size(), "Document selected");
        self.file = Some(file);
        self.reset_results();
        self.errors.clear();
    }

    /// Run stage 1 (summary) and, if it succeeds, stage 2 (questions).
    ///
    /// Returns an error only when there is no document or stage 1 fails. A stage 2 failure is
    /// recorded under [`Stage::Questions`] and leaves the summary in place.
    pub async fn process<B>(&mut self, backend: &B) -> Result<(), SessionError>
    where
        B: DocumentBackend + ?Sized,
    {
        let Some(file) = self.file.as_ref() else {
            return Err(SessionError::NoFileSelected);
        };
        self.summary = None;
        self.questions.clear();
        self.expanded.clear();
        self.audio = None;
        for stage in [Stage::Summary, Stage::Questions, Stage::Audio] {
            self.errors.dismiss(stage);
        }

        tracing::info!(file = file.name(), source = ?self.source, "Generating summary");
        let summary = match backend.summarize(file, self.source).await {
            Ok(summary) => summary,
            Err(error) => {
                tracing::error!(file = file.name(), error = %error, "Summary generation failed");
                self.summary = Some(Summary::Fallback);
                let error = StageError::from_backend(Stage::Summary, &error);
                self.errors.record(error.clone());
                return Err(error.into());
            }
        };

        let questions = match self.source {
            SummarySource::Uploaded(_) => backend.questions_from_file(file).await,
            SummarySource::Ocr => backend.questions_from_text(&summary).await,
        };
        self.summary = Some(Summary::Generated(summary));

        match questions {
            Ok(questions) if questions.is_empty() => {
                tracing::warn!(file = file.name(), "No valid questions received");
            }
            Ok(questions) => {
                tracing::info!(file = file.name(), count = questions.len(), "Questions generated");
                self.questions = questions;
            }
            Err(error) => {
                tracing::error!(file = file.name(), error = %error, "Question generation failed");
                self.errors
                    .record(StageError::from_backend(Stage::Questions, &error));
            }
        }
        Ok(())
    }

    /// Flip the expanded flag of question `index`, returning the new state.
    ///
    /// Returns `None` when there is no question at `index`.
    pub fn toggle_question(&mut self, index: usize) -> Option<bool> {
        if index >= self.questions.len() {
            return None;
        }
        if self.expanded.remove(&index) {
            Some(false)
        } else {
            self.expanded.insert(index);
            Some(true)
        }
    }

    /// Whether question `index` is showing its answer.
    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    /// Synthesize the current summary as audio, replacing any earlier artifact.
    ///
    /// Requires a generated summary; the fallback text is never synthesized.
    pub async fn generate_audio<S>(&mut self, speech: &S) -> Result<&AudioArtifact, SessionError>
    where
        S: SpeechSynthesizer + ?Sized,
    {
        let Some(Summary::Generated(summary)) = &self.summary else {
            return Err(SessionError::NoSummary);
        };
        let plain = strip_markdown(summary);
        self.audio = None;
        self.errors.dismiss(Stage::Audio);

        match speech.synthesize(&plain).await {
            Ok(audio) => {
                tracing::info!(bytes = audio.bytes().len(), "Audio generated");
                let audio = self.audio.insert(audio);
                Ok(&*audio)
            }
            Err(error) => {
                tracing::error!(error = %error, "Audio generation failed");
                let error = StageError::from_speech(&error);
                self.errors.record(error.clone());
                Err(error.into())
            }
        }
    }

    /// Selected document, if any.
    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    /// Current summary, if stage 1 has settled.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// Display text of the current summary.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_ref().map(Summary::text)
    }

    /// Generated questions; empty until stage 2 succeeds.
    pub fn questions(&self) -> &[QuestionItem] {
        &self.questions
    }

    /// Audio for the current summary, if generated.
    pub fn audio(&self) -> Option<&AudioArtifact> {
        self.audio.as_ref()
    }

    /// Errors currently shown for this flow.
    pub fn errors(&self) -> &StageErrors {
        &self.errors
    }

    /// Dismiss the error shown for `stage`.
    pub fn dismiss_error(&mut self, stage: Stage) -> Option<StageError> {
        self.errors.dismiss(stage)
    }

    fn reset_results(&mut self) {
        self.summary = None;
        self.questions.clear();
        self.expanded.clear();
        self.audio = None;
    }
}
