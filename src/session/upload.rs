//! Upload-and-process orchestration for the chat flow.

use crate::backend::DocumentBackend;
use crate::document::UploadedFile;
use crate::session::types::{SessionError, Stage, StageError, StageErrors};

/// Where the document is in its way to the ingestion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// Nothing selected yet.
    Idle,
    /// A document is selected and can be processed.
    Selected,
    /// An ingestion request was started and has not settled.
    Processing,
    /// The backend indexed the document; chat is available.
    Ready,
}

/// Drives one document through ingestion.
///
/// `process` takes `&mut self`, so a single orchestrator can never have two ingestion requests in
/// flight. If a caller drops the `process` future (for example after a timeout) the state stays
/// `Processing` and a later `process` call retries.
#[derive(Debug)]
pub struct UploadOrchestrator {
    file: Option<UploadedFile>,
    state: UploadState,
    errors: StageErrors,
}

impl Default for UploadOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadOrchestrator {
    /// Create an orchestrator with nothing selected.
    pub fn new() -> Self {
        Self {
            file: None,
            state: UploadState::Idle,
            errors: StageErrors::default(),
        }
    }

    /// Select (or replace) the document to ingest.
    ///
    /// Once the document is ready the selection is locked and `false` is returned.
    pub fn select(&mut self, file: UploadedFile) -> bool {
        if self.state == UploadState::Ready {
            tracing::debug!(file = file.name(), "Ignoring selection after document is ready");
            return false;
        }
        tracing::debug!(file = file.name(), size = file.size(), "Document selected");
        self.file = Some(file);
        self.state = UploadState::Selected;
        self.errors.dismiss(Stage::Upload);
        true
    }

    /// Send the selected document to the ingestion endpoint.
    ///
    /// Succeeds immediately, without a request, when the document is already ready. On failure
    /// the orchestrator returns to `Selected` and records an [`Stage::Upload`] error.
    pub async fn process<B>(&mut self, backend: &B) -> Result<(), SessionError>
    where
        B: DocumentBackend + ?Sized,
    {
        if self.state == UploadState::Ready {
            return Ok(());
        }
        let Some(file) = self.file.as_ref() else {
            return Err(SessionError::NoFileSelected);
        };

        self.state = UploadState::Processing;
        tracing::info!(file = file.name(), "Processing document");
        match backend.ingest(file).await {
            Ok(()) => {
                self.state = UploadState::Ready;
                self.errors.dismiss(Stage::Upload);
                tracing::info!(file = file.name(), "Document ready for questions");
                Ok(())
            }
            Err(error) => {
                tracing::error!(file = file.name(), error = %error, "Upload failed");
                self.state = UploadState::Selected;
                let error = StageError::from_backend(Stage::Upload, &error);
                self.errors.record(error.clone());
                Err(error.into())
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Whether chat may start.
    pub fn is_ready(&self) -> bool {
        self.state == UploadState::Ready
    }

    /// Whether an ingestion request is outstanding; the trigger should stay disabled meanwhile.
    pub fn is_processing(&self) -> bool {
        self.state == UploadState::Processing
    }

    /// Selected document, if any.
    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    /// Errors currently shown for this flow.
    pub fn errors(&self) -> &StageErrors {
        &self.errors
    }

    /// Dismiss the error shown for `stage`.
    pub fn dismiss_error(&mut self, stage: Stage) -> Option<StageError> {
        self.errors.dismiss(stage)
    }
}
