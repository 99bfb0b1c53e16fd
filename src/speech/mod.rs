//! Text-to-speech synthesis for generated summaries.
//!
//! The client posts plain text to a configured synthesis endpoint and keeps the returned audio
//! bytes as an [`AudioArtifact`]. The endpoint is usually a server-side proxy that holds the
//! provider credential; a direct provider URL works as well when `TALKTODOCS_SPEECH_API_KEY` is
//! set.

use crate::backend::ErrorKind;
use crate::config::{Config, SpeechSettings};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CONTENT_TYPE: &str = "audio/mpeg";

/// Errors surfaced while synthesizing audio.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// No speech endpoint is configured.
    #[error("Speech synthesis is not configured")]
    Disabled,
    /// HTTP layer failed before receiving a response.
    #[error("Speech request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Provider returned an error response.
    #[error("Speech provider returned {status}: {body}")]
    Status {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider answered successfully without usable audio.
    #[error("Malformed speech response: {0}")]
    Malformed(String),
}

impl SpeechError {
    /// Classify the error for user-facing reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Disabled | Self::Transport(_) => ErrorKind::Transport,
            Self::Status { .. } => ErrorKind::Status,
            Self::Malformed(_) => ErrorKind::Malformed,
        }
    }
}

/// Playable audio produced from a summary.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    bytes: Vec<u8>,
    content_type: String,
}

impl AudioArtifact {
    /// Wrap synthesized audio bytes.
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Encoded audio payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type reported by the provider.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Write the audio to `path` so a local player can open it.
    pub async fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::write(path.as_ref(), &self.bytes).await?;
        tracing::info!(path = %path.as_ref().display(), bytes = self.bytes.len(), "Saved audio");
        Ok(())
    }
}

impl std::fmt::Debug for AudioArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioArtifact")
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Interface implemented by speech synthesis providers.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Convert plain text into audio.
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SpeechError>;
}

/// HTTP speech client speaking the ElevenLabs text-to-speech request format.
pub struct SpeechClient {
    http: Client,
    settings: SpeechSettings,
}

impl SpeechClient {
    /// Build a client for the given endpoint settings.
    pub fn new(settings: SpeechSettings, timeout: Option<Duration>) -> Result<Self, SpeechError> {
        let mut builder = Client::builder().user_agent("talktodocs/speech");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            settings,
        })
    }

    /// Build a client from configuration, or `None` when speech is not configured.
    pub fn from_config(config: &Config) -> Option<Result<Self, SpeechError>> {
        config
            .speech
            .clone()
            .map(|settings| Self::new(settings, config.request_timeout))
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SpeechError> {
        let payload = json!({
            "text": text,
            "voice_settings": {
                "stability": self.settings.stability,
                "similarity_boost": self.settings.similarity_boost,
            }
        });

        let mut request = self
            .http
            .post(&self.settings.url)
            .header(header::ACCEPT, DEFAULT_CONTENT_TYPE)
            .json(&payload);
        if let Some(key) = &self.settings.api_key {
            request = request.header("xi-api-key", key);
        }

        tracing::debug!(url = %self.settings.url, chars = text.len(), "Requesting speech synthesis");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = SpeechError::Status { status, body };
            tracing::error!(error = %error, "Speech synthesis failed");
            return Err(error);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SpeechError::Malformed("empty audio payload".into()));
        }

        Ok(AudioArtifact::new(bytes.to_vec(), content_type))
    }
}
