use crate::backend::Model;
use std::env;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the TalkToDocs client.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the document backend (ingestion, queries, summaries, questions).
    pub backend_url: String,
    /// Backend model used when the caller does not pick one.
    pub default_model: Model,
    /// Optional per-request timeout; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Speech synthesis settings, present only when an endpoint is configured.
    pub speech: Option<SpeechSettings>,
}

/// Connection and voice settings for the speech synthesis endpoint.
#[derive(Clone)]
pub struct SpeechSettings {
    /// Full URL of the synthesis endpoint (typically a server-side proxy).
    pub url: String,
    /// Credential forwarded as `xi-api-key`, when the endpoint requires one.
    pub api_key: Option<String>,
    /// `voice_settings.stability` value.
    pub stability: f32,
    /// `voice_settings.similarity_boost` value.
    pub similarity_boost: f32,
}

const DEFAULT_VOICE_SETTING: f32 = 0.75;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_url = load_env("TALKTODOCS_BACKEND_URL")?;
        validate_url("TALKTODOCS_BACKEND_URL", &backend_url)?;

        let default_model = load_env_optional("TALKTODOCS_MODEL")
            .map(|value| {
                value
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("TALKTODOCS_MODEL".into()))
            })
            .transpose()?
            .unwrap_or_default();

        let request_timeout = load_env_optional("TALKTODOCS_REQUEST_TIMEOUT_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        ConfigError::InvalidValue("TALKTODOCS_REQUEST_TIMEOUT_SECS".into())
                    })
            })
            .transpose()?;

        let speech = match load_env_optional("TALKTODOCS_SPEECH_URL") {
            Some(url) => {
                validate_url("TALKTODOCS_SPEECH_URL", &url)?;
                Some(SpeechSettings {
                    url,
                    api_key: load_env_optional("TALKTODOCS_SPEECH_API_KEY"),
                    stability: load_unit_interval("TALKTODOCS_SPEECH_STABILITY")?,
                    similarity_boost: load_unit_interval("TALKTODOCS_SPEECH_SIMILARITY_BOOST")?,
                })
            }
            None => None,
        };

        Ok(Self {
            backend_url,
            default_model,
            request_timeout,
            speech,
        })
    }

    /// Model to use for a request: the explicit choice, else [`Config::default_model`].
    pub fn model_or_default(&self, explicit: Option<Model>) -> Model {
        explicit.unwrap_or(self.default_model)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("backend_url", &self.backend_url)
            .field("default_model", &self.default_model)
            .field("request_timeout", &self.request_timeout)
            .field("speech", &self.speech)
            .finish()
    }
}

impl fmt::Debug for SpeechSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechSettings")
            .field("url", &self.url)
            .field("has_api_key", &self.api_key.is_some())
            .field("stability", &self.stability)
            .field("similarity_boost", &self.similarity_boost)
            .finish()
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

/// Read `key`, trimming it; blank values count as unset.
pub(crate) fn load_env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn load_unit_interval(key: &str) -> Result<f32, ConfigError> {
    match load_env_optional(key) {
        None => Ok(DEFAULT_VOICE_SETTING),
        Some(value) => value
            .parse::<f32>()
            .ok()
            .filter(|parsed| (0.0..=1.0).contains(parsed))
            .ok_or_else(|| ConfigError::InvalidValue(key.to_string())),
    }
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Merge a `.env` file from the working directory (or its parents) into the process environment.
///
/// Variables already set in the environment win. Run this before
/// [`crate::logging::init_tracing`] so `RUST_LOG` and `TALKTODOCS_LOG_FILE` may come from the
/// file too.
pub fn load_env_file() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    load_env_file();
    let config = Config::from_env()?;
    tracing::debug!(
        backend_url = %config.backend_url,
        model = %config.default_model,
        timeout = ?config.request_timeout,
        speech_enabled = config.speech.is_some(),
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
