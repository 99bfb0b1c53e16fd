#![deny(missing_docs)]

//! Client library for TalkToDocs: chat with a PDF or turn it into a summary with study questions.

/// Document backend HTTP client and response types.
pub mod backend;
/// Environment-driven configuration management.
pub mod config;
/// Selected document handling.
pub mod document;
/// Structured logging and tracing setup.
pub mod logging;
/// Markdown flattening for speech synthesis.
pub mod markdown;
/// Terminal rendering of transcripts and summaries.
pub mod render;
/// Upload, chat, and summary orchestrators.
pub mod session;
/// Text-to-speech client and audio artifacts.
pub mod speech;
