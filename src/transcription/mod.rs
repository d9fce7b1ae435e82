//! # Transcription Module
//!
//! Speech-to-text is delegated to an external provider (AssemblyAI). This
//! module owns the request/response shapes around that call.
//!
//! ## Key Components:
//! - **Provider trait**: the narrow seam the rest of the crate talks to
//! - **AssemblyAI client**: the production provider over HTTP
//! - **Service**: validation, file checks and logging around each call
//! - **Transcript**: words, sentences and paragraphs, and their JSON file format

pub mod assemblyai;
pub mod service;
pub mod transcript;

pub use assemblyai::AssemblyAiClient;
pub use service::TranscriptionService;
pub use transcript::Transcript;

use crate::error::AppResult;
use crate::validation::DEFAULT_LANGUAGE;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single transcription request as received from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptionRequest {
    pub file_path: String,

    /// ISO 639-1 language hint, defaults to `"en"`
    #[serde(default = "default_language")]
    pub language_code: String,
}

/// Text returned for a completed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub language_code: String,
}

/// Outcome of a transcription that was saved to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptFileResult {
    pub json_output_path: String,
    pub text: String,
}

pub(crate) fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Anything that can turn an audio file into a transcript.
///
/// Implementations block the calling task until the provider reports a
/// terminal status. Inputs have already been validated by the caller.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(&self, path: &Path, language_code: &str) -> AppResult<Transcript>;
}
