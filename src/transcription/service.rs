//! # Transcription Service
//!
//! The validate-then-call sequence shared by every tool:
//! 1. **Format check**: extension must be on the allow-list
//! 2. **Language check**: code must be on the allow-list
//! 3. **File check**: path must exist, be a regular file and be readable
//! 4. **Provider call**: upload, transcribe, wait for the result
//!
//! Steps 1 and 2 never touch the disk or the network, so a rejected request
//! costs nothing.

use super::transcript::Transcript;
use super::{TranscriptFileResult, TranscriptionProvider, TranscriptionRequest, TranscriptionResult};
use crate::error::AppResult;
use crate::files;
use crate::validation;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// File name used when the caller does not choose an output path.
pub const DEFAULT_TRANSCRIPT_FILE: &str = "transcript.json";

/// Stateless front door to the provider. Cheap to clone.
#[derive(Clone)]
pub struct TranscriptionService {
    provider: Arc<dyn TranscriptionProvider>,
}

impl TranscriptionService {
    pub fn new(provider: Arc<dyn TranscriptionProvider>) -> Self {
        Self { provider }
    }

    /// Transcribe a file and return its text.
    pub async fn transcribe(&self, request: &TranscriptionRequest) -> AppResult<TranscriptionResult> {
        let transcript = self.run(request).await?;
        Ok(TranscriptionResult {
            text: transcript.text,
            language_code: request.language_code.clone(),
        })
    }

    /// Transcribe a file and save the full transcript (text, words, sentences
    /// and paragraphs) as JSON.
    ///
    /// Without `json_output_path` the transcript lands in `transcript.json`
    /// next to the audio file.
    pub async fn transcribe_to_file(
        &self,
        request: &TranscriptionRequest,
        json_output_path: Option<&Path>,
    ) -> AppResult<TranscriptFileResult> {
        let output_path = match json_output_path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_output_path(&request.file_path);
                info!(path = %path.display(), "No output path specified, using default");
                path
            }
        };

        let transcript = self.run(request).await?;
        if let Err(e) = transcript.save(&output_path).await {
            error!(path = %output_path.display(), error = %e, "Failed to save transcript");
            return Err(e);
        }
        info!(path = %output_path.display(), "Transcription saved");

        Ok(TranscriptFileResult {
            json_output_path: output_path.display().to_string(),
            text: transcript.text,
        })
    }

    async fn run(&self, request: &TranscriptionRequest) -> AppResult<Transcript> {
        validation::validate_format(&request.file_path)?;
        validation::validate_language(&request.language_code)?;

        let file_info = files::inspect_audio_file(&request.file_path).await?;
        let language = validation::language_name(&request.language_code).unwrap_or("unknown");

        info!(
            file = %file_info.name,
            size = %file_info.size_human(),
            language = %language,
            "Transcribing audio file"
        );

        let start_time = Instant::now();
        let result = self
            .provider
            .transcribe(Path::new(&request.file_path), &request.language_code)
            .await;
        let duration = start_time.elapsed();

        match &result {
            Ok(transcript) => info!(
                file = %file_info.name,
                words = transcript.words.len(),
                duration_ms = %duration.as_millis(),
                "Transcription completed"
            ),
            Err(e) => error!(
                file = %file_info.name,
                duration_ms = %duration.as_millis(),
                error = %e,
                "Transcription failed"
            ),
        }

        result
    }
}

/// `transcript.json` in the same directory as the audio file.
pub fn default_output_path(audio_path: &str) -> PathBuf {
    Path::new(audio_path)
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(DEFAULT_TRANSCRIPT_FILE)
}
