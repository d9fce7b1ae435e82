//! Transcript data returned by the provider and persisted next to the audio.
//!
//! ## File Format:
//! ```json
//! {
//!   "text": "hello world. how are you?",
//!   "words": [{ "text": "hello", "start": 0, "end": 420, "confidence": 0.98 }],
//!   "sentences": [{ "text": "hello world.", "start": 0, "end": 900, "words": [...] }],
//!   "paragraphs": [{ "text": "hello world. how are you?", "start": 0, "end": 2100, "words": [...] }],
//!   "created_at": "2025-01-01T12:00:00Z"
//! }
//! ```
//! `sentences`, `paragraphs` and `created_at` may be absent in files written
//! by other tools; `text` and `words` may not.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single word with timing information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,

    /// Start time in milliseconds
    pub start: u64,

    /// End time in milliseconds
    pub end: u64,

    /// Confidence score (0.0 to 1.0)
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    #[serde(default)]
    pub speaker: Option<String>,

    #[serde(default)]
    pub channel: Option<String>,
}

/// A sentence or paragraph as grouped by the provider.
///
/// Same timing fields as [`Word`], plus the words it is made of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start: u64,
    pub end: u64,

    #[serde(default = "default_confidence")]
    pub confidence: f64,

    #[serde(default)]
    pub words: Vec<Word>,

    #[serde(default)]
    pub speaker: Option<String>,
}

fn default_confidence() -> f64 {
    1.0
}

/// Complete transcript of an audio or video file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub words: Vec<Word>,

    #[serde(default)]
    pub sentences: Vec<Segment>,

    #[serde(default)]
    pub paragraphs: Vec<Segment>,

    /// When the transcript was produced; absent in files written by other tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transcript {
    pub fn new(text: impl Into<String>, words: Vec<Word>) -> Self {
        Self {
            text: text.into(),
            words,
            sentences: Vec::new(),
            paragraphs: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Attach the provider's sentence and paragraph grouping.
    pub fn with_segments(mut self, sentences: Vec<Segment>, paragraphs: Vec<Segment>) -> Self {
        self.sentences = sentences;
        self.paragraphs = paragraphs;
        self
    }

    /// Write the transcript as pretty JSON, creating parent directories.
    pub async fn save(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Internal(format!("Failed to encode transcript: {}", e)))?;
        tokio::fs::write(path, json).await.map_err(|e| {
            AppError::Io(format!(
                "Failed to save transcription to {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load a transcript previously written with [`Transcript::save`].
    #[cfg(test)]
    pub async fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::Io(format!(
                    "Transcript file not found: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|e| {
            AppError::BadRequest(format!(
                "Error parsing transcript file {}: {}",
                path.display(),
                e
            ))
        })
    }
}
