//! # AssemblyAI Client
//!
//! Talks to the AssemblyAI REST API in three steps:
//! 1. **Upload**: `POST /v2/upload` with the raw file bytes, returns an `upload_url`
//! 2. **Submit**: `POST /v2/transcript` with the `audio_url` and language hint
//! 3. **Poll**: `GET /v2/transcript/{id}` until the job is `completed` or `error`
//! 4. **Segments**: `GET /v2/transcript/{id}/sentences` and `/paragraphs` once
//!    the job is complete
//!
//! Every request carries the API key in the `authorization` header. There are
//! no retries: the first failure is returned to the caller.

use super::transcript::{Segment, Transcript, Word};
use super::TranscriptionProvider;
use crate::config::AssemblyAiConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    audio_url: &'a str,
    language_code: &'a str,
}

/// Lifecycle of a provider-side transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: JobStatus,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    words: Option<Vec<Word>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentencesResponse {
    sentences: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct ParagraphsResponse {
    paragraphs: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the AssemblyAI API.
pub struct AssemblyAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

impl AssemblyAiClient {
    pub fn new(config: &AssemblyAiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            poll_interval: config.poll_interval(),
        })
    }

    async fn upload(&self, path: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!(bytes = bytes.len(), "Uploading audio");

        let response = self
            .http
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let upload: UploadResponse = check_status(response).await?.json().await?;
        Ok(upload.upload_url)
    }

    async fn submit(&self, audio_url: &str, language_code: &str) -> AppResult<TranscriptResponse> {
        let response = self
            .http
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&SubmitRequest {
                audio_url,
                language_code,
            })
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn fetch(&self, id: &str) -> AppResult<TranscriptResponse> {
        self.get_json(&format!("/v2/transcript/{}", id)).await
    }

    /// Sentence and paragraph grouping of a completed job.
    async fn fetch_segments(&self, id: &str) -> AppResult<(Vec<Segment>, Vec<Segment>)> {
        let sentences: SentencesResponse =
            self.get_json(&format!("/v2/transcript/{}/sentences", id)).await?;
        let paragraphs: ParagraphsResponse =
            self.get_json(&format!("/v2/transcript/{}/paragraphs", id)).await?;
        Ok((sentences.sentences, paragraphs.paragraphs))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> AppResult<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("authorization", &self.api_key)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Poll until the job reaches a terminal status.
    async fn wait_for_completion(&self, mut job: TranscriptResponse) -> AppResult<Transcript> {
        let id = job.id.clone();
        loop {
            match job.status {
                JobStatus::Completed => {
                    let (sentences, paragraphs) = self.fetch_segments(&id).await?;
                    debug!(
                        id = %id,
                        sentences = sentences.len(),
                        paragraphs = paragraphs.len(),
                        "Transcript complete"
                    );
                    return Ok(Transcript::new(
                        job.text.unwrap_or_default(),
                        job.words.unwrap_or_default(),
                    )
                    .with_segments(sentences, paragraphs));
                }
                JobStatus::Error => {
                    return Err(AppError::Provider(
                        job.error
                            .unwrap_or_else(|| "transcription failed without a message".to_string()),
                    ));
                }
                JobStatus::Queued | JobStatus::Processing => {
                    debug!(id = %id, status = ?job.status, "Transcript not ready");
                    tokio::time::sleep(self.poll_interval).await;
                    job = self.fetch(&id).await?;
                }
            }
        }
    }
}

#[async_trait]
impl TranscriptionProvider for AssemblyAiClient {
    async fn transcribe(&self, path: &Path, language_code: &str) -> AppResult<Transcript> {
        let audio_url = self.upload(path).await?;
        let job = self.submit(&audio_url, language_code).await?;
        info!(id = %job.id, "Transcription job submitted");

        self.wait_for_completion(job).await
    }
}

/// Map non-success responses to auth or provider errors, keeping the
/// provider's own message when the body has one.
async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Auth(message)),
        _ => Err(AppError::Provider(format!("HTTP {}: {}", status.as_u16(), message))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AssemblyAiClient {
        AssemblyAiClient::new(&AssemblyAiConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            poll_interval_ms: 10,
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    fn audio_file() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.wav");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"RIFF....WAVE")
            .unwrap();
        (dir, path)
    }

    async fn mount_upload(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v2/upload"))
            .and(header("authorization", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "upload_url": "https://cdn.assemblyai.com/upload/abc"
            })))
            .mount(server)
            .await;
    }

    async fn mount_segments(server: &MockServer, id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/transcript/{}/sentences", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "sentences": [
                    {"text": "Hola mundo.", "start": 0, "end": 700, "confidence": 0.96, "words": []}
                ]
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/v2/transcript/{}/paragraphs", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "paragraphs": [
                    {"text": "Hola mundo.", "start": 0, "end": 700, "confidence": 0.96, "words": []}
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_completed_transcription() {
        let server = MockServer::start().await;
        mount_upload(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/transcript"))
            .and(body_json(json!({
                "audio_url": "https://cdn.assemblyai.com/upload/abc",
                "language_code": "es"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-1",
                "status": "queued"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/transcript/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-1",
                "status": "completed",
                "text": "hola mundo",
                "words": [
                    {"text": "hola", "start": 0, "end": 300, "confidence": 0.97, "speaker": null},
                    {"text": "mundo", "start": 320, "end": 700, "confidence": 0.95, "speaker": null}
                ]
            })))
            .mount(&server)
            .await;
        mount_segments(&server, "job-1").await;

        let (_dir, audio) = audio_file();
        let transcript = client_for(&server).transcribe(&audio, "es").await.unwrap();

        assert_eq!(transcript.text, "hola mundo");
        assert_eq!(transcript.words.len(), 2);
        assert_eq!(transcript.words[1].start, 320);
        assert_eq!(transcript.sentences.len(), 1);
        assert_eq!(transcript.sentences[0].text, "Hola mundo.");
        assert_eq!(transcript.paragraphs[0].end, 700);
    }

    #[tokio::test]
    async fn test_polls_until_completed() {
        let server = MockServer::start().await;
        mount_upload(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/transcript"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-3",
                "status": "queued"
            })))
            .mount(&server)
            .await;

        // First two status checks still report processing
        Mock::given(method("GET"))
            .and(path("/v2/transcript/job-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-3",
                "status": "processing"
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/transcript/job-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-3",
                "status": "completed",
                "text": "finally",
                "words": []
            })))
            .mount(&server)
            .await;
        mount_segments(&server, "job-3").await;

        let (_dir, audio) = audio_file();
        let transcript = client_for(&server).transcribe(&audio, "en").await.unwrap();
        assert_eq!(transcript.text, "finally");

        let status_checks = server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/v2/transcript/job-3")
            .count();
        assert_eq!(status_checks, 3);
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/upload"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let (_dir, audio) = audio_file();
        let err = client_for(&server).transcribe(&audio, "en").await.unwrap_err();

        assert_eq!(err.kind(), "auth_error");
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_job_error_carries_provider_message() {
        let server = MockServer::start().await;
        mount_upload(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/transcript"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-2",
                "status": "processing"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/transcript/job-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-2",
                "status": "error",
                "error": "Audio duration is too short."
            })))
            .mount(&server)
            .await;

        let (_dir, audio) = audio_file();
        let err = client_for(&server).transcribe(&audio, "en").await.unwrap_err();

        assert_eq!(err.kind(), "provider_error");
        assert!(err.to_string().contains("Audio duration is too short."));
    }

    #[tokio::test]
    async fn test_server_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/upload"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let (_dir, audio) = audio_file();
        let err = client_for(&server).transcribe(&audio, "en").await.unwrap_err();

        assert_eq!(err.kind(), "provider_error");
        assert!(err.to_string().contains("HTTP 503: upstream unavailable"));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_io_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let err = client_for(&server)
            .transcribe(&dir.path().join("missing.mp3"), "en")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "io_error");
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }
}
