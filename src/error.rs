//! # Error Handling
//!
//! This module defines the application's error type and how it is turned into
//! an MCP tool result.
//!
//! ## Error Categories:
//! - **Config**: Settings the provider client cannot be built from
//! - **Validation**: Bad file extension or language code (request never sent)
//! - **Io**: The audio file or transcript path could not be accessed
//! - **Auth**: The provider rejected the API key
//! - **Provider**: The provider reported a failure
//! - **BadRequest**: The host sent malformed tool arguments
//! - **Internal**: Anything else
//!
//! ## Tool Result Format:
//! Errors reach the host as a tool result with `isError: true` and a
//! structured body:
//! ```json
//! {
//!   "error": {
//!     "type": "validation_error",
//!     "message": "Unsupported language code: 'xx'. ..."
//!   }
//! }
//! ```

use crate::validation::ValidationError;
use rmcp::model::CallToolResult; // What the host receives for a tool call
use serde_json::json;
use std::fmt;                    // For the Display implementation

/// Every failure a tool call can end in.
///
/// ## Where each variant comes from:
/// - `Validation`: [`crate::validation`], before any I/O
/// - `Io`: [`crate::files`] and transcript saving
/// - `Auth` / `Provider`: the AssemblyAI client, from HTTP statuses and job errors
/// - `BadRequest`: argument parsing in the server
/// - `Config`: building the HTTP client at startup
///
/// Variants carry a human-readable message; the machine-readable part is
/// [`AppError::kind`].
#[derive(Debug)]
pub enum AppError {
    /// Settings that cannot be turned into a working client
    Config(String),

    /// Input rejected by the allow-lists
    Validation(ValidationError),

    /// File system access failed
    Io(String),

    /// Provider refused our credentials
    Auth(String),

    /// Provider returned an error status or failed the transcription job
    Provider(String),

    /// Tool arguments could not be parsed
    BadRequest(String),

    /// Unexpected failures
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Validation(err) => write!(f, "Validation error: {}", err),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            AppError::Provider(msg) => write!(f, "Provider error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Machine-readable error type.
    ///
    /// Goes into the `type` field of the error body, so hosts can branch on
    /// it without parsing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Validation(_) => "validation_error",
            AppError::Io(_) => "io_error",
            AppError::Auth(_) => "auth_error",
            AppError::Provider(_) => "provider_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Whether the request was rejected before any provider call.
    ///
    /// The server logs these at `warn` instead of `error`.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// Convert into an error tool result for the host.
    ///
    /// The result has `isError: true` and a structured
    /// `{ "error": { "type", "message" } }` body.
    pub fn into_tool_result(self) -> CallToolResult {
        CallToolResult::structured_error(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Transport-level failures talking to the provider. HTTP status errors are
/// mapped separately by the client so they can carry the provider's message.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Provider(format!("request failed: {}", err))
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;
