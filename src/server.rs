//! # MCP Server
//!
//! Exposes the transcription service to an agent host as MCP tools over
//! stdio. The wire protocol belongs to `rmcp`; this module only declares the
//! tools and routes calls to their handlers.
//!
//! ## Available Tools:
//! - `transcribe` - Transcribe a file and return its text
//! - `transcribe_file` - Transcribe a file and save the transcript as JSON
//!
//! ## Tool Table:
//! The `{name → handler}` table is built once at startup by
//! [`ToolRegistry::new`] and never changes afterwards. Each entry carries the
//! descriptor the host sees (name, description, input and output schema) and
//! a plain function pointer that runs the call.
//!
//! ## Call Outcomes:
//! - Success: structured content matching the tool's output schema
//! - Unknown tool or malformed arguments: MCP `invalid_params` error
//! - Anything else: a tool result with `isError: true` (see `error.rs`)

use crate::error::{AppError, AppResult};
use crate::transcription::{TranscriptionRequest, TranscriptionService};
use crate::validation::{self, DEFAULT_LANGUAGE};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

type ToolFuture<'a> = Pin<Box<dyn Future<Output = AppResult<Value>> + Send + 'a>>;

/// Handler signature shared by every tool.
///
/// Handlers borrow the service for the life of the call and own their
/// arguments, so the returned future can be boxed without cloning.
type ToolHandler = for<'a> fn(&'a TranscriptionService, JsonObject) -> ToolFuture<'a>;

struct ToolEntry {
    descriptor: Tool,
    handler: ToolHandler,
}

/// The tools this server exposes, keyed by name.
///
/// ## Purpose:
/// Keeps tool declaration and tool dispatch in one place, so a tool can
/// never be listed without being callable (or the other way round).
///
/// ## Usage:
/// ```ignore
/// let registry = ToolRegistry::new();
/// let tools = registry.tools();                       // for list_tools
/// let outcome = registry.dispatch("transcribe", &service, args).await;
/// ```
pub struct ToolRegistry {
    entries: HashMap<&'static str, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };

        registry.register(
            "transcribe",
            Tool::new(
                "transcribe",
                "Transcribe an audio or video file and return its text content.",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": format!(
                                "Path to the audio file. Supported formats: {}",
                                validation::supported_formats_list()
                            )
                        },
                        "language_code": {
                            "type": "string",
                            "description": format!(
                                "Language code for transcription. Supported languages: {}",
                                validation::supported_languages_list()
                            ),
                            "default": DEFAULT_LANGUAGE
                        }
                    },
                    "required": ["file_path"]
                })),
            )
            .with_output(json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Transcribed text" },
                    "language_code": { "type": "string", "description": "Language used" }
                },
                "required": ["text"]
            })),
            transcribe_handler,
        );

        registry.register(
            "transcribe_file",
            Tool::new(
                "transcribe_file",
                "Transcribe an audio or video file, save the transcript with word timings \
                 as JSON and return its text content.",
                schema(json!({
                    "type": "object",
                    "properties": {
                        "audio_path": {
                            "type": "string",
                            "description": "Path to the audio or video file to transcribe"
                        },
                        "language_code": {
                            "type": "string",
                            "description": "Language code for transcription",
                            "default": DEFAULT_LANGUAGE
                        },
                        "json_output_path": {
                            "type": "string",
                            "description": "Where to save the transcript JSON. Defaults to \
                                            transcript.json next to the audio file"
                        }
                    },
                    "required": ["audio_path"]
                })),
            )
            .with_output(json!({
                "type": "object",
                "properties": {
                    "result": { "type": "string", "enum": ["Success"] },
                    "json_output_path": {
                        "type": "string",
                        "description": "Where the transcript JSON was written"
                    },
                    "text": { "type": "string", "description": "Transcribed text" }
                },
                "required": ["result", "json_output_path", "text"]
            })),
            transcribe_file_handler,
        );

        registry
    }

    fn register(&mut self, name: &'static str, descriptor: Tool, handler: ToolHandler) {
        self.entries.insert(name, ToolEntry { descriptor, handler });
    }

    /// Tool descriptors sorted by name.
    pub fn tools(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.entries.values().map(|e| e.descriptor.clone()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Run the named tool. Returns `None` for unknown tools.
    pub async fn dispatch(
        &self,
        name: &str,
        service: &TranscriptionService,
        arguments: JsonObject,
    ) -> Option<AppResult<Value>> {
        let entry = self.entries.get(name)?;
        Some((entry.handler)(service, arguments).await)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn schema(value: Value) -> Arc<JsonObject> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

/// Declares the shape of a tool's structured content.
trait WithOutput {
    fn with_output(self, output: Value) -> Self;
}

impl WithOutput for Tool {
    fn with_output(mut self, output: Value) -> Self {
        self.output_schema = Some(schema(output));
        self
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: JsonObject) -> AppResult<T> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| AppError::BadRequest(format!("Invalid arguments: {}", e)))
}

fn transcribe_handler(service: &TranscriptionService, arguments: JsonObject) -> ToolFuture<'_> {
    Box::pin(async move {
        let request: TranscriptionRequest = parse_args(arguments)?;
        let result = service.transcribe(&request).await?;
        Ok(serde_json::to_value(result)?)
    })
}

#[derive(Debug, Deserialize)]
struct TranscribeFileArgs {
    audio_path: String,
    #[serde(default = "crate::transcription::default_language")]
    language_code: String,
    #[serde(default)]
    json_output_path: Option<String>,
}

fn transcribe_file_handler(service: &TranscriptionService, arguments: JsonObject) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: TranscribeFileArgs = parse_args(arguments)?;
        let request = TranscriptionRequest {
            file_path: args.audio_path,
            language_code: args.language_code,
        };

        let result = service
            .transcribe_to_file(&request, args.json_output_path.as_deref().map(Path::new))
            .await?;

        Ok(json!({
            "result": "Success",
            "json_output_path": result.json_output_path,
            "text": result.text,
        }))
    })
}

/// MCP handler that serves the tool table.
///
/// ## Fields:
/// - `name`: server name reported in `initialize` (from `[server] name`)
/// - `registry`: the tool table, shared read-only between sessions
/// - `service`: validation and provider access behind every tool
///
/// Cloning is cheap; `rmcp` may clone the handler per session.
#[derive(Clone)]
pub struct TranscriberServer {
    name: String,
    registry: Arc<ToolRegistry>,
    service: TranscriptionService,
}

impl TranscriberServer {
    pub fn new(name: impl Into<String>, registry: ToolRegistry, service: TranscriptionService) -> Self {
        Self {
            name: name.into(),
            registry: Arc::new(registry),
            service,
        }
    }

    /// Route a tool call and log its outcome.
    ///
    /// Unknown tools and malformed arguments are protocol errors; everything
    /// else becomes a tool result so the host can show the message.
    pub async fn handle_call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        if !self.registry.contains(name) {
            warn!(tool = %name, "Unknown tool requested");
            return Err(ErrorData::invalid_params(format!("Unknown tool: {}", name), None));
        }

        let request_id = uuid::Uuid::new_v4();
        let start_time = Instant::now();
        info!(tool = %name, request_id = %request_id, "Tool call started");

        let outcome = self
            .registry
            .dispatch(name, &self.service, arguments.unwrap_or_default())
            .await
            .unwrap_or_else(|| Err(AppError::Internal(format!("Tool {} vanished", name))));
        let duration = start_time.elapsed();

        match outcome {
            Ok(value) => {
                info!(
                    tool = %name,
                    request_id = %request_id,
                    duration_ms = %duration.as_millis(),
                    "Tool call completed"
                );
                Ok(CallToolResult::structured(value))
            }
            Err(AppError::BadRequest(message)) => {
                warn!(tool = %name, request_id = %request_id, error = %message, "Rejected tool arguments");
                Err(ErrorData::invalid_params(message, None))
            }
            // Rejected inputs are the caller's problem, not ours
            Err(err) if err.is_validation() => {
                warn!(
                    tool = %name,
                    request_id = %request_id,
                    error = %err,
                    "Tool call rejected by validation"
                );
                Ok(err.into_tool_result())
            }
            Err(err) => {
                error!(
                    tool = %name,
                    request_id = %request_id,
                    duration_ms = %duration.as_millis(),
                    kind = err.kind(),
                    error = %err,
                    "Tool call failed"
                );
                Ok(err.into_tool_result())
            }
        }
    }
}

impl ServerHandler for TranscriberServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(format!(
                "Transcribes local audio and video files with AssemblyAI. \
                 Supported formats: {}. Supported languages: {}.",
                validation::supported_formats_list(),
                validation::supported_languages_list()
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.registry.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.handle_call(&request.name, request.arguments).await
    }
}
