//! # Transcriber MCP Service - Main Application Entry Point
//!
//! Exposes speech-to-text transcription of local audio and video files to an
//! agent host over the Model Context Protocol (stdio transport). The actual
//! transcription is done by AssemblyAI.
//!
//! ## Application Architecture:
//! - **config**: Loads settings (TOML file + environment variables + `.env`)
//! - **validation**: Allow-lists for file formats and language codes
//! - **files**: File existence and readability checks
//! - **transcription**: Provider client, service and transcript model
//! - **server**: MCP tool table and request routing
//! - **error**: Error types and their tool-result form
//!
//! ## Startup Order:
//! Configuration is loaded and validated before the transport is opened, so
//! a missing `ASSEMBLYAI_API_KEY` stops the process before any request is
//! accepted.

// Module declarations
mod config;        // Configuration management (config.rs)
mod error;         // Error types and tool-result conversion (error.rs)
mod files;         // Audio file checks (files.rs)
mod server;        // MCP tool table and handler (server.rs)
mod transcription; // Provider client, service, transcript model (transcription/)
mod validation;    // Format and language allow-lists (validation.rs)

// External crate imports
use anyhow::Result;    // Startup errors with context
use config::AppConfig; // Our custom configuration struct
use rmcp::ServiceExt;  // Adds .serve() to our handler
use server::{ToolRegistry, TranscriberServer};
use std::sync::Arc;
use tracing::{error, info};  // Structured logging
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};  // Logging setup
use transcription::{AssemblyAiClient, TranscriptionService};

#[tokio::main]
async fn main() -> Result<()> {
    // It's fine if there's no .env file
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }

    info!("Starting transcriber-mcp v{}", env!("CARGO_PKG_VERSION"));
    info!("Supported languages: {}", validation::supported_languages_list());
    info!("Supported formats: {}", validation::supported_formats_list());
    info!(
        base_url = %config.assemblyai.base_url,
        poll_interval_ms = config.assemblyai.poll_interval_ms,
        "Configuration loaded"
    );

    let provider = AssemblyAiClient::new(&config.assemblyai)?;
    let service = TranscriptionService::new(Arc::new(provider));
    let server = TranscriberServer::new(config.server.name.clone(), ToolRegistry::new(), service);

    info!("Serving MCP over stdio");
    let running = server.serve(rmcp::transport::stdio()).await?;

    // Run until the host closes the transport OR a shutdown signal arrives
    tokio::select! {
        result = running.waiting() => {
            match result {
                Ok(reason) => info!("MCP session ended: {:?}", reason),
                Err(e) => error!("MCP service task error: {}", e),
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize structured logging.
///
/// Logs go to stderr because stdout carries the MCP transport.
///
/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged (e.g., "debug", "transcriber_mcp=trace")
/// - If not set, defaults to "transcriber_mcp=debug,rmcp=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transcriber_mcp=debug,rmcp=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(())
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C");
    }
}
