//! # Configuration Management
//!
//! This module handles loading the service configuration from multiple sources:
//! - Default values (built into the code)
//! - TOML configuration file (config.toml, optional)
//! - Environment variables (with TRANSCRIBER_ prefix)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (TRANSCRIBER_ASSEMBLYAI__BASE_URL, etc.)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! ## The API Key:
//! The key is the one setting that is *not* layered. It is read from
//! `ASSEMBLYAI_API_KEY` only (a `.env` file counts, since `main` loads it into
//! the environment first). A key in `config.toml` or under the `TRANSCRIBER_`
//! prefix is ignored, so an unset variable always stops startup.
//!
//! The configuration is read once at startup and handed to the components
//! that need it; nothing reads it from a global afterwards.

use anyhow::Result;                  // Startup errors with context
use serde::{Deserialize, Serialize}; // For converting to/from TOML
use std::env;                        // For reading ASSEMBLYAI_API_KEY
use std::time::Duration;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "ASSEMBLYAI_API_KEY";

/// Main application configuration that contains all settings.
///
/// ## Sections:
/// - `server`: how the service introduces itself to the MCP host
/// - `assemblyai`: where and how to reach the provider
///
/// Built by [`AppConfig::load`], checked by [`AppConfig::validate`], then
/// split up: the server takes its name, the HTTP client takes the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub assemblyai: AssemblyAiConfig,
}

/// MCP server identity reported to the host during initialization.
///
/// ## Fields:
/// - `name`: shown by the host in its tool list (default `"transcriber"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
}

/// Provider connection settings.
///
/// ## Fields:
/// - `api_key`: AssemblyAI API key (required, never logged, only from `ASSEMBLYAI_API_KEY`)
/// - `base_url`: API root, overridable for tests or proxies
/// - `poll_interval_ms`: Delay between transcript status checks
/// - `request_timeout_secs`: Timeout applied to each individual HTTP request
///
/// ## Tuning guidelines:
/// - Shorter poll intervals return results sooner but spend more requests
/// - The timeout covers one request, so it must fit the largest upload
#[derive(Clone, Serialize, Deserialize)]
pub struct AssemblyAiConfig {
    #[serde(skip)]
    pub api_key: String,
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
}

// Hand-written so the key never ends up in logs
impl std::fmt::Debug for AssemblyAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyAiConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "transcriber".to_string(),
            },
            assemblyai: AssemblyAiConfig {
                api_key: String::new(),
                base_url: "https://api.assemblyai.com".to_string(),
                poll_interval_ms: 3000,
                request_timeout_secs: 60,
            },
        }
    }
}

impl AssemblyAiConfig {
    /// Delay between status checks while a job is queued or processing.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from defaults, `config.toml` and the environment.
    ///
    /// This never fails because of a missing key; call [`AppConfig::validate`]
    /// for that.
    pub fn load() -> Result<Self> {
        Self::load_from(
            config::File::with_name("config").required(false),
            env::var(API_KEY_ENV).ok(),
        )
    }

    /// Same as [`AppConfig::load`] with an explicit file source and key.
    ///
    /// `api_key` is whatever `ASSEMBLYAI_API_KEY` held, if anything.
    pub fn load_from<S>(file: S, api_key: Option<String>) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            // TRANSCRIBER_ASSEMBLYAI__POLL_INTERVAL_MS becomes assemblyai.poll_interval_ms
            .add_source(
                config::Environment::with_prefix("TRANSCRIBER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: AppConfig = settings.build()?.try_deserialize()?;
        config.assemblyai.api_key = api_key.unwrap_or_default();
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// A missing API key is the common failure here; it stops the process
    /// before the MCP transport is opened.
    pub fn validate(&self) -> Result<()> {
        if self.assemblyai.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "{} environment variable not set",
                API_KEY_ENV
            ));
        }

        if self.assemblyai.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("AssemblyAI base URL cannot be empty"));
        }

        if self.assemblyai.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("Poll interval must be greater than 0"));
        }

        if self.assemblyai.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> AppConfig {
        let mut config = AppConfig::default();
        config.assemblyai.api_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.assemblyai.base_url, "https://api.assemblyai.com");
        assert_eq!(config.assemblyai.poll_interval(), Duration::from_secs(3));
        assert!(with_key().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));

        let mut config = AppConfig::default();
        config.assemblyai.api_key = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = with_key();
        config.assemblyai.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = with_key();
        config.assemblyai.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    fn toml(source: &str) -> config::File<config::FileSourceString, config::FileFormat> {
        config::File::from_str(source, config::FileFormat::Toml)
    }

    #[test]
    fn test_load_from_toml() {
        let source = r#"
            [assemblyai]
            poll_interval_ms = 250

            [server]
            name = "scribe"
        "#;
        let config = AppConfig::load_from(toml(source), Some("env-key".to_string())).unwrap();

        assert_eq!(config.assemblyai.poll_interval_ms, 250);
        assert_eq!(config.server.name, "scribe");
        assert_eq!(config.assemblyai.api_key, "env-key");
        // Untouched keys keep their defaults
        assert_eq!(config.assemblyai.base_url, "https://api.assemblyai.com");
        assert_eq!(config.assemblyai.request_timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_only_from_environment() {
        let source = r#"
            [assemblyai]
            api_key = "from-file"
        "#;

        let config = AppConfig::load_from(toml(source), None).unwrap();
        assert_eq!(config.assemblyai.api_key, "");
        assert!(config.validate().is_err());

        let config = AppConfig::load_from(toml(source), Some(String::new())).unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::load_from(toml(source), Some("from-env".to_string())).unwrap();
        assert_eq!(config.assemblyai.api_key, "from-env");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", with_key());
        assert!(!rendered.contains("test-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
