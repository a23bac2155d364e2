// ABOUTME: Environment-based server configuration for the turn service
// ABOUTME: Parses ports, database URL, shared secret, media storage, and capability timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! Environment-only configuration.
//!
//! Every setting has a development default so `voxloom-server` starts with no
//! configuration at all; production refuses to start with the demo secret.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use voxloom_core::constants::{limits, service};

use crate::auth::SharedSecret;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
            Self::Testing => f.write_str("testing"),
        }
    }
}

/// Type-safe database URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database file
    SQLite {
        /// Path to the database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (tests and demos)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error for URL schemes other than `sqlite:`
    pub fn parse_url(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("sqlite:") {
            let path = rest.trim_start_matches("//");
            if path == ":memory:" || path.is_empty() {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path),
                })
            }
        } else if s.contains("://") {
            bail!("Unsupported database URL scheme: {s}")
        } else {
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/voxloom.db"),
        }
    }
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
    /// Pool size for file databases
    pub max_connections: u32,
    /// Run schema migrations at startup
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DatabaseUrl::default(),
            max_connections: 5,
            auto_migrate: true,
        }
    }
}

/// Upper bounds on each capability call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityTimeouts {
    /// Speech recognition
    pub transcription: Duration,
    /// Reply generation
    pub reply: Duration,
    /// Speech synthesis
    pub synthesis: Duration,
    /// Tool/CRM invocation
    pub tool: Duration,
}

impl Default for CapabilityTimeouts {
    fn default() -> Self {
        Self {
            transcription: Duration::from_secs(30),
            reply: Duration::from_secs(30),
            synthesis: Duration::from_secs(15),
            tool: Duration::from_secs(10),
        }
    }
}

/// Which speech synthesizer to wire in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsMode {
    /// Write a short silent WAV per reply
    #[default]
    SilentWav,
    /// Produce no audio (text-only replies)
    Disabled,
}

impl TtsMode {
    /// Parse `TTS_MODE`
    ///
    /// # Errors
    ///
    /// Returns an error for unknown modes
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "silent_wav" | "silent-wav" | "wav" => Ok(Self::SilentWav),
            "none" | "disabled" | "off" => Ok(Self::Disabled),
            other => bail!("Invalid TTS_MODE value: {other}"),
        }
    }
}

/// Media (content store) settings
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory holding content-addressed audio
    pub media_dir: PathBuf,
    /// Largest decoded inbound audio accepted
    pub max_audio_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from("./media"),
            max_audio_bytes: limits::DEFAULT_MAX_AUDIO_BYTES,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database settings
    pub database: DatabaseConfig,
    /// Shared bearer secret for `/api/v1`
    pub api_key: SharedSecret,
    /// Content store settings
    pub media: MediaConfig,
    /// Capability deadlines
    pub timeouts: CapabilityTimeouts,
    /// Synthesizer selection
    pub tts_mode: TtsMode,
    /// Allowed CORS origins (`*` for any)
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8000,
            environment: Environment::Development,
            database: DatabaseConfig::default(),
            api_key: SharedSecret::new(service::DEFAULT_API_KEY),
            media: MediaConfig::default(),
            timeouts: CapabilityTimeouts::default(),
            tts_mode: TtsMode::default(),
            cors_allowed_origins: vec!["*".to_owned()],
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and `.env` when present)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable fails to parse or the result fails validation
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {e}");
        }

        let environment = Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));
        let api_key = match env::var("API_KEY") {
            Ok(value) => SharedSecret::new(value),
            Err(_) if environment.is_production() => {
                bail!("API_KEY must be set in production")
            }
            Err(_) => {
                warn!("API_KEY not set; using the demo shared secret");
                SharedSecret::new(service::DEFAULT_API_KEY)
            }
        };

        let config = Self {
            http_port: env_var_or("HTTP_PORT", "8000")
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment,
            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&env_var_or("DATABASE_URL", "sqlite:./data/voxloom.db"))
                    .context("Invalid DATABASE_URL value")?,
                max_connections: env_var_or("DATABASE_MAX_CONNECTIONS", "5")
                    .parse()
                    .context("Invalid DATABASE_MAX_CONNECTIONS value")?,
                auto_migrate: env_var_or("AUTO_MIGRATE", "true")
                    .parse()
                    .context("Invalid AUTO_MIGRATE value")?,
            },
            api_key,
            media: MediaConfig {
                media_dir: PathBuf::from(env_var_or("MEDIA_DIR", "./media")),
                max_audio_bytes: env_var_or(
                    "MAX_AUDIO_BYTES",
                    &limits::DEFAULT_MAX_AUDIO_BYTES.to_string(),
                )
                .parse()
                .context("Invalid MAX_AUDIO_BYTES value")?,
            },
            timeouts: CapabilityTimeouts {
                transcription: secs_var("ASR_TIMEOUT_SECS", 30)?,
                reply: secs_var("LLM_TIMEOUT_SECS", 30)?,
                synthesis: secs_var("TTS_TIMEOUT_SECS", 15)?,
                tool: secs_var("TOOL_TIMEOUT_SECS", 10)?,
            },
            tts_mode: TtsMode::parse(&env_var_or("TTS_MODE", "silent_wav"))?,
            cors_allowed_origins: parse_origins(&env_var_or("CORS_ALLOWED_ORIGINS", "*")),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for an empty secret, zero timeouts, or a zero pool size
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            bail!("API_KEY cannot be empty");
        }
        if self.environment.is_production() && self.api_key.matches(service::DEFAULT_API_KEY) {
            bail!("The demo API_KEY cannot be used in production");
        }
        if self.database.max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        let timeouts = [
            ("ASR_TIMEOUT_SECS", self.timeouts.transcription),
            ("LLM_TIMEOUT_SECS", self.timeouts.reply),
            ("TTS_TIMEOUT_SECS", self.timeouts.synthesis),
            ("TOOL_TIMEOUT_SECS", self.timeouts.tool),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| value.is_zero()) {
            bail!("{name} must be greater than zero");
        }
        if self.media.max_audio_bytes == 0 {
            bail!("MAX_AUDIO_BYTES must be greater than zero");
        }
        Ok(())
    }

    /// Secret-free human-readable summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "VoxLoom Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - Media Directory: {}\n\
             - TTS Mode: {:?}\n\
             - Timeouts (asr/llm/tts/tool): {}s/{}s/{}s/{}s\n\
             - CORS Origins: {}",
            self.http_port,
            self.environment,
            self.database.url.to_connection_string(),
            self.media.media_dir.display(),
            self.tts_mode,
            self.timeouts.transcription.as_secs(),
            self.timeouts.reply.as_secs(),
            self.timeouts.synthesis.as_secs(),
            self.timeouts.tool.as_secs(),
            self.cors_allowed_origins.join(", "),
        )
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn secs_var(key: &str, default: u64) -> Result<Duration> {
    let secs: u64 = env_var_or(key, &default.to_string())
        .parse()
        .with_context(|| format!("Invalid {key} value"))?;
    Ok(Duration::from_secs(secs))
}

/// Parse comma-separated CORS origins
fn parse_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:3000, https://app.example.com,"),
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("unknown"),
            Environment::Development
        );
    }

    #[test]
    fn test_database_url_parsing() {
        assert_eq!(
            DatabaseUrl::parse_url("sqlite::memory:").unwrap(),
            DatabaseUrl::Memory
        );
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/x.db").unwrap(),
            DatabaseUrl::SQLite {
                path: PathBuf::from("./data/x.db")
            }
        );
        assert!(DatabaseUrl::parse_url("postgres://localhost/db").is_err());
        assert_eq!(
            DatabaseUrl::Memory.to_connection_string(),
            "sqlite::memory:"
        );
    }

    #[test]
    fn test_tts_mode_parsing() {
        assert_eq!(TtsMode::parse("none").unwrap(), TtsMode::Disabled);
        assert_eq!(TtsMode::parse("SILENT_WAV").unwrap(), TtsMode::SilentWav);
        assert!(TtsMode::parse("opera").is_err());
    }

    #[test]
    fn test_validate_rejects_demo_secret_in_production() {
        let config = ServerConfig {
            environment: Environment::Production,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = ServerConfig::default();
        config.timeouts.reply = Duration::ZERO;
        let error = config.validate().unwrap_err().to_string();
        assert!(error.contains("LLM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_summary_hides_secret() {
        let config = ServerConfig::default();
        assert!(!config.summary().contains(service::DEFAULT_API_KEY));
    }
}
