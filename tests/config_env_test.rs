// ABOUTME: Tests for environment-driven server configuration
// ABOUTME: Serialized because they mutate process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::time::Duration;

use serial_test::serial;
use voxloom_server::config::{DatabaseUrl, ServerConfig, TtsMode};

const VARS: [&str; 12] = [
    "ENVIRONMENT",
    "API_KEY",
    "HTTP_PORT",
    "DATABASE_URL",
    "MEDIA_DIR",
    "MAX_AUDIO_BYTES",
    "ASR_TIMEOUT_SECS",
    "LLM_TIMEOUT_SECS",
    "TTS_TIMEOUT_SECS",
    "TOOL_TIMEOUT_SECS",
    "TTS_MODE",
    "CORS_ALLOWED_ORIGINS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_in_development() {
    clear_env();

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 8000);
    assert_eq!(config.tts_mode, TtsMode::SilentWav);
    assert_eq!(config.timeouts.transcription, Duration::from_secs(30));
    assert_eq!(config.timeouts.tool, Duration::from_secs(10));
    assert_eq!(config.cors_allowed_origins, vec!["*"]);
}

#[test]
#[serial]
fn test_overrides_from_environment() {
    clear_env();
    env::set_var("API_KEY", "from-env");
    env::set_var("HTTP_PORT", "9100");
    env::set_var("DATABASE_URL", "sqlite::memory:");
    env::set_var("LLM_TIMEOUT_SECS", "3");
    env::set_var("TTS_MODE", "disabled");
    env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");

    let config = ServerConfig::from_env().unwrap();
    assert!(config.api_key.matches("from-env"));
    assert_eq!(config.http_port, 9100);
    assert!(matches!(config.database.url, DatabaseUrl::Memory));
    assert_eq!(config.timeouts.reply, Duration::from_secs(3));
    assert_eq!(config.tts_mode, TtsMode::Disabled);
    assert_eq!(
        config.cors_allowed_origins,
        vec!["https://a.example", "https://b.example"]
    );
    clear_env();
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    clear_env();
    env::set_var("TTS_MODE", "loud");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("ASR_TIMEOUT_SECS", "0");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("HTTP_PORT", "not-a-port");
    assert!(ServerConfig::from_env().is_err());
    clear_env();
}

#[test]
#[serial]
fn test_production_requires_explicit_secret() {
    clear_env();
    env::set_var("ENVIRONMENT", "production");
    assert!(ServerConfig::from_env().is_err());

    env::set_var("API_KEY", "a-real-secret");
    let config = ServerConfig::from_env().unwrap();
    assert!(config.environment.is_production());
    clear_env();
}
