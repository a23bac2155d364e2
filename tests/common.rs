// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory stores, quiet logging, and scripted capability doubles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `voxloom_server`

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::sleep;
use voxloom_server::auth::SharedSecret;
use voxloom_server::capabilities::{
    PlaceholderTranscriber, ReplyContext, ReplyGenerator, RuleBasedReplyGenerator,
    SilentWavSynthesizer, SpeechSynthesizer, SynthesisRequest, SynthesizedAudio, Transcriber,
    TranscriptionRequest,
};
use voxloom_server::config::{CapabilityTimeouts, ServerConfig};
use voxloom_server::content_store::{ContentStore, InMemoryContentStore};
use voxloom_server::database::Database;
use voxloom_server::errors::CapabilityError;
use voxloom_server::resources::ServerResources;
use voxloom_server::services::{MessageTurnOrchestrator, TurnCapabilities};

/// Secret accepted by test routers
pub const TEST_API_KEY: &str = "test_shared_secret";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Migrated in-memory conversation store
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    let database = Database::new_in_memory().await?;
    database.migrate().await?;
    Ok(database)
}

/// Short deadlines so timeout tests finish quickly
pub fn test_timeouts() -> CapabilityTimeouts {
    CapabilityTimeouts {
        transcription: Duration::from_millis(500),
        reply: Duration::from_millis(500),
        synthesis: Duration::from_millis(500),
        tool: Duration::from_secs(5),
    }
}

/// Server configuration used by HTTP tests
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig {
        api_key: SharedSecret::new(TEST_API_KEY),
        timeouts: test_timeouts(),
        ..ServerConfig::default()
    };
    config.media.max_audio_bytes = 1024 * 1024;
    config
}

/// Default offline adapters writing synthesized audio to `store`
pub fn default_capabilities(store: Arc<dyn ContentStore>) -> TurnCapabilities {
    TurnCapabilities {
        transcriber: Arc::new(PlaceholderTranscriber),
        reply_generator: Arc::new(RuleBasedReplyGenerator),
        synthesizer: Arc::new(SilentWavSynthesizer::new(store)),
    }
}

/// Orchestrator over `database` with the given adapters and an in-memory content store
pub fn create_test_orchestrator(
    database: &Database,
    capabilities: impl FnOnce(Arc<dyn ContentStore>) -> TurnCapabilities,
) -> MessageTurnOrchestrator {
    let store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
    MessageTurnOrchestrator::new(
        database.clone(),
        Arc::clone(&store),
        capabilities(Arc::clone(&store)),
        test_timeouts(),
        1024 * 1024,
    )
}

/// Server resources over `database` with the default adapters
pub fn create_test_resources(database: &Database) -> Arc<ServerResources> {
    let store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
    let capabilities = default_capabilities(Arc::clone(&store));
    Arc::new(ServerResources::new(
        database.clone(),
        store,
        capabilities,
        Arc::new(test_config()),
    ))
}

/// Transcriber returning a fixed outcome
pub struct ScriptedTranscriber {
    pub outcome: Result<String, CapabilityError>,
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    fn model_id(&self) -> &str {
        "scripted-asr"
    }

    async fn transcribe(&self, _request: TranscriptionRequest<'_>) -> Result<String, CapabilityError> {
        self.outcome.clone()
    }
}

/// Reply generator that always fails
pub struct FailingReplyGenerator;

#[async_trait]
impl ReplyGenerator for FailingReplyGenerator {
    fn model_id(&self) -> &str {
        "failing-llm"
    }

    async fn generate_reply(&self, _context: &ReplyContext) -> Result<String, CapabilityError> {
        Err(CapabilityError::failed("upstream model unavailable"))
    }
}

/// Reply generator that sleeps before answering
pub struct SlowReplyGenerator {
    pub delay: Duration,
}

#[async_trait]
impl ReplyGenerator for SlowReplyGenerator {
    fn model_id(&self) -> &str {
        "slow-llm"
    }

    async fn generate_reply(&self, _context: &ReplyContext) -> Result<String, CapabilityError> {
        sleep(self.delay).await;
        Ok("finally".to_owned())
    }
}

/// Reply generator that remembers every context it was given
#[derive(Default)]
pub struct RecordingReplyGenerator {
    pub contexts: Mutex<Vec<ReplyContext>>,
}

#[async_trait]
impl ReplyGenerator for RecordingReplyGenerator {
    fn model_id(&self) -> &str {
        "recording-llm"
    }

    async fn generate_reply(&self, context: &ReplyContext) -> Result<String, CapabilityError> {
        self.contexts.lock().unwrap().push(context.clone());
        Ok(format!("echo: {}", context.user_text))
    }
}

/// Synthesizer that always fails
pub struct FailingSynthesizer;

#[async_trait]
impl SpeechSynthesizer for FailingSynthesizer {
    fn model_id(&self) -> &str {
        "failing-tts"
    }

    async fn synthesize(
        &self,
        _request: SynthesisRequest<'_>,
    ) -> Result<Option<SynthesizedAudio>, CapabilityError> {
        Err(CapabilityError::failed("voice service down"))
    }
}

/// Transcriber that sleeps before answering
pub struct SlowTranscriber {
    pub delay: Duration,
}

#[async_trait]
impl Transcriber for SlowTranscriber {
    fn model_id(&self) -> &str {
        "slow-asr"
    }

    async fn transcribe(&self, _request: TranscriptionRequest<'_>) -> Result<String, CapabilityError> {
        sleep(self.delay).await;
        Ok("too late".to_owned())
    }
}

/// Synthesizer that sleeps before answering
pub struct SlowSynthesizer {
    pub delay: Duration,
}

#[async_trait]
impl SpeechSynthesizer for SlowSynthesizer {
    fn model_id(&self) -> &str {
        "slow-tts"
    }

    async fn synthesize(
        &self,
        _request: SynthesisRequest<'_>,
    ) -> Result<Option<SynthesizedAudio>, CapabilityError> {
        sleep(self.delay).await;
        Ok(None)
    }
}
