// ABOUTME: Shared server resources injected into every HTTP handler as router state
// ABOUTME: Wires the store, content store, capability adapters, and shared secret once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::sync::Arc;

use voxloom_core::errors::AppResult;

use crate::auth::SharedSecret;
use crate::capabilities::{
    NullSynthesizer, PlaceholderTranscriber, RuleBasedReplyGenerator, SilentWavSynthesizer,
    SpeechSynthesizer,
};
use crate::config::{ServerConfig, TtsMode};
use crate::content_store::{ContentStore, FilesystemContentStore};
use crate::database::Database;
use crate::services::{MessageTurnOrchestrator, ToolInvoker, TurnCapabilities};

/// Everything a request handler needs, shared behind an `Arc`
#[derive(Clone)]
pub struct ServerResources {
    /// Conversation store
    pub database: Database,
    /// Audio blob store
    pub content_store: Arc<dyn ContentStore>,
    /// Turn pipeline
    pub orchestrator: MessageTurnOrchestrator,
    /// Shared bearer secret checked by the auth middleware
    pub api_key: SharedSecret,
    /// Configuration the server was started with
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Assemble resources from explicit parts
    #[must_use]
    pub fn new(
        database: Database,
        content_store: Arc<dyn ContentStore>,
        capabilities: TurnCapabilities,
        config: Arc<ServerConfig>,
    ) -> Self {
        let orchestrator = MessageTurnOrchestrator::new(
            database.clone(),
            Arc::clone(&content_store),
            capabilities,
            config.timeouts,
            config.media.max_audio_bytes,
        );
        Self {
            database,
            content_store,
            orchestrator,
            api_key: config.api_key.clone(),
            config,
        }
    }

    /// Assemble resources with the default adapters and a filesystem content store
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the media directory cannot be created
    pub async fn from_config(database: Database, config: Arc<ServerConfig>) -> AppResult<Self> {
        let content_store: Arc<dyn ContentStore> =
            Arc::new(FilesystemContentStore::new(&config.media.media_dir).await?);
        let capabilities = default_capabilities(config.tts_mode, Arc::clone(&content_store));
        Ok(Self::new(database, content_store, capabilities, config))
    }

    /// Tool invoker used by the tool endpoint
    #[must_use]
    pub const fn tool_invoker(&self) -> &ToolInvoker {
        self.orchestrator.tool_invoker()
    }
}

/// Default adapter set: placeholder ASR, rule-based replies, synthesizer per `tts_mode`
#[must_use]
pub fn default_capabilities(
    tts_mode: TtsMode,
    content_store: Arc<dyn ContentStore>,
) -> TurnCapabilities {
    let synthesizer: Arc<dyn SpeechSynthesizer> = match tts_mode {
        TtsMode::SilentWav => Arc::new(SilentWavSynthesizer::new(content_store)),
        TtsMode::Disabled => Arc::new(NullSynthesizer),
    };
    TurnCapabilities {
        transcriber: Arc::new(PlaceholderTranscriber),
        reply_generator: Arc::new(RuleBasedReplyGenerator),
        synthesizer,
    }
}
