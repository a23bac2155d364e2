// ABOUTME: Capability adapter contracts for transcription, reply generation, and synthesis
// ABOUTME: Async traits with typed outputs and CapabilityError failures, plus default adapters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! # Capability Adapters
//!
//! External collaborators reached through fixed contracts. The orchestrator only
//! sees these traits; swapping the rule-based reply generator for a hosted model
//! means adding one more implementation.
//!
//! Every adapter reports a `model_id` that is written on its audit records.

/// Rule-based reply generator
pub mod reply;
/// Speech synthesizers
pub mod synthesis;
/// Deadlines for capability calls
pub mod timeout;
/// Placeholder speech recognizer
pub mod transcription;

pub use reply::RuleBasedReplyGenerator;
pub use synthesis::{NullSynthesizer, SilentWavSynthesizer};
pub use timeout::with_capability_timeout;
pub use transcription::PlaceholderTranscriber;

use async_trait::async_trait;
use voxloom_core::errors::CapabilityError;
use voxloom_core::models::{Direction, Session};

/// Audio handed to a transcriber
#[derive(Debug, Clone, Copy)]
pub struct TranscriptionRequest<'a> {
    /// Raw audio bytes
    pub audio: &'a [u8],
    /// MIME type of the audio
    pub mime: &'a str,
    /// Expected spoken language
    pub language: &'a str,
}

/// Converts speech to text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Identifier recorded on ASR model calls
    fn model_id(&self) -> &str;

    /// Transcribe audio to text
    ///
    /// # Errors
    ///
    /// Returns `CapabilityError` when the audio cannot be transcribed
    async fn transcribe(&self, request: TranscriptionRequest<'_>) -> Result<String, CapabilityError>;
}

/// One earlier message as seen by the reply generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    /// Who said it
    pub direction: Direction,
    /// What was said (transcript or reply text)
    pub text: String,
}

/// Conversation context for reply generation
#[derive(Debug, Clone)]
pub struct ReplyContext {
    /// Session the turn belongs to
    pub session: Session,
    /// Earlier messages in sequence order, excluding the current one
    pub history: Vec<ContextEntry>,
    /// Text of the current inbound message (transcript for audio)
    pub user_text: String,
}

/// Produces a textual reply from conversation context
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Identifier recorded on LLM model calls
    fn model_id(&self) -> &str;

    /// Generate the reply for the current turn
    ///
    /// # Errors
    ///
    /// Returns `CapabilityError` when no reply can be produced
    async fn generate_reply(&self, context: &ReplyContext) -> Result<String, CapabilityError>;
}

/// Reply text handed to a synthesizer
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    /// Text to speak
    pub text: &'a str,
    /// Language to speak it in
    pub language: &'a str,
}

/// Audio produced by a synthesizer and already placed in the content store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    /// Content-store reference
    pub content_ref: String,
    /// MIME type of the audio
    pub mime: String,
    /// Size in bytes
    pub size: usize,
}

/// Converts reply text to audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Identifier recorded on TTS model calls
    fn model_id(&self) -> &str;

    /// Synthesize reply audio; `Ok(None)` means the synthesizer ran and produced no audio
    ///
    /// # Errors
    ///
    /// Returns `CapabilityError` when synthesis fails
    async fn synthesize(
        &self,
        request: SynthesisRequest<'_>,
    ) -> Result<Option<SynthesizedAudio>, CapabilityError>;
}
