// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Model identifiers, placeholder transcripts, scenario schemas, and limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! Constants module
//!
//! Values that appear in persisted audit records live here so stored data stays
//! stable across refactors of the adapters that produce it.

/// Service identity reported by the banner and health endpoints
pub mod service {
    /// Service name
    pub const SERVICE_NAME: &str = "voxloom-backend";
    /// Default shared secret used outside production
    pub const DEFAULT_API_KEY: &str = "voxloom_demo_api_key";
}

/// Model identifiers recorded on model calls
pub mod model_ids {
    /// Placeholder speech recognizer
    pub const PLACEHOLDER_ASR: &str = "placeholder-asr-v1";
    /// Keyword rule reply generator
    pub const RULE_BASED_REPLY: &str = "rule-based-generate-reply-v1";
    /// Silent WAV synthesizer
    pub const SILENT_WAV_TTS: &str = "silent-wav-tts-v1";
    /// Synthesizer that never produces audio
    pub const NULL_TTS: &str = "null-tts";
}

/// Transcript placeholders
pub mod transcripts {
    /// Substituted when transcription fails or times out
    pub const EMPTY_TRANSCRIPT: &str = "<empty_transcript>";
    /// Produced by the placeholder recognizer for any non-empty audio
    pub const PENDING_REAL_MODEL: &str = "<transcript_from_asr_pending_real_model>";
}

/// Status codes stored on failed or skipped model calls
pub mod status_codes {
    /// Adapter exceeded its deadline
    pub const TIMEOUT: &str = "timeout";
    /// Adapter rejected its input
    pub const INVALID_INPUT: &str = "invalid_input";
    /// Adapter reported an error
    pub const ADAPTER_ERROR: &str = "adapter_error";
    /// Step not attempted because an earlier step failed
    pub const UPSTREAM_FAILED: &str = "upstream_failed";
}

/// Tool scenarios and their schemas
pub mod scenarios {
    /// Billing or refund query captured into the CRM
    pub const BILLING_QUERY: &str = "billing_query";
    /// Fields a `billing_query` payload must carry
    pub const BILLING_QUERY_REQUIRED_FIELDS: [&str; 5] =
        ["name", "account_id", "query", "intent", "priority"];
    /// Accepted values of the `priority` field
    pub const PRIORITIES: [&str; 4] = ["low", "normal", "high", "urgent"];
    /// Intent recorded for refund requests
    pub const INTENT_REFUND: &str = "request_refund";
    /// Intent recorded for bill explanations
    pub const INTENT_BILLING_EXPLANATION: &str = "billing_explanation";
    /// Initial status of a captured CRM record
    pub const CRM_STATUS_PENDING: &str = "pending";
}

/// Size limits
pub mod limits {
    /// Characters kept from model inputs/outputs in audit summaries
    pub const SUMMARY_MAX_CHARS: usize = 200;
    /// Default upper bound on decoded inbound audio
    pub const DEFAULT_MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;
    /// Prefix length of the session id used in generated account ids
    pub const ACCOUNT_ID_PREFIX_LEN: usize = 8;
}

/// Audio parameters of synthesized replies
pub mod audio {
    /// Sample rate of synthesized WAV output
    pub const TTS_SAMPLE_RATE: u32 = 16_000;
    /// Duration of the silent reply clip
    pub const SILENT_CLIP_SECONDS: u32 = 1;
    /// MIME type of WAV audio
    pub const MIME_WAV: &str = "audio/wav";
    /// MIME type of MP3 audio
    pub const MIME_MP3: &str = "audio/mpeg";
}
