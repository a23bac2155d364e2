// ABOUTME: Audit record of a single transcription, reply-generation, or synthesis call
// ABOUTME: Append-only; every model call is attached to the message that triggered it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Capability that was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelCallKind {
    /// Speech recognition
    Asr,
    /// Reply generation
    Llm,
    /// Speech synthesis
    Tts,
}

impl ModelCallKind {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asr => "ASR",
            Self::Llm => "LLM",
            Self::Tts => "TTS",
        }
    }
}

impl fmt::Display for ModelCallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelCallKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASR" => Ok(Self::Asr),
            "LLM" => Ok(Self::Llm),
            "TTS" => Ok(Self::Tts),
            other => Err(AppError::serialization(format!(
                "Invalid model call kind: {other}"
            ))),
        }
    }
}

/// Outcome of a model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCallStatus {
    /// The capability produced an output (possibly empty)
    Success,
    /// The capability failed or timed out
    Failure,
    /// The capability was not invoked because an earlier step failed
    Skipped,
}

impl ModelCallStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ModelCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelCallStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "skipped" => Ok(Self::Skipped),
            other => Err(AppError::serialization(format!(
                "Invalid model call status: {other}"
            ))),
        }
    }
}

/// Persisted audit record of one capability invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCall {
    /// Unique model call ID
    pub id: String,
    /// Message that triggered the call
    pub message_id: String,
    /// Capability kind
    pub kind: ModelCallKind,
    /// Identifier of the model or adapter that ran
    pub model_id: String,
    /// Truncated summary of the input
    pub input_summary: Option<String>,
    /// Truncated summary of the output
    pub output_summary: Option<String>,
    /// Outcome
    pub status: ModelCallStatus,
    /// Machine-readable reason for failure or skip (e.g. `timeout`)
    pub status_code: Option<String>,
    /// Wall-clock latency of the call
    pub latency_ms: i64,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}
