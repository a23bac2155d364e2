// ABOUTME: Error type shared by transcription, reply generation, and synthesis adapters
// ABOUTME: Kept separate from AppError so adapter failures are audited rather than propagated
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::time::Duration;

use thiserror::Error;

use crate::constants::status_codes;

/// Failure reported by a capability adapter.
///
/// The orchestrator records these as `failure` model calls; they only become an
/// [`AppError`](super::AppError) when the failing step is fatal to the turn.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The adapter did not answer within its deadline
    #[error("capability timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// The adapter rejected its input (empty audio, unsupported MIME type, ...)
    #[error("invalid capability input: {0}")]
    InvalidInput(String),
    /// The adapter ran and failed
    #[error("capability failed: {0}")]
    Failed(String),
}

impl CapabilityError {
    /// Short machine-readable code stored on the failed model call
    #[must_use]
    pub const fn status_code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => status_codes::TIMEOUT,
            Self::InvalidInput(_) => status_codes::INVALID_INPUT,
            Self::Failed(_) => status_codes::ADAPTER_ERROR,
        }
    }

    /// Convenience constructor for adapter failures
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
