// ABOUTME: Placeholder speech recognizer used until a real ASR model is wired in
// ABOUTME: Fails on empty audio and returns a fixed marker transcript otherwise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use async_trait::async_trait;
use voxloom_core::constants::model_ids::PLACEHOLDER_ASR;
use voxloom_core::constants::transcripts::PENDING_REAL_MODEL;
use voxloom_core::errors::CapabilityError;

use super::{Transcriber, TranscriptionRequest};

/// Transcriber that never runs a model
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderTranscriber;

#[async_trait]
impl Transcriber for PlaceholderTranscriber {
    fn model_id(&self) -> &str {
        PLACEHOLDER_ASR
    }

    async fn transcribe(&self, request: TranscriptionRequest<'_>) -> Result<String, CapabilityError> {
        if request.audio.is_empty() {
            return Err(CapabilityError::InvalidInput("audio is empty".to_owned()));
        }
        if !request.mime.starts_with("audio/") {
            return Err(CapabilityError::InvalidInput(format!(
                "unsupported MIME type {}",
                request.mime
            )));
        }
        Ok(PENDING_REAL_MODEL.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_audio_fails() {
        let error = PlaceholderTranscriber
            .transcribe(TranscriptionRequest {
                audio: &[],
                mime: "audio/wav",
                language: "en",
            })
            .await
            .unwrap_err();
        assert_eq!(error.status_code(), "invalid_input");
    }

    #[tokio::test]
    async fn test_audio_yields_marker_transcript() {
        let text = PlaceholderTranscriber
            .transcribe(TranscriptionRequest {
                audio: b"RIFF",
                mime: "audio/wav",
                language: "en",
            })
            .await
            .unwrap();
        assert_eq!(text, PENDING_REAL_MODEL);
    }
}
