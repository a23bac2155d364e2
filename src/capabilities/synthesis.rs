// ABOUTME: Speech synthesizers: a silent WAV generator and a no-audio synthesizer
// ABOUTME: Synthesized audio is written to the content store and returned by reference
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use voxloom_core::constants::audio::{MIME_WAV, SILENT_CLIP_SECONDS, TTS_SAMPLE_RATE};
use voxloom_core::constants::model_ids::{NULL_TTS, SILENT_WAV_TTS};
use voxloom_core::errors::CapabilityError;

use super::{SpeechSynthesizer, SynthesisRequest, SynthesizedAudio};
use crate::content_store::ContentStore;

/// Synthesizer that emits a short silent 16-bit mono WAV for every reply
#[derive(Clone)]
pub struct SilentWavSynthesizer {
    store: Arc<dyn ContentStore>,
}

impl SilentWavSynthesizer {
    /// Create a synthesizer writing into `store`
    #[must_use]
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Encode the silent clip
    ///
    /// # Errors
    ///
    /// Returns `CapabilityError::Failed` if WAV encoding fails
    pub fn silent_wav() -> Result<Vec<u8>, CapabilityError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: TTS_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut buffer, spec)
            .map_err(|e| CapabilityError::failed(format!("Failed to create WAV writer: {e}")))?;
        for _ in 0..TTS_SAMPLE_RATE * SILENT_CLIP_SECONDS {
            writer
                .write_sample(0_i16)
                .map_err(|e| CapabilityError::failed(format!("Failed to write sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| CapabilityError::failed(format!("Failed to finalize WAV: {e}")))?;

        Ok(buffer.into_inner())
    }
}

#[async_trait]
impl SpeechSynthesizer for SilentWavSynthesizer {
    fn model_id(&self) -> &str {
        SILENT_WAV_TTS
    }

    async fn synthesize(
        &self,
        request: SynthesisRequest<'_>,
    ) -> Result<Option<SynthesizedAudio>, CapabilityError> {
        if request.text.trim().is_empty() {
            return Ok(None);
        }
        let wav = Self::silent_wav()?;
        let stored = self
            .store
            .put(&wav, MIME_WAV)
            .await
            .map_err(|e| CapabilityError::failed(format!("Failed to store audio: {e}")))?;
        Ok(Some(SynthesizedAudio {
            content_ref: stored.content_ref,
            mime: stored.mime,
            size: stored.size,
        }))
    }
}

/// Synthesizer for text-only deployments; always succeeds without audio
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSynthesizer;

#[async_trait]
impl SpeechSynthesizer for NullSynthesizer {
    fn model_id(&self) -> &str {
        NULL_TTS
    }

    async fn synthesize(
        &self,
        _request: SynthesisRequest<'_>,
    ) -> Result<Option<SynthesizedAudio>, CapabilityError> {
        Ok(None)
    }
}
