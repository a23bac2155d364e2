// ABOUTME: Message turn orchestration from inbound message to finalized, audited reply
// ABOUTME: Runs transcription, reply generation, synthesis, and CRM capture in strict order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{instrument, warn};
use voxloom_core::constants::audio::MIME_WAV;
use voxloom_core::constants::scenarios::BILLING_QUERY;
use voxloom_core::constants::status_codes::UPSTREAM_FAILED;
use voxloom_core::constants::transcripts::EMPTY_TRANSCRIPT;
use voxloom_core::errors::{AppError, AppResult, CapabilityError};
use voxloom_core::models::{
    CrmRecord, Direction, Message, Modality, ModelCall, ModelCallKind, ModelCallStatus, Session,
    ToolCall,
};

use super::model_call_logger::{CallRecord, ModelCallLogger};
use super::scenario::billing_query_payload;
use super::tool_invoker::ToolInvoker;
use crate::capabilities::{
    with_capability_timeout, ContextEntry, ReplyContext, ReplyGenerator, SpeechSynthesizer,
    SynthesisRequest, SynthesizedAudio, Transcriber, TranscriptionRequest,
};
use crate::config::CapabilityTimeouts;
use crate::content_store::ContentStore;
use crate::database::{Database, NewMessage};
use crate::intent::classify_billing_intent;
use crate::logging::AppLogger;

/// Content of an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// Typed text
    Text(String),
    /// Recorded speech
    Audio {
        /// Raw audio bytes
        bytes: Bytes,
        /// MIME type of the audio
        mime: String,
    },
}

impl InboundPayload {
    /// Build a payload from its loosely typed wire form.
    ///
    /// Exactly one of `text` or `audio` must be present and must match `kind`.
    /// Audio without a MIME type is assumed to be WAV.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` when the parts are inconsistent or empty
    pub fn from_parts(
        kind: &str,
        text: Option<String>,
        audio: Option<Vec<u8>>,
        mime: Option<String>,
    ) -> AppResult<Self> {
        match (kind, text, audio) {
            ("text", Some(text), None) => {
                if text.trim().is_empty() {
                    return Err(AppError::invalid_payload("Text message must not be empty"));
                }
                Ok(Self::Text(text))
            }
            ("audio", None, Some(audio)) => {
                if audio.is_empty() {
                    return Err(AppError::invalid_payload("Audio message must not be empty"));
                }
                let mime = mime.unwrap_or_else(|| MIME_WAV.to_owned());
                if !mime.starts_with("audio/") {
                    return Err(AppError::invalid_payload(format!(
                        "Unsupported audio MIME type: {mime}"
                    )));
                }
                Ok(Self::Audio {
                    bytes: Bytes::from(audio),
                    mime,
                })
            }
            ("text" | "audio", _, _) => Err(AppError::invalid_payload(
                "Exactly one of text or audio content must be provided, matching the message type",
            )),
            (other, _, _) => Err(AppError::invalid_payload(format!(
                "Message type must be 'text' or 'audio', got '{other}'"
            ))),
        }
    }

    /// Wire name of the payload kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Audio { .. } => "audio",
        }
    }
}

/// A step that failed without aborting the turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Degradation {
    /// Transcription failed; the turn continued from the fallback transcript
    Transcription {
        /// Reason code recorded on the ASR model call
        status_code: String,
    },
    /// Synthesis failed; the reply was delivered as text only
    Synthesis {
        /// Reason code recorded on the TTS model call
        status_code: String,
    },
    /// Automatic CRM capture was rejected by schema validation
    CrmCapture {
        /// Offending payload fields
        fields: Vec<String>,
    },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transcription { status_code } => {
                write!(f, "transcription unavailable ({status_code}), fallback transcript used")
            }
            Self::Synthesis { status_code } => {
                write!(f, "audio synthesis unavailable ({status_code})")
            }
            Self::CrmCapture { fields } => {
                write!(f, "CRM capture rejected ({})", fields.join(", "))
            }
        }
    }
}

/// Everything a finalized turn produced
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// Persisted inbound message, with its transcript for audio
    pub inbound: Message,
    /// Persisted reply message
    pub outbound: Message,
    /// Model calls of the turn in execution order
    pub model_calls: Vec<ModelCall>,
    /// Tool call made by automatic CRM capture
    pub tool_call: Option<ToolCall>,
    /// CRM record created by that tool call
    pub crm_record: Option<CrmRecord>,
    /// Steps that failed without aborting the turn
    pub degradations: Vec<Degradation>,
}

impl TurnResult {
    /// Text the turn replied with
    #[must_use]
    pub fn reply_text(&self) -> &str {
        self.outbound.derived_text.as_deref().unwrap_or_default()
    }

    /// Transcript (audio) or text (text) the reply was generated from
    #[must_use]
    pub fn user_text(&self) -> &str {
        self.inbound.context_text().unwrap_or_default()
    }

    /// Content reference of synthesized reply audio
    #[must_use]
    pub fn reply_audio_ref(&self) -> Option<&str> {
        self.outbound.content_ref.as_deref()
    }

    /// One-line account of what succeeded and what degraded
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec!["reply generated".to_owned()];
        let synthesis_failed = self
            .degradations
            .iter()
            .any(|d| matches!(d, Degradation::Synthesis { .. }));
        if !synthesis_failed {
            parts.push(if self.reply_audio_ref().is_some() {
                "reply audio synthesized".to_owned()
            } else {
                "no reply audio produced".to_owned()
            });
        }
        if let Some(record) = &self.crm_record {
            parts.push(format!("CRM record {} created", record.id));
        }
        parts.extend(self.degradations.iter().map(ToString::to_string));
        parts.join("; ")
    }
}

/// Capability adapters used by the orchestrator
#[derive(Clone)]
pub struct TurnCapabilities {
    /// Speech recognizer
    pub transcriber: Arc<dyn Transcriber>,
    /// Reply generator
    pub reply_generator: Arc<dyn ReplyGenerator>,
    /// Speech synthesizer
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

/// Drives one inbound message through the full turn pipeline
#[derive(Clone)]
pub struct MessageTurnOrchestrator {
    database: Database,
    content_store: Arc<dyn ContentStore>,
    capabilities: TurnCapabilities,
    model_calls: ModelCallLogger,
    tool_invoker: ToolInvoker,
    timeouts: CapabilityTimeouts,
    max_audio_bytes: usize,
}

impl MessageTurnOrchestrator {
    /// Wire an orchestrator over a store, content store, and adapters
    #[must_use]
    pub fn new(
        database: Database,
        content_store: Arc<dyn ContentStore>,
        capabilities: TurnCapabilities,
        timeouts: CapabilityTimeouts,
        max_audio_bytes: usize,
    ) -> Self {
        Self {
            model_calls: ModelCallLogger::new(database.clone()),
            tool_invoker: ToolInvoker::new(database.clone(), timeouts.tool),
            database,
            content_store,
            capabilities,
            timeouts,
            max_audio_bytes,
        }
    }

    /// Invoker shared with the tool endpoint
    #[must_use]
    pub const fn tool_invoker(&self) -> &ToolInvoker {
        &self.tool_invoker
    }

    /// Handle one inbound message and return the finalized turn.
    ///
    /// Every record is committed before the next step starts. If the returned future
    /// is dropped mid-turn, no further steps run and whatever was committed stays.
    /// When reply generation fails the turn aborts with `ReplyGenerationFailed`; the
    /// inbound message and its model calls remain, and their IDs are listed in the
    /// error details.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload`, `SessionNotFound`, `ReplyGenerationFailed`, or
    /// `StoreUnavailable`
    #[instrument(skip(self, payload), fields(session.id = %session_id, turn.kind = payload.kind()))]
    pub async fn handle_turn(
        &self,
        session_id: &str,
        payload: InboundPayload,
    ) -> AppResult<TurnResult> {
        let started = Instant::now();
        if let InboundPayload::Audio { bytes, .. } = &payload {
            if bytes.len() > self.max_audio_bytes {
                return Err(AppError::invalid_payload(format!(
                    "Audio exceeds the {} byte limit",
                    self.max_audio_bytes
                )));
            }
        }

        let session = self.database.require_session(session_id).await?;
        let mut model_calls = Vec::new();
        let mut degradations = Vec::new();

        let inbound = match payload {
            InboundPayload::Text(text) => {
                self.database
                    .append_message(NewMessage {
                        session_id,
                        direction: Direction::Inbound,
                        modality: Modality::Text,
                        text: Some(&text),
                        content_ref: None,
                        mime: None,
                        derived_text: Some(&text),
                    })
                    .await?
            }
            InboundPayload::Audio { bytes, mime } => {
                self.receive_audio(&session, &bytes, &mime, &mut model_calls, &mut degradations)
                    .await?
            }
        };
        let user_text = inbound.context_text().unwrap_or_default().to_owned();

        let reply = self
            .generate_reply(&session, &inbound, &user_text, &mut model_calls)
            .await?;
        let audio = self
            .synthesize(&session, &inbound, &reply, &mut model_calls, &mut degradations)
            .await?;

        let outbound = self
            .database
            .append_message(NewMessage {
                session_id,
                direction: Direction::Outbound,
                modality: if audio.is_some() {
                    Modality::Audio
                } else {
                    Modality::Text
                },
                text: audio.is_none().then_some(reply.as_str()),
                content_ref: audio.as_ref().map(|a| a.content_ref.as_str()),
                mime: audio.as_ref().map(|a| a.mime.as_str()),
                derived_text: Some(&reply),
            })
            .await?;

        let (tool_call, crm_record) = self
            .capture_crm(&session, &inbound, &user_text, &mut degradations)
            .await?;

        AppLogger::log_turn_completed(
            session_id,
            inbound.seq,
            degradations.len(),
            started.elapsed().as_millis(),
        );

        Ok(TurnResult {
            inbound,
            outbound,
            model_calls,
            tool_call,
            crm_record,
            degradations,
        })
    }

    async fn receive_audio(
        &self,
        session: &Session,
        bytes: &[u8],
        mime: &str,
        model_calls: &mut Vec<ModelCall>,
        degradations: &mut Vec<Degradation>,
    ) -> AppResult<Message> {
        // Unreferenced if the append below fails; a resend reuses the same blob
        let stored = self.content_store.put(bytes, mime).await?;
        let mut inbound = self
            .database
            .append_message(NewMessage {
                session_id: &session.id,
                direction: Direction::Inbound,
                modality: Modality::Audio,
                text: None,
                content_ref: Some(&stored.content_ref),
                mime: Some(mime),
                derived_text: None,
            })
            .await?;

        let transcriber = &self.capabilities.transcriber;
        let call_started = Instant::now();
        let outcome = with_capability_timeout(
            self.timeouts.transcription,
            transcriber.transcribe(TranscriptionRequest {
                audio: bytes,
                mime,
                language: &session.language,
            }),
        )
        .await;
        let latency = call_started.elapsed();

        let transcript = match outcome {
            Ok(transcript) => {
                model_calls.push(
                    self.log_success(
                        &inbound.id,
                        ModelCallKind::Asr,
                        transcriber.model_id(),
                        Some(&stored.content_ref),
                        Some(&transcript),
                        latency,
                    )
                    .await?,
                );
                transcript
            }
            Err(error) => {
                model_calls.push(
                    self.log_failure(
                        &inbound.id,
                        ModelCallKind::Asr,
                        transcriber.model_id(),
                        Some(&stored.content_ref),
                        &error,
                        latency,
                    )
                    .await?,
                );
                degradations.push(Degradation::Transcription {
                    status_code: error.status_code().to_owned(),
                });
                EMPTY_TRANSCRIPT.to_owned()
            }
        };

        if !self.database.set_derived_text(&inbound.id, &transcript).await? {
            warn!(message.id = %inbound.id, "Derived text already set, keeping stored value");
        }
        inbound.derived_text = Some(transcript);
        Ok(inbound)
    }

    async fn generate_reply(
        &self,
        session: &Session,
        inbound: &Message,
        user_text: &str,
        model_calls: &mut Vec<ModelCall>,
    ) -> AppResult<String> {
        let history = self
            .database
            .list_messages(&session.id)
            .await?
            .into_iter()
            .filter(|message| message.id != inbound.id)
            .filter_map(|message| {
                message.context_text().map(|text| ContextEntry {
                    direction: message.direction,
                    text: text.to_owned(),
                })
            })
            .collect();
        let context = ReplyContext {
            session: session.clone(),
            history,
            user_text: user_text.to_owned(),
        };

        let generator = &self.capabilities.reply_generator;
        let call_started = Instant::now();
        let outcome = with_capability_timeout(self.timeouts.reply, generator.generate_reply(&context))
            .await
            .and_then(|reply| {
                if reply.trim().is_empty() {
                    Err(CapabilityError::failed("reply generator returned an empty reply"))
                } else {
                    Ok(reply)
                }
            });
        let latency = call_started.elapsed();

        match outcome {
            Ok(reply) => {
                model_calls.push(
                    self.log_success(
                        &inbound.id,
                        ModelCallKind::Llm,
                        generator.model_id(),
                        Some(user_text),
                        Some(&reply),
                        latency,
                    )
                    .await?,
                );
                Ok(reply)
            }
            Err(error) => {
                model_calls.push(
                    self.log_failure(
                        &inbound.id,
                        ModelCallKind::Llm,
                        generator.model_id(),
                        Some(user_text),
                        &error,
                        latency,
                    )
                    .await?,
                );
                model_calls.push(
                    self.model_calls
                        .log_call(CallRecord {
                            message_id: &inbound.id,
                            kind: ModelCallKind::Tts,
                            model_id: self.capabilities.synthesizer.model_id(),
                            input: None,
                            output: None,
                            status: ModelCallStatus::Skipped,
                            status_code: Some(UPSTREAM_FAILED),
                            latency: Duration::ZERO,
                        })
                        .await?,
                );

                let model_call_ids: Vec<&str> =
                    model_calls.iter().map(|call| call.id.as_str()).collect();
                Err(AppError::reply_generation_failed(format!(
                    "Reply generation failed: {error}"
                ))
                .with_resource_id(&session.id)
                .with_details(json!({
                    "inbound_message_id": inbound.id,
                    "status_code": error.status_code(),
                    "model_call_ids": model_call_ids,
                })))
            }
        }
    }

    async fn synthesize(
        &self,
        session: &Session,
        inbound: &Message,
        reply: &str,
        model_calls: &mut Vec<ModelCall>,
        degradations: &mut Vec<Degradation>,
    ) -> AppResult<Option<SynthesizedAudio>> {
        let synthesizer = &self.capabilities.synthesizer;
        let call_started = Instant::now();
        let outcome = with_capability_timeout(
            self.timeouts.synthesis,
            synthesizer.synthesize(SynthesisRequest {
                text: reply,
                language: &session.language,
            }),
        )
        .await;
        let latency = call_started.elapsed();

        match outcome {
            Ok(audio) => {
                model_calls.push(
                    self.log_success(
                        &inbound.id,
                        ModelCallKind::Tts,
                        synthesizer.model_id(),
                        Some(reply),
                        audio.as_ref().map(|a| a.content_ref.as_str()),
                        latency,
                    )
                    .await?,
                );
                Ok(audio)
            }
            Err(error) => {
                model_calls.push(
                    self.log_failure(
                        &inbound.id,
                        ModelCallKind::Tts,
                        synthesizer.model_id(),
                        Some(reply),
                        &error,
                        latency,
                    )
                    .await?,
                );
                degradations.push(Degradation::Synthesis {
                    status_code: error.status_code().to_owned(),
                });
                Ok(None)
            }
        }
    }

    async fn capture_crm(
        &self,
        session: &Session,
        inbound: &Message,
        user_text: &str,
        degradations: &mut Vec<Degradation>,
    ) -> AppResult<(Option<ToolCall>, Option<CrmRecord>)> {
        let Some(intent) = classify_billing_intent(user_text) else {
            return Ok((None, None));
        };

        let payload = billing_query_payload(session, user_text, intent);
        let invocation = self
            .tool_invoker
            .record(&session.id, Some(&inbound.id), BILLING_QUERY, payload)
            .await?;
        if invocation.is_rejected() {
            degradations.push(Degradation::CrmCapture {
                fields: invocation.violations.clone(),
            });
        }
        Ok((Some(invocation.tool_call), invocation.crm_record))
    }

    async fn log_success(
        &self,
        message_id: &str,
        kind: ModelCallKind,
        model_id: &str,
        input: Option<&str>,
        output: Option<&str>,
        latency: Duration,
    ) -> AppResult<ModelCall> {
        self.model_calls
            .log_call(CallRecord {
                message_id,
                kind,
                model_id,
                input,
                output,
                status: ModelCallStatus::Success,
                status_code: None,
                latency,
            })
            .await
    }

    async fn log_failure(
        &self,
        message_id: &str,
        kind: ModelCallKind,
        model_id: &str,
        input: Option<&str>,
        error: &CapabilityError,
        latency: Duration,
    ) -> AppResult<ModelCall> {
        warn!(model.kind = %kind, model.id = %model_id, error = %error, "Capability call failed");
        let detail = error.to_string();
        self.model_calls
            .log_call(CallRecord {
                message_id,
                kind,
                model_id,
                input,
                output: Some(&detail),
                status: ModelCallStatus::Failure,
                status_code: Some(error.status_code()),
                latency,
            })
            .await
    }
}
