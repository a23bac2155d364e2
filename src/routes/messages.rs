// ABOUTME: Message route handler that runs one full turn per inbound message
// ABOUTME: Decodes text or base64 audio and returns the finalized, audited turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use voxloom_core::errors::{AppError, AppResult};
use voxloom_core::models::{CrmRecord, ModelCall, ToolCall};

use super::invalid_json;
use crate::resources::ServerResources;
use crate::services::{Degradation, InboundPayload, TurnResult};

/// Inbound message as sent by clients
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    /// `text` or `audio`
    #[serde(rename = "type")]
    pub kind: String,
    /// Text content
    #[serde(default)]
    pub text: Option<String>,
    /// Base64-encoded audio
    #[serde(default, alias = "audio_base64")]
    pub audio_content: Option<String>,
    /// Audio MIME type
    #[serde(default)]
    pub mime: Option<String>,
}

/// Finalized turn
#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Session the turn belongs to
    pub session_id: String,
    /// Inbound message ID
    pub inbound_message_id: String,
    /// Inbound sequence number
    pub inbound_seq: i64,
    /// Reply message ID
    pub outbound_message_id: String,
    /// Reply sequence number
    pub outbound_seq: i64,
    /// Text the reply was generated from
    pub transcript: String,
    /// Reply text
    pub reply_text: String,
    /// Content reference of reply audio, when synthesized
    pub reply_audio_ref: Option<String>,
    /// Model calls of the turn
    pub model_calls: Vec<ModelCall>,
    /// Tool call from automatic CRM capture
    pub tool_call: Option<ToolCall>,
    /// CRM record created by that tool call
    pub crm_record: Option<CrmRecord>,
    /// Steps that degraded
    pub degradations: Vec<Degradation>,
    /// One-line account of the turn
    pub summary: String,
}

impl From<TurnResult> for TurnResponse {
    fn from(turn: TurnResult) -> Self {
        Self {
            summary: turn.summary(),
            transcript: turn.user_text().to_owned(),
            reply_text: turn.reply_text().to_owned(),
            reply_audio_ref: turn.reply_audio_ref().map(ToOwned::to_owned),
            session_id: turn.inbound.session_id,
            inbound_message_id: turn.inbound.id,
            inbound_seq: turn.inbound.seq,
            outbound_message_id: turn.outbound.id,
            outbound_seq: turn.outbound.seq,
            model_calls: turn.model_calls,
            tool_call: turn.tool_call,
            crm_record: turn.crm_record,
            degradations: turn.degradations,
        }
    }
}

/// Message routes
pub struct MessageRoutes;

impl MessageRoutes {
    /// Create all message routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/v1/sessions/:session_id/messages",
                post(Self::post_message),
            )
            .with_state(resources)
    }

    async fn post_message(
        State(resources): State<Arc<ServerResources>>,
        Path(session_id): Path<String>,
        payload: Result<Json<PostMessageRequest>, JsonRejection>,
    ) -> AppResult<(StatusCode, Json<TurnResponse>)> {
        let Json(request) = payload.map_err(invalid_json)?;
        let audio = request
            .audio_content
            .as_deref()
            .map(|encoded| {
                STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| AppError::invalid_payload(format!("Invalid base64 audio: {e}")))
            })
            .transpose()?;
        let inbound = InboundPayload::from_parts(&request.kind, request.text, audio, request.mime)?;

        let turn = resources
            .orchestrator
            .handle_turn(&session_id, inbound)
            .await?;

        Ok((StatusCode::CREATED, Json(TurnResponse::from(turn))))
    }
}
