// ABOUTME: Session route handlers for creating sessions and reading conversations
// ABOUTME: Conversation reads return one consistent, fully ordered snapshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use voxloom_core::errors::{AppError, AppResult};
use voxloom_core::models::ConversationSnapshot;

use super::invalid_json;
use crate::resources::ServerResources;

/// Request to open a session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Customer the session is for
    pub customer_id: String,
    /// Spoken/written language code
    pub language: String,
    /// Channel the customer reached us on
    pub channel: String,
    /// Optional agent persona
    #[serde(default)]
    pub persona: Option<String>,
}

/// Response for session creation
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// New session ID
    pub session_id: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Conversation snapshot plus derived activity timestamp
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    /// Full ordered snapshot
    #[serde(flatten)]
    pub conversation: ConversationSnapshot,
    /// Timestamp of the latest message
    pub last_activity: DateTime<Utc>,
}

/// Session routes
pub struct SessionRoutes;

impl SessionRoutes {
    /// Create all session routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/v1/sessions", post(Self::create_session))
            .route(
                "/api/v1/sessions/:session_id/conversation",
                get(Self::get_conversation),
            )
            .with_state(resources)
    }

    async fn create_session(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<CreateSessionRequest>, JsonRejection>,
    ) -> AppResult<(StatusCode, Json<CreateSessionResponse>)> {
        let Json(request) = payload.map_err(invalid_json)?;
        for (field, value) in [
            ("customer_id", &request.customer_id),
            ("language", &request.language),
            ("channel", &request.channel),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::invalid_payload(format!("{field} must not be empty")));
            }
        }

        let session = resources
            .database
            .create_session(
                &request.customer_id,
                &request.language,
                &request.channel,
                request.persona.as_deref(),
            )
            .await?;
        info!(session.id = %session.id, customer.id = %session.customer_id, "Session created");

        Ok((
            StatusCode::CREATED,
            Json(CreateSessionResponse {
                session_id: session.id,
                created_at: session.created_at,
            }),
        ))
    }

    async fn get_conversation(
        State(resources): State<Arc<ServerResources>>,
        Path(session_id): Path<String>,
    ) -> AppResult<Json<ConversationResponse>> {
        let conversation = resources.database.get_conversation(&session_id).await?;
        Ok(Json(ConversationResponse {
            last_activity: conversation.last_activity(),
            conversation,
        }))
    }
}
