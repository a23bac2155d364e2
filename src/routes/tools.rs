// ABOUTME: Tool route handlers for direct Tool/CRM invocation
// ABOUTME: Schema violations answer 422 after the rejected call has been audited
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use voxloom_core::errors::AppResult;
use voxloom_core::models::ToolCallStatus;

use super::invalid_json;
use crate::resources::ServerResources;

/// Tool invocation request
#[derive(Debug, Deserialize)]
pub struct InvokeToolRequest {
    /// Session the call belongs to
    pub session_id: String,
    /// Message whose turn triggered the call
    #[serde(default)]
    pub triggering_message_id: Option<String>,
    /// Scenario tag
    pub scenario: String,
    /// Scenario payload
    #[serde(default, alias = "crm_record")]
    pub payload: Value,
}

/// Tool invocation outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeToolResponse {
    /// Whether the call completed
    pub ok: bool,
    /// Tool call status
    pub status: ToolCallStatus,
    /// CRM record created by the call
    pub crm_record_id: Option<String>,
    /// Audited tool call
    pub tool_call_id: String,
}

/// Tool routes
pub struct ToolRoutes;

impl ToolRoutes {
    /// Create all tool routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/v1/tools/invoke", post(Self::invoke))
            .route("/api/v1/tools/mcp", post(Self::invoke))
            .with_state(resources)
    }

    async fn invoke(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<InvokeToolRequest>, JsonRejection>,
    ) -> AppResult<(StatusCode, Json<InvokeToolResponse>)> {
        let Json(request) = payload.map_err(invalid_json)?;
        let invocation = resources
            .tool_invoker()
            .invoke(
                &request.session_id,
                request.triggering_message_id.as_deref(),
                &request.scenario,
                request.payload,
            )
            .await?;

        Ok((
            StatusCode::CREATED,
            Json(InvokeToolResponse {
                ok: true,
                status: invocation.tool_call.status,
                crm_record_id: invocation.tool_call.crm_record_id,
                tool_call_id: invocation.tool_call.id,
            }),
        ))
    }
}
