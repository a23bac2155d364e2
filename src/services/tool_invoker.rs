// ABOUTME: Tool/CRM invoker validating scenario payloads and recording tool calls
// ABOUTME: Rejected calls are audited without a CRM record; completed calls commit both atomically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{instrument, warn};
use voxloom_core::errors::{AppError, AppResult};
use voxloom_core::models::{CrmRecord, ToolCall, ToolCallStatus};

use super::scenario::validate_payload;
use crate::database::{Database, NewCrmRecord, NewToolCall};
use crate::logging::AppLogger;

/// Recorded outcome of one tool invocation
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Audited tool call, completed or rejected
    pub tool_call: ToolCall,
    /// CRM record created by a completed call
    pub crm_record: Option<CrmRecord>,
    /// Offending fields of a rejected call
    pub violations: Vec<String>,
}

impl ToolInvocation {
    /// Whether the call was rejected by schema validation
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.tool_call.status == ToolCallStatus::Rejected
    }

    /// Convert a rejection into the `SchemaViolation` error reported to callers
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` when the call was rejected
    pub fn into_result(self) -> AppResult<Self> {
        if !self.is_rejected() {
            return Ok(self);
        }
        let details = json!({
            "scenario": self.tool_call.scenario,
            "fields": self.violations,
            "tool_call_id": self.tool_call.id,
        });
        Err(AppError::schema_violation(&self.tool_call.scenario, &self.violations)
            .with_details(details))
    }
}

/// Validates and executes structured side-effecting actions
#[derive(Clone)]
pub struct ToolInvoker {
    database: Database,
    timeout: Duration,
}

impl ToolInvoker {
    /// Create an invoker bounded by `timeout` per invocation
    #[must_use]
    pub const fn new(database: Database, timeout: Duration) -> Self {
        Self { database, timeout }
    }

    /// Invoke a scenario, failing with `SchemaViolation` when the payload is rejected.
    ///
    /// The rejected tool call is persisted before the error is returned; its ID is in
    /// the error details under `tool_call_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `InvalidPayload` for a triggering message outside the
    /// session, `SchemaViolation`, or `StoreUnavailable`
    pub async fn invoke(
        &self,
        session_id: &str,
        triggering_message_id: Option<&str>,
        scenario: &str,
        payload: Value,
    ) -> AppResult<ToolInvocation> {
        self.record(session_id, triggering_message_id, scenario, payload)
            .await?
            .into_result()
    }

    /// Invoke a scenario and return the recorded outcome, rejected or completed
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `InvalidPayload`, or `StoreUnavailable`; schema
    /// rejections are reported through [`ToolInvocation::is_rejected`]
    #[instrument(skip(self, payload), fields(session.id = %session_id, tool.scenario = %scenario))]
    pub async fn record(
        &self,
        session_id: &str,
        triggering_message_id: Option<&str>,
        scenario: &str,
        payload: Value,
    ) -> AppResult<ToolInvocation> {
        timeout(
            self.timeout,
            self.record_inner(session_id, triggering_message_id, scenario, payload),
        )
        .await
        .map_err(|_| {
            AppError::store_unavailable(format!(
                "Tool invocation exceeded {}ms",
                self.timeout.as_millis()
            ))
        })?
    }

    async fn record_inner(
        &self,
        session_id: &str,
        triggering_message_id: Option<&str>,
        scenario: &str,
        payload: Value,
    ) -> AppResult<ToolInvocation> {
        let session = self.database.require_session(session_id).await?;

        if let Some(message_id) = triggering_message_id {
            let belongs = self
                .database
                .get_message(message_id)
                .await?
                .is_some_and(|message| message.session_id == session_id);
            if !belongs {
                return Err(AppError::invalid_payload(format!(
                    "Triggering message {message_id} does not belong to session {session_id}"
                )));
            }
        }

        let validated = validate_payload(scenario, &payload);
        let call = NewToolCall {
            session_id: session.id.clone(),
            triggering_message_id: triggering_message_id.map(ToOwned::to_owned),
            scenario: scenario.to_owned(),
            request_payload: payload,
        };

        match validated {
            Ok(query) => {
                let crm = NewCrmRecord {
                    session_id: session.id.clone(),
                    customer_id: session.customer_id.clone(),
                    scenario: scenario.to_owned(),
                    name: query.name,
                    contact: query.contact,
                    account_id: query.account_id,
                    query: query.query,
                    intent: query.intent,
                    priority: query.priority,
                };
                let (crm_record, tool_call) =
                    self.database.record_completed_tool_call(crm, call).await?;
                AppLogger::log_tool_call(session_id, scenario, tool_call.status);
                Ok(ToolInvocation {
                    tool_call,
                    crm_record: Some(crm_record),
                    violations: Vec::new(),
                })
            }
            Err(violations) => {
                let error = format!("missing or invalid fields: {}", violations.join(", "));
                warn!(fields = %violations.join(","), "Tool payload rejected");
                let tool_call = self.database.record_rejected_tool_call(call, &error).await?;
                AppLogger::log_tool_call(session_id, scenario, tool_call.status);
                Ok(ToolInvocation {
                    tool_call,
                    crm_record: None,
                    violations,
                })
            }
        }
    }
}
