// ABOUTME: Writes audited model call records for every capability invocation
// ABOUTME: Truncates summaries and treats a failed audit write as an infrastructure error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::time::Duration;

use voxloom_core::constants::limits::SUMMARY_MAX_CHARS;
use voxloom_core::errors::AppResult;
use voxloom_core::models::{ModelCall, ModelCallKind, ModelCallStatus};

use crate::database::{truncate_summary, Database, NewModelCall};
use crate::logging::AppLogger;

/// One capability invocation to audit
#[derive(Debug, Clone, Copy)]
pub struct CallRecord<'a> {
    /// Message that triggered the call
    pub message_id: &'a str,
    /// Capability kind
    pub kind: ModelCallKind,
    /// Model that ran (or would have run)
    pub model_id: &'a str,
    /// Input handed to the capability
    pub input: Option<&'a str>,
    /// Output returned by the capability
    pub output: Option<&'a str>,
    /// Outcome of the call
    pub status: ModelCallStatus,
    /// Reason code for failures and skips
    pub status_code: Option<&'a str>,
    /// Wall-clock time spent in the capability
    pub latency: Duration,
}

/// Records model calls against the conversation store
#[derive(Clone)]
pub struct ModelCallLogger {
    database: Database,
}

impl ModelCallLogger {
    /// Create a logger writing to `database`
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Persist one model call
    ///
    /// The status of the modeled call is stored as-is; this only fails when the
    /// audit write itself fails.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the record cannot be written
    pub async fn log_call(&self, record: CallRecord<'_>) -> AppResult<ModelCall> {
        let latency_ms = i64::try_from(record.latency.as_millis()).unwrap_or(i64::MAX);

        let call = self
            .database
            .insert_model_call(NewModelCall {
                message_id: record.message_id.to_owned(),
                kind: record.kind,
                model_id: record.model_id.to_owned(),
                input_summary: record
                    .input
                    .map(|input| truncate_summary(input, SUMMARY_MAX_CHARS)),
                output_summary: record
                    .output
                    .map(|output| truncate_summary(output, SUMMARY_MAX_CHARS)),
                status: record.status,
                status_code: record.status_code.map(ToOwned::to_owned),
                latency_ms,
            })
            .await?;

        AppLogger::log_model_call(
            &call.message_id,
            call.kind,
            &call.model_id,
            call.status,
            call.latency_ms,
        );
        Ok(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::NewMessage;
    use voxloom_core::errors::ErrorCode;
    use voxloom_core::models::{Direction, Modality};

    #[tokio::test]
    async fn test_summaries_are_truncated() {
        let db = Database::new_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let session = db.create_session("cust_1", "en", "web", None).await.unwrap();
        let message = db
            .append_message(NewMessage {
                session_id: &session.id,
                direction: Direction::Inbound,
                modality: Modality::Text,
                text: Some("hi"),
                content_ref: None,
                mime: None,
                derived_text: Some("hi"),
            })
            .await
            .unwrap();

        let long_output = "x".repeat(500);
        let call = ModelCallLogger::new(db.clone())
            .log_call(CallRecord {
                message_id: &message.id,
                kind: ModelCallKind::Llm,
                model_id: "test-llm",
                input: Some("hi"),
                output: Some(&long_output),
                status: ModelCallStatus::Success,
                status_code: None,
                latency: Duration::from_millis(12),
            })
            .await
            .unwrap();

        assert_eq!(call.output_summary.as_deref().map(str::len), Some(200));
        assert_eq!(call.latency_ms, 12);
    }

    #[tokio::test]
    async fn test_unknown_message_is_store_failure() {
        let db = Database::new_in_memory().await.unwrap();
        db.migrate().await.unwrap();

        let error = ModelCallLogger::new(db)
            .log_call(CallRecord {
                message_id: "missing",
                kind: ModelCallKind::Asr,
                model_id: "test-asr",
                input: None,
                output: None,
                status: ModelCallStatus::Failure,
                status_code: Some("timeout"),
                latency: Duration::ZERO,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::StoreUnavailable);
    }
}
