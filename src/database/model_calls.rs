// ABOUTME: Model call audit persistence for the conversation store
// ABOUTME: Append-only records, each referencing the message that triggered it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;
use voxloom_core::errors::{AppError, AppResult};
use voxloom_core::models::{ModelCall, ModelCallKind, ModelCallStatus};

use super::Database;

/// Fields of a model call about to be recorded
#[derive(Debug, Clone)]
pub struct NewModelCall {
    /// Message that triggered the call
    pub message_id: String,
    /// Capability kind
    pub kind: ModelCallKind,
    /// Identifier of the model that ran
    pub model_id: String,
    /// Truncated input summary
    pub input_summary: Option<String>,
    /// Truncated output summary
    pub output_summary: Option<String>,
    /// Outcome
    pub status: ModelCallStatus,
    /// Reason code for failures and skips
    pub status_code: Option<String>,
    /// Latency in milliseconds
    pub latency_ms: i64,
}

impl Database {
    pub(super) async fn migrate_model_calls(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS model_calls (
                id TEXT PRIMARY KEY,
                message_id TEXT NOT NULL REFERENCES messages(id),
                kind TEXT NOT NULL CHECK (kind IN ('ASR', 'LLM', 'TTS')),
                model_id TEXT NOT NULL,
                input_summary TEXT,
                output_summary TEXT,
                status TEXT NOT NULL CHECK (status IN ('success', 'failure', 'skipped')),
                status_code TEXT,
                latency_ms INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_model_calls_message ON model_calls(message_id)",
        )
        .await
    }

    /// Persist one model call record
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the insert fails, including when the referenced
    /// message does not exist
    pub async fn insert_model_call(&self, new: NewModelCall) -> AppResult<ModelCall> {
        let call = ModelCall {
            id: Uuid::new_v4().to_string(),
            message_id: new.message_id,
            kind: new.kind,
            model_id: new.model_id,
            input_summary: new.input_summary,
            output_summary: new.output_summary,
            status: new.status,
            status_code: new.status_code,
            latency_ms: new.latency_ms,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO model_calls
                (id, message_id, kind, model_id, input_summary, output_summary, status,
                 status_code, latency_ms, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(&call.id)
        .bind(&call.message_id)
        .bind(call.kind.as_str())
        .bind(&call.model_id)
        .bind(&call.input_summary)
        .bind(&call.output_summary)
        .bind(call.status.as_str())
        .bind(&call.status_code)
        .bind(call.latency_ms)
        .bind(call.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::store_unavailable(format!("Failed to record model call: {e}")))?;

        Ok(call)
    }

    /// Model calls attached to one message, in recording order
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails
    pub async fn list_model_calls_for_message(&self, message_id: &str) -> AppResult<Vec<ModelCall>> {
        let rows = sqlx::query(
            r"
            SELECT id, message_id, kind, model_id, input_summary, output_summary, status,
                   status_code, latency_ms, created_at
            FROM model_calls WHERE message_id = $1
            ORDER BY rowid ASC
            ",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::store_unavailable(format!("Failed to list model calls: {e}")))?;

        rows.iter().map(row_to_model_call).collect()
    }
}

/// Model calls of a session grouped by owning message in sequence order
pub(super) async fn fetch_session_model_calls(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> AppResult<Vec<ModelCall>> {
    let rows = sqlx::query(
        r"
        SELECT mc.id, mc.message_id, mc.kind, mc.model_id, mc.input_summary,
               mc.output_summary, mc.status, mc.status_code, mc.latency_ms, mc.created_at
        FROM model_calls mc
        JOIN messages m ON m.id = mc.message_id
        WHERE m.session_id = $1
        ORDER BY m.seq ASC, mc.rowid ASC
        ",
    )
    .bind(session_id)
    .fetch_all(conn)
    .await
    .map_err(|e| AppError::store_unavailable(format!("Failed to list model calls: {e}")))?;

    rows.iter().map(row_to_model_call).collect()
}

fn row_to_model_call(row: &SqliteRow) -> AppResult<ModelCall> {
    let kind: String = row.try_get("kind")?;
    let status: String = row.try_get("status")?;
    Ok(ModelCall {
        id: row.try_get("id")?,
        message_id: row.try_get("message_id")?,
        kind: kind.parse()?,
        model_id: row.try_get("model_id")?,
        input_summary: row.try_get("input_summary")?,
        output_summary: row.try_get("output_summary")?,
        status: status.parse()?,
        status_code: row.try_get("status_code")?,
        latency_ms: row.try_get("latency_ms")?,
        created_at: row.try_get("created_at")?,
    })
}
