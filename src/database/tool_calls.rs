// ABOUTME: Tool call and CRM record persistence for the conversation store
// ABOUTME: Completed calls commit the CRM record and the tool call in one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;
use voxloom_core::constants::scenarios::CRM_STATUS_PENDING;
use voxloom_core::errors::{AppError, AppResult};
use voxloom_core::models::{CrmRecord, ToolCall, ToolCallStatus};

use super::transactions::{retry_transaction, SqliteTransactionGuard, DEFAULT_MAX_RETRIES};
use super::Database;

/// Validated CRM fields about to be written
#[derive(Debug, Clone)]
pub struct NewCrmRecord {
    /// Owning session
    pub session_id: String,
    /// Customer the record is about
    pub customer_id: String,
    /// Scenario tag
    pub scenario: String,
    /// Customer name
    pub name: String,
    /// Optional phone or email
    pub contact: Option<String>,
    /// Billing account
    pub account_id: String,
    /// Customer query
    pub query: String,
    /// Classified intent
    pub intent: String,
    /// Handling priority
    pub priority: String,
}

/// Tool call audit fields about to be written
#[derive(Debug, Clone)]
pub struct NewToolCall {
    /// Owning session
    pub session_id: String,
    /// Message whose turn triggered the call
    pub triggering_message_id: Option<String>,
    /// Scenario tag
    pub scenario: String,
    /// Payload as received
    pub request_payload: Value,
}

impl Database {
    pub(super) async fn migrate_tool_calls(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS crm_records (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                customer_id TEXT NOT NULL,
                scenario TEXT NOT NULL,
                name TEXT NOT NULL,
                contact TEXT,
                account_id TEXT NOT NULL,
                query TEXT NOT NULL,
                intent TEXT NOT NULL,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS tool_calls (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                triggering_message_id TEXT REFERENCES messages(id),
                scenario TEXT NOT NULL,
                request_payload TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('completed', 'rejected')),
                error TEXT,
                crm_record_id TEXT REFERENCES crm_records(id),
                created_at TEXT NOT NULL,
                CHECK ((status = 'completed') = (crm_record_id IS NOT NULL))
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_crm_records_session ON crm_records(session_id)",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_tool_calls_session ON tool_calls(session_id)",
        )
        .await
    }

    /// Persist a CRM record and the completed tool call that references it
    ///
    /// Both rows commit in one transaction, CRM record first; if either insert fails
    /// neither is visible.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the transaction fails
    pub async fn record_completed_tool_call(
        &self,
        crm: NewCrmRecord,
        call: NewToolCall,
    ) -> AppResult<(CrmRecord, ToolCall)> {
        let created_at = Utc::now();
        let crm_record = CrmRecord {
            id: Uuid::new_v4().to_string(),
            session_id: crm.session_id,
            customer_id: crm.customer_id,
            scenario: crm.scenario,
            name: crm.name,
            contact: crm.contact,
            account_id: crm.account_id,
            query: crm.query,
            intent: crm.intent,
            priority: crm.priority,
            status: CRM_STATUS_PENDING.to_owned(),
            created_at,
        };
        let tool_call = ToolCall {
            id: Uuid::new_v4().to_string(),
            session_id: call.session_id,
            triggering_message_id: call.triggering_message_id,
            scenario: call.scenario,
            request_payload: call.request_payload,
            status: ToolCallStatus::Completed,
            error: None,
            crm_record_id: Some(crm_record.id.clone()),
            // Strictly after the CRM record it references
            created_at: created_at + ChronoDuration::microseconds(1),
        };

        let (crm_ref, call_ref) = (&crm_record, &tool_call);
        retry_transaction(
            move || async move {
                let tx = self.pool.begin().await.map_err(|e| {
                    AppError::store_unavailable(format!("Failed to begin transaction: {e}"))
                })?;
                let mut guard = SqliteTransactionGuard::new(tx);
                insert_crm_record(guard.executor()?, crm_ref).await?;
                insert_tool_call(guard.executor()?, call_ref).await?;
                guard.commit().await
            },
            DEFAULT_MAX_RETRIES,
        )
        .await?;

        Ok((crm_record, tool_call))
    }

    /// Persist a rejected tool call with its validation error and no CRM record
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the insert fails
    pub async fn record_rejected_tool_call(
        &self,
        call: NewToolCall,
        error: &str,
    ) -> AppResult<ToolCall> {
        let tool_call = ToolCall {
            id: Uuid::new_v4().to_string(),
            session_id: call.session_id,
            triggering_message_id: call.triggering_message_id,
            scenario: call.scenario,
            request_payload: call.request_payload,
            status: ToolCallStatus::Rejected,
            error: Some(error.to_owned()),
            crm_record_id: None,
            created_at: Utc::now(),
        };

        let mut conn = self.acquire().await?;
        insert_tool_call(&mut conn, &tool_call).await?;
        Ok(tool_call)
    }

    /// Tool calls of a session in creation order
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails
    pub async fn list_tool_calls(&self, session_id: &str) -> AppResult<Vec<ToolCall>> {
        let mut conn = self.acquire().await?;
        fetch_tool_calls(&mut conn, session_id).await
    }

    /// CRM records of a session in creation order
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails
    pub async fn list_crm_records(&self, session_id: &str) -> AppResult<Vec<CrmRecord>> {
        let mut conn = self.acquire().await?;
        fetch_crm_records(&mut conn, session_id).await
    }
}

async fn insert_crm_record(conn: &mut SqliteConnection, record: &CrmRecord) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO crm_records
            (id, session_id, customer_id, scenario, name, contact, account_id, query,
             intent, priority, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ",
    )
    .bind(&record.id)
    .bind(&record.session_id)
    .bind(&record.customer_id)
    .bind(&record.scenario)
    .bind(&record.name)
    .bind(&record.contact)
    .bind(&record.account_id)
    .bind(&record.query)
    .bind(&record.intent)
    .bind(&record.priority)
    .bind(&record.status)
    .bind(record.created_at)
    .execute(conn)
    .await
    .map_err(|e| AppError::store_unavailable(format!("Failed to create CRM record: {e}")))?;
    Ok(())
}

async fn insert_tool_call(conn: &mut SqliteConnection, call: &ToolCall) -> AppResult<()> {
    let payload = serde_json::to_string(&call.request_payload)?;
    sqlx::query(
        r"
        INSERT INTO tool_calls
            (id, session_id, triggering_message_id, scenario, request_payload, status, error,
             crm_record_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ",
    )
    .bind(&call.id)
    .bind(&call.session_id)
    .bind(&call.triggering_message_id)
    .bind(&call.scenario)
    .bind(payload)
    .bind(call.status.as_str())
    .bind(&call.error)
    .bind(&call.crm_record_id)
    .bind(call.created_at)
    .execute(conn)
    .await
    .map_err(|e| AppError::store_unavailable(format!("Failed to record tool call: {e}")))?;
    Ok(())
}

pub(super) async fn fetch_tool_calls(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> AppResult<Vec<ToolCall>> {
    let rows = sqlx::query(
        r"
        SELECT id, session_id, triggering_message_id, scenario, request_payload, status,
               error, crm_record_id, created_at
        FROM tool_calls WHERE session_id = $1
        ORDER BY rowid ASC
        ",
    )
    .bind(session_id)
    .fetch_all(conn)
    .await
    .map_err(|e| AppError::store_unavailable(format!("Failed to list tool calls: {e}")))?;

    rows.iter().map(row_to_tool_call).collect()
}

pub(super) async fn fetch_crm_records(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> AppResult<Vec<CrmRecord>> {
    let rows = sqlx::query(
        r"
        SELECT id, session_id, customer_id, scenario, name, contact, account_id, query,
               intent, priority, status, created_at
        FROM crm_records WHERE session_id = $1
        ORDER BY rowid ASC
        ",
    )
    .bind(session_id)
    .fetch_all(conn)
    .await
    .map_err(|e| AppError::store_unavailable(format!("Failed to list CRM records: {e}")))?;

    rows.iter().map(row_to_crm_record).collect()
}

fn row_to_tool_call(row: &SqliteRow) -> AppResult<ToolCall> {
    let payload: String = row.try_get("request_payload")?;
    let status: String = row.try_get("status")?;
    Ok(ToolCall {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        triggering_message_id: row.try_get("triggering_message_id")?,
        scenario: row.try_get("scenario")?,
        request_payload: serde_json::from_str(&payload)?,
        status: status.parse()?,
        error: row.try_get("error")?,
        crm_record_id: row.try_get("crm_record_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_crm_record(row: &SqliteRow) -> AppResult<CrmRecord> {
    Ok(CrmRecord {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        customer_id: row.try_get("customer_id")?,
        scenario: row.try_get("scenario")?,
        name: row.try_get("name")?,
        contact: row.try_get("contact")?,
        account_id: row.try_get("account_id")?,
        query: row.try_get("query")?,
        intent: row.try_get("intent")?,
        priority: row.try_get("priority")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}
