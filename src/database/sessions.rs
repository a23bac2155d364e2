// ABOUTME: Session persistence for the conversation store
// ABOUTME: Sessions are created once and never updated or deleted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;
use voxloom_core::errors::{AppError, AppResult};
use voxloom_core::models::Session;

use super::Database;

impl Database {
    pub(super) async fn migrate_sessions(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                language TEXT NOT NULL,
                channel TEXT NOT NULL,
                persona TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_sessions_customer ON sessions(customer_id)",
        )
        .await
    }

    /// Create a new session
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the insert fails
    pub async fn create_session(
        &self,
        customer_id: &str,
        language: &str,
        channel: &str,
        persona: Option<&str>,
    ) -> AppResult<Session> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_owned(),
            language: language.to_owned(),
            channel: channel.to_owned(),
            persona: persona.map(ToOwned::to_owned),
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO sessions (id, customer_id, language, channel, persona, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&session.id)
        .bind(&session.customer_id)
        .bind(&session.language)
        .bind(&session.channel)
        .bind(&session.persona)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::store_unavailable(format!("Failed to create session: {e}")))?;

        Ok(session)
    }

    /// Look up a session by ID
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails
    pub async fn get_session(&self, session_id: &str) -> AppResult<Option<Session>> {
        let mut conn = self.acquire().await?;
        fetch_session(&mut conn, session_id).await
    }

    /// Look up a session, failing with `SessionNotFound` when absent
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` or `StoreUnavailable`
    pub async fn require_session(&self, session_id: &str) -> AppResult<Session> {
        self.get_session(session_id)
            .await?
            .ok_or_else(|| AppError::session_not_found(session_id))
    }
}

/// Fetch a session on an existing connection (used inside snapshot transactions)
pub(super) async fn fetch_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> AppResult<Option<Session>> {
    let row = sqlx::query(
        r"
        SELECT id, customer_id, language, channel, persona, created_at
        FROM sessions WHERE id = $1
        ",
    )
    .bind(session_id)
    .fetch_optional(conn)
    .await
    .map_err(|e| AppError::store_unavailable(format!("Failed to get session: {e}")))?;

    row.as_ref().map(row_to_session).transpose()
}

fn row_to_session(row: &SqliteRow) -> AppResult<Session> {
    Ok(Session {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        language: row.try_get("language")?,
        channel: row.try_get("channel")?,
        persona: row.try_get("persona")?,
        created_at: row.try_get("created_at")?,
    })
}
