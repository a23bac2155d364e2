// ABOUTME: Message persistence with gap-free per-session sequence numbers
// ABOUTME: Appends are serialized per session; derived text is write-once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;
use uuid::Uuid;
use voxloom_core::errors::{AppError, AppResult};
use voxloom_core::models::{Direction, Message, Modality};

use super::transactions::{retry_transaction, DEFAULT_MAX_RETRIES};
use super::Database;

const MESSAGE_COLUMNS: &str =
    "id, session_id, seq, direction, modality, text, content_ref, mime, derived_text, created_at";

/// Fields of a message about to be appended; id, sequence and timestamp are assigned
#[derive(Debug, Clone, Copy)]
pub struct NewMessage<'a> {
    /// Owning session
    pub session_id: &'a str,
    /// Inbound or outbound
    pub direction: Direction,
    /// Text or audio
    pub modality: Modality,
    /// Raw text for text messages
    pub text: Option<&'a str>,
    /// Content-store reference for audio
    pub content_ref: Option<&'a str>,
    /// MIME type of the referenced audio
    pub mime: Option<&'a str>,
    /// Transcript or reply text, if already known
    pub derived_text: Option<&'a str>,
}

impl Database {
    pub(super) async fn migrate_messages(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                seq INTEGER NOT NULL CHECK (seq > 0),
                direction TEXT NOT NULL CHECK (direction IN ('inbound', 'outbound')),
                modality TEXT NOT NULL CHECK (modality IN ('text', 'audio')),
                text TEXT,
                content_ref TEXT,
                mime TEXT,
                derived_text TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (session_id, seq)
            )
            ",
        )
        .await
    }

    /// Append a message to its session with the next sequence number
    ///
    /// Appends to one session are serialized by a per-session lock, and the
    /// sequence number is computed inside the insert itself, so concurrent appends
    /// produce 1, 2, 3, ... with no gaps or duplicates. Appends to different
    /// sessions do not contend on the lock.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the insert fails
    pub async fn append_message(&self, new: NewMessage<'_>) -> AppResult<Message> {
        let _session_guard = self.lock_session(new.session_id).await;
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let id_ref = id.as_str();
        let seq: i64 = retry_transaction(
            move || async move {
                let row = sqlx::query(
                    r"
                    INSERT INTO messages
                        (id, session_id, seq, direction, modality, text, content_ref, mime,
                         derived_text, created_at)
                    SELECT $1, $2, COALESCE(MAX(seq), 0) + 1, $3, $4, $5, $6, $7, $8, $9
                    FROM messages WHERE session_id = $2
                    RETURNING seq
                    ",
                )
                .bind(id_ref)
                .bind(new.session_id)
                .bind(new.direction.as_str())
                .bind(new.modality.as_str())
                .bind(new.text)
                .bind(new.content_ref)
                .bind(new.mime)
                .bind(new.derived_text)
                .bind(created_at)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::store_unavailable(format!("Failed to append message: {e}"))
                })?;
                Ok(row.try_get("seq")?)
            },
            DEFAULT_MAX_RETRIES,
        )
        .await?;

        debug!(
            session.id = %new.session_id,
            message.id = %id,
            message.seq = seq,
            message.direction = %new.direction,
            "Message appended"
        );

        Ok(Message {
            id,
            session_id: new.session_id.to_owned(),
            seq,
            direction: new.direction,
            modality: new.modality,
            text: new.text.map(ToOwned::to_owned),
            content_ref: new.content_ref.map(ToOwned::to_owned),
            mime: new.mime.map(ToOwned::to_owned),
            derived_text: new.derived_text.map(ToOwned::to_owned),
            created_at,
        })
    }

    /// Fill in the derived text of a message that does not have one yet
    ///
    /// Returns `false` when the message already had derived text; the stored value
    /// is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the update fails
    pub async fn set_derived_text(&self, message_id: &str, derived_text: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE messages SET derived_text = $1 WHERE id = $2 AND derived_text IS NULL",
        )
        .bind(derived_text)
        .bind(message_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::store_unavailable(format!("Failed to set derived text: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Look up a message by ID
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails
    pub async fn get_message(&self, message_id: &str) -> AppResult<Option<Message>> {
        let row = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::store_unavailable(format!("Failed to get message: {e}")))?;

        row.as_ref().map(row_to_message).transpose()
    }

    /// All messages of a session in sequence order
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails
    pub async fn list_messages(&self, session_id: &str) -> AppResult<Vec<Message>> {
        let mut conn = self.acquire().await?;
        fetch_messages(&mut conn, session_id).await
    }
}

pub(super) async fn fetch_messages(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> AppResult<Vec<Message>> {
    let rows = sqlx::query(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = $1 ORDER BY seq ASC"
    ))
    .bind(session_id)
    .fetch_all(conn)
    .await
    .map_err(|e| AppError::store_unavailable(format!("Failed to list messages: {e}")))?;

    rows.iter().map(row_to_message).collect()
}

fn row_to_message(row: &SqliteRow) -> AppResult<Message> {
    let direction: String = row.try_get("direction")?;
    let modality: String = row.try_get("modality")?;
    Ok(Message {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        seq: row.try_get("seq")?,
        direction: direction.parse()?,
        modality: modality.parse()?,
        text: row.try_get("text")?,
        content_ref: row.try_get("content_ref")?,
        mime: row.try_get("mime")?,
        derived_text: row.try_get("derived_text")?,
        created_at: row.try_get("created_at")?,
    })
}
