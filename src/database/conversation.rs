// ABOUTME: Consistent conversation snapshot reads
// ABOUTME: Reads the session and all of its records inside a single transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use tracing::instrument;
use voxloom_core::errors::{AppError, AppResult};
use voxloom_core::models::ConversationSnapshot;

use super::messages::fetch_messages;
use super::model_calls::fetch_session_model_calls;
use super::sessions::fetch_session;
use super::tool_calls::{fetch_crm_records, fetch_tool_calls};
use super::transactions::SqliteTransactionGuard;
use super::Database;

impl Database {
    /// Reconstruct a conversation from one consistent snapshot
    ///
    /// All reads share one transaction, so a turn committing concurrently is either
    /// fully absent from or fully present in each table read after its commit.
    /// Messages are in sequence order, model calls grouped by message in that order,
    /// tool calls and CRM records in creation order.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown sessions, `StoreUnavailable` otherwise
    #[instrument(skip(self), fields(session.id = %session_id))]
    pub async fn get_conversation(&self, session_id: &str) -> AppResult<ConversationSnapshot> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::store_unavailable(format!("Failed to begin snapshot: {e}"))
        })?;
        let mut guard = SqliteTransactionGuard::new(tx);

        let Some(session) = fetch_session(guard.executor()?, session_id).await? else {
            guard.rollback().await?;
            return Err(AppError::session_not_found(session_id));
        };
        let messages = fetch_messages(guard.executor()?, session_id).await?;
        let model_calls = fetch_session_model_calls(guard.executor()?, session_id).await?;
        let tool_calls = fetch_tool_calls(guard.executor()?, session_id).await?;
        let crm_records = fetch_crm_records(guard.executor()?, session_id).await?;
        guard.commit().await?;

        Ok(ConversationSnapshot {
            session,
            messages,
            model_calls,
            tool_calls,
            crm_records,
        })
    }
}
