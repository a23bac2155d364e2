// ABOUTME: Conversation store backed by SQLite via sqlx
// ABOUTME: Owns the pool, schema migrations, and per-session write serialization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! # Conversation Store
//!
//! Durable repository of sessions, messages, model calls, tool calls and CRM
//! records. Operations are split across submodules, each adding methods to
//! [`Database`]:
//!
//! - `sessions`: session creation and lookup
//! - `messages`: gap-free per-session message append
//! - `model_calls`: model call audit records
//! - `tool_calls`: CRM record + tool call writes
//! - `conversation`: consistent snapshot reads

mod conversation;
mod messages;
mod model_calls;
mod sessions;
mod tool_calls;

/// Transaction guard and retry helpers
pub mod transactions;

pub use messages::NewMessage;
pub use model_calls::NewModelCall;
pub use tool_calls::{NewCrmRecord, NewToolCall};

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};
use voxloom_core::errors::{AppError, AppResult};

use crate::config::{DatabaseConfig, DatabaseUrl};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Conversation store handle; cheap to clone
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    session_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Database {
    /// Connect to the configured database and run migrations when enabled
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the database cannot be opened or migrated
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = match &config.url {
            DatabaseUrl::Memory => Self::memory_pool().await?,
            DatabaseUrl::SQLite { path } => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).await.map_err(|e| {
                        AppError::store_unavailable(format!(
                            "Failed to create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
                let options = SqliteConnectOptions::from_str(&config.url.to_connection_string())
                    .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
                    .create_if_missing(true)
                    .foreign_keys(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(BUSY_TIMEOUT);
                SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        AppError::store_unavailable(format!("Failed to open database: {e}"))
                    })?
            }
        };

        let db = Self::from_pool(pool);
        if config.auto_migrate {
            db.migrate().await?;
        }
        info!(database = %config.url.to_connection_string(), "Conversation store ready");
        Ok(db)
    }

    /// Open a fresh, migrated in-memory store
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the pool cannot be created
    pub async fn new_in_memory() -> AppResult<Self> {
        let db = Self::from_pool(Self::memory_pool().await?);
        db.migrate().await?;
        Ok(db)
    }

    /// Wrap an existing pool (migrations are not run)
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            session_locks: Arc::new(DashMap::new()),
        }
    }

    // Every in-memory connection is its own database, so the pool is pinned to one
    // connection that never expires.
    async fn memory_pool() -> AppResult<SqlitePool> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .foreign_keys(true);
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::store_unavailable(format!("Failed to open database: {e}")))
    }

    pub(crate) async fn acquire(&self) -> AppResult<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(|e| {
            AppError::store_unavailable(format!("Failed to acquire connection: {e}"))
        })
    }

    /// Close the pool; subsequent operations fail with `StoreUnavailable`
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Check that the store answers queries
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the probe query fails
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::store_unavailable(format!("Health check failed: {e}")))?;
        Ok(())
    }

    /// Acquire the write lock that serializes sequence assignment for one session
    ///
    /// The lock entry is dropped from the map once its last holder or waiter releases it.
    pub(crate) async fn lock_session(&self, session_id: &str) -> SessionWriteGuard {
        let lock = self
            .session_locks
            .entry(session_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        SessionWriteGuard {
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(&self.session_locks),
            session_id: session_id.to_owned(),
        }
    }

    /// Create all tables and indexes; idempotent
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if any statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_sessions().await?;
        self.migrate_messages().await?;
        self.migrate_model_calls().await?;
        self.migrate_tool_calls().await?;
        debug!("Conversation store schema up to date");
        Ok(())
    }

    async fn execute_ddl(&self, statement: &str) -> AppResult<()> {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::store_unavailable(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

/// Held while a session's next sequence number is assigned
pub(crate) struct SessionWriteGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    session_id: String,
}

impl Drop for SessionWriteGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone, so a count of one means only the map refers to it
        self.locks
            .remove_if(&self.session_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Truncate to at most `max_chars` characters on a char boundary
#[must_use]
pub fn truncate_summary(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => value[..end].to_owned(),
        None => value.to_owned(),
    }
}
