// ABOUTME: Transaction management with RAII guards and retry patterns for store writes
// ABOUTME: Provides automatic rollback on drop and exponential backoff on SQLite lock contention
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! Transaction management with RAII guards and retry patterns
//!
//! - `TransactionGuard`: wraps a `SQLx` transaction and rolls it back unless committed
//! - `retry_transaction`: re-runs a whole transaction when `SQLite` reports lock contention
//!
//! ```text
//! retry_transaction(|| async {
//!     let mut guard = TransactionGuard::new(pool.begin().await?);
//!     sqlx::query("INSERT INTO crm_records ...").execute(guard.executor()?).await?;
//!     sqlx::query("INSERT INTO tool_calls ...").execute(guard.executor()?).await?;
//!     guard.commit().await
//! }, 3).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use sqlx::{Database, Transaction};
use tokio::time::sleep;
use tracing::{debug, error, warn};
use voxloom_core::errors::{AppError, AppResult, ErrorCode};

/// Default number of attempts for store transactions
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retry a transaction operation if it fails due to lock contention or timeout
///
/// Backoff doubles from 20ms per attempt. Non-retryable errors (constraint
/// violations, validation failures, missing rows) are returned immediately.
///
/// # Errors
///
/// Returns the last error once `max_retries` attempts have failed, or the first
/// non-retryable error
pub async fn retry_transaction<F, Fut, T>(mut f: F, max_retries: u32) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if attempts >= max_retries {
                    error!(
                        attempts = attempts,
                        max_retries = max_retries,
                        error = %e,
                        "Transaction failed after max retries"
                    );
                    return Err(e);
                }

                if !is_retryable_error(&e) {
                    return Err(e);
                }

                let backoff_ms = 10 * (1_u64 << attempts);
                warn!(
                    attempt = attempts,
                    max_retries = max_retries,
                    backoff_ms = backoff_ms,
                    error = %e,
                    "Transaction failed with retryable error, retrying after backoff"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}

/// Whether an error is transient store contention worth retrying
fn is_retryable_error(error: &AppError) -> bool {
    if error.code != ErrorCode::StoreUnavailable {
        return false;
    }

    let message = error.message.to_lowercase();
    if message.contains("constraint") || message.contains("pool closed") {
        return false;
    }

    message.contains("database is locked")
        || message.contains("locked")
        || message.contains("busy")
        || message.contains("timed out")
        || message.contains("timeout")
}

/// RAII guard for database transactions ensuring automatic rollback on drop
///
/// If the guard is dropped before `commit()` (an early `?` return or a cancelled
/// future), `SQLx` rolls the transaction back.
pub struct TransactionGuard<'c, DB: Database> {
    transaction: Option<Transaction<'c, DB>>,
    committed: bool,
}

impl<'c, DB: Database> TransactionGuard<'c, DB> {
    /// Create a new transaction guard from an existing `SQLx` transaction
    #[must_use]
    pub fn new(transaction: Transaction<'c, DB>) -> Self {
        debug!("TransactionGuard created - transaction will auto-rollback if not committed");
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction was already consumed or the commit fails
    pub async fn commit(mut self) -> AppResult<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed - cannot commit"))?;
        tx.commit()
            .await
            .map_err(|e| AppError::store_unavailable(format!("Transaction commit failed: {e}")))?;
        self.committed = true;
        debug!("TransactionGuard committed successfully");
        Ok(())
    }

    /// Explicitly rollback the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction was already consumed or the rollback fails
    pub async fn rollback(mut self) -> AppResult<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed - cannot rollback"))?;
        tx.rollback().await.map_err(|e| {
            AppError::store_unavailable(format!("Transaction rollback failed: {e}"))
        })?;
        debug!("TransactionGuard rolled back explicitly");
        Ok(())
    }

    /// Mutable access to the connection for executing queries
    ///
    /// # Errors
    ///
    /// Returns an error if the guard is used after commit or rollback
    pub fn executor(&mut self) -> AppResult<&mut <DB as Database>::Connection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::internal("Transaction already consumed - guard used after commit/rollback")
        })
    }
}

impl<DB: Database> Drop for TransactionGuard<'_, DB> {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            warn!(
                "TransactionGuard dropped without commit - transaction will be rolled back automatically"
            );
        }
    }
}

/// Type alias for `SQLite` transaction guard
pub type SqliteTransactionGuard<'c> = TransactionGuard<'c, sqlx::Sqlite>;
