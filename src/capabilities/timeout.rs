// ABOUTME: Deadline wrapper for capability adapter calls
// ABOUTME: Converts an elapsed deadline into CapabilityError::Timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use voxloom_core::errors::CapabilityError;

/// Run a capability call with an upper bound on its duration
///
/// # Errors
///
/// Returns `CapabilityError::Timeout` if `limit` elapses first, or the call's own error
pub async fn with_capability_timeout<F, T>(limit: Duration, operation: F) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    timeout(limit, operation)
        .await
        .map_or_else(|_| Err(CapabilityError::Timeout(limit)), |result| result)
}
