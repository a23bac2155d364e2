// ABOUTME: Session record created once per customer conversation
// ABOUTME: Immutable after creation; last activity is derived from its messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation between one customer and the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier
    pub id: String,
    /// Customer the session belongs to
    pub customer_id: String,
    /// Conversation language (e.g. `en`)
    pub language: String,
    /// Channel the customer reached us on (e.g. `web`, `phone`)
    pub channel: String,
    /// Optional persona the replies should adopt
    pub persona: Option<String>,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}
