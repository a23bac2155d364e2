// ABOUTME: Consistent snapshot of everything recorded for one session
// ABOUTME: Returned by the conversation store, read inside a single transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CrmRecord, Message, ModelCall, Session, ToolCall};

/// Full conversation reconstruction for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    /// The session itself
    pub session: Session,
    /// Messages in ascending sequence order
    pub messages: Vec<Message>,
    /// Model calls grouped by owning message in message order, then creation order
    pub model_calls: Vec<ModelCall>,
    /// Tool calls in creation order
    pub tool_calls: Vec<ToolCall>,
    /// CRM records in creation order
    pub crm_records: Vec<CrmRecord>,
}

impl ConversationSnapshot {
    /// Timestamp of the latest message, or session creation when there are none
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.messages
            .last()
            .map_or(self.session.created_at, |message| message.created_at)
    }

    /// Model calls attached to one message
    pub fn model_calls_for<'a>(&'a self, message_id: &'a str) -> impl Iterator<Item = &'a ModelCall> {
        self.model_calls
            .iter()
            .filter(move |call| call.message_id == message_id)
    }
}
