// ABOUTME: Tool invocation audit record and the CRM record it may create
// ABOUTME: A completed tool call always references a CRM record persisted in the same transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Result of a tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    /// Payload was valid and the side effect committed
    Completed,
    /// Payload failed validation; nothing but the audit record was written
    Rejected,
}

impl ToolCallStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolCallStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            other => Err(AppError::serialization(format!(
                "Invalid tool call status: {other}"
            ))),
        }
    }
}

/// Audit record of a structured side-effecting action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique tool call ID
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Message whose turn triggered the call
    pub triggering_message_id: Option<String>,
    /// Scenario tag (e.g. `billing_query`)
    pub scenario: String,
    /// Request payload as received
    pub request_payload: Value,
    /// Completed or rejected
    pub status: ToolCallStatus,
    /// Validation error for rejected calls
    pub error: Option<String>,
    /// CRM record created by a completed call
    pub crm_record_id: Option<String>,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}

/// Customer-relationship record captured by a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmRecord {
    /// Unique CRM record ID
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Customer the record is about
    pub customer_id: String,
    /// Scenario that produced the record
    pub scenario: String,
    /// Customer name
    pub name: String,
    /// Optional phone number or email
    pub contact: Option<String>,
    /// Billing account
    pub account_id: String,
    /// Customer query in their own words
    pub query: String,
    /// Classified intent
    pub intent: String,
    /// Handling priority
    pub priority: String,
    /// Workflow status (starts as `pending`)
    pub status: String,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}
