// ABOUTME: Message record with direction, modality, and per-session sequence number
// ABOUTME: Audio content is referenced by content-store key, never stored inline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Who produced the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the customer
    Inbound,
    /// Produced by the service
    Outbound,
}

impl Direction {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            other => Err(AppError::serialization(format!(
                "Invalid message direction: {other}"
            ))),
        }
    }
}

/// Form of the raw message content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Plain text
    Text,
    /// Audio blob in the content store
    Audio,
}

impl Modality {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "audio" => Ok(Self::Audio),
            other => Err(AppError::serialization(format!(
                "Invalid message modality: {other}"
            ))),
        }
    }
}

/// One message within a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Position within the session, starting at 1 with no gaps
    pub seq: i64,
    /// Inbound or outbound
    pub direction: Direction,
    /// Text or audio
    pub modality: Modality,
    /// Raw text content for text messages
    pub text: Option<String>,
    /// Content-store reference for audio messages (inbound audio or synthesized reply)
    pub content_ref: Option<String>,
    /// MIME type of the referenced audio
    pub mime: Option<String>,
    /// Transcript (inbound) or reply text (outbound)
    pub derived_text: Option<String>,
    /// When the message was persisted
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Text that represents this message in a conversation context
    #[must_use]
    pub fn context_text(&self) -> Option<&str> {
        self.derived_text.as_deref().or(self.text.as_deref())
    }
}
