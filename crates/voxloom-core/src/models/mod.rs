// ABOUTME: Domain records persisted by the conversation store
// ABOUTME: Re-exports Session, Message, ModelCall, ToolCall, CrmRecord and the conversation snapshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! # Data Models
//!
//! Records that make up a conversation. A [`Session`] owns an ordered list of
//! [`Message`]s; every model invocation made while handling a message is audited as a
//! [`ModelCall`]; structured side effects are audited as [`ToolCall`]s and may produce a
//! [`CrmRecord`].
//!
//! All records are immutable once persisted. The only exception is the write-once
//! `derived_text` of an inbound audio message, filled after transcription.

mod conversation;
mod message;
mod model_call;
mod session;
mod tool_call;

pub use conversation::ConversationSnapshot;
pub use message::{Direction, Message, Modality};
pub use model_call::{ModelCall, ModelCallKind, ModelCallStatus};
pub use session::Session;
pub use tool_call::{CrmRecord, ToolCall, ToolCallStatus};
