// ABOUTME: Domain service layer for turn orchestration, audit logging, and tool invocation
// ABOUTME: Protocol-agnostic business logic shared by HTTP handlers and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! Domain service layer
//!
//! Route handlers stay thin: they decode the wire format, call one of these services,
//! and encode the result. All ordering, auditing, and validation rules live here.

/// Model call audit records
pub mod model_call_logger;

/// Scenario schemas and CRM payload construction
pub mod scenario;

/// Tool/CRM invocation with schema validation
pub mod tool_invoker;

/// End-to-end message turn pipeline
pub mod turn_orchestration;

pub use model_call_logger::{CallRecord, ModelCallLogger};
pub use tool_invoker::{ToolInvocation, ToolInvoker};
pub use turn_orchestration::{
    Degradation, InboundPayload, MessageTurnOrchestrator, TurnCapabilities, TurnResult,
};
