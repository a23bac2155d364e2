// ABOUTME: Core types and constants for the VoxLoom turn service
// ABOUTME: Foundation crate with error handling, domain records, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

#![deny(unsafe_code)]

//! # VoxLoom Core
//!
//! Foundation crate providing shared types and constants for the VoxLoom turn
//! service. It changes infrequently, so the server crate recompiles independently.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode`, and the adapter-level `CapabilityError`
//! - **constants**: Model identifiers, scenario schemas, and limits
//! - **models**: Session, Message, `ModelCall`, `ToolCall`, `CrmRecord`

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Conversation records persisted by the store
pub mod models;
