// ABOUTME: HTTP middleware for request tracing, bearer authentication, and CORS
// ABOUTME: Layers applied by the router around every API handler
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

/// Shared-secret bearer authentication
pub mod auth;
/// CORS configuration
pub mod cors;
/// Request IDs and request spans
pub mod tracing;

pub use auth::require_api_key;
pub use cors::setup_cors;
pub use self::tracing::{make_request_span, request_id_header, MakeRequestUuidV4};
