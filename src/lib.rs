// ABOUTME: Main library entry point for the VoxLoom message turn service
// ABOUTME: Turn orchestration, audit persistence, capability adapters, and the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # VoxLoom Turn Service
//!
//! Backend for voice and text customer-support conversations. Each inbound message
//! runs through one turn: optional transcription, reply generation, speech
//! synthesis, and automatic CRM capture for billing and refund requests. Every
//! capability invocation leaves a durable model call record, so a conversation can
//! be reconstructed and audited exactly as it happened.
//!
//! ## Architecture
//!
//! - **Services**: the turn orchestrator, model call logger, and tool invoker
//! - **Capabilities**: transcriber, reply generator, and synthesizer traits with
//!   default offline implementations
//! - **Database**: the `SQLite` conversation store with per-session sequencing
//! - **Content store**: content-addressed audio blobs
//! - **Routes**: the authenticated `/api/v1` HTTP surface
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voxloom_server::config::ServerConfig;
//! use voxloom_server::database::Database;
//! use voxloom_server::resources::ServerResources;
//! use voxloom_server::routes::build_router;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Arc::new(ServerConfig::from_env()?);
//! let database = Database::new(&config.database).await?;
//! database.migrate().await?;
//! let resources = Arc::new(ServerResources::from_config(database, config).await?);
//! let app = build_router(resources);
//! # drop(app);
//! # Ok(())
//! # }
//! ```

/// Shared-secret bearer authentication
pub mod auth;

/// Capability adapter traits and default implementations
pub mod capabilities;

/// Configuration management
pub mod config;

/// Content-addressed audio storage
pub mod content_store;

/// Conversation store on `SQLite`
pub mod database;

/// Billing and refund intent classification
pub mod intent;

/// Structured logging setup and domain log events
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Shared server resources
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Domain services
pub mod services;

pub use voxloom_core::{constants, errors, models};
