// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Liveness, store readiness, and the service banner; none require authentication
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! Health check routes
//!
//! `/health` answers as long as the process runs, `/ready` additionally checks that
//! the conversation store answers queries.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use voxloom_core::constants::service::SERVICE_NAME;
use voxloom_core::errors::AppResult;

use crate::resources::ServerResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/", get(Self::banner))
            .route("/health", get(Self::health))
            .route("/ready", get(Self::ready))
            .with_state(resources)
    }

    async fn banner() -> Json<Value> {
        Json(json!({ "ok": true, "service": SERVICE_NAME }))
    }

    async fn health() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }

    async fn ready(State(resources): State<Arc<ServerResources>>) -> AppResult<Json<Value>> {
        resources.database.health_check().await?;
        Ok(Json(json!({
            "status": "ready",
            "timestamp": Utc::now().to_rfc3339(),
        })))
    }
}
