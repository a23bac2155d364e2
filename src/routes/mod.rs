// ABOUTME: Route module organization for the VoxLoom HTTP API
// ABOUTME: Assembles domain routers, bearer authentication, and the tower-http layer stack
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! HTTP routes
//!
//! Each domain module contains only route definitions and thin handlers that
//! delegate to the service layer. Everything under `/api/v1` sits behind the
//! shared-secret bearer check; health endpoints do not.

/// Health check and service banner routes
pub mod health;
/// Stored audio retrieval
pub mod media;
/// Message turn submission
pub mod messages;
/// Session creation and conversation reads
pub mod sessions;
/// Tool/CRM invocation
pub mod tools;

pub use health::HealthRoutes;
pub use media::MediaRoutes;
pub use messages::MessageRoutes;
pub use sessions::SessionRoutes;
pub use tools::ToolRoutes;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use voxloom_core::errors::AppError;

use crate::middleware::{
    make_request_span, request_id_header, require_api_key, setup_cors, MakeRequestUuidV4,
};
use crate::resources::ServerResources;

/// Room for JSON framing around base64 audio
const JSON_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(SessionRoutes::routes(Arc::clone(&resources)))
        .merge(MessageRoutes::routes(Arc::clone(&resources)))
        .merge(ToolRoutes::routes(Arc::clone(&resources)))
        .merge(MediaRoutes::routes(Arc::clone(&resources)))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&resources),
            require_api_key,
        ));

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(api)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(request_body_limit(
            resources.config.media.max_audio_bytes,
        )))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                .layer(PropagateRequestIdLayer::new(request_id_header()))
                .layer(setup_cors(&resources.config)),
        )
}

/// Largest request body accepted: base64-encoded audio plus JSON framing
#[must_use]
pub const fn request_body_limit(max_audio_bytes: usize) -> usize {
    max_audio_bytes.saturating_mul(4) / 3 + JSON_OVERHEAD_BYTES
}

/// Report malformed JSON bodies as `InvalidPayload`
pub(crate) fn invalid_json(rejection: JsonRejection) -> AppError {
    AppError::invalid_payload(rejection.body_text())
}
