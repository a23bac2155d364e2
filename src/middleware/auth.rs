// ABOUTME: Bearer authentication middleware for the /api/v1 surface
// ABOUTME: Rejects requests before any handler runs: 401 when missing, 403 when wrong
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::authenticate;
use crate::logging::AppLogger;
use crate::resources::ServerResources;

/// Check the `Authorization: Bearer <secret>` header against the configured secret
pub async fn require_api_key(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match authenticate(&resources.api_key, header) {
        Ok(()) => next.run(request).await,
        Err(error) => {
            AppLogger::log_auth_rejected(request.uri().path(), &error.message);
            error.into_response()
        }
    }
}
