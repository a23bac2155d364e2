// ABOUTME: Media route handler serving stored audio by content reference
// ABOUTME: Lets clients play back inbound audio and synthesized replies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use voxloom_core::errors::{AppError, AppResult};

use crate::content_store::mime_for_ref;
use crate::resources::ServerResources;

/// Media routes
pub struct MediaRoutes;

impl MediaRoutes {
    /// Create all media routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/v1/media/:content_ref", get(Self::get_media))
            .with_state(resources)
    }

    async fn get_media(
        State(resources): State<Arc<ServerResources>>,
        Path(content_ref): Path<String>,
    ) -> AppResult<impl IntoResponse> {
        let bytes = resources
            .content_store
            .get(&content_ref)
            .await?
            .ok_or_else(|| AppError::not_found("Media").with_resource_id(&content_ref))?;

        Ok(([(CONTENT_TYPE, mime_for_ref(&content_ref))], bytes))
    }
}
