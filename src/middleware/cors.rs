// ABOUTME: CORS middleware configuration for HTTP API endpoints
// ABOUTME: Builds the allowed origin list from server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ServerConfig;

/// Configure CORS from `CORS_ALLOWED_ORIGINS`
///
/// An empty list or `*` allows any origin; otherwise only the listed origins are
/// allowed. Unparseable entries are skipped.
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let origins = &config.cors_allowed_origins;
    let allow_origin = if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
            .collect();
        if parsed.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(parsed)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}
