// ABOUTME: Request tracing support: request ID generation and per-request spans
// ABOUTME: Used by the router's SetRequestId, PropagateRequestId, and Trace layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use axum::extract::Request;
use http::HeaderName;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Header carrying the request ID
#[must_use]
pub const fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

/// Generates `req_<uuid>` request IDs for requests that arrive without one
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        format!("req_{}", Uuid::new_v4().simple())
            .parse()
            .ok()
            .map(RequestId::new)
    }
}

/// Span for one HTTP request, tagged with its request ID
pub fn make_request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(request_id_header())
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}
