// ABOUTME: Unified error handling with standard error codes and HTTP response formatting
// ABOUTME: Defines AppError, ErrorCode, and the JSON error body returned by every endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! # Unified Error Handling System
//!
//! Every fallible operation in the service returns [`AppResult`]. The error codes map
//! one-to-one onto the failure kinds a turn can end in, and each code carries its HTTP
//! status so route handlers never pick status codes by hand.
//!
//! Capability adapters (transcription, reply generation, synthesis) do not use
//! [`AppError`]; they return [`CapabilityError`] which the orchestrator converts into
//! audited model-call failures.

/// Errors returned by capability adapters
pub mod capability;

pub use capability::CapabilityError;

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Standard error codes used throughout the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// No bearer credential was supplied, or it was malformed
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    /// A bearer credential was supplied but does not match the shared secret
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,

    // Validation (3000-3999)
    /// The request payload is malformed or inconsistent
    #[serde(rename = "INVALID_PAYLOAD")]
    InvalidPayload = 3000,
    /// A tool payload does not satisfy its scenario schema
    #[serde(rename = "SCHEMA_VIOLATION")]
    SchemaViolation = 3001,

    // Resources (4000-4999)
    /// The referenced session does not exist
    #[serde(rename = "SESSION_NOT_FOUND")]
    SessionNotFound = 4000,
    /// Some other referenced resource does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4001,

    // Capabilities (5000-5999)
    /// Audio could not be transcribed
    #[serde(rename = "TRANSCRIPTION_FAILED")]
    TranscriptionFailed = 5000,
    /// No reply could be produced for the turn
    #[serde(rename = "REPLY_GENERATION_FAILED")]
    ReplyGenerationFailed = 5001,
    /// Reply audio could not be synthesized
    #[serde(rename = "SYNTHESIS_FAILED")]
    SynthesisFailed = 5002,

    // Infrastructure (9000-9999)
    /// The conversation store or content store is unreachable or failed a write
    #[serde(rename = "STORE_UNAVAILABLE")]
    StoreUnavailable = 9000,
    /// Configuration is missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 9001,
    /// Data could not be serialized or deserialized
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9002,
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9003,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidPayload => 400,
            Self::AuthRequired => 401,
            Self::AuthInvalid => 403,
            Self::SessionNotFound | Self::ResourceNotFound => 404,
            Self::SchemaViolation => 422,
            Self::TranscriptionFailed | Self::ReplyGenerationFailed | Self::SynthesisFailed => {
                502
            }
            Self::StoreUnavailable => 503,
            Self::ConfigError | Self::SerializationError | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "A bearer credential is required to access this resource",
            Self::AuthInvalid => "The provided bearer credential is not valid",
            Self::InvalidPayload => "The request payload is invalid",
            Self::SchemaViolation => "The tool payload does not satisfy the scenario schema",
            Self::SessionNotFound => "The requested session was not found",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::TranscriptionFailed => "Audio transcription failed",
            Self::ReplyGenerationFailed => "Reply generation failed",
            Self::SynthesisFailed => "Speech synthesis failed",
            Self::StoreUnavailable => "The conversation store is unavailable",
            Self::ConfigError => "Configuration error encountered",
            Self::SerializationError => "Data serialization/deserialization failed",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// Unified error type for the service
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Resource the error refers to, if any
    pub resource_id: Option<String>,
    /// Structured details (missing fields, partial audit ids, ...)
    pub details: Value,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            resource_id: None,
            details: Value::Object(Map::new()),
            source: None,
        }
    }

    /// Attach the id of the resource the error refers to
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Replace the structured details
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Missing or malformed bearer credential
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Missing or malformed bearer token")
    }

    /// Bearer credential does not match
    #[must_use]
    pub fn auth_invalid() -> Self {
        Self::new(ErrorCode::AuthInvalid, "Invalid bearer token")
    }

    /// Malformed or inconsistent request payload
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPayload, message)
    }

    /// Session lookup failed
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self::new(
            ErrorCode::SessionNotFound,
            format!("Session {session_id} not found"),
        )
        .with_resource_id(session_id)
    }

    /// Generic resource lookup failed
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Tool payload failed scenario validation; `fields` lists every offending field
    pub fn schema_violation(scenario: &str, fields: &[String]) -> Self {
        Self::new(
            ErrorCode::SchemaViolation,
            format!(
                "Payload for scenario '{scenario}' is missing or has invalid fields: {}",
                fields.join(", ")
            ),
        )
        .with_details(json!({ "scenario": scenario, "fields": fields }))
    }

    /// Reply generation failed and the turn was aborted
    pub fn reply_generation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReplyGenerationFailed, message)
    }

    /// Persistence layer failure
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreUnavailable, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error body
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable machine-readable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Resource the error refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Structured details
    #[serde(skip_serializing_if = "is_empty_details")]
    pub details: Value,
}

fn is_empty_details(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                resource_id: error.resource_id,
                details: error.details,
            },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {error}"))
    }
}

#[cfg(feature = "database-errors")]
mod database {
    use sqlx::Error as SqlxError;

    use super::AppError;

    impl From<SqlxError> for AppError {
        fn from(error: SqlxError) -> Self {
            match error {
                SqlxError::RowNotFound => Self::not_found("Row"),
                other => {
                    Self::store_unavailable(format!("Database error: {other}")).with_source(other)
                }
            }
        }
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use http::StatusCode;
    use tracing::{debug, error};

    use super::{AppError, ErrorResponse};

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                error!(code = ?self.code, error = %self, "request failed");
            } else {
                debug!(code = ?self.code, error = %self, "request rejected");
            }
            (status, Json(ErrorResponse::from(self))).into_response()
        }
    }
}
