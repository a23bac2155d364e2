// ABOUTME: Shared-secret bearer authentication primitives
// ABOUTME: Constant-time secret comparison and Authorization header parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! Bearer authentication against a single process-wide shared secret.
//!
//! The secret is loaded once at startup and handed to the router state; nothing in
//! this module reads global configuration.

use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use voxloom_core::errors::AppError;

/// Process-wide shared secret.
///
/// `Debug` never prints the value.
#[derive(Clone)]
pub struct SharedSecret(Arc<str>);

impl SharedSecret {
    /// Wrap a secret value
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::from(secret.into()))
    }

    /// Constant-time comparison against a presented credential
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Whether the secret is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
///
/// # Errors
///
/// Returns `AuthRequired` when the header is absent, not a bearer credential, or empty
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let value = header.ok_or_else(AppError::auth_required)?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(AppError::auth_required)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::auth_required());
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::auth_required());
    }
    Ok(token)
}

/// Authenticate an `Authorization` header value against the shared secret
///
/// # Errors
///
/// `AuthRequired` for missing or malformed credentials, `AuthInvalid` for a wrong token
pub fn authenticate(secret: &SharedSecret, header: Option<&str>) -> Result<(), AppError> {
    let token = extract_bearer_token(header)?;
    if secret.matches(token) {
        Ok(())
    } else {
        Err(AppError::auth_invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxloom_core::errors::ErrorCode;

    #[test]
    fn test_missing_or_malformed_header_requires_auth() {
        let secret = SharedSecret::new("s3cret");
        for header in [None, Some(""), Some("Basic abc"), Some("Bearer "), Some("s3cret")] {
            let error = authenticate(&secret, header).unwrap_err();
            assert_eq!(error.code, ErrorCode::AuthRequired, "header: {header:?}");
        }
    }

    #[test]
    fn test_wrong_token_is_invalid() {
        let secret = SharedSecret::new("s3cret");
        let error = authenticate(&secret, Some("Bearer nope")).unwrap_err();
        assert_eq!(error.code, ErrorCode::AuthInvalid);
    }

    #[test]
    fn test_matching_token_is_accepted() {
        let secret = SharedSecret::new("s3cret");
        assert!(authenticate(&secret, Some("bearer s3cret")).is_ok());
        assert!(!format!("{secret:?}").contains("s3cret"));
    }
}
