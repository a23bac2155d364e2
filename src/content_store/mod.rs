// ABOUTME: Content-addressed blob storage for inbound and synthesized audio
// ABOUTME: Pluggable backends (filesystem, in-memory) keyed by SHA-256 of the content
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! # Content Store
//!
//! Audio never travels through the conversation store. Messages hold a content
//! reference of the form `<sha256-hex>.<ext>`; identical bytes always map to the same
//! reference, so storing them twice is a no-op.
//!
//! Inbound audio is stored before its message is appended. If the append fails or the
//! turn is cancelled in between, the blob stays unreferenced until the same audio is
//! sent again, at which point the existing blob is reused. Nothing deletes blobs.

/// Filesystem-backed store
pub mod filesystem;
/// In-memory store
pub mod memory;

pub use filesystem::FilesystemContentStore;
pub use memory::InMemoryContentStore;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};
use voxloom_core::constants::audio::{MIME_MP3, MIME_WAV};
use voxloom_core::errors::{AppError, AppResult};

/// Result of storing a blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredContent {
    /// Reference to persist on the message
    pub content_ref: String,
    /// MIME type the blob was stored with
    pub mime: String,
    /// Size in bytes
    pub size: usize,
}

/// Pluggable blob storage
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their content reference
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the backend cannot persist the blob
    async fn put(&self, bytes: &[u8], mime: &str) -> AppResult<StoredContent>;

    /// Fetch bytes by reference; `None` when nothing is stored under it
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for malformed references, `StoreUnavailable` on I/O errors
    async fn get(&self, content_ref: &str) -> AppResult<Option<Bytes>>;
}

/// Compute the reference for a blob
#[must_use]
pub fn content_ref_for(bytes: &[u8], mime: &str) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!("{digest}.{}", extension_for_mime(mime))
}

/// File extension used for a MIME type
#[must_use]
pub fn extension_for_mime(mime: &str) -> &'static str {
    let mime = mime.to_ascii_lowercase();
    if mime.contains("mp3") || mime.contains("mpeg") {
        "mp3"
    } else if mime.contains("wav") || mime.contains("wave") {
        "wav"
    } else if mime.contains("ogg") {
        "ogg"
    } else if mime.contains("webm") {
        "webm"
    } else {
        "bin"
    }
}

/// MIME type implied by a reference's extension
#[must_use]
pub fn mime_for_ref(content_ref: &str) -> &'static str {
    match content_ref.rsplit_once('.').map(|(_, ext)| ext) {
        Some("wav") => MIME_WAV,
        Some("mp3") => MIME_MP3,
        Some("ogg") => "audio/ogg",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// Reject anything that is not `<64 hex chars>.<alphanumeric ext>`
///
/// # Errors
///
/// Returns `InvalidPayload` for malformed references
pub fn validate_content_ref(content_ref: &str) -> AppResult<()> {
    let (digest, ext) = content_ref
        .split_once('.')
        .ok_or_else(|| AppError::invalid_payload("Malformed content reference"))?;
    let digest_ok = digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit());
    let ext_ok = !ext.is_empty() && ext.len() <= 8 && ext.bytes().all(|b| b.is_ascii_alphanumeric());
    if digest_ok && ext_ok {
        Ok(())
    } else {
        Err(AppError::invalid_payload("Malformed content reference"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_ref_is_stable_and_typed() {
        let a = content_ref_for(b"abc", "audio/wav");
        let b = content_ref_for(b"abc", "audio/x-wav");
        assert_eq!(a, b);
        assert_eq!(
            a,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.wav"
        );
        assert!(content_ref_for(b"abc", "audio/mpeg").ends_with(".mp3"));
    }

    #[test]
    fn test_validate_content_ref_rejects_traversal() {
        assert!(validate_content_ref(&content_ref_for(b"x", "audio/wav")).is_ok());
        assert!(validate_content_ref("../../etc/passwd").is_err());
        assert!(validate_content_ref("abc.wav").is_err());
    }

    #[test]
    fn test_mime_for_ref() {
        assert_eq!(mime_for_ref("x.wav"), "audio/wav");
        assert_eq!(mime_for_ref("x.bin"), "application/octet-stream");
    }
}
