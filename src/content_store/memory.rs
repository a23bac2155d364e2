// ABOUTME: In-memory content store for tests and ephemeral deployments
// ABOUTME: Backed by a concurrent DashMap keyed by content reference
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use voxloom_core::errors::AppResult;

use super::{content_ref_for, validate_content_ref, ContentStore, StoredContent};

/// Content store that keeps blobs in process memory
#[derive(Clone, Default)]
pub struct InMemoryContentStore {
    blobs: Arc<DashMap<String, Bytes>>,
}

impl InMemoryContentStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, bytes: &[u8], mime: &str) -> AppResult<StoredContent> {
        let content_ref = content_ref_for(bytes, mime);
        self.blobs
            .entry(content_ref.clone())
            .or_insert_with(|| Bytes::copy_from_slice(bytes));
        Ok(StoredContent {
            content_ref,
            mime: mime.to_owned(),
            size: bytes.len(),
        })
    }

    async fn get(&self, content_ref: &str) -> AppResult<Option<Bytes>> {
        validate_content_ref(content_ref)?;
        Ok(self.blobs.get(content_ref).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identical_content_is_stored_once() {
        let store = InMemoryContentStore::new();
        let first = store.put(b"RIFF....", "audio/wav").await.unwrap();
        let second = store.put(b"RIFF....", "audio/wav").await.unwrap();

        assert_eq!(first.content_ref, second.content_ref);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&first.content_ref).await.unwrap().unwrap(),
            Bytes::from_static(b"RIFF....")
        );
    }
}
