// ABOUTME: Filesystem content store writing one file per content reference
// ABOUTME: Writes go to a temporary file and are renamed into place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;
use voxloom_core::errors::{AppError, AppResult};

use super::{content_ref_for, validate_content_ref, ContentStore, StoredContent};

/// Content store rooted at a media directory
#[derive(Debug, Clone)]
pub struct FilesystemContentStore {
    root: PathBuf,
}

impl FilesystemContentStore {
    /// Create the media directory if needed and return a store rooted there
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the directory cannot be created
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::store_unavailable(format!(
                "Failed to create media directory {}: {e}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// Directory blobs are written to
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    async fn put(&self, bytes: &[u8], mime: &str) -> AppResult<StoredContent> {
        let content_ref = content_ref_for(bytes, mime);
        let target = self.root.join(&content_ref);

        let exists = fs::try_exists(&target).await.map_err(|e| {
            AppError::store_unavailable(format!("Failed to check media file: {e}"))
        })?;
        if exists {
            debug!(content.ref = %content_ref, "Content already stored");
        } else {
            let staging = self.root.join(format!(".{}.tmp", Uuid::new_v4()));
            fs::write(&staging, bytes).await.map_err(|e| {
                AppError::store_unavailable(format!("Failed to write media file: {e}"))
            })?;
            fs::rename(&staging, &target).await.map_err(|e| {
                AppError::store_unavailable(format!("Failed to finalize media file: {e}"))
            })?;
            debug!(content.ref = %content_ref, size = bytes.len(), "Content stored");
        }

        Ok(StoredContent {
            content_ref,
            mime: mime.to_owned(),
            size: bytes.len(),
        })
    }

    async fn get(&self, content_ref: &str) -> AppResult<Option<Bytes>> {
        validate_content_ref(content_ref)?;
        match fs::read(self.root.join(content_ref)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::store_unavailable(format!(
                "Failed to read media file: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use voxloom_core::errors::ErrorCode;

    #[tokio::test]
    async fn test_put_then_get_from_disk() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemContentStore::new(dir.path().join("media"))
            .await
            .unwrap();

        let stored = store.put(b"ID3 fake mp3", "audio/mp3").await.unwrap();
        assert!(stored.content_ref.ends_with(".mp3"));
        assert!(store.root().join(&stored.content_ref).exists());

        let data = store.get(&stored.content_ref).await.unwrap().unwrap();
        assert_eq!(&data[..], b"ID3 fake mp3");
    }

    #[tokio::test]
    async fn test_unreadable_root_reports_store_unavailable() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("media");
        let store = FilesystemContentStore::new(&root).await.unwrap();
        fs::remove_dir(&root).await.unwrap();
        fs::write(&root, b"not a directory").await.unwrap();

        let error = store.put(b"RIFF", "audio/wav").await.unwrap_err();
        assert_eq!(error.code, ErrorCode::StoreUnavailable);
        assert!(error.message.contains("Failed to check media file"));
    }

    #[tokio::test]
    async fn test_missing_content_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemContentStore::new(dir.path()).await.unwrap();
        let missing = content_ref_for(b"never stored", "audio/wav");
        assert!(store.get(&missing).await.unwrap().is_none());
    }
}
