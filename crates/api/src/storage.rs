//! Blob store for todo attachments.
//!
//! The todo service only ever sees the [`StoredFile`] descriptor returned by
//! [`BlobStore::put`]; where the bytes live is up to the implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use taskhub_core::attachment::{sanitize_stem, ATTACHMENT_FIELD};
use tokio::fs;

/// Descriptor of a persisted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated name, unique per upload.
    pub file_name: String,
    /// Location the file can be retrieved from.
    pub file_path: String,
    /// MIME type reported by the client.
    pub file_type: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` and describe where they went.
    async fn put(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> std::io::Result<StoredFile>;
}

/// Stores uploads as plain files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// `attachment-<unix millis>-<sanitized stem><.ext>`.
pub fn storage_name(original_name: &str, millis: i64) -> String {
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_stem)
        .unwrap_or_else(|| sanitize_stem(""));
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", sanitize_stem(e)))
        .unwrap_or_default();
    format!("{ATTACHMENT_FIELD}-{millis}-{stem}{ext}")
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> std::io::Result<StoredFile> {
        fs::create_dir_all(&self.root).await?;

        let file_name = storage_name(original_name, chrono::Utc::now().timestamp_millis());
        let path = self.root.join(&file_name);
        fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored attachment");

        Ok(StoredFile {
            file_name,
            file_path: path.to_string_lossy().into_owned(),
            file_type: content_type.to_string(),
        })
    }
}
