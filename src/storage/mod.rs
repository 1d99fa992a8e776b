//! Image store integration
//!
//! Uploads locally staged product photos to S3-compatible object storage
//! (DigitalOcean Spaces) so the generation provider, which cannot reach
//! private hosts, can fetch them from a public URL.

pub mod client;
pub mod mock;

pub use client::StorageClient;
pub use mock::MockStorageClient;

use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload_bytes(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;

    /// Stage a local file into the store under a fresh date/uuid key and
    /// return its public URL.
    async fn upload_path(&self, path: &Path) -> Result<String> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            Error::UploadFailed(format!("cannot read {}: {}", path.display(), e))
        })?;
        let key = object_key(path);
        self.upload_bytes(&key, &data, content_type_for(path)).await
    }
}

/// Build a store key like `uploads/2026-08-07/<uuid>.jpg`.
fn object_key(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg")
        .to_ascii_lowercase();
    let date = chrono::Local::now().format("%Y-%m-%d");
    format!("uploads/{}/{}.{}", date, uuid::Uuid::new_v4(), ext)
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
