//! HTTP blob store client
//!
//! Uploaded images live in an external object store with a bucket/object API.
//! The database row only ever references a blob by its bucket-relative path,
//! so deletion can target the exact object that was written.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::types::{ArchwayError, Result};

/// Reference to one stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    /// Bucket-relative object path, persisted for later deletion
    pub path: String,
    /// Publicly servable URL
    pub public_url: String,
}

/// Seam over the object store so tests can swap in an in-memory fake
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a fresh object name derived from `file_name`
    async fn put(&self, file_name: &str, bytes: Vec<u8>, content_type: &str) -> Result<BlobRef>;

    /// Remove the object at `path`. An already-absent object counts as
    /// removed, so interrupted deletes can be retried safely.
    async fn remove(&self, path: &str) -> Result<()>;
}

/// Object-store client speaking the bucket/object HTTP API
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    bucket: String,
}

impl HttpBlobStore {
    /// `timeout` bounds every outbound call so a hung object store cannot
    /// stall uploads or deletes indefinitely.
    pub fn new(base_url: &str, bucket: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        )
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        )
    }
}

/// Derive a collision-free object name, keeping the original extension
fn object_name(file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8);

    match ext {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
        None => Uuid::new_v4().to_string(),
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, file_name: &str, bytes: Vec<u8>, content_type: &str) -> Result<BlobRef> {
        let path = object_name(file_name);
        let url = self.object_url(&path);

        let response = self
            .client
            .post(&url)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ArchwayError::Storage(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ArchwayError::Storage(format!(
                "Upload rejected with status {}",
                response.status()
            )));
        }

        debug!(%path, "blob stored");
        Ok(BlobRef {
            public_url: self.public_url(&path),
            path,
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str) -> Result<()> {
        let url = self.object_url(path);

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| ArchwayError::Storage(format!("Delete request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(%path, "blob already absent");
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(ArchwayError::Storage(format!(
                "Delete rejected with status {}",
                response.status()
            )));
        }

        debug!(%path, "blob removed");
        Ok(())
    }
}
