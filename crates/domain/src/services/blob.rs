//! Blob storage abstraction.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by blob storage backends.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("upload failed: {0}")]
    Upload(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBlob {
    /// Public URL the object is served from.
    pub url: String,
    /// Pathname the store actually used (may carry a random suffix).
    pub pathname: String,
    pub size: u64,
}

/// Content-addressable object storage.
///
/// `put` never overwrites: implementations add a random suffix to the
/// requested pathname so two uploads of the same name get distinct URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        pathname: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredBlob, BlobError>;

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BlobError>;

    async fn delete(&self, url: &str) -> Result<(), BlobError>;
}
