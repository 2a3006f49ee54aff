//! Blob store backends.
//!
//! `local` keeps objects under a directory the API serves at `/blobs`;
//! `http` talks to a remote object store addressed by
//! `{remote_base_url}/{pathname}` with a bearer token.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::services::{BlobError, BlobStore, StoredBlob};
use reqwest::{header, Client, StatusCode};
use shared::ids::with_random_suffix;
use tracing::debug;

use crate::config::BlobConfig;

/// Builds the store selected by `blob.provider`.
pub fn build_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, BlobError> {
    match config.provider.as_str() {
        "local" => Ok(Arc::new(LocalBlobStore::new(
            &config.local_dir,
            &config.public_base_url,
        ))),
        "http" => Ok(Arc::new(HttpBlobStore::new(
            &config.remote_base_url,
            &config.token,
            Duration::from_millis(config.timeout_ms),
        )?)),
        other => Err(BlobError::Upload(format!("unknown blob provider '{}'", other))),
    }
}

/// Rejects absolute paths and parent traversal.
fn checked_relative(pathname: &str) -> Result<&Path, BlobError> {
    let path = Path::new(pathname);
    let safe = !pathname.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if safe {
        Ok(path)
    } else {
        Err(BlobError::Upload(format!("invalid pathname '{}'", pathname)))
    }
}

/// Objects stored as files under `root`, published as
/// `{public_base_url}/{pathname}`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps one of our own URLs back to its file.
    fn path_for_url(&self, url: &str) -> Result<PathBuf, BlobError> {
        let pathname = url
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| BlobError::NotFound(url.to_string()))?;
        let relative = checked_relative(pathname).map_err(|_| BlobError::NotFound(url.to_string()))?;
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        pathname: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredBlob, BlobError> {
        let stored_name = with_random_suffix(pathname);
        let file_path = self.root.join(checked_relative(&stored_name)?);
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let size = bytes.len() as u64;
        tokio::fs::write(&file_path, bytes).await?;
        debug!(path = %file_path.display(), size, "Stored local blob");

        Ok(StoredBlob {
            url: format!("{}/{}", self.public_base_url, stored_name),
            pathname: stored_name,
            size,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.path_for_url(url)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(url.to_string()))
            }
            Err(e) => Err(BlobError::Fetch(e.to_string())),
        }
    }

    /// Deleting a missing file succeeds.
    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let path = self.path_for_url(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobError::Delete(e.to_string())),
        }
    }
}

/// Remote object store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpBlobStore {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, BlobError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BlobError::Upload(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(
        &self,
        pathname: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredBlob, BlobError> {
        let stored_name = with_random_suffix(pathname);
        checked_relative(&stored_name)?;
        let url = format!("{}/{}", self.base_url, stored_name);
        let size = bytes.len() as u64;

        let response = self
            .authorized(self.client.put(&url))
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| BlobError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlobError::Upload(format!("HTTP {}: {}", status, body)));
        }

        debug!(url = %url, size, "Stored remote blob");
        Ok(StoredBlob {
            url,
            pathname: stored_name,
            size,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BlobError> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| BlobError::Fetch(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BlobError::NotFound(url.to_string())),
            status if !status.is_success() => {
                Err(BlobError::Fetch(format!("HTTP {} for {}", status, url)))
            }
            _ => response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| BlobError::Fetch(e.to_string())),
        }
    }

    /// A 404 counts as deleted.
    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let response = self
            .authorized(self.client.delete(url))
            .send()
            .await
            .map_err(|e| BlobError::Delete(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(BlobError::Delete(format!("HTTP {} for {}", status, url))),
        }
    }
}
