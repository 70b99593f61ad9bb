//! Object storage backends the image proxy reads from.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use axum::http::{StatusCode, header::CONTENT_TYPE};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::AppError;

/// A fetched image and the content type to serve it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Read-only access to stored images.
///
/// `path` is always storage-relative with a single leading `/`, for example
/// `/uploads/portfolio/a.jpg`.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<StoredImage, AppError>;

    /// Short name for logs ("local", "http").
    fn scheme(&self) -> &'static str;
}

/// Images stored under a local directory.
pub struct LocalImageStore {
    base_path: PathBuf,
}

impl LocalImageStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Map a storage path onto the base directory, refusing anything that
    /// could climb out of it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        (safe && !path.contains('\0')).then(|| self.base_path.join(relative))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn fetch(&self, path: &str) -> Result<StoredImage, AppError> {
        let file_path = self
            .resolve(path)
            .ok_or_else(|| AppError::ImageNotFound(path.to_string()))?;

        let body = match fs::read(&file_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::ImageNotFound(path.to_string()));
            }
            Err(e) => {
                warn!(path = %file_path.display(), error = %e, "failed to read image");
                return Err(AppError::Storage(e.to_string()));
            }
        };

        debug!(path, size = body.len(), "image read from disk");
        Ok(StoredImage {
            body,
            content_type: guess_content_type(path).to_string(),
        })
    }

    fn scheme(&self) -> &'static str {
        "local"
    }
}

/// Images behind an HTTP object storage endpoint, e.g. a bucket URL.
pub struct HttpImageStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpImageStore {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn fetch(&self, path: &str) -> Result<StoredImage, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Request failed: {e}")))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                // private buckets answer 403 for missing keys
                return Err(AppError::ImageNotFound(path.to_string()));
            }
            status => {
                warn!(%url, %status, "storage returned an error");
                return Err(AppError::Storage(format!("storage responded with {status}")));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| guess_content_type(path).to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Read failed: {e}")))?;

        debug!(%url, size = body.len(), "image fetched from storage");
        Ok(StoredImage {
            body: body.to_vec(),
            content_type,
        })
    }

    fn scheme(&self) -> &'static str {
        "http"
    }
}

/// Content type from the file extension.
pub fn guess_content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
