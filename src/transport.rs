// ABOUTME: HTTP transport seam used for page scraping and archive downloads.
// ABOUTME: Trait plus a reqwest-backed implementation with rustls.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::SourceConfig;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Minimal HTTP operations the update pipeline needs.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET a page and return its body as text. Non-2xx status is an error.
    async fn get_text(&self, url: &str) -> Result<String, TransportError>;

    /// GET a resource and stream the body into `dest`, returning bytes written.
    ///
    /// `dest` may be left partially written on error; callers own cleanup.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    pub fn from_config(source: &SourceConfig) -> Result<Self, TransportError> {
        Self::new(&source.user_agent, source.request_timeout)
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        let response = self.send(url).await?;
        response.text().await.map_err(|e| request_error(url, e))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransportError> {
        let mut response = self.send(url).await?;
        let write_error = |source| TransportError::Write {
            path: dest.display().to_string(),
            source,
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| request_error(url, e))? {
            file.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_error)?;
        file.sync_all().await.map_err(write_error)?;

        tracing::debug!("downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}

fn request_error(url: &str, err: reqwest::Error) -> TransportError {
    TransportError::Request {
        url: url.to_string(),
        message: err.to_string(),
    }
}
