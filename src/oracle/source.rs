// ABOUTME: Pluggable discovery of the latest published server build.
// ABOUTME: Page scraping via HttpTransport, or a pinned URI from configuration.

use async_trait::async_trait;

use super::link::LinkFormat;
use super::{OracleError, UpdateCandidate};
use crate::config::Config;
use crate::transport::HttpTransport;

/// Source of the latest available build.
///
/// The pipeline only depends on this trait, so scraping can be swapped for a
/// stable API without touching the orchestration.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn latest(&self) -> Result<UpdateCandidate, OracleError>;
}

/// Scrapes the vendor download page for the platform-specific archive link.
pub struct PageScraper<'a, T: HttpTransport> {
    transport: &'a T,
    page_url: String,
    format: LinkFormat,
}

impl<'a, T: HttpTransport> PageScraper<'a, T> {
    pub fn new(transport: &'a T, page_url: impl Into<String>, format: LinkFormat) -> Self {
        Self {
            transport,
            page_url: page_url.into(),
            format,
        }
    }

    pub fn from_config(transport: &'a T, config: &Config) -> Self {
        Self::new(
            transport,
            config.source.page_url.clone(),
            LinkFormat::from_config(&config.source),
        )
    }
}

#[async_trait]
impl<'a, T: HttpTransport> VersionSource for PageScraper<'a, T> {
    async fn latest(&self) -> Result<UpdateCandidate, OracleError> {
        tracing::debug!("scraping {} for download link", self.page_url);
        let html = self
            .transport
            .get_text(&self.page_url)
            .await
            .map_err(|e| OracleError::SourceUnreachable(e.to_string()))?;

        let link = self.format.find_link(&self.page_url, &html)?;
        let version = self.format.version_from_link(&link)?;
        tracing::debug!("found {} at {}", version, link);

        Ok(UpdateCandidate {
            version,
            download_uri: link,
        })
    }
}

/// Pick the source the configuration asks for: a pinned `download_uri`
/// when set, otherwise the page scraper.
pub fn configured_source<'a, T: HttpTransport>(
    config: &Config,
    transport: &'a T,
) -> Box<dyn VersionSource + 'a> {
    match &config.download_uri {
        Some(uri) => Box::new(PinnedSource::new(
            uri.clone(),
            LinkFormat::from_config(&config.source),
        )),
        None => Box::new(PageScraper::from_config(transport, config)),
    }
}

/// Uses a configured archive URI; no network access.
#[derive(Debug, Clone)]
pub struct PinnedSource {
    uri: String,
    format: LinkFormat,
}

impl PinnedSource {
    pub fn new(uri: impl Into<String>, format: LinkFormat) -> Self {
        Self {
            uri: uri.into(),
            format,
        }
    }
}

#[async_trait]
impl VersionSource for PinnedSource {
    async fn latest(&self) -> Result<UpdateCandidate, OracleError> {
        let version = self.format.version_from_link(&self.uri)?;
        Ok(UpdateCandidate {
            version,
            download_uri: self.uri.clone(),
        })
    }
}
