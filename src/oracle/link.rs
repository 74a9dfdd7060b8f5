// ABOUTME: Download-link matching and version extraction for the vendor page.
// ABOUTME: Surfaces markup changes as NoLinkFound/UnexpectedFormat instead of misparsing.

use regex::Regex;

use super::OracleError;
use crate::config::SourceConfig;
use crate::types::VersionTag;

/// How a download link looks and where the version sits inside it.
#[derive(Debug, Clone)]
pub struct LinkFormat {
    pattern: Regex,
    prefix: String,
    suffix: String,
}

impl LinkFormat {
    pub fn new(pattern: Regex, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            pattern,
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn from_config(source: &SourceConfig) -> Self {
        Self::new(
            source.link_pattern.clone(),
            source.link_prefix.clone(),
            source.link_suffix.clone(),
        )
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Find the single download link in a page.
    ///
    /// The same link repeated (e.g. in `href` and in visible text) counts once;
    /// two different matching links are ambiguous and rejected.
    pub fn find_link(&self, page_url: &str, html: &str) -> Result<String, OracleError> {
        let mut links: Vec<&str> = self.pattern.find_iter(html).map(|m| m.as_str()).collect();
        links.sort_unstable();
        links.dedup();

        match links.as_slice() {
            [] => Err(OracleError::NoLinkFound {
                url: page_url.to_string(),
                pattern: self.pattern.as_str().to_string(),
            }),
            [link] => Ok((*link).to_string()),
            many => Err(OracleError::UnexpectedFormat(format!(
                "{} distinct download links matched on {}: {}",
                many.len(),
                page_url,
                many.join(", ")
            ))),
        }
    }

    /// Strip the known prefix and suffix to obtain the version.
    pub fn version_from_link(&self, link: &str) -> Result<VersionTag, OracleError> {
        let rest = link.strip_prefix(&self.prefix).ok_or_else(|| {
            OracleError::UnexpectedFormat(format!(
                "link '{link}' does not start with '{}'",
                self.prefix
            ))
        })?;
        let version = rest.strip_suffix(&self.suffix).ok_or_else(|| {
            OracleError::UnexpectedFormat(format!(
                "link '{link}' does not end with '{}'",
                self.suffix
            ))
        })?;

        if version.contains('/') {
            return Err(OracleError::UnexpectedFormat(format!(
                "version segment '{version}' of link '{link}' contains a path separator"
            )));
        }

        VersionTag::new(version).map_err(|e| {
            OracleError::UnexpectedFormat(format!("link '{link}' yields no usable version: {e}"))
        })
    }
}
