// ABOUTME: Remote version source settings.
// ABOUTME: Vendor page URL, link-matching regex, and the link prefix/suffix around the version.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::deserialize::{deserialize_regex, serialize_regex};

pub const DEFAULT_PAGE_URL: &str = "https://www.minecraft.net/en-us/download/server/bedrock/";
pub const DEFAULT_LINK_PATTERN: &str =
    r#"https://minecraft\.azureedge\.net/bin-linux/[^"'\s<>]+\.zip"#;
pub const DEFAULT_LINK_PREFIX: &str = "https://minecraft.azureedge.net/bin-linux/bedrock-server-";
pub const DEFAULT_LINK_SUFFIX: &str = ".zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_page_url")]
    pub page_url: String,

    #[serde(
        default = "default_link_pattern",
        deserialize_with = "deserialize_regex",
        serialize_with = "serialize_regex"
    )]
    pub link_pattern: Regex,

    #[serde(default = "default_link_prefix")]
    pub link_prefix: String,

    #[serde(default = "default_link_suffix")]
    pub link_suffix: String,

    /// Some vendor CDNs refuse requests without a browser-like agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_url: default_page_url(),
            link_pattern: default_link_pattern(),
            link_prefix: default_link_prefix(),
            link_suffix: default_link_suffix(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_page_url() -> String {
    DEFAULT_PAGE_URL.to_string()
}

fn default_link_pattern() -> Regex {
    Regex::new(DEFAULT_LINK_PATTERN).expect("default link pattern is valid")
}

fn default_link_prefix() -> String {
    DEFAULT_LINK_PREFIX.to_string()
}

fn default_link_suffix() -> String {
    DEFAULT_LINK_SUFFIX.to_string()
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (X11; Linux x86_64) bedrock-updater/{}",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300)
}
