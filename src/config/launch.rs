// ABOUTME: Smoke-test launch settings for post-install validation.
// ABOUTME: Command, environment, ready-line regex, and graceful stop behaviour.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::deserialize::{deserialize_regex, serialize_regex};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Server executable; relative paths resolve against the install directory.
    #[serde(default = "default_command")]
    pub command: PathBuf,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_env")]
    pub env: BTreeMap<String, String>,

    #[serde(
        default = "default_ready_pattern",
        deserialize_with = "deserialize_regex",
        serialize_with = "serialize_regex"
    )]
    pub ready_pattern: Regex,

    /// Line written to stdin to ask the server to shut down. `None` kills immediately.
    #[serde(default = "default_stop_command")]
    pub stop_command: Option<String>,

    #[serde(default = "default_stop_grace", with = "humantime_serde")]
    pub stop_grace: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            env: default_env(),
            ready_pattern: default_ready_pattern(),
            stop_command: default_stop_command(),
            stop_grace: default_stop_grace(),
        }
    }
}

fn default_command() -> PathBuf {
    PathBuf::from("bedrock_server")
}

fn default_env() -> BTreeMap<String, String> {
    BTreeMap::from([("LD_LIBRARY_PATH".to_string(), ".".to_string())])
}

fn default_ready_pattern() -> Regex {
    Regex::new(r"Server started\.").expect("default ready pattern is valid")
}

fn default_stop_command() -> Option<String> {
    Some("stop".to_string())
}

fn default_stop_grace() -> Duration {
    Duration::from_secs(10)
}
