//! Publication settings.
//!
//! Values come from an optional TOML file; the CLI overlays its flags on
//! top. Every field has a default, so an empty file is a valid config.

use crate::feed::{DEFAULT_FEED_URL, DEFAULT_PLANNED_FEED_URL, FeedSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Static asset prefix used when rendering for local development.
pub const DEV_STATIC_PREFIX: &str = "https://status.nordu.net";

pub const DEFAULT_TITLE: &str = "NORDUnet status";
pub const DEFAULT_DATA_PATH: &str = "data.yml";
pub const DEFAULT_OUT_DIR: &str = "static";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Directory generated artifacts are written to.
    pub out_dir: PathBuf,
    /// Status document path.
    pub data_path: PathBuf,
    pub title: String,
    pub feed_url: String,
    pub planned_feed_url: String,
    /// Entry id prefix; defaults to `feed_url`.
    pub entry_base_url: Option<String>,
    pub dev: bool,
    /// Editors allowed to mutate the document. Empty means the caller
    /// decides.
    pub editors: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            title: DEFAULT_TITLE.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            planned_feed_url: DEFAULT_PLANNED_FEED_URL.to_string(),
            entry_base_url: None,
            dev: false,
            editors: Vec::new(),
        }
    }
}

impl PublishConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn entry_base_url(&self) -> &str {
        self.entry_base_url.as_deref().unwrap_or(&self.feed_url)
    }

    pub fn static_prefix(&self) -> Option<&'static str> {
        self.dev.then_some(DEV_STATIC_PREFIX)
    }

    pub fn general_feed(&self) -> FeedSettings {
        FeedSettings::new(self.title.clone(), self.feed_url.clone())
            .with_entry_base_url(self.entry_base_url())
    }

    pub fn maintenance_feed(&self) -> FeedSettings {
        FeedSettings::new(
            format!("{} planned maintenance", self.title),
            self.planned_feed_url.clone(),
        )
        .with_entry_base_url(self.entry_base_url())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}
