//! Generated artifacts of one publication run.

use crate::atom::render_atom;
use crate::collection::EventCollection;
use crate::config::PublishConfig;
use crate::document::{DocumentError, write_atomic};
use crate::feed::{build_general_feed, build_maintenance_feed};
use crate::snapshot::{PageSnapshot, StatusReport};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const GENERAL_FEED_FILE: &str = "feed.xml";
pub const MAINTENANCE_FEED_FILE: &str = "planned.xml";
pub const SNAPSHOT_FILE: &str = "feed.json";
pub const STATUS_FILE: &str = "status.json";

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to serialize {file}: {message}")]
    Serialize { file: &'static str, message: String },

    #[error(transparent)]
    Write(#[from] DocumentError),
}

/// Rendered artifacts, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub feed_xml: String,
    pub planned_xml: String,
    pub snapshot_json: String,
    pub status_json: String,
}

impl Publication {
    pub fn build(
        collection: &EventCollection,
        config: &PublishConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, PublishError> {
        let general = build_general_feed(collection, &config.general_feed(), now);
        let planned = build_maintenance_feed(collection, &config.maintenance_feed(), now);
        let snapshot = PageSnapshot::build(collection, config, now);
        let report = StatusReport::build(collection, now);

        Ok(Self {
            feed_xml: render_atom(&general),
            planned_xml: render_atom(&planned),
            snapshot_json: to_json(SNAPSHOT_FILE, &snapshot)?,
            status_json: to_json(STATUS_FILE, &report)?,
        })
    }

    fn files(&self) -> [(&'static str, &str); 4] {
        [
            (GENERAL_FEED_FILE, self.feed_xml.as_str()),
            (MAINTENANCE_FEED_FILE, self.planned_xml.as_str()),
            (SNAPSHOT_FILE, self.snapshot_json.as_str()),
            (STATUS_FILE, self.status_json.as_str()),
        ]
    }

    /// Write every artifact into `out_dir`, each replaced atomically.
    pub fn write_to(&self, out_dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
        let mut written = Vec::with_capacity(4);
        for (name, contents) in self.files() {
            let path = out_dir.join(name);
            write_atomic(&path, contents.as_bytes())?;
            tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
            written.push(path);
        }
        tracing::info!(out_dir = %out_dir.display(), files = written.len(), "published artifacts");
        Ok(written)
    }
}

fn to_json<T: serde::Serialize>(file: &'static str, value: &T) -> Result<String, PublishError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|e| PublishError::Serialize {
        file,
        message: e.to_string(),
    })?;
    text.push('\n');
    Ok(text)
}
