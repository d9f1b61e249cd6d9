//! Derived page model handed to the page renderer.
//!
//! The snapshot carries everything a page needs and nothing used only
//! while editing: there is no id index and no editor context in it.

use crate::collection::EventCollection;
use crate::config::PublishConfig;
use crate::event::{Event, Section, Status};
use crate::status::{ServiceStatus, aggregate};
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_yaml::Mapping;

/// Everything the status page renders, borrowed from a loaded collection.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot<'a> {
    pub current: &'a [Event],
    pub planned: &'a [Event],
    pub past: &'a [Event],
    pub info: &'a [Event],
    /// Top-level document keys outside the four sections.
    #[serde(flatten)]
    pub extra: &'a Mapping,
    pub service_status: ServiceStatus,
    /// Generation time, `YYYY-MM-DD HH:MM UTC`.
    pub now: String,
    pub statuses: [Status; 5],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_prefix: Option<&'static str>,
}

impl<'a> PageSnapshot<'a> {
    pub fn build(
        collection: &'a EventCollection,
        config: &PublishConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            current: collection.section(Section::Current),
            planned: collection.section(Section::Planned),
            past: collection.section(Section::Past),
            info: collection.section(Section::Info),
            extra: collection.extra(),
            service_status: aggregate(collection.section(Section::Current)),
            now: timestamp::format_display(now),
            statuses: Status::ALL,
            static_prefix: config.static_prefix(),
        }
    }
}

/// Machine-readable status summary written as `status.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub generated_at: String,
    pub service_status: ServiceStatus,
}

impl StatusReport {
    pub fn build(collection: &EventCollection, now: DateTime<Utc>) -> Self {
        Self {
            generated_at: timestamp::format_feed(now),
            service_status: aggregate(collection.section(Section::Current)),
        }
    }
}
