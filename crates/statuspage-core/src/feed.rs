//! Feed projection of events.
//!
//! Two feeds are published:
//! - the general feed: `current` then `past`, in stored order
//! - the maintenance feed: `maintenance` events from `current` and `planned`
//!
//! Entry order is never changed here; sections are already newest first.

use crate::collection::EventCollection;
use crate::event::{Event, Section, Status};
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_FEED_URL: &str = "https://status.nordu.net/feed.xml";
pub const DEFAULT_PLANNED_FEED_URL: &str = "https://status.nordu.net/planned.xml";

/// Feed identity and entry id base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub title: String,
    pub feed_url: String,
    /// Prefix of every entry id; the event id is appended verbatim.
    pub entry_base_url: String,
}

impl FeedSettings {
    /// Settings whose entry ids are based on the feed URL itself.
    pub fn new(title: impl Into<String>, feed_url: impl Into<String>) -> Self {
        let feed_url = feed_url.into();
        Self {
            title: title.into(),
            entry_base_url: feed_url.clone(),
            feed_url,
        }
    }

    pub fn with_entry_base_url(mut self, entry_base_url: impl Into<String>) -> Self {
        self.entry_base_url = entry_base_url.into();
        self
    }
}

/// A built feed, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub title: String,
    pub url: String,
    pub id: String,
    /// Generation time, independent of entry times.
    pub updated: String,
    pub entries: Vec<FeedEntry>,
}

/// One event projected into a feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    pub feed_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    pub section: Section,
    #[serde(flatten)]
    pub event: Event,
}

/// Latest valid timestamp of an event, normalized to ISO-8601.
///
/// Candidates are `start`, `closed` unless it lies after `now`, and every
/// update time. Values that do not match the stored timestamp pattern are
/// skipped. Returns `None` when no candidate survives.
pub fn compute_updated(event: &Event, now: DateTime<Utc>) -> Option<String> {
    let closed = event
        .closed()
        .filter(|closed| !timestamp::is_after(closed, now));

    event
        .start()
        .into_iter()
        .chain(closed)
        .chain(event.updates.iter().map(|update| update.time.as_str()))
        .filter_map(timestamp::normalize)
        .max()
}

/// Build a feed from events in the given order.
pub fn build_feed<'a>(
    events: impl IntoIterator<Item = (Section, &'a Event)>,
    settings: &FeedSettings,
    generated_at: DateTime<Utc>,
) -> Feed {
    let entries = events
        .into_iter()
        .map(|(section, event)| FeedEntry {
            feed_id: format!("{}{}", settings.entry_base_url, event.id),
            updated: compute_updated(event, generated_at),
            section,
            event: event.clone(),
        })
        .collect();

    Feed {
        title: settings.title.clone(),
        url: settings.feed_url.clone(),
        id: settings.feed_url.clone(),
        updated: timestamp::format_feed(generated_at),
        entries,
    }
}

/// General feed: `current` followed by `past`.
pub fn build_general_feed(
    collection: &EventCollection,
    settings: &FeedSettings,
    generated_at: DateTime<Utc>,
) -> Feed {
    build_feed(
        sections(collection, &[Section::Current, Section::Past]),
        settings,
        generated_at,
    )
}

/// Maintenance feed: `maintenance` events from `current` and `planned`.
///
/// Maintenance-status events in other sections never appear.
pub fn build_maintenance_feed(
    collection: &EventCollection,
    settings: &FeedSettings,
    generated_at: DateTime<Utc>,
) -> Feed {
    build_feed(
        sections(collection, &[Section::Current, Section::Planned])
            .filter(|(_, event)| event.status() == Status::Maintenance),
        settings,
        generated_at,
    )
}

fn sections<'a>(
    collection: &'a EventCollection,
    sections: &'a [Section],
) -> impl Iterator<Item = (Section, &'a Event)> {
    sections.iter().flat_map(move |section| {
        collection
            .section(*section)
            .iter()
            .map(move |event| (*section, event))
    })
}
