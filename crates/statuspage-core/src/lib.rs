//! # statuspage-core
//!
//! Event catalog and publication pipeline for a service status page.
//!
//! This crate provides:
//! - `Event`, `Section` and `Status` types (the catalog)
//! - YAML read/write of the status document (portable persistence)
//! - `EventCollection` (canonical in-memory state)
//! - section lifecycle, id allocation and the editor boundary
//! - derived views: per-product status, Atom feeds, the page snapshot
//!
//! It does not render HTML, serve HTTP or authenticate anyone. Callers
//! decide who may edit and pass that decision in as an [`Authorization`].
//!
//! ## Data model
//!
//! ```text
//! data.yml (current / planned / past / info)
//!     ↕  load / save
//! EventCollection (ordered sections, newest first)
//!     ↓  aggregate / build feeds / snapshot
//! feed.xml, planned.xml, feed.json, status.json
//! ```

pub mod atom;
pub mod collection;
pub mod config;
pub mod document;
pub mod edit;
pub mod event;
pub mod feed;
pub mod ids;
pub mod publish;
pub mod section;
pub mod snapshot;
pub mod status;
pub mod timestamp;

pub use atom::render_atom;
pub use collection::EventCollection;
pub use config::{ConfigError, DEV_STATIC_PREFIX, PublishConfig};
pub use document::{
    DocumentError, load, load_from_path, load_raw_from_path, parse, render, save, save_raw_to_path,
    save_to_path, write_atomic,
};
pub use edit::{Authorization, EditError, EditOutcome, EventForm, apply_form};
pub use event::{
    Event, EventId, EventKind, Incident, Section, ShapeError, Status, UnknownVariant, Update,
};
pub use feed::{
    DEFAULT_FEED_URL, DEFAULT_PLANNED_FEED_URL, Feed, FeedEntry, FeedSettings, build_feed,
    build_general_feed, build_maintenance_feed, compute_updated,
};
pub use ids::{AssignedId, assign_missing_ids, duplicate_ids, next_id};
pub use publish::{Publication, PublishError};
pub use section::{
    EventDraft, SectionError, ShapeFields, add_update, apply_section_shape, create_event,
    delete_event, move_section, move_section_with, reconcile_updates, sort_updates,
};
pub use snapshot::{PageSnapshot, StatusReport};
pub use status::{ServiceStatus, aggregate};
