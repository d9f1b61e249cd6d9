//! Event id allocation.
//!
//! Ids are unique across all four sections, so every allocation scans the
//! whole document, never just the target section.

use crate::collection::EventCollection;
use crate::document::DocumentError;
use crate::event::{EventId, Section};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Next free id: `max(existing) + 1`, or 1 for an empty collection.
///
/// `None` once the largest id is `u64::MAX`.
pub fn next_id(collection: &EventCollection) -> Option<EventId> {
    collection
        .events()
        .map(|(_, event)| event.id.0)
        .max()
        .map_or(Some(1), |max| max.checked_add(1))
        .map(EventId)
}

/// Ids that appear more than once, ascending.
pub fn duplicate_ids(collection: &EventCollection) -> Vec<EventId> {
    let mut counts: BTreeMap<EventId, usize> = BTreeMap::new();
    for (_, event) in collection.events() {
        *counts.entry(event.id).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect()
}

/// One id handed out by [`assign_missing_ids`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedId {
    pub id: EventId,
    pub section: Section,
    pub title: String,
}

/// Give every record without an id a fresh one, in place.
///
/// Works on the untyped document because the typed model cannot load
/// records that lack an id. Records are visited in
/// [`Section::LOOKUP_ORDER`]; missing or null ids are numbered from the
/// current maximum + 1. Ids that do not read as integers are left alone and
/// do not count towards the maximum.
///
/// Fails without touching the document when the ids needed would run past
/// `u64::MAX`.
pub fn assign_missing_ids(document: &mut Mapping) -> Result<Vec<AssignedId>, DocumentError> {
    let id_key = Value::from("id");

    let mut max_id: Option<u64> = None;
    let mut missing: u64 = 0;
    for record in records(document) {
        match record.get(&id_key) {
            None | Some(Value::Null) => missing += 1,
            Some(value) => {
                if let Some(id) = read_id(value) {
                    max_id = Some(max_id.map_or(id, |max| max.max(id)));
                }
            }
        }
    }
    if missing == 0 {
        return Ok(Vec::new());
    }

    let mut next = max_id
        .map_or(Some(1), |max| max.checked_add(1))
        .filter(|first| first.checked_add(missing - 1).is_some())
        .ok_or_else(|| {
            DocumentError::MalformedDocument(format!(
                "cannot assign {missing} event id(s) after id {}",
                max_id.unwrap_or_default()
            ))
        })?;

    let mut assigned = Vec::new();
    for section in Section::LOOKUP_ORDER {
        let Some(Value::Sequence(items)) = document.get_mut(section.as_str()) else {
            continue;
        };
        for item in items.iter_mut() {
            let Value::Mapping(record) = item else {
                continue;
            };
            if !matches!(record.get(&id_key), None | Some(Value::Null)) {
                continue;
            }
            let title = record
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            record.insert(id_key.clone(), Value::from(next));
            tracing::debug!(id = next, %section, %title, "assigned event id");
            assigned.push(AssignedId {
                id: EventId(next),
                section,
                title,
            });
            next = next.saturating_add(1);
        }
    }
    Ok(assigned)
}

fn records(document: &Mapping) -> impl Iterator<Item = &Mapping> {
    Section::LOOKUP_ORDER
        .into_iter()
        .filter_map(|section| document.get(section.as_str()))
        .filter_map(Value::as_sequence)
        .flatten()
        .filter_map(Value::as_mapping)
}

fn read_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
