//! Section membership and event lifecycle.
//!
//! Every mutation here keeps three invariants:
//! - an event sits in exactly one section sequence (moves are
//!   remove-then-insert, never copies)
//! - the event's [`EventKind`] matches its section
//! - `updates` stays sorted newest first
//!
//! Validation runs before anything is touched, so an error leaves the
//! collection unchanged.

use crate::collection::EventCollection;
use crate::event::{Event, EventId, EventKind, Incident, Section, ShapeError, Status, Update};
use crate::ids::next_id;
use serde_yaml::Mapping;
use std::collections::BTreeMap;

/// Errors raised by section operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SectionError {
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    #[error("event {id} is not in section {section}")]
    NotInSection { id: EventId, section: Section },

    #[error("no event id left to allocate")]
    IdsExhausted,

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Section-dependent fields as submitted by an editor.
///
/// `None` means the field was not submitted. For `start` and `closed` an
/// empty string means "submitted, but cleared" and is stored as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeFields {
    pub system_status: Option<String>,
    pub user_impact: Option<String>,
    pub start: Option<String>,
    pub closed: Option<String>,
}

/// Build the event kind for `section` from submitted fields.
///
/// For `info` the incident fields are dropped and the event becomes an
/// always-operational notice. Every other section requires `start`,
/// `system_status` and `user_impact`; the status is taken directly from
/// `user_impact`.
pub fn apply_section_shape(fields: ShapeFields, section: Section) -> Result<EventKind, ShapeError> {
    if section.is_info() {
        return Ok(EventKind::Notice);
    }

    let missing = |field: &'static str| ShapeError::MissingRequiredField {
        id: None,
        section,
        field,
    };
    let start = fields.start.ok_or_else(|| missing("start"))?;
    let system_status = fields.system_status.ok_or_else(|| missing("system_status"))?;
    let user_impact = fields.user_impact.ok_or_else(|| missing("user_impact"))?;

    Ok(EventKind::Incident(Incident {
        status: status_from_impact(&user_impact)?,
        system_status,
        user_impact,
        start: non_empty(start),
        keep_null_closed: fields.closed.is_some(),
        closed: fields.closed.and_then(non_empty),
        keep_null_start: true,
    }))
}

/// Reshape an existing event for `section`, overlaying submitted fields.
///
/// An incident staying outside `info` keeps every field that was not
/// submitted, its status included: the status is re-derived only from a
/// submitted `user_impact`. Notices and moves into `info` go through
/// [`apply_section_shape`].
pub(crate) fn reshape_kind(
    current: &EventKind,
    submitted: ShapeFields,
    section: Section,
) -> Result<EventKind, ShapeError> {
    let EventKind::Incident(incident) = current else {
        return apply_section_shape(submitted, section);
    };
    if section.is_info() {
        return Ok(EventKind::Notice);
    }

    let mut incident = incident.clone();
    if let Some(user_impact) = submitted.user_impact {
        incident.status = status_from_impact(&user_impact)?;
        incident.user_impact = user_impact;
    }
    if let Some(system_status) = submitted.system_status {
        incident.system_status = system_status;
    }
    if let Some(start) = submitted.start {
        incident.start = non_empty(start);
        incident.keep_null_start = true;
    }
    if let Some(closed) = submitted.closed {
        incident.closed = non_empty(closed);
        incident.keep_null_closed = true;
    }
    Ok(EventKind::Incident(incident))
}

fn status_from_impact(user_impact: &str) -> Result<Status, ShapeError> {
    user_impact
        .parse()
        .map_err(|_| ShapeError::InvalidStatus(user_impact.to_string()))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Move an event between sections, keeping its incident fields.
///
/// The event is removed from `from` and appended to `to`. Moving into
/// `info` truncates it to a notice. Moving a notice out of `info` needs
/// incident fields and fails with `MissingRequiredField`; use
/// [`move_section_with`] to supply them.
pub fn move_section(
    collection: &mut EventCollection,
    id: EventId,
    from: Section,
    to: Section,
) -> Result<(), SectionError> {
    move_section_with(collection, id, from, to, None)
}

/// Move an event between sections, reshaping it with `fields` when given.
pub fn move_section_with(
    collection: &mut EventCollection,
    id: EventId,
    from: Section,
    to: Section,
    fields: Option<ShapeFields>,
) -> Result<(), SectionError> {
    let index = position_in(collection, id, from)?;
    let current = &collection.section(from)[index];

    let kind = match (fields, &current.kind) {
        (Some(fields), kind) => reshape_kind(kind, fields, to).map_err(|e| with_id(e, id))?,
        (None, _) if to.is_info() => EventKind::Notice,
        (None, EventKind::Incident(_)) => current.kind.clone(),
        (None, EventKind::Notice) => apply_section_shape(ShapeFields::default(), to)
            .map_err(|e| with_id(e, id))?,
    };

    if from == to {
        collection.section_mut(from)[index].kind = kind;
        return Ok(());
    }

    let mut event = collection.section_mut(from).remove(index);
    event.kind = kind;
    collection.section_mut(to).push(event);
    tracing::debug!(%id, %from, %to, "moved event between sections");
    Ok(())
}

fn with_id(error: ShapeError, id: EventId) -> ShapeError {
    match error {
        ShapeError::MissingRequiredField { section, field, .. } => {
            ShapeError::MissingRequiredField {
                id: Some(id),
                section,
                field,
            }
        }
        other => other,
    }
}

fn position_in(
    collection: &EventCollection,
    id: EventId,
    section: Section,
) -> Result<usize, SectionError> {
    collection
        .section(section)
        .iter()
        .rposition(|event| event.id == id)
        .ok_or_else(|| {
            if collection.find(id).is_some() {
                SectionError::NotInSection { id, section }
            } else {
                SectionError::EventNotFound(id)
            }
        })
}

/// Replace the event at `index` of `from`, relocating it when `to` differs.
///
/// Relocation appends to the target section, like [`move_section`].
pub(crate) fn replace_event(
    collection: &mut EventCollection,
    from: Section,
    index: usize,
    to: Section,
    event: Event,
) {
    if from == to {
        collection.section_mut(from)[index] = event;
    } else {
        collection.section_mut(from).remove(index);
        collection.section_mut(to).push(event);
    }
}

/// A new event before it has an id.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: String,
    pub body: String,
    pub products: Vec<String>,
    pub fields: ShapeFields,
    pub updates: Vec<Update>,
}

/// Allocate an id for `draft`, shape it for `section` and prepend it.
///
/// New events go to the front so each section reads newest first; the
/// status aggregator relies on that order.
pub fn create_event(
    collection: &mut EventCollection,
    section: Section,
    draft: EventDraft,
) -> Result<EventId, SectionError> {
    let kind = apply_section_shape(draft.fields, section)?;
    let id = next_id(collection).ok_or(SectionError::IdsExhausted)?;

    let mut updates = draft.updates;
    sort_updates(&mut updates);

    collection.section_mut(section).insert(
        0,
        Event {
            id,
            title: draft.title,
            body: draft.body,
            products: draft.products,
            updates,
            kind,
            extra: Mapping::new(),
        },
    );
    tracing::debug!(%id, %section, "created event");
    Ok(id)
}

/// Remove an event from whichever section holds it.
pub fn delete_event(
    collection: &mut EventCollection,
    id: EventId,
) -> Result<(Section, Event), SectionError> {
    let (section, index) = collection.find(id).ok_or(SectionError::EventNotFound(id))?;
    let event = collection.section_mut(section).remove(index);
    tracing::debug!(%id, %section, "deleted event");
    Ok((section, event))
}

/// Attach one update to an event, keeping newest-first order.
pub fn add_update(
    collection: &mut EventCollection,
    id: EventId,
    update: Update,
) -> Result<(), SectionError> {
    let event = collection
        .event_mut(id)
        .ok_or(SectionError::EventNotFound(id))?;
    event.updates.push(update);
    sort_updates(&mut event.updates);
    Ok(())
}

/// Sort updates newest first.
///
/// Plain string order is chronological for the fixed-width stored format.
/// The sort is stable, so updates with equal times keep their relative
/// order.
pub fn sort_updates(updates: &mut [Update]) {
    updates.sort_by(|a, b| b.time.cmp(&a.time));
}

/// Rebuild an update list from submitted form entries.
///
/// Entries are keyed `{prefix}_title`, `{prefix}_time` and `{prefix}_body`;
/// the prefix is opaque and only groups the three parts of one update.
/// Keys with any other suffix are ignored, and a missing part reads as
/// empty. `new_update` is appended before the list is sorted newest first.
pub fn reconcile_updates<I, K, V>(entries: I, new_update: Option<Update>) -> Vec<Update>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut grouped: BTreeMap<String, Update> = BTreeMap::new();
    for (key, value) in entries {
        let key = key.as_ref();
        let (prefix, part) = if let Some(prefix) = key.strip_suffix("_title") {
            (prefix, UpdatePart::Title)
        } else if let Some(prefix) = key.strip_suffix("_time") {
            (prefix, UpdatePart::Time)
        } else if let Some(prefix) = key.strip_suffix("_body") {
            (prefix, UpdatePart::Body)
        } else {
            continue;
        };

        let update = grouped.entry(prefix.to_string()).or_default();
        let value = value.into();
        match part {
            UpdatePart::Title => update.title = value,
            UpdatePart::Time => update.time = value,
            UpdatePart::Body => update.body = value,
        }
    }

    let mut updates: Vec<Update> = grouped.into_values().collect();
    updates.extend(new_update);
    sort_updates(&mut updates);
    updates
}

enum UpdatePart {
    Title,
    Time,
    Body,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::tests::{incident, notice};
    use crate::event::Status;

    fn sample() -> EventCollection {
        EventCollection::from_sections(
            vec![incident(3, "Outage", Status::Outage, &["web"])],
            vec![incident(2, "Window", Status::Maintenance, &["dns"])],
            vec![],
            vec![notice(1, "Welcome")],
        )
        .expect("collection should build")
    }

    fn occurrences(collection: &EventCollection, id: EventId) -> usize {
        collection.events().filter(|(_, e)| e.id == id).count()
    }

    fn full_fields(impact: &str) -> ShapeFields {
        ShapeFields {
            system_status: Some("down".to_string()),
            user_impact: Some(impact.to_string()),
            start: Some("2024-01-01 10:00".to_string()),
            closed: None,
        }
    }

    #[test]
    fn move_section_appends_and_keeps_event_exclusive() {
        let mut collection = sample();
        collection
            .section_mut(Section::Past)
            .push(incident(9, "Older", Status::Operational, &[]));

        move_section(&mut collection, EventId(3), Section::Current, Section::Past)
            .expect("move should succeed");

        assert!(collection.section(Section::Current).is_empty());
        let past: Vec<u64> = collection
            .section(Section::Past)
            .iter()
            .map(|e| e.id.0)
            .collect();
        assert_eq!(past, vec![9, 3]);
        assert_eq!(occurrences(&collection, EventId(3)), 1);
        assert_eq!(collection.section_of(EventId(3)), Some(Section::Past));
    }

    #[test]
    fn move_into_info_truncates_to_notice() {
        let mut collection = sample();
        move_section(&mut collection, EventId(3), Section::Current, Section::Info)
            .expect("move should succeed");

        let event = collection.event(EventId(3)).expect("event must exist");
        assert_eq!(event.kind, EventKind::Notice);
        assert_eq!(event.status(), Status::Operational);
        assert_eq!(event.start(), None);
    }

    #[test]
    fn move_out_of_info_requires_incident_fields() {
        let mut collection = sample();
        let before = collection.clone();

        let err = move_section(&mut collection, EventId(1), Section::Info, Section::Current)
            .expect_err("notice has no incident fields");
        assert_eq!(
            err,
            SectionError::Shape(ShapeError::MissingRequiredField {
                id: Some(EventId(1)),
                section: Section::Current,
                field: "start",
            })
        );
        assert_eq!(collection, before);

        move_section_with(
            &mut collection,
            EventId(1),
            Section::Info,
            Section::Current,
            Some(full_fields("degraded")),
        )
        .expect("move with fields should succeed");
        let event = collection.event(EventId(1)).expect("event must exist");
        assert_eq!(event.status(), Status::Degraded);
        assert_eq!(collection.section_of(EventId(1)), Some(Section::Current));
    }

    #[test]
    fn move_with_fields_keeps_status_unless_impact_submitted() {
        let mut collection = sample();
        let stored = &mut collection.section_mut(Section::Current)[0];
        if let EventKind::Incident(incident) = &mut stored.kind {
            incident.user_impact = "Mail is slow".to_string();
        }

        move_section_with(
            &mut collection,
            EventId(3),
            Section::Current,
            Section::Past,
            Some(ShapeFields {
                closed: Some("2024-01-02 09:00".to_string()),
                ..ShapeFields::default()
            }),
        )
        .expect("move should keep the stored status");

        let event = collection.event(EventId(3)).expect("event must exist");
        assert_eq!(event.status(), Status::Outage);
        assert_eq!(event.closed(), Some("2024-01-02 09:00"));
        assert_eq!(
            event.kind.incident().map(|i| i.user_impact.as_str()),
            Some("Mail is slow")
        );
    }

    #[test]
    fn create_event_fails_when_ids_run_out() {
        let mut collection = sample();
        collection.section_mut(Section::Info).push(notice(u64::MAX, "Last"));
        let before = collection.clone();

        let err = create_event(
            &mut collection,
            Section::Info,
            EventDraft {
                title: "One too many".to_string(),
                ..Default::default()
            },
        )
        .expect_err("no id left");
        assert_eq!(err, SectionError::IdsExhausted);
        assert_eq!(collection, before);
    }

    #[test]
    fn move_from_wrong_section_is_rejected() {
        let mut collection = sample();
        let err = move_section(&mut collection, EventId(3), Section::Planned, Section::Past)
            .expect_err("event 3 is in current");
        assert_eq!(
            err,
            SectionError::NotInSection {
                id: EventId(3),
                section: Section::Planned,
            }
        );

        let err = move_section(&mut collection, EventId(42), Section::Current, Section::Past)
            .expect_err("unknown id");
        assert_eq!(err, SectionError::EventNotFound(EventId(42)));
    }

    #[test]
    fn apply_section_shape_for_info_drops_incident_fields() {
        let kind = apply_section_shape(full_fields("outage"), Section::Info)
            .expect("info shape never fails");
        assert_eq!(kind, EventKind::Notice);
    }

    #[test]
    fn apply_section_shape_requires_fields_outside_info() {
        let mut fields = full_fields("outage");
        fields.user_impact = None;
        let err = apply_section_shape(fields, Section::Planned).expect_err("missing user_impact");
        assert_eq!(
            err,
            ShapeError::MissingRequiredField {
                id: None,
                section: Section::Planned,
                field: "user_impact",
            }
        );
    }

    #[test]
    fn apply_section_shape_takes_status_from_user_impact() {
        let kind = apply_section_shape(full_fields("critical"), Section::Current)
            .expect("shape should succeed");
        let incident = kind.incident().expect("incident kind");
        assert_eq!(incident.status, Status::Critical);
        assert_eq!(incident.start.as_deref(), Some("2024-01-01 10:00"));

        let err = apply_section_shape(full_fields("sort of ok"), Section::Current)
            .expect_err("free-form impact outside the vocabulary");
        assert_eq!(err, ShapeError::InvalidStatus("sort of ok".to_string()));
    }

    #[test]
    fn empty_start_is_stored_as_null() {
        let mut fields = full_fields("outage");
        fields.start = Some("  ".to_string());
        let kind = apply_section_shape(fields, Section::Current).expect("shape should succeed");
        assert_eq!(kind.incident().and_then(|i| i.start.clone()), None);
    }

    #[test]
    fn create_event_allocates_and_prepends() {
        let mut collection = sample();
        let id = create_event(
            &mut collection,
            Section::Current,
            EventDraft {
                title: "New outage".to_string(),
                products: vec!["web".to_string()],
                fields: full_fields("degraded"),
                ..Default::default()
            },
        )
        .expect("create should succeed");

        assert_eq!(id, EventId(4));
        assert_eq!(collection.section(Section::Current)[0].id, id);
        assert_eq!(collection.section(Section::Current).len(), 2);
    }

    #[test]
    fn delete_event_removes_from_its_section() {
        let mut collection = sample();
        let (section, event) = delete_event(&mut collection, EventId(2)).expect("delete");
        assert_eq!(section, Section::Planned);
        assert_eq!(event.title, "Window");
        assert!(collection.event(EventId(2)).is_none());
    }

    #[test]
    fn add_update_keeps_descending_order() {
        let mut collection = sample();
        for time in ["2024-01-01 10:00", "2024-01-01 12:00", "2024-01-01 11:00"] {
            add_update(&mut collection, EventId(3), Update::new("note", time, ""))
                .expect("update should attach");
        }
        let times: Vec<&str> = collection
            .event(EventId(3))
            .expect("event must exist")
            .updates
            .iter()
            .map(|u| u.time.as_str())
            .collect();
        assert_eq!(
            times,
            vec!["2024-01-01 12:00", "2024-01-01 11:00", "2024-01-01 10:00"]
        );
    }

    #[test]
    fn reconcile_updates_groups_by_prefix_and_sorts() {
        let entries = vec![
            ("update-1_title", "Investigating"),
            ("update-1_time", "2024-01-01 10:00"),
            ("update-1_body", "Looking"),
            ("update-2_time", "2024-01-01 12:00"),
            ("update-2_title", "Resolved"),
            ("update-2_body", "Fixed"),
            ("csrf_token", "ignored"),
        ];
        let updates = reconcile_updates(
            entries,
            Some(Update::new("Identified", "2024-01-01 11:00", "Cause known")),
        );

        let titles: Vec<&str> = updates.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, vec!["Resolved", "Identified", "Investigating"]);
        for pair in updates.windows(2) {
            assert!(pair[0].time >= pair[1].time);
        }
    }

    #[test]
    fn reconcile_updates_tolerates_partial_groups() {
        let updates = reconcile_updates(vec![("a_title", "Only a title")], None);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].time, "");
        assert_eq!(updates[0].body, "");
    }
}
