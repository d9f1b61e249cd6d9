//! Canonical in-memory representation of the status document.
//!
//! This is the memory boundary for `statuspage-core`:
//! - four ordered section sequences, newest event first
//! - top-level keys the model does not own, kept for round-trips
//! - id lookup across all sections

use crate::event::{Event, EventId, Section, ShapeError};
use serde_yaml::Mapping;

/// All events of one status document, grouped by section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCollection {
    current: Vec<Event>,
    planned: Vec<Event>,
    past: Vec<Event>,
    info: Vec<Event>,
    extra: Mapping,
}

impl EventCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from fully-materialized sections.
    ///
    /// Every event must have the shape of the section it is placed in.
    pub fn from_sections(
        current: Vec<Event>,
        planned: Vec<Event>,
        past: Vec<Event>,
        info: Vec<Event>,
    ) -> Result<Self, ShapeError> {
        let collection = Self {
            current,
            planned,
            past,
            info,
            extra: Mapping::new(),
        };
        for (section, event) in collection.events() {
            if !event.kind.fits(section) {
                return Err(ShapeError::SectionMismatch {
                    id: event.id,
                    section,
                });
            }
        }
        Ok(collection)
    }

    pub(crate) fn with_extra(mut self, extra: Mapping) -> Self {
        self.extra = extra;
        self
    }

    /// Events of one section in stored order.
    pub fn section(&self, section: Section) -> &[Event] {
        match section {
            Section::Current => &self.current,
            Section::Planned => &self.planned,
            Section::Past => &self.past,
            Section::Info => &self.info,
        }
    }

    pub(crate) fn section_mut(&mut self, section: Section) -> &mut Vec<Event> {
        match section {
            Section::Current => &mut self.current,
            Section::Planned => &mut self.planned,
            Section::Past => &mut self.past,
            Section::Info => &mut self.info,
        }
    }

    /// Iterate every event with its section, in document order.
    pub fn events(&self) -> impl Iterator<Item = (Section, &Event)> {
        Section::ALL.into_iter().flat_map(move |section| {
            self.section(section)
                .iter()
                .map(move |event| (section, event))
        })
    }

    /// Top-level document keys other than the four sections.
    pub fn extra(&self) -> &Mapping {
        &self.extra
    }

    /// Total number of events in all sections.
    pub fn len(&self) -> usize {
        Section::ALL.iter().map(|s| self.section(*s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locate an event by id.
    ///
    /// Sections are scanned in [`Section::LOOKUP_ORDER`] and the last match
    /// wins, so a duplicated id in a hand-edited document resolves to one
    /// deterministic event. Duplicates are reported by
    /// [`crate::ids::duplicate_ids`], not repaired here.
    pub fn find(&self, id: EventId) -> Option<(Section, usize)> {
        let mut found = None;
        for section in Section::LOOKUP_ORDER {
            if let Some(index) = self.section(section).iter().rposition(|e| e.id == id) {
                found = Some((section, index));
            }
        }
        found
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.find(id)
            .map(|(section, index)| &self.section(section)[index])
    }

    pub fn event_mut(&mut self, id: EventId) -> Option<&mut Event> {
        let (section, index) = self.find(id)?;
        self.section_mut(section).get_mut(index)
    }

    pub fn section_of(&self, id: EventId) -> Option<Section> {
        self.find(id).map(|(section, _)| section)
    }

    /// Count of events per section, in document order.
    pub fn counts(&self) -> [(Section, usize); 4] {
        Section::ALL.map(|section| (section, self.section(section).len()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::event::{EventKind, Incident, Status};

    pub(crate) fn incident(id: u64, title: &str, status: Status, products: &[&str]) -> Event {
        Event {
            id: EventId(id),
            title: title.to_string(),
            body: String::new(),
            products: products.iter().map(|p| p.to_string()).collect(),
            updates: Vec::new(),
            kind: EventKind::Incident(Incident {
                status,
                system_status: status.as_str().to_string(),
                user_impact: status.as_str().to_string(),
                ..Incident::default()
            }),
            extra: Mapping::new(),
        }
    }

    pub(crate) fn notice(id: u64, title: &str) -> Event {
        Event {
            id: EventId(id),
            title: title.to_string(),
            body: String::new(),
            products: Vec::new(),
            updates: Vec::new(),
            kind: EventKind::Notice,
            extra: Mapping::new(),
        }
    }

    #[test]
    fn from_sections_rejects_misplaced_shapes() {
        let err = EventCollection::from_sections(vec![notice(1, "Notice")], vec![], vec![], vec![])
            .expect_err("notice in current must be rejected");
        assert_eq!(
            err,
            ShapeError::SectionMismatch {
                id: EventId(1),
                section: Section::Current,
            }
        );
    }

    #[test]
    fn find_scans_all_sections() {
        let collection = EventCollection::from_sections(
            vec![incident(4, "Now", Status::Outage, &["web"])],
            vec![incident(3, "Later", Status::Maintenance, &["dns"])],
            vec![incident(2, "Before", Status::Degraded, &["web"])],
            vec![notice(1, "Hello")],
        )
        .expect("collection should build");

        assert_eq!(collection.section_of(EventId(1)), Some(Section::Info));
        assert_eq!(collection.section_of(EventId(3)), Some(Section::Planned));
        assert_eq!(collection.section_of(EventId(9)), None);
        assert_eq!(collection.len(), 4);
    }

    #[test]
    fn duplicate_ids_resolve_to_last_lookup_section() {
        let collection = EventCollection::from_sections(
            vec![incident(7, "In current", Status::Outage, &[])],
            vec![],
            vec![incident(7, "In past", Status::Operational, &[])],
            vec![],
        )
        .expect("collection should build");

        let event = collection.event(EventId(7)).expect("event must resolve");
        assert_eq!(event.title, "In current");
    }
}
