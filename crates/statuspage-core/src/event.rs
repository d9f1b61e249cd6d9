//! Event type: the primary record of the status catalog.
//!
//! An event lives in exactly one [`Section`]. Which fields it carries
//! depends on that section, so the shape is an explicit union:
//! [`EventKind::Incident`] for `current`/`planned`/`past`, and
//! [`EventKind::Notice`] for `info`. The `info` truncation happens once,
//! when a stored record is converted into an [`Event`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;

/// Lifecycle bucket an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Current,
    Planned,
    Past,
    Info,
}

impl Section {
    /// Document order of the four section keys.
    pub const ALL: [Section; 4] = [
        Section::Current,
        Section::Planned,
        Section::Past,
        Section::Info,
    ];

    /// Scan order for id lookup and id assignment. Later sections win
    /// when a hand-edited document repeats an id.
    pub const LOOKUP_ORDER: [Section; 4] = [
        Section::Past,
        Section::Planned,
        Section::Info,
        Section::Current,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Current => "current",
            Section::Planned => "planned",
            Section::Past => "past",
            Section::Info => "info",
        }
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Section::Info)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s.trim())
            .ok_or_else(|| UnknownVariant::new("section", s))
    }
}

/// Service status vocabulary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Operational,
    Degraded,
    Outage,
    Critical,
    Maintenance,
}

impl Status {
    /// Every status in the order editors are offered them.
    pub const ALL: [Status; 5] = [
        Status::Operational,
        Status::Degraded,
        Status::Outage,
        Status::Critical,
        Status::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Operational => "operational",
            Status::Degraded => "degraded",
            Status::Outage => "outage",
            Status::Critical => "critical",
            Status::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownVariant::new("status", s))
    }
}

/// A string that is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Event identifier, unique across all four sections.
///
/// Documents written by loose loaders may quote ids (`id: '12'`); both
/// forms are accepted, and ids are always written back as integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(EventId)
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(EventId(n)),
            RawId::Text(text) => text
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid event id: {text:?}"))),
        }
    }
}

/// One timestamped progress note attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default, deserialize_with = "loose::text")]
    pub title: String,
    #[serde(default, deserialize_with = "loose::text")]
    pub time: String,
    #[serde(default, deserialize_with = "loose::text")]
    pub body: String,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Update {
    pub fn new(
        title: impl Into<String>,
        time: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            time: time.into(),
            body: body.into(),
            extra: Mapping::new(),
        }
    }
}

/// Fields carried by events outside the `info` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Incident {
    pub status: Status,
    pub system_status: String,
    pub user_impact: String,
    pub start: Option<String>,
    pub closed: Option<String>,
    /// Write `start: null` when `start` is unset instead of leaving the key out.
    pub keep_null_start: bool,
    /// Same for `closed`.
    pub keep_null_closed: bool,
}

/// Section-dependent part of an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `current`, `planned` and `past` events.
    Incident(Incident),
    /// `info` events: no start, classifiers or closing time; always
    /// operational.
    Notice,
}

impl EventKind {
    pub fn incident(&self) -> Option<&Incident> {
        match self {
            EventKind::Incident(incident) => Some(incident),
            EventKind::Notice => None,
        }
    }

    /// Whether this shape is allowed in `section`.
    pub fn fits(&self, section: Section) -> bool {
        matches!(self, EventKind::Notice) == section.is_info()
    }
}

/// A status event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub body: String,
    pub products: Vec<String>,
    /// Newest first.
    pub updates: Vec<Update>,
    pub kind: EventKind,
    /// Keys this model does not own, preserved across load/save.
    pub extra: Mapping,
}

impl Event {
    /// Effective status: `operational` for notices.
    pub fn status(&self) -> Status {
        match &self.kind {
            EventKind::Incident(incident) => incident.status,
            EventKind::Notice => Status::Operational,
        }
    }

    pub fn start(&self) -> Option<&str> {
        self.kind.incident().and_then(|i| i.start.as_deref())
    }

    pub fn closed(&self) -> Option<&str> {
        self.kind.incident().and_then(|i| i.closed.as_deref())
    }

    pub fn touches(&self, product: &str) -> bool {
        self.products.iter().any(|p| p == product)
    }

    /// Convert a stored record into an event of `section`.
    ///
    /// For `info` the record's `start`, `system_status` and `user_impact`
    /// are dropped and the status is forced to operational; a `closed` value
    /// is kept untouched among the extra keys. Other sections require
    /// `system_status` and `user_impact`; `start` and `closed` may be absent
    /// or null.
    pub(crate) fn from_record(record: EventRecord, section: Section) -> Result<Self, ShapeError> {
        let mut extra = record.extra;
        let kind = if section.is_info() {
            if let Some(Some(closed)) = record.closed {
                extra.insert(Value::from("closed"), Value::from(closed));
            }
            EventKind::Notice
        } else {
            let system_status = record.system_status.ok_or(ShapeError::MissingRequiredField {
                id: Some(record.id),
                section,
                field: "system_status",
            })?;
            let user_impact = record.user_impact.ok_or(ShapeError::MissingRequiredField {
                id: Some(record.id),
                section,
                field: "user_impact",
            })?;
            EventKind::Incident(Incident {
                status: record.status.unwrap_or_default(),
                system_status,
                user_impact,
                keep_null_start: record.start.is_some(),
                keep_null_closed: record.closed.is_some(),
                start: record.start.flatten(),
                closed: record.closed.flatten(),
            })
        };

        Ok(Self {
            id: record.id,
            title: record.title,
            body: record.body,
            products: record.products,
            updates: record.updates,
            kind,
            extra,
        })
    }

    pub(crate) fn to_record(&self) -> EventRecord {
        let mut record = EventRecord {
            id: self.id,
            title: self.title.clone(),
            body: self.body.clone(),
            status: Some(self.status()),
            system_status: None,
            user_impact: None,
            products: self.products.clone(),
            start: None,
            closed: None,
            updates: self.updates.clone(),
            extra: self.extra.clone(),
        };
        if let EventKind::Incident(incident) = &self.kind {
            record.system_status = Some(incident.system_status.clone());
            record.user_impact = Some(incident.user_impact.clone());
            record.start = nullable_key(&incident.start, incident.keep_null_start);
            record.closed = nullable_key(&incident.closed, incident.keep_null_closed);
        }
        record
    }
}

fn nullable_key(value: &Option<String>, keep_null: bool) -> Option<Option<String>> {
    match value {
        Some(value) => Some(Some(value.clone())),
        None => keep_null.then_some(None),
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

/// Shape violations raised while building or editing events.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("{section} event{} is missing required field `{field}`", describe_id(.id))]
    MissingRequiredField {
        id: Option<EventId>,
        section: Section,
        field: &'static str,
    },

    #[error("invalid status {0:?}; expected one of operational, degraded, outage, critical, maintenance")]
    InvalidStatus(String),

    #[error("event {id} does not have the shape of section {section}")]
    SectionMismatch { id: EventId, section: Section },
}

fn describe_id(id: &Option<EventId>) -> String {
    id.map(|id| format!(" {id}")).unwrap_or_default()
}

/// Stored form of an event, one entry of a section sequence.
///
/// Nullable timestamps use `Option<Option<_>>`: the outer level is key
/// presence, the inner level is null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EventRecord {
    pub id: EventId,
    #[serde(deserialize_with = "loose::text")]
    pub title: String,
    #[serde(default, deserialize_with = "loose::text")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(
        default,
        deserialize_with = "loose::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_status: Option<String>,
    #[serde(
        default,
        deserialize_with = "loose::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_impact: Option<String>,
    #[serde(
        default,
        deserialize_with = "loose::text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub products: Vec<String>,
    #[serde(
        default,
        deserialize_with = "loose::nullable_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "loose::nullable_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub closed: Option<Option<String>>,
    #[serde(default, deserialize_with = "loose::sequence")]
    pub updates: Vec<Update>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Lenient scalar readers.
///
/// Hand-written YAML turns `title: 2024` or `products: [443]` into numbers;
/// every text field accepts any scalar and keeps its textual form.
pub(crate) mod loose {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(i64),
        Unsigned(u64),
        Float(f64),
        Bool(bool),
    }

    impl Scalar {
        fn into_text(self) -> String {
            match self {
                Scalar::Text(text) => text,
                Scalar::Integer(n) => n.to_string(),
                Scalar::Unsigned(n) => n.to_string(),
                Scalar::Float(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    /// Text field; null reads as empty.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(Option::<Scalar>::deserialize(deserializer)?
            .map(Scalar::into_text)
            .unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
    }

    /// Present-but-null reads as `Some(None)`; absence is handled by
    /// `#[serde(default)]`.
    pub fn nullable_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<String>>, D::Error> {
        optional_text(deserializer).map(Some)
    }

    pub fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Vec<Scalar>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(Scalar::into_text)
            .collect())
    }

    /// Sequence field; null reads as empty.
    pub fn sequence<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }
}
