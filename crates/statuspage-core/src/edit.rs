//! Editor-facing mutation boundary.
//!
//! An edit arrives as a flat list of submitted form fields together with an
//! authorization decision made by the caller. The core keeps no identity
//! state of its own: whoever serves the form decides who the editor is and
//! whether they may edit, and passes that decision in.

use crate::collection::EventCollection;
use crate::event::{EventId, Section, ShapeError, Update};
use crate::section::{ShapeFields, reconcile_updates, replace_event, reshape_kind, sort_updates};
use serde::Serialize;

/// Prefix of form keys that carry existing updates (`update-<n>_title`, ...).
pub const UPDATE_KEY_PREFIX: &str = "update-";
/// Prefix of form keys for the optional new update.
pub const NEW_UPDATE_KEY_PREFIX: &str = "new_update";

/// Outcome of an authorization check, made outside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Granted { editor: String },
    Denied { reason: String },
}

impl Authorization {
    pub fn granted(editor: impl Into<String>) -> Self {
        Authorization::Granted {
            editor: editor.into(),
        }
    }

    /// Grant `editor` when it appears in `allowed`.
    pub fn from_allow_list(editor: Option<&str>, allowed: &[String]) -> Self {
        match editor.map(str::trim) {
            None | Some("") => Authorization::Denied {
                reason: "no editor identity".to_string(),
            },
            Some(editor) if allowed.iter().any(|a| a == editor) => Self::granted(editor),
            Some(editor) => Authorization::Denied {
                reason: format!("{editor} is not an allowed editor"),
            },
        }
    }

    pub fn editor(&self) -> Option<&str> {
        match self {
            Authorization::Granted { editor } => Some(editor),
            Authorization::Denied { .. } => None,
        }
    }
}

/// Errors raised while applying an edit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("event not found: {0}")]
    EventNotFound(EventId),

    #[error("invalid value for `{field}`: {value:?}")]
    InvalidField { field: String, value: String },

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// A submitted edit form. Absent fields keep the event's current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventForm {
    pub title: Option<String>,
    pub body: Option<String>,
    pub section: Option<Section>,
    pub products: Option<Vec<String>>,
    pub fields: ShapeFields,
    /// `update-<n>_{title,time,body}` entries. When present they replace
    /// the stored update list.
    pub update_entries: Vec<(String, String)>,
    pub new_update: Option<Update>,
}

impl EventForm {
    /// Parse submitted `(key, value)` pairs.
    ///
    /// `products` may repeat and each value may hold a comma-separated
    /// list. Unknown keys are ignored. A new update is only recorded when
    /// its title or body is non-empty.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, EditError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut form = EventForm::default();
        let mut new_update = Update::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value: String = value.into();
            match key {
                "title" => form.title = Some(value),
                "body" => form.body = Some(value),
                "section" => {
                    let section = value.parse().map_err(|_| EditError::InvalidField {
                        field: key.to_string(),
                        value: value.clone(),
                    })?;
                    form.section = Some(section);
                }
                "products" => form.products.get_or_insert_with(Vec::new).extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                ),
                "system_status" => form.fields.system_status = Some(value),
                "user_impact" => form.fields.user_impact = Some(value),
                "start" => form.fields.start = Some(value),
                "closed" => form.fields.closed = Some(value),
                "new_update_title" => new_update.title = value,
                "new_update_time" => new_update.time = value,
                "new_update_body" => new_update.body = value,
                _ if key.starts_with(UPDATE_KEY_PREFIX) => {
                    form.update_entries.push((key.to_string(), value))
                }
                _ => {}
            }
        }

        if !new_update.title.trim().is_empty() || !new_update.body.trim().is_empty() {
            form.new_update = Some(new_update);
        }
        Ok(form)
    }
}

/// What an applied edit changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    pub id: EventId,
    pub editor: String,
    pub section: Section,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved_from: Option<Section>,
    pub updates: usize,
}

/// Apply a submitted form to one event.
///
/// The event is reshaped for its (possibly new) section; outside `info`
/// a submitted `user_impact` sets its status, otherwise the status is
/// kept. Moving to another section appends the event there. Nothing is changed unless every check passes.
pub fn apply_form(
    collection: &mut EventCollection,
    id: EventId,
    form: EventForm,
    authorization: &Authorization,
) -> Result<EditOutcome, EditError> {
    let editor = match authorization {
        Authorization::Granted { editor } => editor.clone(),
        Authorization::Denied { reason } => return Err(EditError::Unauthorized(reason.clone())),
    };

    let (from, index) = collection.find(id).ok_or(EditError::EventNotFound(id))?;
    let to = form.section.unwrap_or(from);
    let mut event = collection.section(from)[index].clone();

    event.kind = match reshape_kind(&event.kind, form.fields, to) {
        Ok(kind) => kind,
        Err(ShapeError::MissingRequiredField { section, field, .. }) => {
            return Err(EditError::Shape(ShapeError::MissingRequiredField {
                id: Some(id),
                section,
                field,
            }));
        }
        Err(other) => return Err(other.into()),
    };

    if let Some(title) = form.title {
        event.title = title;
    }
    if let Some(body) = form.body {
        event.body = body;
    }
    if let Some(products) = form.products {
        event.products = products;
    }

    if form.update_entries.is_empty() {
        event.updates.extend(form.new_update);
        sort_updates(&mut event.updates);
    } else {
        event.updates = reconcile_updates(form.update_entries, form.new_update);
    }
    let updates = event.updates.len();

    replace_event(collection, from, index, to, event);
    tracing::info!(%id, %editor, section = %to, "applied event edit");

    Ok(EditOutcome {
        id,
        editor,
        section: to,
        moved_from: (from != to).then_some(from),
        updates,
    })
}
