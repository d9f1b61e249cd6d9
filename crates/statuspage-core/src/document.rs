//! YAML document storage: four top-level section sequences.
//!
//! The document is the single source of truth edited by humans and by the
//! CLI, so saves keep it diffable: multi-line text is written as literal
//! block scalars and keys the model does not own are written back as read.

use crate::collection::EventCollection;
use crate::event::{Event, EventRecord, Section, loose};
use crate::ids::duplicate_ids;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default, Serialize, Deserialize)]
struct DocumentRecord {
    #[serde(default, deserialize_with = "loose::sequence")]
    current: Vec<EventRecord>,
    #[serde(default, deserialize_with = "loose::sequence")]
    planned: Vec<EventRecord>,
    #[serde(default, deserialize_with = "loose::sequence")]
    past: Vec<EventRecord>,
    #[serde(default, deserialize_with = "loose::sequence")]
    info: Vec<EventRecord>,
    #[serde(flatten)]
    extra: Mapping,
}

impl DocumentRecord {
    fn take(&mut self, section: Section) -> Vec<EventRecord> {
        std::mem::take(match section {
            Section::Current => &mut self.current,
            Section::Planned => &mut self.planned,
            Section::Past => &mut self.past,
            Section::Info => &mut self.info,
        })
    }
}

/// Parse a status document from YAML text.
///
/// Empty input is an empty collection. Absent or null sections are empty.
pub fn parse(text: &str) -> Result<EventCollection, DocumentError> {
    if text.trim().is_empty() {
        return Ok(EventCollection::new());
    }

    let mut record: DocumentRecord = serde_yaml::from_str(text)
        .map_err(|e| DocumentError::MalformedDocument(e.to_string()))?;

    let mut convert = |section: Section| -> Result<Vec<Event>, DocumentError> {
        record
            .take(section)
            .into_iter()
            .map(|rec| Event::from_record(rec, section))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DocumentError::MalformedDocument(e.to_string()))
    };
    let current = convert(Section::Current)?;
    let planned = convert(Section::Planned)?;
    let past = convert(Section::Past)?;
    let info = convert(Section::Info)?;

    let collection = EventCollection::from_sections(current, planned, past, info)
        .map_err(|e| DocumentError::MalformedDocument(e.to_string()))?
        .with_extra(record.extra);

    for id in duplicate_ids(&collection) {
        tracing::warn!(%id, "event id used more than once; lookups resolve to the last match");
    }
    Ok(collection)
}

/// Render a collection as YAML text.
pub fn render(collection: &EventCollection) -> Result<String, DocumentError> {
    let section = |s: Section| -> Vec<EventRecord> {
        collection.section(s).iter().map(Event::to_record).collect()
    };
    let record = DocumentRecord {
        current: section(Section::Current),
        planned: section(Section::Planned),
        past: section(Section::Past),
        info: section(Section::Info),
        extra: collection.extra().clone(),
    };
    serde_yaml::to_string(&record).map_err(|e| DocumentError::Serialize(e.to_string()))
}

/// Read a status document from a reader.
pub fn load(mut reader: impl Read) -> Result<EventCollection, DocumentError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| DocumentError::Io(e.to_string()))?;
    let text = validate_document_bytes("<reader>", &bytes)?;
    parse(text)
}

/// Write a status document to a writer.
pub fn save(collection: &EventCollection, writer: &mut impl Write) -> Result<(), DocumentError> {
    let text = render(collection)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| DocumentError::Io(e.to_string()))
}

/// Read a status document from a file path.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<EventCollection, DocumentError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| DocumentError::Io(format!("{}: {e}", path.display())))?;
    let text = validate_document_bytes(&path.display().to_string(), &bytes)?;
    let collection = parse(text).map_err(|e| match e {
        DocumentError::MalformedDocument(msg) => {
            DocumentError::MalformedDocument(format!("{}: {msg}", path.display()))
        }
        other => other,
    })?;

    let [current, planned, past, info] = collection.counts().map(|(_, n)| n);
    tracing::info!(
        path = %path.display(),
        current,
        planned,
        past,
        info,
        "loaded status document"
    );
    Ok(collection)
}

/// Write a status document to a file path, replacing it atomically.
pub fn save_to_path(collection: &EventCollection, path: impl AsRef<Path>) -> Result<(), DocumentError> {
    let path = path.as_ref();
    let text = render(collection)?;
    write_atomic(path, text.as_bytes())?;
    tracing::info!(path = %path.display(), events = collection.len(), "saved status document");
    Ok(())
}

/// Read a document as an untyped YAML mapping.
///
/// Used by maintenance passes that must run on documents the typed model
/// rejects, such as records that still lack an id.
pub fn load_raw_from_path(path: impl AsRef<Path>) -> Result<Mapping, DocumentError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| DocumentError::Io(format!("{}: {e}", path.display())))?;
    let text = validate_document_bytes(&path.display().to_string(), &bytes)?;
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }
    serde_yaml::from_str(text)
        .map_err(|e| DocumentError::MalformedDocument(format!("{}: {e}", path.display())))
}

/// Write an untyped YAML mapping, replacing the file atomically.
pub fn save_raw_to_path(document: &Mapping, path: impl AsRef<Path>) -> Result<(), DocumentError> {
    let path = path.as_ref();
    let text =
        serde_yaml::to_string(document).map_err(|e| DocumentError::Serialize(e.to_string()))?;
    write_atomic(path, text.as_bytes())
}

/// Replace `path` with `contents` via a synced temporary file and rename.
///
/// On failure the previous file, if any, is left untouched.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| DocumentError::Io(format!("{}: {e}", parent.display())))?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), DocumentError> {
        let mut file = File::create(&tmp_path)
            .map_err(|e| DocumentError::Io(format!("{}: {e}", tmp_path.display())))?;
        file.write_all(contents)
            .map_err(|e| DocumentError::Io(format!("{}: {e}", tmp_path.display())))?;
        file.sync_all()
            .map_err(|e| DocumentError::Io(format!("{}: {e}", tmp_path.display())))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DocumentError::Io(format!(
            "{} -> {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let dir = File::open(parent)
            .map_err(|e| DocumentError::Io(format!("{}: {e}", parent.display())))?;
        dir.sync_all()
            .map_err(|e| DocumentError::Io(format!("{}: {e}", parent.display())))?;
    }

    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

fn validate_document_bytes<'a>(label: &str, bytes: &'a [u8]) -> Result<&'a str, DocumentError> {
    if bytes.contains(&0) {
        return Err(DocumentError::MalformedDocument(format!(
            "{label}: contains NUL byte(s)"
        )));
    }
    std::str::from_utf8(bytes).map_err(|_| {
        DocumentError::MalformedDocument(format!("{label}: contains non-UTF-8 byte sequence(s)"))
    })
}

/// Errors from document storage.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}
