//! Lock-scoped mutation of the status document.
//!
//! The core assumes exclusive access for one load, mutate, save cycle. This
//! module provides it with a `<document>.lock` file created with
//! create-new semantics: a second writer fails fast instead of waiting.

use chrono::Utc;
use statuspage_core::{DocumentError, EventCollection, load_from_path, save_to_path};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn document_lock_path(document_path: &Path) -> PathBuf {
    let mut path: OsString = document_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("status document lock busy: {lock_path}")]
    Busy { lock_path: String },

    #[error("failed to acquire status document lock {lock_path}: {message}")]
    Io { lock_path: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LockedMutationError<E> {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Document(DocumentError),

    #[error("{0}")]
    Mutation(E),
}

impl LockError {
    fn io(lock_path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            lock_path: lock_path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Held for the duration of one mutation; the lock file is removed on drop.
pub struct DocumentLock {
    lock_path: PathBuf,
    _file: File,
}

impl DocumentLock {
    pub fn acquire(document_path: &Path) -> Result<Self, LockError> {
        let lock_path = document_lock_path(document_path);

        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| LockError::io(&lock_path, e))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                tracing::debug!(lock = %lock_path.display(), "acquired document lock");
                Ok(Self {
                    lock_path,
                    _file: file,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Err(LockError::Busy {
                lock_path: lock_path.display().to_string(),
            }),
            Err(err) => Err(LockError::io(&lock_path, err)),
        }
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Run one lock-scoped mutation against the document at `path`.
///
/// The mutator returns `(value, changed)`; the document is saved only when
/// `changed` is true, and never when the mutator fails.
pub fn mutate_document<T, E, F>(path: &Path, mutator: F) -> Result<T, LockedMutationError<E>>
where
    F: FnOnce(&mut EventCollection) -> Result<(T, bool), E>,
{
    let _lock = DocumentLock::acquire(path)?;
    let mut collection = load_from_path(path).map_err(LockedMutationError::Document)?;
    let (value, changed) = mutator(&mut collection).map_err(LockedMutationError::Mutation)?;
    if changed {
        save_to_path(&collection, path).map_err(LockedMutationError::Document)?;
    }
    Ok(value)
}
