//! Snapshot persistence
//!
//! Every file the pipeline produces is a JSON document written atomically:
//! the full document is serialized into a temporary file next to the target
//! and renamed over it, so readers never observe a partial snapshot.

use crate::corpus::Corpus;
use crate::DataError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Serializes `value` as JSON and atomically replaces `path` with it
pub fn save_json_atomic<T: Serialize>(value: &T, path: &Path) -> Result<(), DataError> {
    let write_err = |source| DataError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(write_err)?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        serde_json::to_writer(&mut writer, value)?;
        writer.flush().map_err(write_err)?;
    }

    temp_file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Reads and deserializes a JSON document
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let bytes = fs::read(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&bytes).map_err(|source| DataError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a corpus snapshot
pub fn load_corpus(path: &Path) -> Result<Corpus, DataError> {
    load_json(path)
}

/// Writes a corpus snapshot, replacing any previous one
pub fn save_corpus(corpus: &Corpus, path: &Path) -> Result<(), DataError> {
    save_json_atomic(corpus, path)
}

/// Deletes a file, treating an already missing file as success
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
