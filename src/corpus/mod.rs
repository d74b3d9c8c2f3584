//! Corpus module: works keyed by identifier, and their on-disk snapshots
//!
//! # Components
//!
//! - `WorkId`: opaque, stable identifier of a work on the archive
//! - `WorkRecord`: the structured record extracted from a work page
//! - `Corpus`: mapping from `WorkId` to `WorkRecord`
//! - `store`: atomic JSON load/save shared by every snapshot file

mod record;
pub mod store;

pub use record::{ChapterCount, ChapterTotal, WorkRecord};
pub use store::{load_corpus, load_json, remove_if_exists, save_corpus, save_json_atomic};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a work, unique per work and stable across runs
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkId(String);

impl WorkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Mapping from `WorkId` to `WorkRecord` at one pipeline stage
///
/// Keys are kept sorted so that snapshots of the same corpus are byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    works: BTreeMap<WorkId, WorkRecord>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }

    pub fn contains(&self, id: &WorkId) -> bool {
        self.works.contains_key(id)
    }

    pub fn get(&self, id: &WorkId) -> Option<&WorkRecord> {
        self.works.get(id)
    }

    /// Adds a work unless the id is already present
    ///
    /// Returns false and leaves the stored record untouched when the id exists,
    /// so a corpus only ever grows.
    pub fn insert_new(&mut self, id: WorkId, record: WorkRecord) -> bool {
        match self.works.entry(id) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &WorkId> {
        self.works.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WorkId, &WorkRecord)> {
        self.works.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &WorkRecord> {
        self.works.values()
    }

    /// Mutable access to every record; keys stay fixed
    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut WorkRecord> {
        self.works.values_mut()
    }
}

impl FromIterator<(WorkId, WorkRecord)> for Corpus {
    fn from_iter<T: IntoIterator<Item = (WorkId, WorkRecord)>>(iter: T) -> Self {
        Self {
            works: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Corpus {
    type Item = (WorkId, WorkRecord);
    type IntoIter = std::collections::btree_map::IntoIter<WorkId, WorkRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.works.into_iter()
    }
}
