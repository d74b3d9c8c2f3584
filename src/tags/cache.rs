//! Persistent raw tag -> canonical tag map
//!
//! The cache only ever grows: an entry, once known, is never recomputed or
//! removed, so a partially updated cache is still valid.

use crate::corpus::{load_json, save_json_atomic};
use crate::tags::TagType;
use crate::DataError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Raw tag to canonical tag, per tag type; `None` marks an unfilterable tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagCache {
    entries: BTreeMap<TagType, BTreeMap<String, Option<String>>>,
}

impl TagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the cache from `path`; a missing file yields an empty cache
    pub fn load(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            tracing::info!(
                "No tag cache at {}, resolving tags from scratch",
                path.display()
            );
            return Ok(Self::new());
        }

        let cache: Self = load_json(path)?;
        tracing::info!(
            "Loaded {} tag correspondences from {}",
            cache.len(),
            path.display()
        );
        Ok(cache)
    }

    /// Rewrites the whole cache atomically
    pub fn save(&self, path: &Path) -> Result<(), DataError> {
        save_json_atomic(self, path)?;
        tracing::info!(
            "Saved {} tag correspondences to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Lookup result: `None` when unknown, `Some(None)` when unfilterable
    pub fn get(&self, tag_type: TagType, raw: &str) -> Option<Option<&str>> {
        self.entries
            .get(&tag_type)?
            .get(raw)
            .map(|canonical| canonical.as_deref())
    }

    pub fn contains(&self, tag_type: TagType, raw: &str) -> bool {
        self.get(tag_type, raw).is_some()
    }

    /// Inserts unless an entry for `raw` exists; returns whether it was added
    pub fn insert_if_absent(
        &mut self,
        tag_type: TagType,
        raw: impl Into<String>,
        canonical: Option<String>,
    ) -> bool {
        let map = self.entries.entry(tag_type).or_default();
        let raw = raw.into();
        if map.contains_key(&raw) {
            return false;
        }
        map.insert(raw, canonical);
        true
    }

    /// Union with `other`; entries already present here win
    pub fn merge(&mut self, other: TagCache) {
        for (tag_type, map) in other.entries {
            for (raw, canonical) in map {
                self.insert_if_absent(tag_type, raw, canonical);
            }
        }
    }

    /// Entries of one tag type, ordered by raw tag
    pub fn entries(&self, tag_type: TagType) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .get(&tag_type)
            .into_iter()
            .flat_map(|map| map.iter().map(|(raw, c)| (raw.as_str(), c.as_deref())))
    }

    /// Total entries across all tag types
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
