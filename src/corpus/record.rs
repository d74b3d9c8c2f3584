//! Work record definitions
//!
//! A `WorkRecord` is everything extracted from one work's detail page. Field
//! names match the keys of the persisted JSON documents.

use crate::tags::TagType;
use crate::ParseError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Announced chapter total of a work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterTotal {
    Known(u32),
    /// The work is ongoing and its author has not announced a total (`?`)
    Unknown,
}

/// The `chapters` statistic, written `"current/total"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChapterCount {
    pub current: u32,
    pub total: ChapterTotal,
}

impl ChapterCount {
    pub fn new(current: u32, total: ChapterTotal) -> Self {
        Self { current, total }
    }

    /// True when every announced chapter has been posted
    ///
    /// A work without a known total is never complete.
    pub fn is_complete(&self) -> bool {
        match self.total {
            ChapterTotal::Known(total) => self.current == total,
            ChapterTotal::Unknown => false,
        }
    }

    /// True for a finished one-shot, `1/1`
    pub fn is_single_chapter(&self) -> bool {
        self.current == 1 && self.total == ChapterTotal::Known(1)
    }
}

impl fmt::Display for ChapterCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            ChapterTotal::Known(total) => write!(f, "{}/{}", self.current, total),
            ChapterTotal::Unknown => write!(f, "{}/?", self.current),
        }
    }
}

impl FromStr for ChapterCount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidValue {
            field: "chapters".to_string(),
            value: s.to_string(),
        };

        let (current, total) = s.trim().split_once('/').ok_or_else(invalid)?;
        let current = current.trim().parse::<u32>().map_err(|_| invalid())?;
        let total = match total.trim() {
            "?" => ChapterTotal::Unknown,
            known => ChapterTotal::Known(known.parse::<u32>().map_err(|_| invalid())?),
        };

        Ok(Self { current, total })
    }
}

impl TryFrom<String> for ChapterCount {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChapterCount> for String {
    fn from(value: ChapterCount) -> Self {
        value.to_string()
    }
}

/// One harvested work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub title: String,

    #[serde(default)]
    pub author: Vec<String>,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub rating: Vec<String>,

    #[serde(default)]
    pub warning: Vec<String>,

    #[serde(default)]
    pub category: Vec<String>,

    pub fandom: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeform: Option<Vec<String>>,

    pub language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,

    pub published: NaiveDate,

    /// Date of the last update; only present when the work changed after publication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NaiveDate>,

    pub chapters: ChapterCount,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kudos: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmarks: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<u64>,

    /// Chapter bodies keyed by 1-based chapter index
    #[serde(default)]
    pub text: BTreeMap<u32, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_character_tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_relationship_tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_freeform_tags: Option<Vec<String>>,
}

impl WorkRecord {
    /// Creates a record holding only the fields every stage relies on
    pub fn new(
        title: impl Into<String>,
        language: impl Into<String>,
        fandom: Vec<String>,
        chapters: ChapterCount,
        published: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            author: Vec::new(),
            summary: String::new(),
            rating: Vec::new(),
            warning: Vec::new(),
            category: Vec::new(),
            fandom,
            relationship: None,
            character: None,
            freeform: None,
            language: language.into(),
            series: None,
            collections: None,
            published,
            status: None,
            chapters,
            words: None,
            comments: None,
            kudos: None,
            bookmarks: None,
            hits: None,
            text: BTreeMap::new(),
            canonical_character_tags: None,
            canonical_relationship_tags: None,
            canonical_freeform_tags: None,
        }
    }

    /// The date the work last changed: `status` when present, else `published`
    pub fn last_updated(&self) -> NaiveDate {
        self.status.unwrap_or(self.published)
    }

    /// Raw, user-supplied tags of the given type
    pub fn raw_tags(&self, tag_type: TagType) -> Option<&[String]> {
        match tag_type {
            TagType::Character => self.character.as_deref(),
            TagType::Relationship => self.relationship.as_deref(),
            TagType::Freeform => self.freeform.as_deref(),
        }
    }

    pub(crate) fn raw_tags_mut(&mut self, tag_type: TagType) -> &mut Option<Vec<String>> {
        match tag_type {
            TagType::Character => &mut self.character,
            TagType::Relationship => &mut self.relationship,
            TagType::Freeform => &mut self.freeform,
        }
    }

    /// Canonical tags of the given type, once the tag resolver has run
    pub fn canonical_tags(&self, tag_type: TagType) -> Option<&[String]> {
        match tag_type {
            TagType::Character => self.canonical_character_tags.as_deref(),
            TagType::Relationship => self.canonical_relationship_tags.as_deref(),
            TagType::Freeform => self.canonical_freeform_tags.as_deref(),
        }
    }

    pub fn set_canonical_tags(&mut self, tag_type: TagType, tags: Vec<String>) {
        let slot = match tag_type {
            TagType::Character => &mut self.canonical_character_tags,
            TagType::Relationship => &mut self.canonical_relationship_tags,
            TagType::Freeform => &mut self.canonical_freeform_tags,
        };
        *slot = Some(tags);
    }
}
