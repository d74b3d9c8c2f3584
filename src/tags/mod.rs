//! Tag canonicalization
//!
//! Free-form tags are resolved against the archive's own tag pages: a tag is
//! either canonical, a synonym of a canonical tag, or unfilterable. Results
//! accumulate in a persistent `TagCache` shared by every run.

mod cache;
mod classify;
mod resolver;
mod usage;

pub use cache::TagCache;
pub use classify::{classify, classify_page, tag_url, CanonicalEntry};
pub use resolver::{apply_canonical_tags, run_tag_stage, used_tags, ResolveReport, TagResolver};
pub use usage::{canonical_tag_usage, prune_rare_tags, run_dataset_stage, TagUsage};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The tag namespaces that get canonicalized; each has its own map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Character,
    Relationship,
    Freeform,
}

impl TagType {
    pub const ALL: [TagType; 3] = [TagType::Character, TagType::Relationship, TagType::Freeform];

    /// Name of the raw tag field on a work record
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Character => "character",
            TagType::Relationship => "relationship",
            TagType::Freeform => "freeform",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
