use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Main configuration structure for Fic-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// The archive site and the category to harvest
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root of the archive, e.g. "https://archiveofourown.org/"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Category tag exactly as the site names it, e.g. "Lewis (TV)"
    pub category: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the harvester
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the harvester
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for harvester-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Acquisition behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Ceiling on the number of listing pages to walk (all pages when absent)
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Successful extractions between two checkpoint writes
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Minimum time between two requests (milliseconds)
    #[serde(rename = "request-delay", default)]
    pub request_delay: u64,

    /// Per-request timeout in seconds (no timeout when absent)
    #[serde(rename = "request-timeout", default)]
    pub request_timeout: Option<u64>,

    /// Age in days after which a checkpoint is reported as stale
    #[serde(
        rename = "stale-checkpoint-days",
        default = "default_stale_checkpoint_days"
    )]
    pub stale_checkpoint_days: i64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            checkpoint_interval: default_checkpoint_interval(),
            request_delay: 0,
            request_timeout: None,
            stale_checkpoint_days: default_stale_checkpoint_days(),
        }
    }
}

fn default_checkpoint_interval() -> usize {
    100
}

fn default_stale_checkpoint_days() -> i64 {
    7
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Directory all pipeline files are written to (current directory by default)
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// File name stem shared by the corpus files (derived from the category by default)
    #[serde(default)]
    pub stem: Option<String>,

    /// Location of the canonical tag cache (`<directory>/canonical_tags.json` by default)
    #[serde(rename = "tag-cache", default)]
    pub tag_cache: Option<PathBuf>,
}

/// Inclusion predicates applied by the filter stage
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Keep only works written in `language`
    #[serde(rename = "restrict-language", default)]
    pub restrict_language: bool,

    #[serde(default = "default_language")]
    pub language: String,

    /// Drop works listed under more than one fandom
    #[serde(rename = "no-crossover", default)]
    pub no_crossover: bool,

    /// Keep only works of exactly one chapter out of one
    #[serde(rename = "single-chapter", default)]
    pub single_chapter: bool,

    /// Keep only works whose posted chapters equal the announced total
    #[serde(default)]
    pub complete: bool,

    /// Minimum number of days since the last update
    #[serde(rename = "minimum-age-days", default)]
    pub minimum_age_days: i64,

    /// Canonical tags removed from every work
    #[serde(rename = "omit-tags", default)]
    pub omit_tags: BTreeSet<String>,

    /// Canonical tags used fewer times than this are pruned from the dataset
    #[serde(rename = "min-tag-uses", default)]
    pub min_tag_uses: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            restrict_language: false,
            language: default_language(),
            no_crossover: false,
            single_chapter: false,
            complete: false,
            minimum_age_days: 0,
            omit_tags: BTreeSet::new(),
            min_tag_uses: 0,
        }
    }
}

fn default_language() -> String {
    "English".to_string()
}
