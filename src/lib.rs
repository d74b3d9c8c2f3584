//! Fic-Harvest: a resumable fandom corpus harvester
//!
//! This crate walks the work listing of a fandom category on an archive site,
//! extracts every listed work into a structured record, and reduces the corpus
//! to a filtered dataset with canonicalized tags.

pub mod config;
pub mod corpus;
pub mod crawler;
pub mod filter;
pub mod output;
pub mod state;
pub mod tags;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Fic-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: Option<state::BuildState>,
        to: state::BuildState,
    },

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Network and transport failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Unexpected page structure, usually a sign the site layout changed
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Missing element '{element}' on {url}")]
    MissingElement { url: String, element: String },

    #[error("Missing required field '{field}' on {url}")]
    MissingField { url: String, field: String },

    #[error("Unknown field marker '{marker}' on {url}")]
    UnknownField { url: String, marker: String },

    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Tag page matched none of the known markers")]
    UnrecognizedTagPage,

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Malformed or unreadable persisted state (corpus snapshots, tag cache)
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed data in {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Fic-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use corpus::{ChapterCount, ChapterTotal, Corpus, WorkId, WorkRecord};
pub use state::BuildState;
pub use tags::{TagCache, TagType};
