//! Configuration module for Fic-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolves the file layout every pipeline stage reads from and writes to.
//!
//! # Example
//!
//! ```no_run
//! use fic_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Corpus will be written to {}", config.paths().corpus.display());
//! ```

mod parser;
mod paths;
mod types;
mod validation;

// Re-export types
pub use paths::OutputPaths;
pub use types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
