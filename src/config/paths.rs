use crate::config::types::Config;
use crate::ConfigError;
use std::path::PathBuf;
use url::Url;

/// Locations of every file the pipeline reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub checkpoint: PathBuf,
    pub corpus: PathBuf,
    pub filtered: PathBuf,
    pub canonical: PathBuf,
    pub dataset: PathBuf,
    pub tag_cache: PathBuf,
}

impl Config {
    /// The file name stem shared by all corpus snapshots
    ///
    /// Falls back to the category with every character outside `[A-Za-z0-9]`
    /// replaced by `_`, so "Lewis (TV)" becomes "Lewis__TV_".
    pub fn stem(&self) -> String {
        match &self.output.stem {
            Some(stem) => stem.clone(),
            None => self
                .site
                .category
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect(),
        }
    }

    /// Resolves every output path from the `[output]` section
    pub fn paths(&self) -> OutputPaths {
        let dir = self
            .output
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let stem = self.stem();

        OutputPaths {
            checkpoint: dir.join(format!("{stem}.checkpoint.json")),
            corpus: dir.join(format!("{stem}.json")),
            filtered: dir.join(format!("{stem}.filtered.json")),
            canonical: dir.join(format!("{stem}.filtered.canonical.json")),
            dataset: dir.join(format!("{stem}.dataset.json")),
            tag_cache: self
                .output
                .tag_cache
                .clone()
                .unwrap_or_else(|| dir.join("canonical_tags.json")),
        }
    }

    /// The archive root, guaranteed to end with a slash so joins stay below it
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.site.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// The work listing of the configured category: `<base>/tags/<category>/works`
    pub fn listing_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| ConfigError::InvalidUrl(self.site.base_url.clone()))?
            .pop_if_empty()
            .push("tags")
            .push(&self.site.category)
            .push("works");
        Ok(url)
    }
}
