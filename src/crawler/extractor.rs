//! Work extractor
//!
//! Fetches one work's full-view page and parses it into a `WorkRecord`. The
//! result depends only on the work id and the page served for it.

use crate::corpus::{WorkId, WorkRecord};
use crate::crawler::fetcher::Fetch;
use crate::crawler::parser::parse_work;
use crate::{FetchError, Result};
use url::Url;

pub struct WorkExtractor<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    base_url: Url,
}

impl<'a, F: Fetch + ?Sized> WorkExtractor<'a, F> {
    pub fn new(fetcher: &'a F, base_url: Url) -> Self {
        Self { fetcher, base_url }
    }

    /// `<base>/works/<id>?view_adult=true&view_full_work=true`
    pub fn work_url(&self, id: &WorkId) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("works/{}", id))
            .map_err(|e| FetchError::InvalidUrl(format!("work {}: {}", id, e)))?;
        url.query_pairs_mut()
            .append_pair("view_adult", "true")
            .append_pair("view_full_work", "true");
        Ok(url)
    }

    /// Fetches and parses a single work
    pub async fn extract(&self, id: &WorkId) -> Result<WorkRecord> {
        let url = self.work_url(id)?;
        tracing::info!("Parsing work {}", id);
        let html = self.fetcher.fetch(&url).await?;
        Ok(parse_work(&html, url.as_str())?)
    }
}
