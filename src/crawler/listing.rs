//! Listing walker
//!
//! Discovers how many pages the category listing has and enumerates the work
//! ids on each of them, always in ascending page order.

use crate::corpus::WorkId;
use crate::crawler::fetcher::Fetch;
use crate::crawler::parser::{parse_page_count, parse_work_ids};
use crate::Result;
use std::collections::HashSet;
use url::Url;

/// Walks the paginated work listing of one category
pub struct ListingWalker<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    listing_url: Url,
}

impl<'a, F: Fetch + ?Sized> ListingWalker<'a, F> {
    /// Creates a walker over `listing_url`, e.g. `<base>/tags/<category>/works`
    pub fn new(fetcher: &'a F, listing_url: Url) -> Self {
        Self {
            fetcher,
            listing_url,
        }
    }

    /// URL of the given listing page
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.listing_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string());
        url
    }

    /// Fetches the first listing page and reads the last page number from it
    ///
    /// Fails with a parse error when the pagination control is absent or
    /// shaped unexpectedly.
    pub async fn discover_page_count(&self) -> Result<u32> {
        let html = self.fetcher.fetch(&self.listing_url).await?;
        Ok(parse_page_count(&html, self.listing_url.as_str())?)
    }

    /// Fetches one listing page and returns its work ids in listing order
    pub async fn list_work_ids(&self, page: u32) -> Result<Vec<WorkId>> {
        let url = self.page_url(page);
        let html = self.fetcher.fetch(&url).await?;
        Ok(parse_work_ids(&html, url.as_str())?)
    }

    /// Enumerates work ids across pages `1..=min(page count, max_pages)`
    ///
    /// Works can shift onto the next page while the listing is walked; an id
    /// seen twice is only kept at its first position.
    pub async fn walk(&self, max_pages: Option<u32>) -> Result<Vec<WorkId>> {
        let discovered = self.discover_page_count().await?;
        let pages = match max_pages {
            Some(ceiling) if ceiling < discovered => {
                tracing::info!(
                    "Listing has {} pages, walking the first {} (max-pages)",
                    discovered,
                    ceiling
                );
                ceiling
            }
            _ => {
                tracing::info!("Listing has {} pages", discovered);
                discovered
            }
        };

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for page in 1..=pages {
            let page_ids = self.list_work_ids(page).await?;
            tracing::debug!("Page {}/{}: {} works", page, pages, page_ids.len());
            for id in page_ids {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }

        tracing::info!("Discovered {} works", ids.len());
        Ok(ids)
    }
}
