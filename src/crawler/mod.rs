//! Crawler module for archive page fetching and corpus acquisition
//!
//! This module contains the acquisition side of the pipeline, including:
//! - HTTP fetching behind the `Fetch` seam, with request pacing
//! - Parsing of listing pages and full-view work pages
//! - Walking the paginated category listing
//! - Checkpointed, resumable corpus building

mod builder;
mod extractor;
mod fetcher;
mod listing;
mod parser;

pub use builder::{BuildOptions, BuildOutcome, BuildReport, CorpusBuilder, OverwriteConfirm};
pub use extractor::WorkExtractor;
pub use fetcher::{build_http_client, Fetch, HttpFetcher};
pub use listing::ListingWalker;
pub use parser::{html_to_text, normalize_typography, parse_page_count, parse_work, parse_work_ids};

pub(crate) use parser::{element_text, selector};

use crate::config::Config;
use crate::Result;

/// Runs the download stage for the category described by `config`
///
/// This is the main entry point for acquisition. It will:
/// 1. Decide between a fresh build and resuming from the checkpoint
/// 2. Walk the listing pages
/// 3. Extract every work not yet in the corpus, checkpointing periodically
/// 4. Commit the final corpus and remove the checkpoint
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `fetcher` - Page source, usually an `HttpFetcher`
/// * `confirm` - Asked before an existing final corpus is replaced
/// * `fresh` - Ignore any checkpoint
pub async fn build_corpus<F: Fetch + ?Sized>(
    config: &Config,
    fetcher: &F,
    confirm: &mut dyn OverwriteConfirm,
    fresh: bool,
) -> Result<BuildOutcome> {
    let mut builder = CorpusBuilder::from_config(fetcher, config)?;
    builder.run(confirm, fresh).await
}
