//! Checkpointed corpus builder - main acquisition orchestration logic
//!
//! This module drives one harvest run:
//! - deciding between a fresh build and resuming from a checkpoint
//! - walking the listing and extracting every work not yet in the corpus
//! - persisting the in-progress corpus every `checkpoint-interval` successes
//! - committing the final snapshot and discarding the checkpoint
//!
//! A failed extraction only skips that work for this run; it stays absent
//! from the corpus and is attempted again by the next resumed run.

use crate::config::{Config, CrawlerConfig};
use crate::corpus::{load_corpus, remove_if_exists, save_corpus, Corpus, WorkId};
use crate::crawler::extractor::WorkExtractor;
use crate::crawler::fetcher::Fetch;
use crate::crawler::listing::ListingWalker;
use crate::state::BuildState;
use crate::{HarvestError, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use url::Url;

/// Asked before an existing final corpus is replaced
pub trait OverwriteConfirm {
    /// Returns true to rebuild from scratch, false to leave everything untouched
    fn confirm_overwrite(&mut self, final_path: &Path) -> Result<bool>;
}

impl<F: FnMut(&Path) -> bool> OverwriteConfirm for F {
    fn confirm_overwrite(&mut self, final_path: &Path) -> Result<bool> {
        Ok(self(final_path))
    }
}

/// Tunables of a build run
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Successful extractions between two checkpoint writes
    pub checkpoint_interval: usize,

    /// Ceiling on listing pages to walk
    pub max_pages: Option<u32>,

    /// Checkpoints older than this are reported as stale
    pub stale_after: Duration,
}

impl BuildOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            checkpoint_interval: config.checkpoint_interval.max(1),
            max_pages: config.max_pages,
            stale_after: Duration::days(config.stale_checkpoint_days),
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Counters describing a committed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Works loaded from the checkpoint at start
    pub resumed_from: usize,

    /// Distinct work ids found on the walked listing pages
    pub discovered: usize,

    /// Discovered works skipped because the corpus already held them
    pub already_present: usize,

    /// Works extracted during this run
    pub extracted: usize,

    /// Works whose extraction failed, with the error
    pub failures: Vec<(WorkId, String)>,

    /// Intermediate checkpoint writes
    pub checkpoint_writes: usize,

    /// Works in the committed corpus
    pub total_works: usize,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// An existing final corpus was kept; nothing was changed
    Declined,

    /// The final corpus was written and the checkpoint removed
    Committed(BuildReport),
}

/// Main corpus builder structure
pub struct CorpusBuilder<'a, F: Fetch + ?Sized> {
    walker: ListingWalker<'a, F>,
    extractor: WorkExtractor<'a, F>,
    checkpoint_path: PathBuf,
    final_path: PathBuf,
    options: BuildOptions,
    state: Option<BuildState>,
    corpus: Corpus,
}

impl<'a, F: Fetch + ?Sized> CorpusBuilder<'a, F> {
    pub fn new(
        fetcher: &'a F,
        listing_url: Url,
        base_url: Url,
        checkpoint_path: PathBuf,
        final_path: PathBuf,
        options: BuildOptions,
    ) -> Self {
        Self {
            walker: ListingWalker::new(fetcher, listing_url),
            extractor: WorkExtractor::new(fetcher, base_url),
            checkpoint_path,
            final_path,
            options,
            state: None,
            corpus: Corpus::new(),
        }
    }

    /// Creates a builder for the category, paths and limits of `config`
    pub fn from_config(fetcher: &'a F, config: &Config) -> Result<Self> {
        let paths = config.paths();
        Ok(Self::new(
            fetcher,
            config.listing_url()?,
            config.base_url()?,
            paths.checkpoint,
            paths.corpus,
            BuildOptions::from_config(&config.crawler),
        ))
    }

    /// Current state; `None` until the run has started
    pub fn state(&self) -> Option<BuildState> {
        self.state
    }

    /// The in-progress corpus
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    fn enter(&mut self, next: BuildState) -> Result<()> {
        let legal = match self.state {
            None => next.is_initial(),
            Some(current) => current.can_transition_to(next),
        };
        if !legal {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!(
            "Build state: {} -> {}",
            self.state.map_or("start", |s| s.as_str()),
            next
        );
        self.state = Some(next);
        Ok(())
    }

    /// Runs the build to completion
    ///
    /// # Arguments
    ///
    /// * `confirm` - Asked whether an existing final corpus may be replaced
    /// * `fresh` - Discard any checkpoint instead of resuming from it
    ///
    /// # Returns
    ///
    /// * `Ok(BuildOutcome::Declined)` - Overwrite refused, no file changed
    /// * `Ok(BuildOutcome::Committed(report))` - Final corpus written
    /// * `Err(HarvestError)` - Listing, checkpoint or commit failure; the run aborted
    pub async fn run(
        &mut self,
        confirm: &mut dyn OverwriteConfirm,
        fresh: bool,
    ) -> Result<BuildOutcome> {
        if !self.start(confirm, fresh)? {
            tracing::info!(
                "Keeping existing corpus at {}",
                self.final_path.display()
            );
            return Ok(BuildOutcome::Declined);
        }

        let mut report = BuildReport {
            resumed_from: self.corpus.len(),
            ..BuildReport::default()
        };

        self.enter(BuildState::Running)?;
        let ids = self.walker.walk(self.options.max_pages).await?;
        report.discovered = ids.len();

        for id in ids {
            if self.corpus.contains(&id) {
                report.already_present += 1;
                continue;
            }

            match self.extractor.extract(&id).await {
                Ok(record) => {
                    self.corpus.insert_new(id, record);
                    report.extracted += 1;

                    if report.extracted % self.options.checkpoint_interval == 0 {
                        self.save_checkpoint()?;
                        report.checkpoint_writes += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to extract work {}: {}", id, e);
                    report.failures.push((id, e.to_string()));
                }
            }
        }

        self.enter(BuildState::Drained)?;
        save_corpus(&self.corpus, &self.final_path)?;
        remove_if_exists(&self.checkpoint_path)?;
        self.enter(BuildState::Committed)?;

        report.total_works = self.corpus.len();
        tracing::info!(
            "Corpus committed to {}: {} works ({} new, {} failed, {} checkpoints)",
            self.final_path.display(),
            report.total_works,
            report.extracted,
            report.failures.len(),
            report.checkpoint_writes
        );

        Ok(BuildOutcome::Committed(report))
    }

    /// Chooses between a fresh and a resumed build
    ///
    /// Returns false when the caller declined to overwrite the final corpus.
    fn start(&mut self, confirm: &mut dyn OverwriteConfirm, fresh: bool) -> Result<bool> {
        if self.final_path.exists() {
            if !confirm.confirm_overwrite(&self.final_path)? {
                return Ok(false);
            }
            tracing::info!("Rebuilding {} from scratch", self.final_path.display());
            remove_if_exists(&self.checkpoint_path)?;
            self.corpus = Corpus::new();
            self.enter(BuildState::Fresh)?;
            return Ok(true);
        }

        if fresh {
            if remove_if_exists(&self.checkpoint_path)? {
                tracing::info!("Discarded checkpoint {}", self.checkpoint_path.display());
            }
            self.corpus = Corpus::new();
            self.enter(BuildState::Fresh)?;
            return Ok(true);
        }

        if self.checkpoint_path.exists() {
            self.warn_if_stale();
            self.corpus = load_corpus(&self.checkpoint_path)?;
            tracing::info!(
                "Resuming from checkpoint {} with {} works",
                self.checkpoint_path.display(),
                self.corpus.len()
            );
            self.enter(BuildState::Resuming)?;
        } else {
            tracing::info!("No checkpoint found, starting from an empty corpus");
            self.corpus = Corpus::new();
            self.enter(BuildState::Fresh)?;
        }

        Ok(true)
    }

    /// Reports a checkpoint last written long ago; its contents are still used
    fn warn_if_stale(&self) {
        let modified = match std::fs::metadata(&self.checkpoint_path).and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(e) => {
                tracing::debug!("Cannot read checkpoint modification time: {}", e);
                return;
            }
        };

        let age = Utc::now() - modified;
        if age > self.options.stale_after {
            tracing::warn!(
                "Checkpoint {} was last written {} days ago; resuming from it anyway",
                self.checkpoint_path.display(),
                age.num_days()
            );
        }
    }

    fn save_checkpoint(&self) -> Result<()> {
        save_corpus(&self.corpus, &self.checkpoint_path)?;
        tracing::info!(
            "Checkpoint saved: {} works in {}",
            self.corpus.len(),
            self.checkpoint_path.display()
        );
        Ok(())
    }
}
