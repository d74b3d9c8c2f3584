//! Filter stage: keeps the works that pass every enabled check
//!
//! The checks come from the `[filter]` config section and are combined as a
//! conjunction; with every check disabled the whole corpus passes.

use crate::config::{Config, FilterConfig};
use crate::corpus::{load_corpus, save_corpus, Corpus, WorkRecord};
use crate::Result;
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;

/// The first check a work failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rejection {
    Language,
    Crossover,
    MultiChapter,
    Incomplete,
    TooRecent,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Language => "language",
            Rejection::Crossover => "crossover",
            Rejection::MultiChapter => "multi-chapter",
            Rejection::Incomplete => "incomplete",
            Rejection::TooRecent => "too recent",
        };
        f.write_str(reason)
    }
}

/// Before/after counts of a filter run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStats {
    pub before: usize,
    pub after: usize,
    pub rejected: BTreeMap<Rejection, usize>,
}

/// Returns why `record` is excluded, or `None` when it passes
pub fn check(record: &WorkRecord, config: &FilterConfig, today: NaiveDate) -> Option<Rejection> {
    if config.restrict_language && record.language != config.language {
        return Some(Rejection::Language);
    }
    if config.no_crossover && record.fandom.len() > 1 {
        return Some(Rejection::Crossover);
    }
    if config.single_chapter && !record.chapters.is_single_chapter() {
        return Some(Rejection::MultiChapter);
    }
    if config.complete && !record.chapters.is_complete() {
        return Some(Rejection::Incomplete);
    }

    // A threshold of zero disables the check, even for dates ahead of `today`
    if config.minimum_age_days > 0 {
        let age = (today - record.last_updated()).num_days();
        if age < config.minimum_age_days {
            return Some(Rejection::TooRecent);
        }
    }

    None
}

/// Applies the filter with a fixed `today`, returning the kept works
pub fn filter(corpus: &Corpus, config: &FilterConfig, today: NaiveDate) -> (Corpus, FilterStats) {
    let mut stats = FilterStats {
        before: corpus.len(),
        ..FilterStats::default()
    };

    let kept: Corpus = corpus
        .iter()
        .filter(|(id, record)| match check(record, config, today) {
            None => true,
            Some(reason) => {
                tracing::debug!("Work {} excluded: {}", id, reason);
                *stats.rejected.entry(reason).or_default() += 1;
                false
            }
        })
        .map(|(id, record)| (id.clone(), record.clone()))
        .collect();

    stats.after = kept.len();
    (kept, stats)
}

/// Applies the filter as of the local calendar date
pub fn filter_corpus(corpus: &Corpus, config: &FilterConfig) -> (Corpus, FilterStats) {
    filter(corpus, config, Local::now().date_naive())
}

/// Runs the filter stage: final corpus in, filtered corpus out
pub fn run_filter_stage(config: &Config) -> Result<FilterStats> {
    let paths = config.paths();
    let corpus = load_corpus(&paths.corpus)?;

    tracing::info!("Works before filtering: {}", corpus.len());
    let (filtered, stats) = filter_corpus(&corpus, &config.filter);
    tracing::info!("Works after filtering: {}", stats.after);
    for (reason, count) in &stats.rejected {
        tracing::info!("  excluded ({}): {}", reason, count);
    }

    save_corpus(&filtered, &paths.filtered)?;
    Ok(stats)
}
