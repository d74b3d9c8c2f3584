//! Output module for run summaries and corpus reports
//!
//! This module handles:
//! - Naming the corpus snapshot of each pipeline stage
//! - Printing the outcome of each stage
//! - Computing and displaying corpus statistics

pub mod stats;

pub use stats::{corpus_statistics, print_statistics, top_tags, CorpusStatistics};

use crate::config::OutputPaths;
use crate::corpus::{load_corpus, Corpus};
use crate::crawler::BuildReport;
use crate::filter::FilterStats;
use crate::tags::ResolveReport;
use crate::Result;
use std::path::PathBuf;

/// A corpus snapshot written by one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Stage {
    /// Output of `download`
    #[default]
    Corpus,

    /// Output of `filter`
    Filtered,

    /// Output of `tags`
    Canonical,

    /// Output of `dataset`
    Dataset,
}

impl Stage {
    pub fn path(&self, paths: &OutputPaths) -> PathBuf {
        match self {
            Stage::Corpus => paths.corpus.clone(),
            Stage::Filtered => paths.filtered.clone(),
            Stage::Canonical => paths.canonical.clone(),
            Stage::Dataset => paths.dataset.clone(),
        }
    }
}

/// Loads the snapshot of `stage`
pub fn load_stage(stage: Stage, paths: &OutputPaths) -> Result<Corpus> {
    Ok(load_corpus(&stage.path(paths))?)
}

/// Prints the outcome of a committed download
pub fn print_build_report(report: &BuildReport) {
    println!("=== Download Summary ===\n");
    println!("  Resumed with: {} works", report.resumed_from);
    println!("  Discovered on listing: {}", report.discovered);
    println!("  Already present: {}", report.already_present);
    println!("  Extracted: {}", report.extracted);
    println!("  Checkpoints written: {}", report.checkpoint_writes);
    println!("  Works in corpus: {}", report.total_works);

    if !report.failures.is_empty() {
        println!();
        println!("Failed works ({}):", report.failures.len());
        for (id, error) in &report.failures {
            println!("  - {}: {}", id, error);
        }
    }
}

pub fn print_filter_stats(stats: &FilterStats) {
    println!("=== Filter Summary ===\n");
    println!("  Works before filtering: {}", stats.before);
    println!("  Works after filtering: {}", stats.after);
    for (reason, count) in &stats.rejected {
        println!("  Excluded ({}): {}", reason, count);
    }
}

pub fn print_resolve_report(report: &ResolveReport) {
    println!("=== Tag Summary ===\n");
    println!("  Tag pages fetched: {}", report.requested);
    println!("  Cache entries added: {}", report.added);

    if !report.unrecognized.is_empty() {
        println!();
        println!(
            "Unrecognized tag pages ({}), left unresolved until the next run:",
            report.unrecognized.len()
        );
        for (tag_type, tag) in &report.unrecognized {
            println!("  - [{}] {}", tag_type, tag);
        }
    }
}
