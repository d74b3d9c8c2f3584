//! Statistics over a corpus snapshot
//!
//! This module provides functionality for summarizing a corpus file at any
//! pipeline stage and displaying the summary.

use crate::corpus::Corpus;
use crate::tags::{canonical_tag_usage, used_tags, TagType, TagUsage};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// How many tags per type `print_statistics` lists
pub const TOP_TAGS: usize = 10;

/// Corpus statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStatistics {
    /// Number of works
    pub total_works: usize,

    /// Sum of word counts (works without a count contribute nothing)
    pub total_words: u64,

    /// Works per language
    pub languages: BTreeMap<String, usize>,

    /// Works per rating
    pub ratings: BTreeMap<String, usize>,

    pub complete: usize,
    pub single_chapter: usize,
    pub crossovers: usize,

    /// Earliest and latest publication dates
    pub published_range: Option<(NaiveDate, NaiveDate)>,

    /// Distinct raw tags per type
    pub distinct_raw_tags: BTreeMap<TagType, usize>,

    /// Canonical tag usage; empty before the tag stage ran
    pub canonical_usage: TagUsage,
}

/// Computes statistics for `corpus`
pub fn corpus_statistics(corpus: &Corpus) -> CorpusStatistics {
    let mut stats = CorpusStatistics {
        total_works: corpus.len(),
        ..CorpusStatistics::default()
    };

    for record in corpus.records() {
        stats.total_words += record.words.unwrap_or(0);
        *stats.languages.entry(record.language.clone()).or_default() += 1;
        for rating in &record.rating {
            *stats.ratings.entry(rating.clone()).or_default() += 1;
        }

        if record.chapters.is_complete() {
            stats.complete += 1;
        }
        if record.chapters.is_single_chapter() {
            stats.single_chapter += 1;
        }
        if record.fandom.len() > 1 {
            stats.crossovers += 1;
        }

        stats.published_range = Some(match stats.published_range {
            None => (record.published, record.published),
            Some((first, last)) => (first.min(record.published), last.max(record.published)),
        });
    }

    stats.distinct_raw_tags = used_tags(corpus)
        .into_iter()
        .map(|(tag_type, counts)| (tag_type, counts.len()))
        .collect();
    stats.canonical_usage = canonical_tag_usage(corpus);

    stats
}

/// The `n` most used canonical tags of a type, ties broken by name
pub fn top_tags(stats: &CorpusStatistics, tag_type: TagType, n: usize) -> Vec<(&str, usize)> {
    let mut tags: Vec<(&str, usize)> = stats
        .canonical_usage
        .get(&tag_type)
        .map(|counts| counts.iter().map(|(t, c)| (t.as_str(), *c)).collect())
        .unwrap_or_default();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    tags.truncate(n);
    tags
}

fn percentage(count: usize, total: usize) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CorpusStatistics) {
    println!("=== Corpus Statistics ===\n");

    println!("Overview:");
    println!("  Works: {}", stats.total_works);
    println!("  Words: {}", stats.total_words);
    if let Some((first, last)) = stats.published_range {
        println!("  Published: {} to {}", first, last);
    }
    println!(
        "  Complete: {} ({:.1}%)",
        stats.complete,
        percentage(stats.complete, stats.total_works)
    );
    println!("  Single chapter: {}", stats.single_chapter);
    println!("  Crossovers: {}", stats.crossovers);
    println!();

    println!("Languages:");
    let mut languages: Vec<_> = stats.languages.iter().collect();
    languages.sort_by(|a, b| b.1.cmp(a.1));
    for (language, count) in languages {
        println!(
            "  {}: {} ({:.1}%)",
            language,
            count,
            percentage(*count, stats.total_works)
        );
    }
    println!();

    if !stats.ratings.is_empty() {
        println!("Ratings:");
        for (rating, count) in &stats.ratings {
            println!("  {}: {}", rating, count);
        }
        println!();
    }

    println!("Distinct raw tags:");
    for tag_type in TagType::ALL {
        println!(
            "  {}: {}",
            tag_type,
            stats.distinct_raw_tags.get(&tag_type).copied().unwrap_or(0)
        );
    }

    for tag_type in TagType::ALL {
        let top = top_tags(stats, tag_type, TOP_TAGS);
        if top.is_empty() {
            continue;
        }
        println!();
        println!("Top canonical {} tags:", tag_type);
        for (tag, count) in top {
            println!("  {}: {}", tag, count);
        }
    }
}
