//! Canonical tag usage counts and rare-tag pruning

use crate::config::Config;
use crate::corpus::{load_corpus, save_corpus, Corpus};
use crate::tags::TagType;
use crate::Result;
use std::collections::BTreeMap;

/// Tag -> number of works using it, per tag type
pub type TagUsage = BTreeMap<TagType, BTreeMap<String, usize>>;

/// Counts how many works carry each canonical tag
pub fn canonical_tag_usage(corpus: &Corpus) -> TagUsage {
    let mut usage = TagUsage::new();
    for record in corpus.records() {
        for tag_type in TagType::ALL {
            for tag in record.canonical_tags(tag_type).unwrap_or_default() {
                *usage
                    .entry(tag_type)
                    .or_default()
                    .entry(tag.clone())
                    .or_default() += 1;
            }
        }
    }
    usage
}

/// Copy of `corpus` without canonical tags used by fewer than `min_uses` works
pub fn prune_rare_tags(corpus: &Corpus, min_uses: usize) -> Corpus {
    let usage = canonical_tag_usage(corpus);
    let mut pruned = corpus.clone();

    for record in pruned.records_mut() {
        for tag_type in TagType::ALL {
            let Some(tags) = record.canonical_tags(tag_type) else {
                continue;
            };
            let kept: Vec<String> = tags
                .iter()
                .filter(|tag| {
                    usage
                        .get(&tag_type)
                        .and_then(|counts| counts.get(*tag))
                        .is_some_and(|&uses| uses >= min_uses)
                })
                .cloned()
                .collect();
            record.set_canonical_tags(tag_type, kept);
        }
    }
    pruned
}

/// Runs the dataset stage: canonical corpus in, pruned dataset out
pub fn run_dataset_stage(config: &Config) -> Result<Corpus> {
    let paths = config.paths();
    let corpus = load_corpus(&paths.canonical)?;
    let dataset = prune_rare_tags(&corpus, config.filter.min_tag_uses);
    save_corpus(&dataset, &paths.dataset)?;

    tracing::info!(
        "Dataset of {} works written to {} (tags used fewer than {} times removed)",
        dataset.len(),
        paths.dataset.display(),
        config.filter.min_tag_uses
    );
    Ok(dataset)
}
