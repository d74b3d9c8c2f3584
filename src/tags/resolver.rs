//! Tag resolution pass and application of the results to a corpus

use crate::config::Config;
use crate::corpus::{load_corpus, save_corpus, Corpus};
use crate::crawler::Fetch;
use crate::tags::classify::{classify, CanonicalEntry};
use crate::tags::usage::TagUsage;
use crate::tags::{TagCache, TagType};
use crate::{HarvestError, ParseError, Result};
use std::collections::BTreeSet;
use url::Url;

/// What one update pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveReport {
    /// Tag pages fetched
    pub requested: usize,

    /// Cache entries added
    pub added: usize,

    /// Tags whose page matched no known marker
    ///
    /// They are left out of the cache, so they are dropped from this run's
    /// canonical lists and requested again by the next run.
    pub unrecognized: Vec<(TagType, String)>,
}

/// Counts how often each raw tag is used, per tag type
pub fn used_tags(corpus: &Corpus) -> TagUsage {
    let mut usage = TagUsage::new();
    for record in corpus.records() {
        for tag_type in TagType::ALL {
            for tag in record.raw_tags(tag_type).unwrap_or_default() {
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

/// Fills a `TagCache` with the classification of every used tag
pub struct TagResolver<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    base_url: Url,
    cache: TagCache,
}

impl<'a, F: Fetch + ?Sized> TagResolver<'a, F> {
    pub fn new(fetcher: &'a F, base_url: Url, cache: TagCache) -> Self {
        Self {
            fetcher,
            base_url,
            cache,
        }
    }

    pub fn cache(&self) -> &TagCache {
        &self.cache
    }

    pub fn into_cache(self) -> TagCache {
        self.cache
    }

    /// Classifies every used tag the cache does not know yet
    ///
    /// Tags are visited most used first, then by name. A canonical tag's page
    /// also settles all of its synonyms. Fetch errors abort the pass; entries
    /// added before the error stay in the cache. Unrecognized pages add no
    /// entry.
    pub async fn update(&mut self, used: &TagUsage) -> Result<ResolveReport> {
        let mut report = ResolveReport::default();

        for (tag_type, counts) in used {
            let mut ordered: Vec<(&String, &usize)> = counts.iter().collect();
            ordered.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

            for (tag, _) in ordered {
                if self.cache.contains(*tag_type, tag) {
                    continue;
                }

                report.requested += 1;
                match classify(self.fetcher, &self.base_url, tag).await {
                    Ok(entry) => {
                        report.added += self.record(*tag_type, tag, entry);
                    }
                    Err(HarvestError::Parse(ParseError::UnrecognizedTagPage)) => {
                        tracing::error!(
                            "Could not determine what kind of {} tag '{}' is; leaving it unresolved",
                            tag_type,
                            tag
                        );
                        report.unrecognized.push((*tag_type, tag.clone()));
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        tracing::info!(
            "Tag resolution: {} pages fetched, {} entries added",
            report.requested,
            report.added
        );
        Ok(report)
    }

    fn record(&mut self, tag_type: TagType, tag: &str, entry: CanonicalEntry) -> usize {
        let mut added = 0;
        let mut insert = |raw: &str, canonical: Option<String>| {
            if self.cache.insert_if_absent(tag_type, raw, canonical) {
                added += 1;
            }
        };

        match entry {
            CanonicalEntry::Canonical { synonyms } => {
                insert(tag, Some(tag.to_string()));
                for synonym in &synonyms {
                    insert(synonym, Some(tag.to_string()));
                }
            }
            CanonicalEntry::Synonym(target) => insert(tag, Some(target)),
            CanonicalEntry::Unfilterable => insert(tag, None),
        }
        added
    }
}

/// Sets the canonical tag fields of every record from `cache`
///
/// Unfilterable and omitted tags are dropped; the rest are deduplicated and
/// sorted. A work without raw tags of a type gets an empty list.
pub fn apply_canonical_tags(corpus: &mut Corpus, cache: &TagCache, omit: &BTreeSet<String>) {
    for record in corpus.records_mut() {
        for tag_type in TagType::ALL {
            let canonical: BTreeSet<String> = record
                .raw_tags(tag_type)
                .unwrap_or_default()
                .iter()
                .filter_map(|raw| cache.get(tag_type, raw).flatten())
                .filter(|tag| !omit.contains(*tag))
                .map(str::to_string)
                .collect();
            record.set_canonical_tags(tag_type, canonical.into_iter().collect());
        }
    }
}

/// Runs the tag stage: filtered corpus in, canonical corpus out
///
/// The cache is saved after the update pass even when the pass failed, so
/// the work done before a fetch error is not lost. Before saving, the file on
/// disk is read again and merged in, keeping entries another run added since
/// this one loaded it.
pub async fn run_tag_stage<F: Fetch + ?Sized>(config: &Config, fetcher: &F) -> Result<ResolveReport> {
    let paths = config.paths();
    let mut corpus = load_corpus(&paths.filtered)?;
    let cache = TagCache::load(&paths.tag_cache)?;
    let usage = used_tags(&corpus);

    let mut resolver = TagResolver::new(fetcher, config.base_url()?, cache);
    let outcome = resolver.update(&usage).await;
    let mut cache = resolver.into_cache();
    cache.merge(TagCache::load(&paths.tag_cache)?);
    cache.save(&paths.tag_cache)?;
    let report = outcome?;

    apply_canonical_tags(&mut corpus, &cache, &config.filter.omit_tags);
    save_corpus(&corpus, &paths.canonical)?;
    tracing::info!(
        "Canonical tags written for {} works to {}",
        corpus.len(),
        paths.canonical.display()
    );

    if !report.unrecognized.is_empty() {
        tracing::warn!(
            "{} tags could not be classified; they will be requested again next run",
            report.unrecognized.len()
        );
    }
    Ok(report)
}
