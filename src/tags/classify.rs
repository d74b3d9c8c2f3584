//! Tag page classification
//!
//! A tag page announces what kind of tag it is through one of three fixed
//! phrases, checked in order.

use crate::crawler::{element_text, selector, Fetch};
use crate::{FetchError, ParseError, Result};
use scraper::{ElementRef, Html};
use url::Url;

const UNFILTERABLE_MARKER: &str = "This tag has not been marked common";
const SYNONYM_MARKER: &str = "has been made a synonym of";
const CANONICAL_MARKER: &str = "a common tag";

/// What the archive says about one raw tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalEntry {
    /// The tag is canonical; `synonyms` are the tags merged into it
    Canonical { synonyms: Vec<String> },

    /// The tag was merged into the given canonical tag
    Synonym(String),

    /// The tag is too rare to filter on
    Unfilterable,
}

/// Classifies a fetched tag page
pub fn classify_page(html: &str) -> std::result::Result<CanonicalEntry, ParseError> {
    if html.contains(UNFILTERABLE_MARKER) {
        return Ok(CanonicalEntry::Unfilterable);
    }

    if html.contains(SYNONYM_MARKER) {
        let document = Html::parse_document(html);
        return synonym_target(&document)
            .map(CanonicalEntry::Synonym)
            .ok_or_else(|| ParseError::MissingElement {
                url: "tag page".to_string(),
                element: format!("link after '{}'", SYNONYM_MARKER),
            });
    }

    if html.contains(CANONICAL_MARKER) {
        let document = Html::parse_document(html);
        let items = selector("div.synonym.listbox.group li")?;
        let synonyms = document
            .select(&items)
            .map(|li| element_text(&li))
            .filter(|s| !s.is_empty())
            .collect();
        return Ok(CanonicalEntry::Canonical { synonyms });
    }

    Err(ParseError::UnrecognizedTagPage)
}

/// Text of the first link following the synonym phrase
fn synonym_target(document: &Html) -> Option<String> {
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !text.contains(SYNONYM_MARKER) {
            continue;
        }
        return node
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "a")
            .map(|a| element_text(&a))
            .filter(|target| !target.is_empty());
    }
    None
}

/// `<base>/tags/<tag>` with the tag escaped as a single path segment
pub fn tag_url(base_url: &Url, raw_tag: &str) -> std::result::Result<Url, FetchError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .push("tags")
        .push(raw_tag);
    Ok(url)
}

/// Fetches and classifies the page of `raw_tag`
pub async fn classify<F: Fetch + ?Sized>(
    fetcher: &F,
    base_url: &Url,
    raw_tag: &str,
) -> Result<CanonicalEntry> {
    let url = tag_url(base_url, raw_tag)?;
    tracing::debug!("Classifying tag '{}'", raw_tag);
    let html = fetcher.fetch(&url).await?;
    Ok(classify_page(&html)?)
}
