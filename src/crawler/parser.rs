//! HTML parser for listing pages and work pages
//!
//! This module turns archive markup into structured data:
//! - the last page number of a category listing
//! - the work ids listed on one listing page
//! - a complete `WorkRecord` from a work's full-view page
//!
//! Every structural surprise is reported as a `ParseError` rather than being
//! papered over; a changed page layout must stop the harvest loudly.

use crate::corpus::{ChapterCount, WorkId, WorkRecord};
use crate::tags::TagType;
use crate::ParseError;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Parses a CSS selector, mapping failures into `ParseError`
pub(crate) fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{}: {:?}", css, e)))
}

/// Extracts the number of the last listing page
///
/// The pagination control is `ol.pagination.actions`; its last link is
/// "Next", the one before it holds the last page number.
pub fn parse_page_count(html: &str, url: &str) -> Result<u32, ParseError> {
    let document = Html::parse_document(html);
    let pagination_selector = selector("ol.pagination.actions")?;
    let link_selector = selector("a")?;

    let pagination = document
        .select(&pagination_selector)
        .next()
        .ok_or_else(|| ParseError::MissingElement {
            url: url.to_string(),
            element: "ol.pagination.actions".to_string(),
        })?;

    let links: Vec<ElementRef> = pagination.select(&link_selector).collect();
    if links.len() < 2 {
        return Err(ParseError::MissingElement {
            url: url.to_string(),
            element: "last page link".to_string(),
        });
    }

    let label = element_text(&links[links.len() - 2]);
    label.parse::<u32>().map_err(|_| ParseError::InvalidValue {
        field: "last page".to_string(),
        value: label,
    })
}

/// Extracts the work ids of one listing page, in listing order
///
/// Each work is an `li.work.blurb.group` whose id attribute is `work_<id>`.
pub fn parse_work_ids(html: &str, url: &str) -> Result<Vec<WorkId>, ParseError> {
    let document = Html::parse_document(html);
    let blurb_selector = selector("li.work.blurb.group")?;

    document
        .select(&blurb_selector)
        .map(|blurb| {
            let raw = blurb.value().attr("id").unwrap_or("");
            match raw.split_once('_') {
                Some(("work", id)) if !id.is_empty() => Ok(WorkId::new(id)),
                _ => Err(ParseError::InvalidValue {
                    field: format!("work blurb id on {}", url),
                    value: raw.to_string(),
                }),
            }
        })
        .collect()
}

/// Field markers of the work metadata block (`dl.work.meta.group > dd`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Rating,
    Warning,
    Category,
    Fandom,
    Relationship,
    Character,
    Freeform,
    Language,
    Series,
    Collections,
    Stats,
}

impl MetaField {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "rating" => Some(Self::Rating),
            "warning" => Some(Self::Warning),
            "category" => Some(Self::Category),
            "fandom" => Some(Self::Fandom),
            "relationship" => Some(Self::Relationship),
            "character" => Some(Self::Character),
            "freeform" => Some(Self::Freeform),
            "language" => Some(Self::Language),
            "series" => Some(Self::Series),
            "collections" => Some(Self::Collections),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

/// Field markers of the statistics block (`dl.stats > dd`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatField {
    Published,
    Status,
    Words,
    Chapters,
    Comments,
    Kudos,
    Bookmarks,
    Hits,
}

impl StatField {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "published" => Some(Self::Published),
            "status" => Some(Self::Status),
            "words" => Some(Self::Words),
            "chapters" => Some(Self::Chapters),
            "comments" => Some(Self::Comments),
            "kudos" => Some(Self::Kudos),
            "bookmarks" => Some(Self::Bookmarks),
            "hits" => Some(Self::Hits),
            _ => None,
        }
    }
}

/// Parses a work's full-view page into a `WorkRecord`
///
/// Extraction is all-or-nothing: any missing required field or unknown field
/// marker fails the whole work.
pub fn parse_work(html: &str, url: &str) -> Result<WorkRecord, ParseError> {
    let document = Html::parse_document(html);
    let missing = |field: &str| ParseError::MissingField {
        url: url.to_string(),
        field: field.to_string(),
    };

    let title = document
        .select(&selector("h2.title.heading")?)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| missing("title"))?;

    let author = document
        .select(&selector(r#"a[rel="author"]"#)?)
        .map(|e| element_text(&e))
        .collect();

    let summary = document
        .select(&selector("div.summary.module blockquote.userstuff")?)
        .next()
        .map(html_to_text)
        .unwrap_or_default();

    let meta = document
        .select(&selector("dl.work.meta.group")?)
        .next()
        .ok_or_else(|| ParseError::MissingElement {
            url: url.to_string(),
            element: "dl.work.meta.group".to_string(),
        })?;

    let mut rating = Vec::new();
    let mut warning = Vec::new();
    let mut category = Vec::new();
    let mut fandom = None;
    let mut tags: BTreeMap<TagType, Vec<String>> = BTreeMap::new();
    let mut language = None;
    let mut series = None;
    let mut collections = None;

    let li_selector = selector("li")?;
    for node in child_elements(meta, "dd") {
        let marker = node
            .value()
            .classes()
            .find(|c| *c != "tags")
            .unwrap_or("");
        let field = MetaField::from_marker(marker).ok_or_else(|| ParseError::UnknownField {
            url: url.to_string(),
            marker: marker.to_string(),
        })?;

        let items = || -> Vec<String> {
            node.select(&li_selector)
                .map(|li| element_text(&li))
                .collect()
        };

        match field {
            MetaField::Rating => rating = items(),
            MetaField::Warning => warning = items(),
            MetaField::Category => category = items(),
            MetaField::Fandom => fandom = Some(items()),
            MetaField::Relationship => {
                tags.insert(TagType::Relationship, items());
            }
            MetaField::Character => {
                tags.insert(TagType::Character, items());
            }
            MetaField::Freeform => {
                tags.insert(TagType::Freeform, items());
            }
            MetaField::Collections => collections = Some(items()),
            MetaField::Language => language = Some(html_to_text(node)),
            MetaField::Series => series = Some(html_to_text(node)),
            // Parsed below from the nested statistics list
            MetaField::Stats => {}
        }
    }

    let mut published = None;
    let mut status = None;
    let mut chapters = None;
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();

    if let Some(stats) = document.select(&selector("dl.stats")?).next() {
        for node in child_elements(stats, "dd") {
            let marker = node.value().classes().next().unwrap_or("");
            let field =
                StatField::from_marker(marker).ok_or_else(|| ParseError::UnknownField {
                    url: url.to_string(),
                    marker: marker.to_string(),
                })?;
            let value = element_text(&node);

            match field {
                StatField::Published => published = Some(parse_date("published", &value)?),
                StatField::Status => status = Some(parse_date("status", &value)?),
                StatField::Chapters => chapters = Some(value.parse::<ChapterCount>()?),
                StatField::Words => {
                    counts.insert("words", parse_count("words", &value)?);
                }
                StatField::Comments => {
                    counts.insert("comments", parse_count("comments", &value)?);
                }
                StatField::Kudos => {
                    counts.insert("kudos", parse_count("kudos", &value)?);
                }
                StatField::Bookmarks => {
                    counts.insert("bookmarks", parse_count("bookmarks", &value)?);
                }
                StatField::Hits => {
                    counts.insert("hits", parse_count("hits", &value)?);
                }
            }
        }
    }

    let mut text = BTreeMap::new();
    for (index, chapter) in document.select(&selector("div.userstuff")?).enumerate() {
        text.insert(index as u32 + 1, strip_chapter_heading(html_to_text(chapter)));
    }

    let mut record = WorkRecord::new(
        title,
        language
            .filter(|l| !l.is_empty())
            .ok_or_else(|| missing("language"))?,
        fandom.ok_or_else(|| missing("fandom"))?,
        chapters.ok_or_else(|| missing("chapters"))?,
        published.ok_or_else(|| missing("published"))?,
    );
    record.author = author;
    record.summary = summary;
    record.rating = rating;
    record.warning = warning;
    record.category = category;
    for (tag_type, values) in tags {
        *record.raw_tags_mut(tag_type) = Some(values);
    }
    record.series = series;
    record.collections = collections;
    record.status = status;
    record.words = counts.get("words").copied();
    record.comments = counts.get("comments").copied();
    record.kudos = counts.get("kudos").copied();
    record.bookmarks = counts.get("bookmarks").copied();
    record.hits = counts.get("hits").copied();
    record.text = text;

    Ok(record)
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ParseError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Parses a statistic such as "12,345"
fn parse_count(field: &str, value: &str) -> Result<u64, ParseError> {
    value
        .replace(',', "")
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Direct children of `parent` with the given tag name
fn child_elements<'a>(parent: ElementRef<'a>, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == name)
}

/// The element's text with whitespace collapsed
pub(crate) fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_chapter_heading(text: String) -> String {
    match text.strip_prefix("Chapter Text") {
        Some(rest) => rest.trim_start().to_string(),
        None => text,
    }
}

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "hr",
    "table", "tr", "pre", "center",
];

/// Converts an HTML fragment to plain text
///
/// Block elements become paragraphs separated by a blank line, `<br>` becomes
/// a line break, runs of whitespace collapse to one space, and typographic
/// characters are reduced to ASCII.
pub fn html_to_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    normalize_typography(out.trim())
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            for c in text.chars() {
                if c.is_whitespace() && c != '\u{00A0}' {
                    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                        out.push(' ');
                    }
                } else {
                    out.push(c);
                }
            }
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if name == "br" {
                trim_trailing_spaces(out);
                out.push('\n');
                continue;
            }

            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                paragraph_break(out);
            }
            collect_text(child_element, out);
            if block {
                paragraph_break(out);
            }
        }
    }
}

fn trim_trailing_spaces(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

fn paragraph_break(out: &mut String) {
    trim_trailing_spaces(out);
    if out.is_empty() || out.ends_with("\n\n") {
        return;
    }
    if out.ends_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
}

/// Replaces smart quotes, dashes and ellipses with ASCII equivalents
pub fn normalize_typography(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' => out.push('-'),
            '\u{2014}' => out.push_str("--"),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{00AB}' | '\u{00BB}' => {}
            other => out.push(other),
        }
    }
    out
}
