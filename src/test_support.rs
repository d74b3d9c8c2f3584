//! Shared fixtures for unit tests: a canned-response fetcher, a config, and
//! builders for the archive pages the parsers understand.

use crate::config::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use crate::corpus::{ChapterCount, WorkRecord};
use crate::crawler::Fetch;
use crate::FetchError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

pub fn test_config(base_url: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            category: "Lewis (TV)".to_string(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        },
        crawler: CrawlerConfig::default(),
        output: OutputConfig::default(),
        filter: FilterConfig::default(),
    }
}

/// A one-chapter English work published on 2020-01-01
pub fn sample_record(language: &str) -> WorkRecord {
    WorkRecord::new(
        "Sample",
        language,
        vec!["X".to_string()],
        "1/1".parse::<ChapterCount>().unwrap(),
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    )
}

/// `Fetch` double serving canned bodies and recording every request
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Fetch for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// A listing page with the given last page number (no pagination when `None`)
pub fn listing_html(last_page: Option<u32>, work_ids: &[&str]) -> String {
    let mut html = String::from("<html><body><div id=\"main\">");

    html.push_str("<ol class=\"work index group\">");
    for id in work_ids {
        html.push_str(&format!(
            "<li class=\"work blurb group\" id=\"work_{id}\" role=\"article\"><h4 class=\"heading\"><a href=\"/works/{id}\">Work {id}</a></h4></li>"
        ));
    }
    html.push_str("</ol>");

    if let Some(last) = last_page {
        html.push_str("<ol class=\"pagination actions\" role=\"navigation\">");
        html.push_str("<li class=\"previous\"><span class=\"disabled\">\u{2190} Previous</span></li>");
        html.push_str("<li><span class=\"current\">1</span></li>");
        for page in 2..=last {
            html.push_str(&format!("<li><a href=\"?page={page}\">{page}</a></li>"));
        }
        html.push_str("<li class=\"next\"><a rel=\"next\" href=\"?page=2\">Next \u{2192}</a></li>");
        html.push_str("</ol>");
    }

    html.push_str("</div></body></html>");
    html
}

/// Builder for a work's full-view page
pub struct WorkPage {
    pub title: String,
    pub language: String,
    pub fandoms: Vec<String>,
    pub chapter_count: String,
    pub published: String,
    pub status: Option<String>,
    pub characters: Vec<String>,
    pub relationships: Vec<String>,
    pub freeform: Vec<String>,
    pub chapters: Vec<String>,
    pub extra_meta: Option<String>,
}

impl WorkPage {
    pub fn new(title: &str, language: &str, fandoms: &[&str], chapter_count: &str) -> Self {
        Self {
            title: title.to_string(),
            language: language.to_string(),
            fandoms: fandoms.iter().map(|f| f.to_string()).collect(),
            chapter_count: chapter_count.to_string(),
            published: "2020-01-01".to_string(),
            status: None,
            characters: Vec::new(),
            relationships: Vec::new(),
            freeform: Vec::new(),
            chapters: vec!["<p>Once upon a time.</p>".to_string()],
            extra_meta: None,
        }
    }

    fn tag_list(class: &str, tags: &[String]) -> String {
        if tags.is_empty() {
            return String::new();
        }
        let items: String = tags
            .iter()
            .map(|t| format!("<li><a class=\"tag\" href=\"/tags/x/works\">{t}</a></li>"))
            .collect();
        format!(
            "<dt class=\"{class} tags\">{class}:</dt><dd class=\"{class} tags\"><ul class=\"commas\">{items}</ul></dd>"
        )
    }

    pub fn to_html(&self) -> String {
        let mut meta = String::new();
        meta.push_str(&Self::tag_list("rating", &["General Audiences".to_string()]));
        meta.push_str(&Self::tag_list("fandom", &self.fandoms));
        meta.push_str(&Self::tag_list("relationship", &self.relationships));
        meta.push_str(&Self::tag_list("character", &self.characters));
        meta.push_str(&Self::tag_list("freeform", &self.freeform));
        if let Some(extra) = &self.extra_meta {
            meta.push_str(extra);
        }
        meta.push_str(&format!(
            "<dt class=\"language\">Language:</dt><dd class=\"language\" lang=\"en\">\n  {}\n</dd>",
            self.language
        ));

        let status = self
            .status
            .as_ref()
            .map(|s| format!("<dt class=\"status\">Updated:</dt><dd class=\"status\">{s}</dd>"))
            .unwrap_or_default();
        meta.push_str(&format!(
            "<dt class=\"stats\">Stats:</dt><dd class=\"stats\"><dl class=\"stats\">\
             <dt class=\"published\">Published:</dt><dd class=\"published\">{}</dd>{}\
             <dt class=\"words\">Words:</dt><dd class=\"words\">1,234</dd>\
             <dt class=\"chapters\">Chapters:</dt><dd class=\"chapters\">{}</dd>\
             <dt class=\"kudos\">Kudos:</dt><dd class=\"kudos\">56</dd>\
             <dt class=\"hits\">Hits:</dt><dd class=\"hits\">7,890</dd>\
             </dl></dd>",
            self.published, status, self.chapter_count
        ));

        let chapters: String = self
            .chapters
            .iter()
            .map(|body| {
                format!(
                    "<div class=\"chapter\"><div class=\"userstuff module\" role=\"article\"><h3 class=\"landmark heading\">Chapter Text</h3>{body}</div></div>"
                )
            })
            .collect();

        format!(
            "<html><body><div class=\"wrapper\"><dl class=\"work meta group\">{meta}</dl></div>\
             <div id=\"workskin\"><div class=\"preface group\">\
             <h2 class=\"title heading\">\n  {}\n</h2>\
             <h3 class=\"byline heading\"><a rel=\"author\" href=\"/users/author1\">author1</a></h3>\
             <div class=\"summary module\"><h3 class=\"heading\">Summary:</h3><blockquote class=\"userstuff\"><p>A summary.</p></blockquote></div>\
             </div><div id=\"chapters\">{chapters}</div></div></body></html>",
            self.title
        )
    }
}

/// A tag page declaring `tag` canonical, listing `synonyms`
pub fn canonical_tag_html(tag: &str, synonyms: &[&str]) -> String {
    let synonyms_block = if synonyms.is_empty() {
        String::new()
    } else {
        let items: String = synonyms
            .iter()
            .map(|s| format!("<li><a class=\"tag\" href=\"/tags/x\">{s}</a></li>"))
            .collect();
        format!(
            "<div class=\"synonym listbox group\"><h3 class=\"heading\">Tags with the same meaning:</h3><ul class=\"tags commas index group\">{items}</ul></div>"
        )
    };
    format!(
        "<html><body><div class=\"tag home profile\"><h2 class=\"heading\">{tag}</h2>\
         <p>This tag belongs to the Additional Tags Category. It's a common tag. You can use it to filter works and to filter bookmarks.</p>\
         {synonyms_block}</div></body></html>"
    )
}

/// A tag page declaring `tag` a synonym of `target`
pub fn synonym_tag_html(tag: &str, target: &str) -> String {
    format!(
        "<html><body><div class=\"tag home profile\"><h2 class=\"heading\">{tag}</h2>\
         <div class=\"merger module\"><h3 class=\"heading\">Mergers</h3>\
         <p>{tag} has been made a synonym of <a class=\"tag\" href=\"/tags/{target}\">{target}</a>. Works and bookmarks tagged with {tag} will show up in {target}'s filter.</p>\
         </div></div></body></html>"
    )
}

/// A tag page for a tag that cannot be filtered on
pub fn unfilterable_tag_html(tag: &str) -> String {
    format!(
        "<html><body><div class=\"tag home profile\"><h2 class=\"heading\">{tag}</h2>\
         <p>This tag belongs to the Additional Tags Category. This tag has not been marked common and can't be filtered on (yet).</p>\
         </div></body></html>"
    )
}
