//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to serve an archive site and drive the real
//! `HttpFetcher` through download, filter, tag resolution and dataset stages.

use fic_harvest::config::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use fic_harvest::corpus::{load_corpus, save_corpus, Corpus};
use fic_harvest::crawler::{build_corpus, BuildOutcome, Fetch, HttpFetcher};
use fic_harvest::filter::run_filter_stage;
use fic_harvest::tags::{run_dataset_stage, run_tag_stage, TagCache, TagType};
use fic_harvest::{FetchError, HarvestError, WorkId};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/tags/Lewis/works";

/// Creates a test configuration for the category "Lewis" on `base_url`
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            category: "Lewis".to_string(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        },
        crawler: CrawlerConfig {
            checkpoint_interval: 2,
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            directory: Some(dir.to_path_buf()),
            ..OutputConfig::default()
        },
        filter: FilterConfig {
            restrict_language: true,
            min_tag_uses: 2,
            ..FilterConfig::default()
        },
    }
}

fn listing_page(last_page: u32, ids: &[&str]) -> String {
    let works: String = ids
        .iter()
        .map(|id| format!("<li class=\"work blurb group\" id=\"work_{id}\"><h4>Work {id}</h4></li>"))
        .collect();
    let pages: String = (2..=last_page)
        .map(|p| format!("<li><a href=\"?page={p}\">{p}</a></li>"))
        .collect();
    format!(
        "<html><body><ol class=\"work index group\">{works}</ol>\
         <ol class=\"pagination actions\"><li><span class=\"current\">1</span></li>{pages}\
         <li class=\"next\"><a rel=\"next\" href=\"?page=2\">Next</a></li></ol></body></html>"
    )
}

fn work_page(title: &str, language: &str, freeform: &[&str]) -> String {
    let freeform_block = if freeform.is_empty() {
        String::new()
    } else {
        let items: String = freeform
            .iter()
            .map(|t| format!("<li><a class=\"tag\">{t}</a></li>"))
            .collect();
        format!("<dt class=\"freeform tags\">Additional Tags:</dt><dd class=\"freeform tags\"><ul>{items}</ul></dd>")
    };

    format!(
        "<html><body><dl class=\"work meta group\">\
         <dt class=\"rating tags\">Rating:</dt><dd class=\"rating tags\"><ul><li><a class=\"tag\">General Audiences</a></li></ul></dd>\
         <dt class=\"fandom tags\">Fandom:</dt><dd class=\"fandom tags\"><ul><li><a class=\"tag\">Lewis</a></li></ul></dd>\
         {freeform_block}\
         <dt class=\"language\">Language:</dt><dd class=\"language\">{language}</dd>\
         <dt class=\"stats\">Stats:</dt><dd class=\"stats\"><dl class=\"stats\">\
         <dt class=\"published\">Published:</dt><dd class=\"published\">2015-03-01</dd>\
         <dt class=\"words\">Words:</dt><dd class=\"words\">2,500</dd>\
         <dt class=\"chapters\">Chapters:</dt><dd class=\"chapters\">1/1</dd>\
         </dl></dd></dl>\
         <h2 class=\"title heading\">{title}</h2>\
         <h3 class=\"byline heading\"><a rel=\"author\" href=\"/users/someone\">someone</a></h3>\
         <div id=\"chapters\"><div class=\"userstuff module\"><h3 class=\"landmark heading\">Chapter Text</h3>\
         <p>\u{201c}Morning, sir.\u{201d}</p><p>Hathaway waited\u{2026}</p></div></div>\
         </body></html>"
    )
}

async fn mount_listing(server: &MockServer, pages: &[&[&str]]) {
    let last = pages.len() as u32;
    for (index, ids) in pages.iter().enumerate().skip(1) {
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .and(query_param("page", (index + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(last, ids)))
            .mount(server)
            .await;
    }

    // First page, with or without ?page=1
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(last, pages[0])))
        .mount(server)
        .await;
}

async fn mount_work(server: &MockServer, id: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/works/{id}")))
        .and(query_param("view_full_work", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_tag(server: &MockServer, tag: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/tags/{tag}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn fetcher(config: &Config) -> HttpFetcher {
    HttpFetcher::from_config(&config.user_agent, &config.crawler)
        .expect("Failed to build HTTP client")
}

#[tokio::test]
async fn test_full_pipeline() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), dir.path());
    let paths = config.paths();

    mount_listing(&server, &[&["1", "2"], &["3"]]).await;
    mount_work(&server, "1", work_page("First", "English", &["angsty", "Fluff"]), 1).await;
    mount_work(&server, "2", work_page("Second", "French", &["Angst"]), 1).await;
    mount_work(&server, "3", work_page("Third", "English", &["Angst"]), 1).await;

    mount_tag(
        &server,
        "Angst",
        "<p>It's a common tag.</p><div class=\"synonym listbox group\"><ul><li><a>angsty</a></li></ul></div>".to_string(),
        1,
    )
    .await;
    mount_tag(
        &server,
        "Fluff",
        "<p>This tag has not been marked common and can't be filtered on (yet).</p>".to_string(),
        1,
    )
    .await;
    // Settled by the canonical page of "Angst"
    mount_tag(&server, "angsty", String::new(), 0).await;

    let fetcher = fetcher(&config);

    // Download
    let outcome = build_corpus(&config, &fetcher, &mut |_: &Path| true, false)
        .await
        .expect("Download failed");
    let report = match outcome {
        BuildOutcome::Committed(report) => report,
        BuildOutcome::Declined => panic!("Download was declined"),
    };
    assert_eq!(report.discovered, 3);
    assert_eq!(report.extracted, 3);
    assert_eq!(report.checkpoint_writes, 1);
    assert!(!paths.checkpoint.exists());

    let corpus = load_corpus(&paths.corpus).expect("Failed to load corpus");
    let first = corpus.get(&WorkId::new("1")).expect("Work 1 missing");
    assert_eq!(first.title, "First");
    assert_eq!(first.words, Some(2500));
    assert_eq!(first.text.get(&1).map(String::as_str), Some("\"Morning, sir.\"\n\nHathaway waited..."));

    // Filter
    let stats = run_filter_stage(&config).expect("Filter failed");
    assert_eq!((stats.before, stats.after), (3, 2));

    // Tags
    let resolved = run_tag_stage(&config, &fetcher).await.expect("Tag stage failed");
    assert_eq!(resolved.requested, 2);
    assert!(resolved.unrecognized.is_empty());

    let cache = TagCache::load(&paths.tag_cache).expect("Failed to load tag cache");
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(TagType::Freeform, "angsty"), Some(Some("Angst")));
    assert_eq!(cache.get(TagType::Freeform, "Fluff"), Some(None));

    let canonical = load_corpus(&paths.canonical).expect("Failed to load canonical corpus");
    let first = canonical.get(&WorkId::new("1")).expect("Work 1 missing");
    assert_eq!(
        first.canonical_tags(TagType::Freeform),
        Some(&["Angst".to_string()][..])
    );
    assert_eq!(first.canonical_tags(TagType::Character), Some(&[][..]));

    // Dataset
    let dataset = run_dataset_stage(&config).expect("Dataset stage failed");
    assert_eq!(dataset.len(), 2);
    assert!(paths.dataset.exists());
}

#[tokio::test]
async fn test_download_resumes_from_checkpoint() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), dir.path());
    let paths = config.paths();

    mount_listing(&server, &[&["1"], &["2"]]).await;
    mount_work(&server, "1", work_page("First", "English", &[]), 0).await;
    mount_work(&server, "2", work_page("Second", "English", &[]), 1).await;

    // Simulate an interrupted run that got as far as work 1
    let mut checkpoint = Corpus::new();
    let record = {
        let html = work_page("From checkpoint", "English", &[]);
        fic_harvest::crawler::parse_work(&html, "checkpoint").expect("Fixture should parse")
    };
    checkpoint.insert_new(WorkId::new("1"), record);
    save_corpus(&checkpoint, &paths.checkpoint).expect("Failed to write checkpoint");

    let fetcher = fetcher(&config);
    let outcome = build_corpus(&config, &fetcher, &mut |_: &Path| true, false)
        .await
        .expect("Download failed");

    match outcome {
        BuildOutcome::Committed(report) => {
            assert_eq!(report.resumed_from, 1);
            assert_eq!(report.extracted, 1);
        }
        BuildOutcome::Declined => panic!("Download was declined"),
    }

    let corpus = load_corpus(&paths.corpus).expect("Failed to load corpus");
    assert_eq!(corpus.len(), 2);
    assert_eq!(
        corpus.get(&WorkId::new("1")).map(|r| r.title.as_str()),
        Some("From checkpoint")
    );
    assert!(!paths.checkpoint.exists());
}

#[tokio::test]
async fn test_failed_work_is_left_out() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), dir.path());

    mount_listing(&server, &[&["1"], &["2"]]).await;
    mount_work(&server, "1", work_page("First", "English", &[]), 1).await;
    Mock::given(method("GET"))
        .and(path("/works/2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&config);
    let outcome = build_corpus(&config, &fetcher, &mut |_: &Path| true, false)
        .await
        .expect("Download failed");

    let BuildOutcome::Committed(report) = outcome else {
        panic!("Download was declined");
    };
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, WorkId::new("2"));

    let corpus = load_corpus(&config.paths().corpus).expect("Failed to load corpus");
    assert!(corpus.contains(&WorkId::new("1")));
    assert!(!corpus.contains(&WorkId::new("2")));
}

#[tokio::test]
async fn test_fetcher_identifies_itself() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/hello"))
        .and(header(
            "user-agent",
            "TestHarvester/1.0 (+https://example.com/about; admin@example.com)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
        .expect(1)
        .mount(&server)
        .await;

    let url = url::Url::parse(&format!("{}/hello", server.uri())).unwrap();
    let body = fetcher(&config).fetch(&url).await.expect("Fetch failed");
    assert_eq!(body, "hi");
}

#[tokio::test]
async fn test_fetcher_reports_http_status() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), dir.path());

    let url = url::Url::parse(&format!("{}/missing", server.uri())).unwrap();
    let result = fetcher(&config).fetch(&url).await;

    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_fetcher_spaces_requests() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.request_delay = 200;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let fetcher = fetcher(&config);
    let url = url::Url::parse(&server.uri()).unwrap();

    let started = Instant::now();
    fetcher.fetch(&url).await.expect("First fetch failed");
    fetcher.fetch(&url).await.expect("Second fetch failed");

    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_listing_without_pagination_aborts_download() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Retry later</body></html>"))
        .mount(&server)
        .await;

    let fetcher = fetcher(&config);
    let result = build_corpus(&config, &fetcher, &mut |_: &Path| true, false).await;

    assert!(matches!(result, Err(HarvestError::Parse(_))));
    assert!(!config.paths().corpus.exists());
}
