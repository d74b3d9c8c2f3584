//! HTTP fetcher implementation
//!
//! This module holds the only network primitive of the harvester: a GET that
//! returns the response body as text. Listing, work and tag pages are all
//! fetched through the `Fetch` trait.
//!
//! Requests are issued one at a time. `HttpFetcher` can additionally enforce
//! a minimum delay between two consecutive requests.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Source of page bodies
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issues a GET for `url` and returns the body text
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// The user agent is formatted `Name/Version (+ContactURL; ContactEmail)`.
/// A timeout is only set when one is configured.
///
/// # Example
///
/// ```no_run
/// use fic_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use fic_harvest::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "fic-harvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    let mut builder = Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .brotli(true);

    if let Some(secs) = crawler.request_timeout {
        builder = builder
            .timeout(Duration::from_secs(secs))
            .connect_timeout(Duration::from_secs(secs.min(10)));
    }

    builder.build()
}

/// `Fetch` implementation backed by reqwest
pub struct HttpFetcher {
    client: Client,
    request_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpFetcher {
    pub fn new(client: Client, request_delay: Duration) -> Self {
        Self {
            client,
            request_delay,
            last_request: Mutex::new(None),
        }
    }

    /// Builds the client and politeness delay from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler)?;
        Ok(Self::new(
            client,
            Duration::from_millis(crawler.request_delay),
        ))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        // Held for the whole request so that requests never overlap
        let mut last_request = self.last_request.lock().await;

        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.request_delay {
                tokio::time::sleep(self.request_delay - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());

        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}
