//! HTTP fetcher implementation
//!
//! This module handles all plain page fetches, including:
//! - Building HTTP clients with the polite user agent string
//! - GET requests returning page bodies
//! - Error classification (timeout, HTTP status, transport)
//!
//! Retrying is left to the callers, which know what a failure costs.

use crate::config::{Config, UserAgentConfig};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Anything that can turn a URL into page HTML
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<String>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Whole-request timeout
/// * `cookies` - Whether the client keeps a cookie store, which makes it
///   behave like one browser context across requests
///
/// # Example
///
/// ```no_run
/// use curriculum_harvester::config::UserAgentConfig;
/// use curriculum_harvester::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(25), false).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
    cookies: bool,
) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .cookie_store(cookies)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body
///
/// # Error Mapping
///
/// | Condition | Error |
/// |-----------|-------|
/// | Timeout | `Timeout` |
/// | Non-2xx status | `HttpStatus` |
/// | Connection / body failure | `Http` |
pub async fn fetch_text(client: &Client, url: &Url, timeout: Option<Duration>) -> Result<String> {
    let mut request = client.get(url.clone());
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify_error(url, e))
}

fn classify_error(url: &Url, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Stateless page fetcher shared by every worker
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
            false,
        )?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String> {
        tracing::debug!("GET {}", url);
        fetch_text(&self.client, url, None).await
    }
}
