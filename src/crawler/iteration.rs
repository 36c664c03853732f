//! Iteration listing and detail fetching
//!
//! Given the listing URL produced by submitting the form, fetches every
//! iteration page it links to, follows elective triggers, and assembles the
//! semesters. Page failures are retried with linear backoff; an iteration
//! that exhausts its attempts is recorded as [`IterationPlan::Failed`].

use crate::config::Config;
use crate::crawler::fetcher::PageSource;
use crate::crawler::parser::{
    parse_elective_options, parse_iteration_listing, parse_semesters, ListingEntry, RawSlot,
};
use crate::plan::{CourseSlot, IterationPlan, Semester};
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause after attempt `n` is `n * backoff`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }

    /// Runs `op` until it succeeds or the attempts run out, returning the last error
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::warn!("Giving up on {} after {} attempts: {}", what, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.max_attempts,
                        what,
                        e
                    );
                    tokio::time::sleep(self.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// One listed iteration and what fetching it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedIteration {
    /// Raw composite label from the listing
    pub label: String,
    pub plan: IterationPlan,
}

/// Fetches and parses iteration pages
pub struct IterationFetcher {
    pages: Arc<dyn PageSource>,
    policy: RetryPolicy,
    elective_markers: Vec<String>,
}

impl IterationFetcher {
    pub fn new(pages: Arc<dyn PageSource>, policy: RetryPolicy, elective_markers: Vec<String>) -> Self {
        Self {
            pages,
            policy,
            elective_markers,
        }
    }

    pub fn from_config(pages: Arc<dyn PageSource>, config: &Config) -> Self {
        Self::new(
            pages,
            RetryPolicy::new(
                config.crawler.iteration_retries,
                Duration::from_millis(config.crawler.retry_backoff_ms),
            ),
            config.site.elective_markers.clone(),
        )
    }

    /// Fetches the listing page and returns its (label, url) rows
    pub async fn fetch_listing(&self, listing_url: &Url) -> Result<Vec<ListingEntry>> {
        self.policy
            .run(&format!("listing {}", listing_url), || async {
                let html = self.pages.fetch_page(listing_url).await?;
                parse_iteration_listing(&html, listing_url)
            })
            .await
    }

    /// Fetches one iteration page and resolves its elective groups, single attempt
    pub async fn fetch_iteration(&self, url: &Url) -> Result<Vec<Semester>> {
        let html = self.pages.fetch_page(url).await?;
        let raw_semesters = parse_semesters(&html, url, &self.elective_markers)?;

        let mut semesters = Vec::with_capacity(raw_semesters.len());
        for raw in raw_semesters {
            let mut semester = Vec::with_capacity(raw.len());
            for slot in raw {
                semester.push(self.resolve_slot(slot).await?);
            }
            semesters.push(semester);
        }
        Ok(semesters)
    }

    async fn resolve_slot(&self, slot: RawSlot) -> Result<CourseSlot> {
        match slot {
            RawSlot::Course(code) => Ok(CourseSlot::Course(code)),
            RawSlot::ElectiveTrigger { title, url } => {
                let html = self.pages.fetch_page(&url).await?;
                let options = parse_elective_options(&html).unwrap_or_else(|| {
                    tracing::debug!("Elective page {} has no table, recording \"{}\" without options", url, title);
                    Vec::new()
                });
                Ok(CourseSlot::elective(title, options))
            }
        }
    }

    /// Fetches one iteration with retries; exhaustion yields `IterationPlan::Failed`
    pub async fn fetch_iteration_plan(&self, label: &str, url: &Url) -> IterationPlan {
        match self
            .policy
            .run(&format!("iteration \"{}\"", label), || self.fetch_iteration(url))
            .await
        {
            Ok(semesters) => IterationPlan::Semesters(semesters),
            Err(_) => IterationPlan::Failed,
        }
    }

    /// Fetches every iteration linked from a listing, in listing order
    ///
    /// Fails only if the listing itself cannot be read.
    pub async fn fetch_all(&self, listing_url: &Url, log_prefix: &str) -> Result<Vec<FetchedIteration>> {
        let entries = self.fetch_listing(listing_url).await?;
        if entries.is_empty() {
            tracing::info!("{} Listing {} has no iterations", log_prefix, listing_url);
        }

        let mut fetched = Vec::with_capacity(entries.len());
        for entry in entries {
            tracing::info!("{} Scraping the iteration: {}", log_prefix, entry.label);
            let plan = self.fetch_iteration_plan(&entry.label, &entry.url).await;
            if plan.is_failed() {
                tracing::error!("{} Iteration \"{}\" ({}) failed", log_prefix, entry.label, entry.url);
            }
            fetched.push(FetchedIteration {
                label: entry.label,
                plan,
            });
        }
        Ok(fetched)
    }
}

impl std::fmt::Debug for IterationFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationFetcher")
            .field("policy", &self.policy)
            .field("elective_markers", &self.elective_markers)
            .finish_non_exhaustive()
    }
}
