//! Crawler module for page fetching and crawl coordination
//!
//! This module contains the core crawling logic, including:
//! - HTTP page fetching behind the [`PageSource`] trait
//! - HTML extraction for listing, iteration and elective pages
//! - Iteration fetching with bounded retries
//! - Work distribution and the worker pool

mod coordinator;
mod fetcher;
mod iteration;
pub mod parser;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use fetcher::{build_http_client, fetch_text, HttpFetcher, PageSource};
pub use iteration::{FetchedIteration, IterationFetcher, RetryPolicy};
pub use scheduler::{effective_workers, WorkCursor};
