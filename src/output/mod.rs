//! Output module for the harvested course plans
//!
//! This module handles:
//! - Writing the course plan text file and reading it back
//! - Recording crawl statistics

pub mod plan_text;
pub mod stats;

pub use plan_text::{format_curriculum, parse_curriculum, write_curriculum};
pub use stats::{print_statistics, CrawlStats};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed course plans at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
