//! Curriculum Harvester: a concurrent crawler for cascading curriculum forms
//!
//! This crate drives a multi-step selection form (faculty → program type →
//! program → plan type → iteration) with a pool of independent sessions,
//! extracts every curriculum iteration reachable from it, and merges the
//! per-faculty results into one pruned tree ready for serialization.

pub mod config;
pub mod crawler;
pub mod output;
pub mod plan;
pub mod session;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unexpected page shape at {url}: {message}")]
    UnexpectedPageShape { url: String, message: String },

    #[error("No {level} option named \"{name}\"")]
    NotFound {
        level: session::Level,
        name: String,
    },

    #[error("Selections were reset before choosing a {level}")]
    StaleState { level: session::Level },

    #[error("The {0} dropdown has not been populated")]
    NotPopulated(session::Level),

    #[error("Cannot submit before a {0} is selected")]
    IncompleteSelection(session::Level),

    #[error("Invalid navigation transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::NavState,
        to: state::NavState,
    },

    #[error("Worker error: {0}")]
    Worker(String),
}

impl HarvestError {
    /// Returns true for errors that mean the cascading selections went stale
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::StaleState { .. } | Self::NotPopulated(_) | Self::IncompleteSelection(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome};
pub use plan::{CourseSlot, Curriculum, ElectiveGroup, IterationPlan};
pub use state::NavState;
