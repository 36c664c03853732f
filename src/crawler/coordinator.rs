//! Crawler coordinator - the worker pool over faculties
//!
//! The coordinator hands faculties out through a shared [`WorkCursor`].
//! Each worker claims an index, opens a fresh session, crawls that faculty
//! to completion and keeps the result locally. Results only meet after every
//! worker has been joined, when [`assemble`] merges them in site order and
//! prunes empty branches.

use crate::config::Config;
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::iteration::IterationFetcher;
use crate::crawler::scheduler::{effective_workers, WorkCursor};
use crate::output::CrawlStats;
use crate::plan::{assemble, Curriculum, Faculty};
use crate::session::{HttpSessionFactory, NavigationSession, SessionFactory, SessionStats};
use crate::Result;
use std::sync::Arc;

/// What a run produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub curriculum: Curriculum,
    pub stats: CrawlStats,
}

/// What one worker did, returned when it runs out of work
#[derive(Debug, Default)]
struct WorkerReport {
    faculties: Vec<(usize, Faculty)>,
    sessions: SessionStats,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    sessions: Arc<dyn SessionFactory>,
    iterations: Arc<IterationFetcher>,
}

impl Coordinator {
    /// Creates a coordinator talking to the live site
    ///
    /// # Arguments
    ///
    /// * `config` - The validated harvester configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The HTTP clients or endpoint URLs could not be built
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let sessions = Arc::new(HttpSessionFactory::new(config.clone())?);
        let pages = Arc::new(HttpFetcher::from_config(&config)?);
        let iterations = Arc::new(IterationFetcher::from_config(pages, &config));
        Ok(Self::with_parts(config, sessions, iterations))
    }

    /// Creates a coordinator from explicit collaborators
    pub fn with_parts(
        config: Arc<Config>,
        sessions: Arc<dyn SessionFactory>,
        iterations: Arc<IterationFetcher>,
    ) -> Self {
        Self {
            config,
            sessions,
            iterations,
        }
    }

    /// Reads the faculty names from the form, in site order
    pub async fn discover_faculties(&self) -> Result<Vec<String>> {
        let ui = self.sessions.open_session()?;
        let mut session =
            NavigationSession::new(ui, self.iterations.clone(), self.config.clone(), 0);
        let options = session.faculty_options().await?;
        tracing::info!("Discovered {} faculties", options.len());
        Ok(options.into_iter().map(|o| o.label).collect())
    }

    /// Crawls every faculty in `faculty_names` with up to `workers` parallel sessions
    ///
    /// Never fails: a faculty that cannot be crawled comes back empty and is
    /// pruned, and a worker that dies only loses the faculties it had claimed.
    pub async fn run(&self, faculty_names: &[String], workers: usize) -> CrawlOutcome {
        let workers = effective_workers(workers, faculty_names.len());
        let mut stats = CrawlStats::start(faculty_names.len(), workers);
        tracing::info!(
            "Starting crawl of {} faculties with {} workers",
            faculty_names.len(),
            workers
        );

        let names = Arc::new(faculty_names.to_vec());
        let cursor = Arc::new(WorkCursor::new(names.len()));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 1..=workers {
            let names = names.clone();
            let cursor = cursor.clone();
            let sessions = self.sessions.clone();
            let iterations = self.iterations.clone();
            let config = self.config.clone();
            handles.push(tokio::spawn(async move {
                run_worker(worker_id, names, cursor, sessions, iterations, config).await
            }));
        }

        let mut results = Vec::with_capacity(names.len());
        for handle in handles {
            match handle.await {
                Ok(report) => {
                    stats.merge_worker(report.faculties.len(), &report.sessions);
                    results.extend(report.faculties);
                }
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        let (curriculum, pruned) = assemble(faculty_names, results);
        stats.finish(&curriculum, pruned);
        tracing::info!(
            "Crawl completed: {} faculties, {} iterations kept ({} failed) in {}s",
            stats.faculties_kept,
            stats.iterations_kept,
            stats.sessions.iterations_failed,
            stats.duration_seconds().unwrap_or(0)
        );

        CrawlOutcome { curriculum, stats }
    }
}

async fn run_worker(
    worker_id: usize,
    names: Arc<Vec<String>>,
    cursor: Arc<WorkCursor>,
    sessions: Arc<dyn SessionFactory>,
    iterations: Arc<IterationFetcher>,
    config: Arc<Config>,
) -> WorkerReport {
    let mut report = WorkerReport::default();

    while let Some(index) = cursor.claim() {
        let Some(name) = names.get(index) else {
            break;
        };
        tracing::debug!(
            "[worker {}] Claimed faculty {}/{}: {}",
            worker_id,
            index + 1,
            names.len(),
            name
        );

        let faculty = match sessions.open_session() {
            Ok(ui) => {
                let mut session =
                    NavigationSession::new(ui, iterations.clone(), config.clone(), worker_id);
                let faculty = session.crawl_faculty(name).await;
                report.sessions.merge(&session.stats());
                faculty
            }
            Err(e) => {
                tracing::error!("[worker {}] Could not open a session for {}: {}", worker_id, name, e);
                Faculty::new(name.as_str())
            }
        };
        report.faculties.push((index, faculty));
    }

    tracing::debug!("[worker {}] No faculties left", worker_id);
    report
}

/// Runs a complete crawl over the faculties on the form
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP session factory and page fetcher
/// 2. Read the faculty list from the form
/// 3. Crawl every faculty with the configured worker pool
/// 4. Merge and prune the per-faculty results
///
/// `only` keeps the named faculties (in site order); unknown names are
/// logged and skipped.
pub async fn run_crawl(config: Config, only: &[String]) -> Result<CrawlOutcome> {
    let workers = config.crawler.workers;
    let coordinator = Coordinator::new(config)?;

    let mut faculties = coordinator.discover_faculties().await?;
    if !only.is_empty() {
        for wanted in only {
            if !faculties.contains(wanted) {
                tracing::warn!("Faculty \"{}\" is not on the form, skipping it", wanted);
            }
        }
        faculties.retain(|name| only.contains(name));
    }

    Ok(coordinator.run(&faculties, workers).await)
}
