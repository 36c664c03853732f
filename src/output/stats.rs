//! Run statistics
//!
//! Counters gathered from every worker's sessions plus what the final
//! assembly pruned, with wall-clock timestamps for the run.

use crate::plan::{Curriculum, PruneReport};
use crate::session::SessionStats;
use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Workers actually started
    pub workers: usize,

    /// Faculties handed to the run
    pub faculties_total: usize,

    /// Faculties some worker claimed and finished
    pub faculties_claimed: usize,

    /// Navigation and fetch counters summed over every session
    pub sessions: SessionStats,

    /// Branches removed by the final pruning pass
    pub pruned: PruneReport,

    /// Shape of the final tree
    pub faculties_kept: usize,
    pub programs_kept: usize,
    pub iterations_kept: usize,
}

impl CrawlStats {
    pub fn start(faculties_total: usize, workers: usize) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            workers,
            faculties_total,
            faculties_claimed: 0,
            sessions: SessionStats::default(),
            pruned: PruneReport::default(),
            faculties_kept: 0,
            programs_kept: 0,
            iterations_kept: 0,
        }
    }

    /// Adds one worker's counters
    pub fn merge_worker(&mut self, claimed: usize, sessions: &SessionStats) {
        self.faculties_claimed += claimed;
        self.sessions.merge(sessions);
    }

    /// Records the final tree and stamps the finish time
    pub fn finish(&mut self, curriculum: &Curriculum, pruned: PruneReport) {
        self.pruned = pruned;
        self.faculties_kept = curriculum.faculties.len();
        self.programs_kept = curriculum.faculties.iter().map(|f| f.programs().count()).sum();
        self.iterations_kept = curriculum.iteration_count();
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Faculties that went into the run but came out empty
    pub fn faculties_empty(&self) -> usize {
        self.pruned.faculties
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    let s = &stats.sessions;

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = stats.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!("  Workers: {}", stats.workers);
    println!();

    println!("Faculties:");
    println!("  Requested: {}", stats.faculties_total);
    println!("  Claimed: {}", stats.faculties_claimed);
    println!("  Not found: {}", s.faculties_not_found);
    println!("  Empty (pruned): {}", stats.faculties_empty());
    println!("  Kept: {}", stats.faculties_kept);
    println!();

    println!("Navigation:");
    println!("  Leaves visited: {}", s.leaves_visited);
    println!("  Leaves failed: {}", s.leaves_failed);
    println!("  Branches abandoned: {}", s.branches_abandoned);
    println!("  Resets recovered: {}", s.resets_recovered);
    println!("  Resets abandoned: {}", s.resets_abandoned);
    println!();

    println!("Iterations:");
    println!("  Fetched: {}", s.iterations_fetched);
    println!("  Failed: {}", s.iterations_failed);
    println!("  Kept: {}", stats.iterations_kept);
    println!("  Programs kept: {}", stats.programs_kept);
    println!(
        "  Pruned: {} programs, {} program types, {} faculties",
        stats.pruned.programs, stats.pruned.program_types, stats.pruned.faculties
    );

    let attempted = s.iterations_fetched + s.iterations_failed;
    if attempted > 0 {
        let success_rate = s.iterations_fetched as f64 / attempted as f64 * 100.0;
        println!("\nIteration success rate: {:.1}%", success_rate);
    }
}
