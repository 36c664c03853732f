//! Traversal of one faculty through the cascading form
//!
//! A [`NavigationSession`] owns one [`SelectionUi`] and walks every allowed
//! (program type, program, plan type) leaf under a single faculty:
//!
//! 1. Open the form and find the faculty option by its display name.
//! 2. Select it, read program types, keep the allow-listed ones.
//! 3. For each program type, read every program; for each program read the
//!    plan types and keep the allow-listed values.
//! 4. For each plan type, submit and hand the listing to the
//!    [`IterationFetcher`], then navigate back to the form.
//!
//! The site can silently wipe every selection on backward navigation. After
//! each leaf the session checks for placeholder markers and, if they are
//! showing, re-drives (faculty, program type, program) before moving on to
//! the next plan type. Every dropdown read is retried a bounded number of
//! times; a branch whose options never show up is abandoned.
//!
//! Nothing in here returns an error to the caller: failures end up in the
//! log and in [`SessionStats`].

use crate::config::Config;
use crate::crawler::IterationFetcher;
use crate::plan::{Faculty, ProgramType};
use crate::session::{Level, SelectOption, SelectionUi};
use crate::state::NavState;
use crate::{HarvestError, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Counters for one or more sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub faculties_not_found: usize,
    pub leaves_visited: usize,
    pub leaves_failed: usize,
    pub branches_abandoned: usize,
    pub resets_recovered: usize,
    pub resets_abandoned: usize,
    pub iterations_fetched: usize,
    pub iterations_failed: usize,
}

impl SessionStats {
    pub fn merge(&mut self, other: &SessionStats) {
        self.faculties_not_found += other.faculties_not_found;
        self.leaves_visited += other.leaves_visited;
        self.leaves_failed += other.leaves_failed;
        self.branches_abandoned += other.branches_abandoned;
        self.resets_recovered += other.resets_recovered;
        self.resets_abandoned += other.resets_abandoned;
        self.iterations_fetched += other.iterations_fetched;
        self.iterations_failed += other.iterations_failed;
    }
}

/// Whether traversal continues with the remaining plan types of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafOutcome {
    Continue,
    AbandonProgram,
}

/// Drives one [`SelectionUi`] through one faculty at a time
pub struct NavigationSession {
    ui: Box<dyn SelectionUi>,
    iterations: Arc<IterationFetcher>,
    config: Arc<Config>,
    state: NavState,
    /// Selections believed to be in force, parents first
    selected: Vec<SelectOption>,
    stats: SessionStats,
    worker_id: usize,
    /// Log prefix naming the worker and its current faculty
    prefix: String,
}

impl NavigationSession {
    pub fn new(
        ui: Box<dyn SelectionUi>,
        iterations: Arc<IterationFetcher>,
        config: Arc<Config>,
        worker_id: usize,
    ) -> Self {
        Self {
            ui,
            iterations,
            config,
            state: NavState::AtRoot,
            selected: Vec::new(),
            stats: SessionStats::default(),
            worker_id,
            prefix: format!("[worker {}]", worker_id),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Opens the form and reads the faculty list in site order
    pub async fn faculty_options(&mut self) -> Result<Vec<SelectOption>> {
        self.populate(&[])
            .await
            .ok_or(HarvestError::NotPopulated(Level::Faculty))
    }

    /// Harvests every allowed leaf under `faculty_name`
    ///
    /// Always returns a faculty; it is empty if the faculty could not be
    /// found or nothing under it could be read.
    pub async fn crawl_faculty(&mut self, faculty_name: &str) -> Faculty {
        let mut faculty = Faculty::new(faculty_name);
        self.prefix = format!("[worker {}] [{}]", self.worker_id, faculty_name);
        tracing::info!("{} Scraping the faculty", self.prefix);

        match self.traverse_faculty(&mut faculty).await {
            Ok(()) => {
                tracing::info!(
                    "{} Finished the faculty: {} program types, {} programs",
                    self.prefix,
                    faculty.program_types.len(),
                    faculty.programs().count()
                );
            }
            Err(e @ HarvestError::NotFound { .. }) => {
                self.stats.faculties_not_found += 1;
                tracing::error!("{} {}", self.prefix, e);
            }
            Err(e) => {
                tracing::error!("{} Faculty aborted: {}", self.prefix, e);
            }
        }
        faculty
    }

    async fn traverse_faculty(&mut self, faculty: &mut Faculty) -> Result<()> {
        let faculties = self.faculty_options().await?;
        let faculty_option = faculties
            .into_iter()
            .find(|o| o.label == faculty.name)
            .ok_or_else(|| HarvestError::NotFound {
                level: Level::Faculty,
                name: faculty.name.clone(),
            })?;

        let chain = [faculty_option];
        let Some(program_types) = self.populate(&chain).await else {
            return Ok(());
        };
        let program_types: Vec<SelectOption> = program_types
            .into_iter()
            .filter(|pt| self.config.filters.allows_program_type(&pt.label))
            .collect();
        if program_types.is_empty() {
            tracing::info!("{} No allowed program types", self.prefix);
        }

        for program_type in program_types {
            let chain = [chain[0].clone(), program_type];
            let Some(programs) = self.populate(&chain).await else {
                continue;
            };
            let record = faculty.program_type_mut(&chain[1].label);

            for program in programs {
                let chain = [chain[0].clone(), chain[1].clone(), program];
                self.traverse_program(&chain, record).await;
            }
        }

        Ok(())
    }

    async fn traverse_program(&mut self, chain: &[SelectOption; 3], record: &mut ProgramType) {
        tracing::info!("{} Scraping the program: {}", self.prefix, chain[2].label);
        let Some(plan_types) = self.populate(chain).await else {
            return;
        };

        let plan_types: Vec<SelectOption> = plan_types
            .into_iter()
            .filter(|p| self.config.filters.allows_plan_type(&p.value))
            .collect();

        for plan_type in plan_types {
            let leaf = [chain[0].clone(), chain[1].clone(), chain[2].clone(), plan_type];
            if self.harvest_leaf(&leaf, record).await == LeafOutcome::AbandonProgram {
                tracing::warn!(
                    "{} Abandoning the remaining plan types of {}",
                    self.prefix,
                    describe(chain)
                );
                break;
            }
        }
    }

    /// Submits one leaf, records its iterations and returns to the form
    async fn harvest_leaf(&mut self, leaf: &[SelectOption; 4], record: &mut ProgramType) -> LeafOutcome {
        let attempts = self.config.crawler.leaf_attempts.max(1);
        let mut listing: Option<Url> = None;

        for attempt in 1..=attempts {
            match self.submit_leaf(leaf).await {
                Ok(url) => {
                    listing = Some(url);
                    break;
                }
                Err(e) if e.is_stale() && attempt < attempts => {
                    tracing::warn!(
                        "{} Stale selection at {} ({}), re-selecting",
                        self.prefix,
                        describe(leaf),
                        e
                    );
                    self.selected.clear();
                }
                Err(e) => {
                    tracing::error!("{} Leaf {} failed: {}", self.prefix, describe(leaf), e);
                    self.selected.clear();
                    break;
                }
            }
        }

        let Some(listing) = listing else {
            self.stats.leaves_failed += 1;
            return self.recover_selections(&leaf[..3]).await;
        };

        match self.iterations.fetch_all(&listing, &self.prefix).await {
            Ok(fetched) => {
                self.stats.leaves_visited += 1;
                for iteration in fetched {
                    if iteration.plan.is_failed() {
                        self.stats.iterations_failed += 1;
                    } else {
                        self.stats.iterations_fetched += 1;
                    }
                    record.record_listing_label(&iteration.label, iteration.plan);
                }
            }
            Err(e) => {
                self.stats.leaves_failed += 1;
                tracing::error!(
                    "{} Leaf {} failed reading {}: {}",
                    self.prefix,
                    describe(leaf),
                    listing,
                    e
                );
            }
        }

        if let Err(e) = self.go_back().await {
            tracing::warn!("{} Backward navigation failed, reloading the form: {}", self.prefix, e);
            if let Err(e) = self.reload().await {
                tracing::error!("{} Reloading the form failed: {}", self.prefix, e);
                return LeafOutcome::AbandonProgram;
            }
        }

        self.recover_selections(&leaf[..3]).await
    }

    async fn submit_leaf(&mut self, leaf: &[SelectOption]) -> Result<Url> {
        self.select_chain(leaf, false).await?;
        let listing = self.ui.submit().await?;
        self.advance(NavState::SubmittedIterationList)?;
        Ok(listing)
    }

    async fn go_back(&mut self) -> Result<()> {
        self.ui.back().await?;
        self.advance(NavState::PlanTypeSelected)
    }

    /// Re-drives `parent` if the form came back with its selections wiped
    async fn recover_selections(&mut self, parent: &[SelectOption]) -> LeafOutcome {
        match self.ui.shows_placeholders().await {
            Ok(false) => LeafOutcome::Continue,
            Ok(true) => {
                tracing::warn!(
                    "{} Selections were reset, restoring {}",
                    self.prefix,
                    describe(parent)
                );
                self.state = NavState::AtRoot;
                self.selected.clear();
                if self.populate(parent).await.is_some() {
                    self.stats.resets_recovered += 1;
                    LeafOutcome::Continue
                } else {
                    self.stats.resets_abandoned += 1;
                    LeafOutcome::AbandonProgram
                }
            }
            Err(e) => {
                tracing::warn!("{} Could not inspect the form: {}", self.prefix, e);
                self.selected.clear();
                LeafOutcome::Continue
            }
        }
    }

    /// Selects `chain` and reads the options of the level below it
    ///
    /// Retried up to `dropdown-retries` times; an empty or stale read counts
    /// as a failed attempt. Returns `None` once the retries are used up.
    async fn populate(&mut self, chain: &[SelectOption]) -> Option<Vec<SelectOption>> {
        let retries = self.config.crawler.dropdown_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=retries {
            match self.try_populate(chain, attempt > 1).await {
                Ok(options) => return Some(options),
                Err(e) => {
                    tracing::debug!(
                        "{} Attempt {}/{} to read options below {} failed: {}",
                        self.prefix,
                        attempt,
                        retries,
                        describe(chain),
                        e
                    );
                    if e.is_stale() {
                        self.selected.clear();
                    }
                    last_error = Some(e);
                }
            }
        }

        self.stats.branches_abandoned += 1;
        tracing::warn!(
            "{} Abandoning {} after {} attempts{}",
            self.prefix,
            describe(chain),
            retries,
            last_error.map(|e| format!(": {}", e)).unwrap_or_default()
        );
        None
    }

    async fn try_populate(&mut self, chain: &[SelectOption], refresh: bool) -> Result<Vec<SelectOption>> {
        let level = Level::ALL
            .get(chain.len())
            .copied()
            .ok_or_else(|| HarvestError::Worker("no dropdown below the plan type".to_string()))?;

        if chain.is_empty() {
            self.reload().await?;
        } else {
            self.select_chain(chain, refresh).await?;
        }

        let poll = Duration::from_millis(self.config.crawler.dropdown_poll_ms);
        if !poll.is_zero() {
            tokio::time::sleep(poll).await;
        }

        let options = self.ui.options(level).await?;
        if options.is_empty() {
            return Err(HarvestError::NotPopulated(level));
        }
        Ok(options)
    }

    /// Makes `chain` the selection path, re-selecting only what differs
    ///
    /// With `refresh` the last entry is selected again even if it is
    /// already in force, which re-triggers its round trip.
    async fn select_chain(&mut self, chain: &[SelectOption], refresh: bool) -> Result<()> {
        if !self.state.is_on_form() {
            self.reload().await?;
        }

        let common = self
            .selected
            .iter()
            .zip(chain)
            .take_while(|(current, wanted)| current == wanted)
            .count();
        let start = if refresh {
            common.min(chain.len().saturating_sub(1))
        } else {
            common
        };

        for (level, option) in Level::ALL.iter().zip(chain).skip(start) {
            self.selected.truncate(level.index());
            if let Err(e) = self.ui.select(*level, option).await {
                self.selected.truncate(level.index());
                return Err(e);
            }
            self.selected.push(option.clone());
            self.advance(NavState::after_selecting(*level))?;
        }

        if self.selected.len() > chain.len() {
            // A deeper selection from the previous leaf is still in force;
            // re-selecting the last entry of `chain` clears it.
            let last_level = chain.len().checked_sub(1).and_then(|i| Level::ALL.get(i));
            if let (Some(level), Some(option)) = (last_level, chain.last()) {
                self.ui.select(*level, option).await?;
                self.selected.truncate(chain.len());
                self.advance(NavState::after_selecting(*level))?;
            }
        }
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        self.ui.open().await?;
        self.selected.clear();
        self.state = NavState::AtRoot;
        Ok(())
    }

    fn advance(&mut self, next: NavState) -> Result<()> {
        self.state = self.state.transition(next)?;
        Ok(())
    }
}

/// "Faculty / Program type / Program / plan" for log lines
fn describe(chain: &[SelectOption]) -> String {
    if chain.is_empty() {
        return "the faculty list".to_string();
    }
    chain
        .iter()
        .map(|o| o.label.as_str())
        .collect::<Vec<_>>()
        .join(" / ")
}
