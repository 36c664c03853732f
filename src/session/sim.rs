//! In-memory stand-ins for the live site, used by unit tests
//!
//! [`SimSite`] describes a cascading form as a tree of options. Sessions
//! opened from a [`SimFactory`] behave like the real form: selecting an
//! option repopulates the level below it, and backward navigation can be
//! configured to wipe every selection. [`StaticPages`] serves canned HTML.

use crate::crawler::PageSource;
use crate::session::{Level, SelectOption, SelectionUi, SessionFactory};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

const SIM_HOST: &str = "https://sim.test";

/// Canned pages keyed by absolute URL
#[derive(Debug, Default)]
pub struct StaticPages {
    pages: HashMap<String, String>,
    failures: HashMap<String, usize>,
    hits: Mutex<HashMap<String, usize>>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// The first `count` fetches of `url` time out
    pub fn failing_first(mut self, url: &str, count: usize) -> Self {
        self.failures.insert(url.to_string(), count);
        self
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PageSource for StaticPages {
    async fn fetch_page(&self, url: &Url) -> Result<String> {
        let key = url.as_str().to_string();
        let hit = {
            let mut hits = self.hits.lock().unwrap();
            let entry = hits.entry(key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        if hit <= self.failures.get(&key).copied().unwrap_or(0) {
            return Err(HarvestError::Timeout { url: key });
        }
        self.pages.get(&key).cloned().ok_or(HarvestError::HttpStatus {
            url: key,
            status: 404,
        })
    }
}

/// One option of the simulated form and everything below it
#[derive(Debug, Clone)]
pub struct SimNode {
    pub option: SelectOption,
    pub children: Vec<SimNode>,
}

impl SimNode {
    fn leaf(value: &str, label: &str) -> Self {
        Self {
            option: SelectOption::new(value, label),
            children: Vec::new(),
        }
    }
}

/// Builder scope for one faculty
pub struct FacultyBuilder {
    node: SimNode,
}

impl FacultyBuilder {
    /// Adds a program type with the given programs, each `(code, name, plan types)`
    pub fn program_type(mut self, label: &str, programs: &[(&str, &str, &[&str])]) -> Self {
        let mut program_type = SimNode::leaf(&format!("pt{}", self.node.children.len()), label);
        for (code, name, plan_types) in programs {
            let mut program = SimNode::leaf(code, name);
            program.children = plan_types.iter().map(|p| SimNode::leaf(p, p)).collect();
            program_type.children.push(program);
        }
        self.node.children.push(program_type);
        self
    }
}

/// A simulated cascading form
#[derive(Debug, Clone, Default)]
pub struct SimSite {
    pub faculties: Vec<SimNode>,
}

impl SimSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faculty(mut self, name: &str, build: impl FnOnce(FacultyBuilder) -> FacultyBuilder) -> Self {
        let builder = FacultyBuilder {
            node: SimNode::leaf(&format!("f{}", self.faculties.len()), name),
        };
        self.faculties.push(build(builder).node);
        self
    }

    pub fn faculty_names(&self) -> Vec<String> {
        self.faculties.iter().map(|f| f.option.label.clone()).collect()
    }

    /// Every (faculty, program type, program, plan type) label path, in form order
    pub fn leaf_paths(&self) -> Vec<[String; 4]> {
        let mut paths = Vec::new();
        for f in &self.faculties {
            for pt in &f.children {
                for p in &pt.children {
                    for plan in &p.children {
                        paths.push([
                            f.option.label.clone(),
                            pt.option.label.clone(),
                            p.option.label.clone(),
                            plan.option.value.clone(),
                        ]);
                    }
                }
            }
        }
        paths
    }

    /// Serves a listing with one iteration for every leaf
    ///
    /// The iteration is labelled `"{program} {plan type} 2021-2022 ve Sonrası"`
    /// and has a single semester holding the course `"{code} {plan type}"`.
    pub fn pages(&self) -> StaticPages {
        let mut pages = StaticPages::new();
        for (fi, f) in self.faculties.iter().enumerate() {
            for (pti, pt) in f.children.iter().enumerate() {
                for (pi, p) in pt.children.iter().enumerate() {
                    for (li, plan) in p.children.iter().enumerate() {
                        let path = format!("{}/{}/{}/{}", fi, pti, pi, li);
                        let listing = format!(
                            r#"<table><tbody><tr><td><a href="/plan/{}">Göster</a></td><td>{} {} 2021-2022 ve Sonrası</td></tr></tbody></table>"#,
                            path, p.option.label, plan.option.value
                        );
                        let plan_page = format!(
                            r#"<table><tbody><tr><td><a href="/ders">{} {}</a></td></tr></tbody></table>"#,
                            p.option.value, plan.option.value
                        );
                        pages = pages
                            .with_page(&format!("{}/list/{}", SIM_HOST, path), listing)
                            .with_page(&format!("{}/plan/{}", SIM_HOST, path), plan_page);
                    }
                }
            }
        }
        pages
    }
}

/// Misbehaviour knobs and counters shared by every session of a factory
#[derive(Debug, Default)]
pub struct SimControl {
    /// Every Nth backward navigation of a session wipes its selections
    pub reset_every_nth_back: Option<usize>,
    /// Number of option reads (across sessions) that come back empty
    pub empty_reads: AtomicUsize,
    pub sessions_opened: AtomicUsize,
    pub(crate) submits: Mutex<HashMap<[String; 4], usize>>,
}

impl SimControl {
    pub fn submit_counts(&self) -> HashMap<[String; 4], usize> {
        self.submits.lock().unwrap().clone()
    }
}

/// One simulated form session
pub struct SimUi {
    site: Arc<SimSite>,
    control: Arc<SimControl>,
    path: Vec<usize>,
    populated: [Option<Vec<SelectOption>>; 4],
    on_listing: bool,
    placeholders: bool,
    backs: usize,
}

impl SimUi {
    pub fn new(site: Arc<SimSite>, control: Arc<SimControl>) -> Self {
        Self {
            site,
            control,
            path: Vec::new(),
            populated: [None, None, None, None],
            on_listing: false,
            placeholders: false,
            backs: 0,
        }
    }

    fn reset(&mut self) {
        self.path.clear();
        self.populated = [
            Some(self.site.faculties.iter().map(|f| f.option.clone()).collect()),
            None,
            None,
            None,
        ];
    }

    fn node(&self, path: &[usize]) -> Option<&SimNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.site.faculties.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }

    fn labels(&self) -> Option<[String; 4]> {
        let mut labels: [String; 4] = Default::default();
        for depth in 0..4 {
            let option = &self.node(&self.path[..=depth])?.option;
            labels[depth] = if depth == 3 {
                option.value.clone()
            } else {
                option.label.clone()
            };
        }
        Some(labels)
    }
}

#[async_trait]
impl SelectionUi for SimUi {
    async fn open(&mut self) -> Result<()> {
        self.reset();
        self.on_listing = false;
        self.placeholders = false;
        Ok(())
    }

    async fn options(&mut self, level: Level) -> Result<Vec<SelectOption>> {
        if self.on_listing {
            return Err(HarvestError::NotPopulated(level));
        }
        let options = self.populated[level.index()]
            .clone()
            .ok_or(HarvestError::NotPopulated(level))?;
        let starved = self
            .control
            .empty_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(if starved { Vec::new() } else { options })
    }

    async fn select(&mut self, level: Level, option: &SelectOption) -> Result<()> {
        let depth = level.index();
        let stale = HarvestError::StaleState { level };
        if self.on_listing || self.path.len() < depth {
            return Err(stale);
        }
        let position = self.populated[depth]
            .as_ref()
            .and_then(|options| options.iter().position(|o| o == option))
            .ok_or(stale)?;

        self.path.truncate(depth);
        self.path.push(position);
        for deeper in &mut self.populated[depth + 1..] {
            *deeper = None;
        }
        if let Some(dependent) = level.dependent() {
            let children = self
                .node(&self.path)
                .map(|node| node.children.iter().map(|c| c.option.clone()).collect());
            self.populated[dependent.index()] = children;
        }
        self.placeholders = false;
        Ok(())
    }

    async fn submit(&mut self) -> Result<Url> {
        if self.on_listing || self.path.len() < 4 {
            let missing = Level::ALL.get(self.path.len()).copied().unwrap_or(Level::PlanType);
            return Err(HarvestError::IncompleteSelection(missing));
        }
        let labels = self.labels().ok_or(HarvestError::IncompleteSelection(Level::PlanType))?;
        *self.control.submits.lock().unwrap().entry(labels).or_insert(0) += 1;
        self.on_listing = true;

        let path: Vec<String> = self.path.iter().map(|i| i.to_string()).collect();
        Ok(Url::parse(&format!("{}/list/{}", SIM_HOST, path.join("/")))?)
    }

    async fn back(&mut self) -> Result<()> {
        self.on_listing = false;
        self.backs += 1;
        if let Some(n) = self.control.reset_every_nth_back {
            if self.backs % n == 0 {
                self.reset();
                self.placeholders = true;
            }
        }
        Ok(())
    }

    async fn shows_placeholders(&mut self) -> Result<bool> {
        Ok(self.placeholders)
    }
}

/// Opens [`SimUi`] sessions over one shared site
#[derive(Clone)]
pub struct SimFactory {
    pub site: Arc<SimSite>,
    pub control: Arc<SimControl>,
}

impl SimFactory {
    pub fn new(site: SimSite, control: SimControl) -> Self {
        Self {
            site: Arc::new(site),
            control: Arc::new(control),
        }
    }
}

impl SessionFactory for SimFactory {
    fn open_session(&self) -> Result<Box<dyn SelectionUi>> {
        self.control.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimUi::new(self.site.clone(), self.control.clone())))
    }
}
