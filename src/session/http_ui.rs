//! The live selection form, driven over HTTP
//!
//! The site populates each dropdown through a GET endpoint keyed by the
//! selections above it. [`HttpSelectionUi`] replays those round trips with
//! a cookie-carrying client, so every session gets its own server-side
//! state just like a separate browser context would.

use crate::config::Config;
use crate::crawler::parser::{has_placeholder, parse_form_options, parse_options};
use crate::crawler::{build_http_client, fetch_text};
use crate::session::{Level, SelectOption, SelectionUi, SessionFactory};
use crate::url::Endpoints;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One browser-equivalent session over the live form
pub struct HttpSelectionUi {
    client: Client,
    endpoints: Arc<Endpoints>,
    placeholder_selector: String,
    option_timeout: Duration,
    /// Selected options, parents first
    selections: Vec<SelectOption>,
    /// Options currently loaded per level; `None` until the parent is selected
    populated: [Option<Vec<SelectOption>>; 4],
    on_listing: bool,
    placeholders: bool,
}

impl HttpSelectionUi {
    pub fn new(
        client: Client,
        endpoints: Arc<Endpoints>,
        placeholder_selector: impl Into<String>,
        option_timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoints,
            placeholder_selector: placeholder_selector.into(),
            option_timeout,
            selections: Vec::new(),
            populated: [None, None, None, None],
            on_listing: false,
            placeholders: false,
        }
    }

    async fn load_form(&mut self) -> Result<String> {
        let html = fetch_text(&self.client, self.endpoints.form(), None).await?;
        Ok(html)
    }

    fn reset_from_form(&mut self, html: &str) {
        let faculty = Level::Faculty;
        self.selections.clear();
        self.populated = [
            Some(parse_form_options(
                html,
                faculty.field_name(),
                faculty.has_placeholder_option(),
            )),
            None,
            None,
            None,
        ];
    }

    fn ensure_on_form(&self, level: Level) -> Result<()> {
        if self.on_listing {
            Err(HarvestError::StaleState { level })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SelectionUi for HttpSelectionUi {
    async fn open(&mut self) -> Result<()> {
        let html = self.load_form().await?;
        self.reset_from_form(&html);
        self.on_listing = false;
        self.placeholders = false;
        Ok(())
    }

    async fn options(&mut self, level: Level) -> Result<Vec<SelectOption>> {
        if self.on_listing {
            return Err(HarvestError::NotPopulated(level));
        }
        self.populated[level.index()]
            .clone()
            .ok_or(HarvestError::NotPopulated(level))
    }

    async fn select(&mut self, level: Level, option: &SelectOption) -> Result<()> {
        self.ensure_on_form(level)?;
        let depth = level.index();

        let known = self.populated[depth]
            .as_ref()
            .is_some_and(|options| options.iter().any(|o| o.value == option.value));
        if !known || self.selections.len() < depth {
            return Err(HarvestError::StaleState { level });
        }

        self.selections.truncate(depth);
        self.selections.push(option.clone());
        for deeper in &mut self.populated[depth + 1..] {
            *deeper = None;
        }
        self.placeholders = false;

        let (Some(dependent), Some(url)) = (level.dependent(), self.endpoints.dependent_options(&self.selections))
        else {
            return Ok(());
        };
        let html = fetch_text(&self.client, &url, Some(self.option_timeout)).await?;
        self.populated[dependent.index()] = Some(parse_options(&html, dependent.has_placeholder_option()));
        Ok(())
    }

    async fn submit(&mut self) -> Result<Url> {
        let missing = Level::ALL.get(self.selections.len()).copied();
        match (missing, &self.selections[..]) {
            (None, [_, _, program, plan_type]) if !self.on_listing => {
                let listing = self.endpoints.listing(program, plan_type);
                self.on_listing = true;
                Ok(listing)
            }
            (missing, _) => Err(HarvestError::IncompleteSelection(
                missing.unwrap_or(Level::PlanType),
            )),
        }
    }

    async fn back(&mut self) -> Result<()> {
        let html = self.load_form().await?;
        self.on_listing = false;
        self.placeholders = has_placeholder(&html, &self.placeholder_selector);
        if self.placeholders {
            self.reset_from_form(&html);
        }
        Ok(())
    }

    async fn shows_placeholders(&mut self) -> Result<bool> {
        Ok(self.placeholders)
    }
}

/// Opens a fresh [`HttpSelectionUi`] with its own cookie jar
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    config: Arc<Config>,
    endpoints: Arc<Endpoints>,
}

impl HttpSessionFactory {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let endpoints = Arc::new(Endpoints::from_config(&config.site)?);
        Ok(Self { config, endpoints })
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open_session(&self) -> Result<Box<dyn SelectionUi>> {
        let client = build_http_client(
            &self.config.user_agent,
            Duration::from_secs(self.config.crawler.request_timeout_secs),
            true,
        )?;
        Ok(Box::new(HttpSelectionUi::new(
            client,
            self.endpoints.clone(),
            self.config.site.placeholder_selector.clone(),
            Duration::from_millis(self.config.crawler.dropdown_timeout_ms),
        )))
    }
}
