//! URL handling for the upstream site
//!
//! Builds the form, dependent-option and listing URLs from the configured
//! site layout, and resolves relative links found on fetched pages.

use crate::config::SiteConfig;
use crate::session::{Level, SelectOption};
use crate::HarvestError;
use url::Url;

/// Resolved upstream endpoints
#[derive(Debug, Clone)]
pub struct Endpoints {
    form: Url,
    program_types: Url,
    programs: Url,
    plan_types: Url,
    listing: Url,
}

impl Endpoints {
    /// Resolves every configured path against the base URL
    ///
    /// # Example
    ///
    /// ```
    /// use curriculum_harvester::config::SiteConfig;
    /// use curriculum_harvester::url::Endpoints;
    ///
    /// let endpoints = Endpoints::from_config(&SiteConfig::default()).unwrap();
    /// assert_eq!(endpoints.form().as_str(), "https://obs.itu.edu.tr/public/DersPlan/");
    /// ```
    pub fn from_config(site: &SiteConfig) -> Result<Self, HarvestError> {
        let base = Url::parse(&site.base_url)?;
        Ok(Self {
            form: base.join(&site.form_path)?,
            program_types: base.join(&site.program_types_path)?,
            programs: base.join(&site.programs_path)?,
            plan_types: base.join(&site.plan_types_path)?,
            listing: base.join(&site.listing_path)?,
        })
    }

    pub fn form(&self) -> &Url {
        &self.form
    }

    /// URL populating the options of the level below the last entry of `chain`
    ///
    /// `chain` is the selection path from the faculty down, one option per
    /// level. Returns `None` for a full chain, since plan types have no
    /// dependents.
    pub fn dependent_options(&self, chain: &[SelectOption]) -> Option<Url> {
        let endpoint = match chain.len() {
            1 => &self.program_types,
            2 => &self.programs,
            3 => &self.plan_types,
            _ => return None,
        };

        let mut url = endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (level, option) in Level::ALL.iter().zip(chain) {
                query.append_pair(level.field_name(), &option.value);
            }
        }
        Some(url)
    }

    /// URL the form submits to for a (program, plan type) pair
    pub fn listing(&self, program: &SelectOption, plan_type: &SelectOption) -> Url {
        let mut url = self.listing.clone();
        url.query_pairs_mut()
            .append_pair(Level::Program.field_name(), &program.value)
            .append_pair(Level::PlanType.field_name(), &plan_type.value);
        url
    }
}

/// Resolves a link href found on `base_url` to an absolute http(s) URL
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - anything that does not resolve to http or https
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}
