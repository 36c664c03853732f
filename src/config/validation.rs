use crate::config::types::{Config, CrawlerConfig, FilterConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on parallel sessions; the form host throttles beyond this
const MAX_WORKERS: usize = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_filters(&config.filters)?;
    validate_site_config(&config.site)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates worker pool and retry settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.dropdown_retries < 1 {
        return Err(ConfigError::Validation(
            "dropdown_retries must be >= 1".to_string(),
        ));
    }

    if config.iteration_retries < 1 {
        return Err(ConfigError::Validation(
            "iteration_retries must be >= 1".to_string(),
        ));
    }

    if config.leaf_attempts < 1 {
        return Err(ConfigError::Validation(
            "leaf_attempts must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.dropdown_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "dropdown_timeout_ms must be >= 100ms, got {}ms",
            config.dropdown_timeout_ms
        )));
    }

    Ok(())
}

/// Validates the allow-lists
fn validate_filters(config: &FilterConfig) -> Result<(), ConfigError> {
    if config.program_types.is_empty() {
        return Err(ConfigError::Validation(
            "program_types allow-list cannot be empty".to_string(),
        ));
    }

    if config.plan_types.is_empty() {
        return Err(ConfigError::Validation(
            "plan_types allow-list cannot be empty".to_string(),
        ));
    }

    if let Some(blank) = config
        .program_types
        .iter()
        .chain(config.plan_types.iter())
        .find(|entry| entry.trim().is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "allow-list entries cannot be blank, got '{}'",
            blank
        )));
    }

    Ok(())
}

/// Validates the upstream site layout
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    for (name, path) in [
        ("form_path", &config.form_path),
        ("program_types_path", &config.program_types_path),
        ("programs_path", &config.programs_path),
        ("plan_types_path", &config.plan_types_path),
        ("listing_path", &config.listing_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "{} must start with '/', got '{}'",
                name, path
            )));
        }
    }

    if config.elective_markers.is_empty() {
        return Err(ConfigError::Validation(
            "elective_markers cannot be empty".to_string(),
        ));
    }

    if scraper::Selector::parse(&config.placeholder_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "placeholder_selector is not a valid CSS selector: '{}'",
            config.placeholder_selector
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.course_plans_path.is_empty() {
        return Err(ConfigError::Validation(
            "course_plans_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
