use serde::Deserialize;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Worker pool and retry behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Number of parallel sessions, one faculty each at a time
    pub workers: usize,

    /// How many times a dropdown is re-populated before its branch is abandoned
    pub dropdown_retries: u32,

    /// Pause between a selection and reading its dependent options (milliseconds)
    pub dropdown_poll_ms: u64,

    /// Timeout for one option round trip (milliseconds)
    pub dropdown_timeout_ms: u64,

    /// Attempts per iteration page before it is recorded as failed
    pub iteration_retries: u32,

    /// Linear backoff step between iteration attempts (milliseconds)
    pub retry_backoff_ms: u64,

    /// Timeout for page fetches (seconds)
    pub request_timeout_secs: u64,

    /// Attempts per leaf when its selection path turns out to be stale
    pub leaf_attempts: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            dropdown_retries: 20,
            dropdown_poll_ms: 100,
            dropdown_timeout_ms: 1000,
            iteration_retries: 5,
            retry_backoff_ms: 50,
            request_timeout_secs: 25,
            leaf_attempts: 2,
        }
    }
}

/// Allow-lists applied while descending the form
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FilterConfig {
    /// Program type labels that are traversed
    pub program_types: Vec<String>,

    /// Plan type selection values that are traversed
    pub plan_types: Vec<String>,
}

impl FilterConfig {
    pub fn allows_program_type(&self, label: &str) -> bool {
        self.program_types.iter().any(|p| p == label)
    }

    pub fn allows_plan_type(&self, value: &str) -> bool {
        self.plan_types.iter().any(|p| p == value)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        // Labels as the site spells them in both languages; UOLP is shared.
        let program_types = [
            "UOLP",
            "100% English Program",
            "30% English Program",
            "100% Turkish Program",
            "100% İngilizce Program",
            "30% İngilizce Program",
            "100% Türkçe Program",
        ];
        Self {
            program_types: program_types.iter().map(|s| s.to_string()).collect(),
            plan_types: vec!["lisans".to_string(), "uolp".to_string()],
        }
    }
}

/// Upstream site layout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SiteConfig {
    /// Scheme and host every path below is resolved against
    pub base_url: String,

    /// The selection form itself
    pub form_path: String,

    /// Program type options for a faculty
    pub program_types_path: String,

    /// Program options for a (faculty, program type) pair
    pub programs_path: String,

    /// Plan type options for a (faculty, program type, program) triple
    pub plan_types_path: String,

    /// Iteration listing reached by submitting the form
    pub listing_path: String,

    /// Link texts that mark an elective trigger instead of a course code
    pub elective_markers: Vec<String>,

    /// CSS selector present on the form when selections have been reset
    pub placeholder_selector: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://obs.itu.edu.tr".to_string(),
            form_path: "/public/DersPlan/".to_string(),
            program_types_path: "/public/DersPlan/GetProgramTipiByFakulteId".to_string(),
            programs_path: "/public/DersPlan/GetProgramByProgramTipiId".to_string(),
            plan_types_path: "/public/DersPlan/GetPlanTipiByProgramKodu".to_string(),
            listing_path: "/public/DersPlan/DersPlanlariList".to_string(),
            elective_markers: vec!["Dersler".to_string(), "Courses".to_string()],
            placeholder_selector: "span.select2-selection__placeholder".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "CurriculumHarvester".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/curriculum-harvester".to_string(),
            contact_email: "maintainers@curriculum-harvester.dev".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the serialized course plan file
    #[serde(rename = "course-plans-path")]
    pub course_plans_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            course_plans_path: "data/course_plans.txt".to_string(),
        }
    }
}
