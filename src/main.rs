//! Curriculum Harvester main entry point
//!
//! This is the command-line interface for crawling the course plan form.

use anyhow::Context;
use clap::Parser;
use curriculum_harvester::config::{load_config_with_hash, validate, Config};
use curriculum_harvester::crawler::run_crawl;
use curriculum_harvester::output::{print_statistics, write_curriculum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Curriculum Harvester: crawls every course plan behind a cascading selection form
///
/// Faculties are crawled in parallel, one browser-equivalent session each,
/// and the merged plans are written in the course plan text format.
#[derive(Parser, Debug)]
#[command(name = "curriculum-harvester")]
#[command(version = "1.0.0")]
#[command(about = "Harvests course plans from a cascading selection form", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Where to write the course plans (overrides `course-plans-path`)
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Number of parallel sessions (overrides `workers`)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Only crawl the named faculty; may be repeated
    #[arg(long = "faculty", value_name = "NAME")]
    faculties: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
        validate(&config).context("invalid --workers")?;
    }
    if let Some(output) = &cli.output {
        config.output.course_plans_path = output.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.faculties);
        return Ok(());
    }

    handle_crawl(config, &cli.faculties, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("curriculum_harvester=info,warn"),
            1 => EnvFilter::new("curriculum_harvester=debug,info"),
            2 => EnvFilter::new("curriculum_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, faculties: &[String]) {
    println!("=== Curriculum Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Dropdown retries: {}", config.crawler.dropdown_retries);
    println!("  Dropdown poll: {}ms", config.crawler.dropdown_poll_ms);
    println!("  Iteration retries: {}", config.crawler.iteration_retries);
    println!("  Retry backoff: {}ms", config.crawler.retry_backoff_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Form: {}", config.site.form_path);
    println!("  Elective markers: {}", config.site.elective_markers.join(", "));

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nProgram Types ({}):", config.filters.program_types.len());
    for program_type in &config.filters.program_types {
        println!("  - {}", program_type);
    }

    println!("\nPlan Types ({}):", config.filters.plan_types.len());
    for plan_type in &config.filters.plan_types {
        println!("  - {}", plan_type);
    }

    println!("\nOutput:");
    println!("  Course plans: {}", config.output.course_plans_path);

    println!("\n✓ Configuration is valid");
    if faculties.is_empty() {
        println!("✓ Would crawl every faculty on the form");
    } else {
        println!("✓ Would crawl {} faculties:", faculties.len());
        for faculty in faculties {
            println!("  - {}", faculty);
        }
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, faculties: &[String], quiet: bool) -> anyhow::Result<()> {
    let output_path = PathBuf::from(&config.output.course_plans_path);

    let outcome = match run_crawl(config, faculties).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    write_curriculum(&outcome.curriculum, &output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    tracing::info!(
        "{} distinct course codes referenced",
        outcome.curriculum.course_codes().len()
    );

    if !quiet {
        print_statistics(&outcome.stats);
    }

    Ok(())
}
