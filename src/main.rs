//! VC Scout main entry point
//!
//! Runs the enrichment service, or a single enrichment from the command line.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vcscout::config::{load_config_with_hash, validate, Config};
use vcscout::{build_page_list, CompanyRecord, Enricher};

/// VC Scout: company enrichment for the deal-sourcing dashboard
///
/// Scrapes a handful of likely pages from a company's website and asks a
/// language model to turn them into a structured profile.
#[derive(Parser, Debug)]
#[command(name = "vcscout")]
#[command(version)]
#[command(about = "Company enrichment service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the enrichment API
    Serve {
        /// Override the configured listen address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Enrich one company and print the profile as JSON
    Enrich {
        #[arg(long)]
        name: String,

        #[arg(long)]
        website: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        sector: String,

        #[arg(long, default_value = "")]
        stage: String,

        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        #[arg(long)]
        founded: Option<i32>,
    },

    /// Validate config and show the pages that would be fetched
    DryRun {
        #[arg(long)]
        website: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { bind } => handle_serve(config, bind).await,
        Command::Enrich {
            name,
            website,
            description,
            sector,
            stage,
            tags,
            founded,
        } => {
            let company = CompanyRecord {
                name,
                website,
                description,
                sector,
                stage,
                tags,
                founded,
            };
            handle_enrich(&config, company).await
        }
        Command::DryRun { website } => {
            handle_dry_run(&config, &website);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vcscout=info,warn")),
            1 => EnvFilter::new("vcscout=debug,tower_http=debug,info"),
            2 => EnvFilter::new("vcscout=trace,debug"),
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

fn load(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config).context("Default configuration is invalid")?;
            Ok(config)
        }
    }
}

async fn handle_serve(config: Config, bind: Option<String>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let enricher = Enricher::from_config(&config).context("Failed to build HTTP clients")?;

    if missing_api_key(&config) {
        tracing::warn!(
            "{} is not set; enrichment requests will fail until it is",
            config.llm.api_key_env
        );
    }

    tracing::info!(
        "Provider: {} ({}), throttle: {} requests per {}s",
        config.llm.provider.display_name(),
        config.llm.model(),
        config.throttle.capacity,
        config.throttle.window_secs
    );

    vcscout::server::serve(
        Arc::new(enricher),
        &bind,
        std::time::Duration::from_secs(config.throttle.sweep_interval_secs),
    )
    .await
    .with_context(|| format!("Server error on {}", bind))
}

async fn handle_enrich(config: &Config, company: CompanyRecord) -> anyhow::Result<()> {
    let enricher = Enricher::from_config(config).context("Failed to build HTTP clients")?;

    let response = enricher.enrich_company("cli", company).await?;
    println!("{}", serde_json::to_string_pretty(&response.profile)?);

    Ok(())
}

fn missing_api_key(config: &Config) -> bool {
    config.llm.api_key_from_env().is_none()
}

/// Prints effective settings and candidate URLs without touching the network
fn handle_dry_run(config: &Config, website: &str) {
    println!("=== VC Scout Dry Run ===\n");

    println!("Scraper:");
    println!("  Fetch timeout: {}ms", config.scraper.fetch_timeout_ms);
    println!("  Max attempts: {}", config.scraper.max_attempts);
    println!("  Backoff base: {}ms", config.scraper.backoff_base_ms);
    println!(
        "  Text budget: {} chars/page, {} chars total",
        config.scraper.max_chars_per_page, config.scraper.max_total_chars
    );
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nThrottle:");
    println!(
        "  {} requests per {}s (sweep every {}s)",
        config.throttle.capacity, config.throttle.window_secs, config.throttle.sweep_interval_secs
    );

    println!("\nLLM:");
    println!("  Provider: {}", config.llm.provider.display_name());
    println!("  Endpoint: {}", config.llm.base_url());
    println!("  Model: {}", config.llm.model());
    println!(
        "  Credential: {} ({})",
        config.llm.api_key_env,
        if missing_api_key(config) { "missing" } else { "set" }
    );

    let pages = build_page_list(website);
    println!("\nCandidate pages ({}):", pages.len());
    for page in &pages {
        println!("  - {}", page);
    }

    println!("\n✓ Configuration is valid");
}
