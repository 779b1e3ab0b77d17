use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use job_aggregator::core::ConfigManager;
use job_aggregator::{build_pipeline, start_web_server, validate_search_request, ValidationResult};
use std::fs::OpenOptions;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "job_aggregator=info,jobscout=info,rocket::server=off";

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(about = "Aggregate, deduplicate and rank job postings from several boards")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (default)
    Serve,
    /// Run one search and print the JSON response
    Search {
        /// Free-text query
        query: String,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        max_results: Option<usize>,
        /// Comma-separated job boards, e.g. "indeed,linkedin"
        #[arg(short, long, value_delimiter = ',')]
        sources: Option<Vec<String>>,
    },
}

fn init_logging() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // JSON log file next to the console output when requested
    let file_layer = match std::env::var("JOBSCOUT_LOG_FILE") {
        Ok(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true) // Clear file on startup
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(())
}

async fn run_search(
    config: &ConfigManager,
    query: String,
    location: Option<String>,
    max_results: Option<usize>,
    sources: Option<Vec<String>>,
) -> Result<()> {
    let mut payload = serde_json::json!({ "query": query });
    if let Some(location) = location {
        payload["location"] = location.into();
    }
    if let Some(max_results) = max_results {
        payload["maxResults"] = max_results.into();
    }
    if let Some(sources) = sources {
        payload["sources"] = sources.into();
    }

    let criteria = match validate_search_request(&payload) {
        ValidationResult::Valid(criteria) => criteria,
        ValidationResult::Invalid(errors) => {
            anyhow::bail!("Invalid search: {}", errors.join("; "))
        }
    };

    let pipeline = build_pipeline(config)?;
    let response = pipeline.search(&criteria).await;
    pipeline.registry().close_all().await;

    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to serialize response")?
    );

    if !response.is_success() {
        anyhow::bail!("Search failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let config = ConfigManager::load()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!("Environment: {}", config.environment.name);
            start_web_server(config).await
        }
        Commands::Search {
            query,
            location,
            max_results,
            sources,
        } => run_search(&config, query, location, max_results, sources).await,
    }
}
