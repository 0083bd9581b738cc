//! WebCrawlerAPI command-line client
//!
//! Thin wrapper over the library: submit crawls and scrapes, inspect and
//! cancel jobs.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use webcrawlerapi::config::load_config;
use webcrawlerapi::{
    ClientConfig, CrawlParams, Job, ScrapeOutcome, ScrapeParams, ScrapeType,
    WebCrawlerClient, WebCrawlerError,
};

/// WebCrawlerAPI: crawl and scrape websites through the hosted API
///
/// The API key is read from the config file when one is given, otherwise
/// from WEBCRAWLERAPI_API_KEY.
#[derive(Parser, Debug)]
#[command(name = "webcrawlerapi")]
#[command(version)]
#[command(about = "Client for the WebCrawlerAPI service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
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
    /// Crawl a site and wait for the job to finish
    Crawl {
        /// Seed URL
        url: String,

        /// Output format: html, cleaned or markdown
        #[arg(long, default_value = "html")]
        scrape_type: ScrapeType,

        /// Maximum number of pages to crawl
        #[arg(long, default_value_t = webcrawlerapi::client::DEFAULT_ITEMS_LIMIT)]
        items_limit: u32,

        #[arg(long)]
        allow_subdomains: bool,

        #[arg(long)]
        whitelist_regexp: Option<String>,

        #[arg(long)]
        blacklist_regexp: Option<String>,

        #[arg(long)]
        webhook_url: Option<String>,

        /// Status checks before giving up
        #[arg(long)]
        max_polls: Option<u32>,

        /// Delay between status checks in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Submit and return without waiting
        #[arg(long)]
        no_wait: bool,

        /// Print the content of every finished page
        #[arg(long, conflicts_with = "no_wait")]
        show_content: bool,
    },

    /// Scrape a single page
    Scrape {
        url: String,

        #[arg(long)]
        scrape_type: Option<ScrapeType>,

        /// Extraction prompt for structured output
        #[arg(long)]
        prompt: Option<String>,

        /// JSON file holding the response schema
        #[arg(long, value_name = "FILE")]
        schema: Option<PathBuf>,

        #[arg(long)]
        main_content_only: bool,

        #[arg(long)]
        max_polls: Option<u32>,
    },

    /// Show the current state of a job
    Job {
        id: String,

        /// Print the content of every finished page
        #[arg(long)]
        show_content: bool,
    },

    /// Cancel a running job
    Cancel { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => ClientConfig::from_env()?,
    };
    let client = WebCrawlerClient::new(config)?;

    match cli.command {
        Command::Crawl {
            url,
            scrape_type,
            items_limit,
            allow_subdomains,
            whitelist_regexp,
            blacklist_regexp,
            webhook_url,
            max_polls,
            poll_interval_ms,
            no_wait,
            show_content,
        } => {
            let mut params = CrawlParams::new(url)
                .scrape_type(scrape_type)
                .items_limit(items_limit)
                .allow_subdomains(allow_subdomains);
            params.whitelist_regexp = whitelist_regexp;
            params.blacklist_regexp = blacklist_regexp;
            params.webhook_url = webhook_url;
            params.max_polls = max_polls;
            params.poll_interval_override = poll_interval_ms.map(Duration::from_millis);

            if no_wait {
                let job = client.submit_crawl(&params).await?;
                println!("Submitted job {} ({})", job.id, job.status);
                return Ok(());
            }

            match client.crawl(&params).await {
                Ok(job) => print_job(&job, show_content).await?,
                Err(WebCrawlerError::PollTimeout { attempts, last }) => {
                    if let Some(job) = last.as_job() {
                        print_job(job, false).await?;
                    }
                    anyhow::bail!("job still running after {} status checks", attempts);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Scrape {
            url,
            scrape_type,
            prompt,
            schema,
            main_content_only,
            max_polls,
        } => {
            let mut params = ScrapeParams::new(url);
            params.scrape_type = scrape_type;
            params.prompt = prompt;
            params.max_polls = max_polls;
            if main_content_only {
                params.main_content_only = Some(true);
            }
            if let Some(path) = schema {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading schema {}", path.display()))?;
                params.response_schema = Some(
                    serde_json::from_str(&text)
                        .with_context(|| format!("parsing schema {}", path.display()))?,
                );
            }

            let outcome = client.scrape(&params).await?;
            print_scrape(outcome).await?;
        }
        Command::Job { id, show_content } => {
            let job = client.get_job(&id).await?;
            print_job(&job, show_content).await?;
        }
        Command::Cancel { id } => {
            let confirmation = client.cancel_job(&id).await?;
            match confirmation.message {
                Some(message) => println!("{}", message),
                None => println!("Cancellation requested for {}", id),
            }
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webcrawlerapi=info,warn"),
            1 => EnvFilter::new("webcrawlerapi=debug,info"),
            2 => EnvFilter::new("webcrawlerapi=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn print_job(job: &Job, show_content: bool) -> anyhow::Result<()> {
    println!("Job {} ({})", job.id, job.status);
    if let Some(url) = &job.url {
        println!("  Seed: {}", url);
    }
    if let Some(finished_at) = job.finished_at {
        println!("  Finished: {}", finished_at.to_rfc3339());
    }
    println!("  Items: {}, cost: {}", job.job_items.len(), job.total_cost());

    for item in &job.job_items {
        println!(
            "  - [{}] {} {}",
            item.status,
            item.original_url.as_deref().unwrap_or(&item.id),
            item.title.as_deref().unwrap_or("")
        );
        if let Some(error) = &item.last_error {
            println!("      error: {}", error);
        }
        if show_content && item.status.is_success() {
            match item.content().await {
                Ok(content) => println!("{}", content),
                Err(e) => println!("      content unavailable: {}", e),
            }
        }
    }

    Ok(())
}

async fn print_scrape(outcome: ScrapeOutcome) -> anyhow::Result<()> {
    match outcome {
        ScrapeOutcome::Success(result) => {
            if let Some(title) = &result.page_title {
                println!("Title: {}", title);
            }
            if let Some(data) = &result.structured_data {
                println!("{}", serde_json::to_string_pretty(data)?);
            }
            println!("{}", result.content().await?);
        }
        ScrapeOutcome::Error(error) => {
            anyhow::bail!("scrape failed: {}", error.error_message);
        }
    }
    Ok(())
}
