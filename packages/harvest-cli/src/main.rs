//! Operator CLI for the job harvester.
//!
//! `harvest run` scrapes every configured search and reconciles the
//! catalog; the other commands browse and annotate the catalog.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, TimeDelta};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_harvester::{
    run_harvest, Catalog, EntryFilter, HttpBrowser, RunConfig, SqliteCatalog,
};

mod display;

const DEFAULT_CONFIG: &str = "config.json";
const DEFAULT_DATABASE: &str = "jobs.db";

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Job listing harvester and catalog viewer")]
#[command(version)]
struct Cli {
    /// Catalog database file (default: $HARVEST_DATABASE or jobs.db)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every configured search and reconcile the catalog
    Run {
        /// Run configuration (default: $HARVEST_CONFIG or config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show catalog counters
    Stats,

    /// List jobs, most recently seen first
    List {
        /// Include expired jobs
        #[arg(short, long)]
        all: bool,

        /// Maximum number of jobs
        #[arg(short, long)]
        limit: Option<usize>,

        /// One line per job
        #[arg(short, long)]
        compact: bool,
    },

    /// Active jobs seen in the last few days
    Recent {
        /// How many days back
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Search title, company and location
    Search {
        keyword: String,

        /// Include expired jobs
        #[arg(short, long)]
        all: bool,
    },

    /// Show one job
    Show { job_id: String },

    /// Export jobs as JSON
    Export {
        path: PathBuf,

        /// Include expired jobs
        #[arg(short, long)]
        all: bool,
    },

    /// Record that you applied to a job
    Apply {
        job_id: String,

        /// Application date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Clear the application date of a job
    Unapply { job_id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_harvester=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let database = cli
        .database
        .or_else(|| std::env::var_os("HARVEST_DATABASE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

    let catalog = SqliteCatalog::open(&database)
        .await
        .with_context(|| format!("Failed to open catalog {}", database.display()))?;

    match cli.command {
        Commands::Run { config } => cmd_run(&catalog, config).await,
        Commands::Stats => cmd_stats(&catalog).await,
        Commands::List {
            all,
            limit,
            compact,
        } => {
            let mut filter = if all {
                EntryFilter::all()
            } else {
                EntryFilter::active()
            };
            filter.limit = limit;
            cmd_list(&catalog, &filter, compact).await
        }
        Commands::Recent { days } => {
            let since = days_before(Local::now().date_naive(), days)?;
            let filter = EntryFilter::active().with_seen_since(since);
            cmd_list(&catalog, &filter, false).await
        }
        Commands::Search { keyword, all } => {
            let filter = if all {
                EntryFilter::all()
            } else {
                EntryFilter::active()
            };
            cmd_list(&catalog, &filter.with_keyword(keyword), false).await
        }
        Commands::Show { job_id } => cmd_show(&catalog, &job_id).await,
        Commands::Export { path, all } => cmd_export(&catalog, &path, all).await,
        Commands::Apply { job_id, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            cmd_set_applied(&catalog, &job_id, Some(date)).await
        }
        Commands::Unapply { job_id } => cmd_set_applied(&catalog, &job_id, None).await,
    }
}

/// The date `days` days before `today`.
fn days_before(today: NaiveDate, days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| today.checked_sub_signed(delta))
        .with_context(|| format!("--days {} is out of range", days))
}

async fn cmd_run(catalog: &SqliteCatalog, config: Option<PathBuf>) -> Result<()> {
    let path = config
        .or_else(|| std::env::var_os("HARVEST_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = RunConfig::load(&path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;
    tracing::info!(config = %path.display(), "Configuration loaded");

    display::print_header("Job Harvester");
    println!("Loaded {} search(es):", config.searches.len());
    for (index, search) in config.searches.iter().enumerate() {
        println!("  {}. {}", index + 1, search.label());
    }

    let mut browser = HttpBrowser::from_settings(&config.scrape_settings);
    if let Ok(cookie) = std::env::var("HARVEST_COOKIE") {
        browser = browser.with_cookie(cookie);
    }

    let report = run_harvest(&config, browser, catalog)
        .await
        .context("Harvest run failed")?;
    display::print_run_report(&report);
    Ok(())
}

async fn cmd_stats(catalog: &SqliteCatalog) -> Result<()> {
    let stats = catalog.stats().await.context("Failed to read stats")?;
    display::print_header("Catalog");
    display::print_stats(&stats);
    Ok(())
}

async fn cmd_list(catalog: &SqliteCatalog, filter: &EntryFilter, compact: bool) -> Result<()> {
    let entries = catalog.list(filter).await.context("Failed to list jobs")?;
    display::print_entries(&entries, compact);
    Ok(())
}

async fn cmd_show(catalog: &SqliteCatalog, job_id: &str) -> Result<()> {
    match catalog.get(job_id).await.context("Failed to read job")? {
        Some(entry) => {
            display::print_entry(&entry, false);
            Ok(())
        }
        None => bail!("No job with id {}", job_id),
    }
}

async fn cmd_export(catalog: &SqliteCatalog, path: &Path, all: bool) -> Result<()> {
    let filter = if all {
        EntryFilter::all()
    } else {
        EntryFilter::active()
    };
    let entries = catalog.list(&filter).await.context("Failed to list jobs")?;
    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} Exported {} job(s) to {}",
        "✓".green(),
        entries.len(),
        path.display()
    );
    Ok(())
}

async fn cmd_set_applied(
    catalog: &SqliteCatalog,
    job_id: &str,
    date: Option<NaiveDate>,
) -> Result<()> {
    let updated = catalog
        .set_applied(job_id, date)
        .await
        .context("Failed to update job")?;
    if !updated {
        bail!("No job with id {}", job_id);
    }

    match date {
        Some(date) => println!("{} Marked {} as applied on {}", "✓".green(), job_id, date),
        None => println!("{} Cleared application for {}", "✓".green(), job_id),
    }
    Ok(())
}
