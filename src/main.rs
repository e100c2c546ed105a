//! Linkrot main entry point
//!
//! This is the command-line interface for the linkrot site link checker.

use clap::{Parser, Subcommand};
use linkrot::config::{load_config_with_hash, Config};
use linkrot::crawler::{run_cleanup, run_tick};
use linkrot::output::{load_summary, print_status, print_summary};
use linkrot::storage::{open_storage, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Linkrot: a polite site link checker
///
/// Linkrot crawls one website in short, bounded invocations driven by an
/// external scheduler, records every link it finds in a local database, and
/// reports the ones that are broken or oversized.
#[derive(Parser, Debug)]
#[command(name = "linkrot")]
#[command(version = "1.0.0")]
#[command(about = "A polite site link checker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "linkrot.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one bounded crawl invocation
    Tick,

    /// Delete records older than the retention period
    Cleanup,

    /// Print the link-health summary
    Summary {
        /// Restrict the report to URLs linked from one course
        #[arg(long)]
        course: Option<i64>,
    },

    /// Print crawl-cycle status and recent history
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Cannot load {}: {}", cli.config.display(), e);
            return Err(e.into());
        }
    };
    tracing::debug!(
        "Loaded configuration from {} (hash {})",
        cli.config.display(),
        config_hash
    );

    match cli.command {
        Commands::Tick => handle_tick(config, cli.verbose > 0).await,
        Commands::Cleanup => handle_cleanup(&config),
        Commands::Summary { course } => handle_summary(&config, course),
        Commands::Status => handle_status(&config),
    }
}

/// Installs the tracing subscriber; -v raises detail, -q shows errors only
fn setup_logging(verbose: u8, quiet: bool) {
    let directives = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "linkrot=info,warn",
        (false, 1) => "linkrot=debug,info",
        (false, 2) => "linkrot=trace,debug",
        (false, _) => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the tick subcommand: one bounded crawl invocation
async fn handle_tick(config: Config, verbose: bool) -> anyhow::Result<()> {
    match run_tick(config, verbose).await {
        Ok(()) => {
            tracing::info!("Tick completed");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Tick failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the cleanup subcommand: one retention pass over the store
fn handle_cleanup(config: &Config) -> anyhow::Result<()> {
    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let now = chrono::Utc::now().timestamp();

    let stats = run_cleanup(&mut storage, config, now)?;

    println!(
        "Removed {} URLs and {} links past retention",
        stats.urls_deleted, stats.edges_deleted
    );
    Ok(())
}

/// Handles the summary subcommand: prints the link-health report
fn handle_summary(config: &Config, course: Option<i64>) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;

    let summary = load_summary(&storage, course, config.limits.max_url_size as i64, 100)?;
    print_summary(&summary);

    Ok(())
}

/// Handles the status subcommand: cycle state and recent history
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;

    let state = storage.load_crawl_state()?;
    let queued = storage.count_queued(chrono::Utc::now().timestamp())?;
    let history = storage.recent_history(10)?;
    print_status(&state, queued, &history);

    Ok(())
}
