//! gallwatch CLI
//!
//! One invocation is one run; scheduling (cron, CI workflow) lives outside.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gallwatch::{
    error::Result,
    ledger::NotifiedLedger,
    models::Config,
    notify, pipeline,
    services::HttpPageSource,
    utils::http,
};

/// gallwatch - Gallery Listing Watcher
#[derive(Parser, Debug)]
#[command(
    name = "gallwatch",
    version,
    about = "Watches gallery listings and notifies on new posts"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gallwatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one watch cycle: scan, notify new posts, update the ledger
    Run,

    /// Validate the configuration file
    Validate,

    /// Show ledger location and notified-id count
    Status,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run => {
            let config = Config::load_or_default(&cli.config);
            config.validate()?;

            let client = http::create_async_client(&config.http)?;
            let source = HttpPageSource::new(client.clone(), &config.source);
            let notifier = notify::create_notifier(&config, client)?;

            log::info!(
                "Watching {} ({} page(s))",
                config.source.base_url,
                config.source.pages
            );
            let report = pipeline::run_watch(&config, &source, notifier.as_ref()).await?;

            if report.sent == 0 {
                log::info!("No new posts.");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration from {}...", cli.config.display());

            let config = Config::load(&cli.config)?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            log::info!("✓ Config OK");
            log::info!("  source: {}", config.source.base_url);
            log::info!("  pages: {}", config.source.pages);
            log::info!("  ledger: {}", config.ledger.path.display());
        }

        Command::Status => {
            let config = Config::load_or_default(&cli.config);
            let ledger = NotifiedLedger::load(&config.ledger.path).await;

            log::info!("Ledger file: {}", config.ledger.path.display());
            log::info!(
                "Notified ids: {}{}",
                ledger.len(),
                if ledger.is_empty() {
                    " (no history yet)"
                } else {
                    ""
                }
            );
        }
    }

    Ok(())
}
