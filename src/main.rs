//! dyn-ip-mailer - email notification on public IP change.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dyn_ip_mailer::checker::{self, display_cached, CheckOutcome, Checker};
use dyn_ip_mailer::{AddressCache, IpFetcher, Settings, SmtpNotifier};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dyn-ip-mailer")]
#[command(about = "Emails you when your public IP address changes")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the IP and notify on change (default)
    Check {
        /// Send the notification even if the IP hasn't changed
        #[arg(short, long)]
        force: bool,
    },

    /// Show current and cached IP without updating anything
    Status,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    tracing::debug!("Loaded {:?}", settings);

    match cli.command.unwrap_or(Commands::Check { force: false }) {
        Commands::Check { force } => cmd_check(settings, force).await?,
        Commands::Status => cmd_status(settings).await?,
    }

    Ok(())
}

async fn cmd_check(settings: Settings, force: bool) -> anyhow::Result<()> {
    let fetcher = IpFetcher::new(settings.ip_service.clone());
    let cache = AddressCache::new(settings.cache_file.clone());
    let notifier = SmtpNotifier::new(settings).context("setting up SMTP transport")?;

    let outcome = Checker::new(&fetcher, &cache, &notifier)
        .run(force)
        .await
        .context("checking public IP")?;

    // Mail and cache-write failures never affect the exit status.
    match outcome {
        CheckOutcome::Unchanged { .. } => println!("Result: unchanged"),
        CheckOutcome::Changed {
            previous,
            current,
            cache_written,
            notification,
        } => println!(
            "Result: changed ({} -> {}), cache {}, mail {}",
            display_cached(previous.as_deref()),
            current,
            if cache_written { "updated" } else { "NOT updated" },
            if notification.is_ok() { "sent" } else { "FAILED" }
        ),
    }

    Ok(())
}

async fn cmd_status(settings: Settings) -> anyhow::Result<()> {
    let fetcher = IpFetcher::new(settings.ip_service.clone());
    let cache = AddressCache::new(settings.cache_file.clone());

    let status = checker::status(&fetcher, &cache)
        .await
        .context("reading IP status")?;

    println!("Service:    {}", fetcher.url());
    println!("Current IP: {}", status.current);
    println!("Cached IP:  {}", display_cached(status.cached.as_deref()));
    println!(
        "Changed:    {}",
        if status.changed() { "yes" } else { "no" }
    );

    Ok(())
}
