//! photosyncr: one-way sync of a local photo tree to a photo-hosting service.
//!
//! Each local directory becomes a remote album named after the directory.
//! A local ledger records which files were confirmed uploaded so later runs
//! only send what is new. The ledger is checked against the remote photo
//! count before every sync and the run is refused when they disagree.

#![warn(clippy::all)]

mod cli;
mod config;
mod delta;
mod duplicates;
mod ledger;
mod remote;
pub mod retry;
mod scan;
mod shutdown;
mod sync;
mod types;

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Config, ConfigError};
use duplicates::MatchMode;
use ledger::{LedgerLock, SqliteLedger};
use remote::RestPhotoService;
use retry::RetryConfig;
use scan::DirectorySnapshot;
use sync::{PollConfig, SyncConfig, SyncContext, TokioSleeper};
use types::{MediaExtensionSet, Mode};

/// Exit code for configuration problems, distinct from runtime failures.
const EXIT_CONFIG: i32 = 2;

fn config_failure(e: ConfigError) -> ! {
    tracing::error!("{}", e);
    std::process::exit(EXIT_CONFIG);
}

/// Walk the photo tree off the async runtime.
async fn scan_tree(root: PathBuf) -> anyhow::Result<DirectorySnapshot> {
    let snapshot = tokio::task::spawn_blocking(move || {
        scan::scan_directories(&root, &MediaExtensionSet::default())
    })
    .await??;
    Ok(snapshot)
}

/// Build the REST client, prompting for the auth token when none was given.
fn build_service(config: &Config) -> RestPhotoService {
    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => config_failure(e),
    };
    let (api_url, upload_url) = match config.require_endpoints() {
        Ok(urls) => urls,
        Err(e) => config_failure(e),
    };
    let auth_token = config.auth_token.clone().or_else(|| {
        tokio::task::block_in_place(|| rpassword::prompt_password("Auth token: ").ok())
            .filter(|t| !t.is_empty())
    });
    let Some(auth_token) = auth_token else {
        config_failure(ConfigError::MissingCredential(
            "An auth token (--auth-token or PHOTOSYNCR_AUTH_TOKEN)",
        ));
    };

    match RestPhotoService::new(
        api_url,
        upload_url,
        api_key,
        auth_token,
        config.owner.as_str(),
    ) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Could not set up the HTTP client: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_dupe_report(config: &Config) -> anyhow::Result<()> {
    let snapshot = scan_tree(config.photo_dir.clone()).await?;
    let mode = if config.match_size {
        MatchMode::NameAndSize
    } else {
        MatchMode::Name
    };
    let pairs = duplicates::find_duplicates(&snapshot, mode);
    duplicates::report_duplicates(&pairs);
    Ok(())
}

async fn run_ignored_report(config: &Config) -> anyhow::Result<()> {
    let root = config.photo_dir.clone();
    let counts = tokio::task::spawn_blocking(move || {
        scan::ignored_extensions(&root, &MediaExtensionSet::default())
    })
    .await??;
    scan::report_ignored(&counts);
    Ok(())
}

fn confirm_delete_all() -> anyhow::Result<bool> {
    println!("This will delete EVERY photo in the remote account and remove the ledger.");
    println!();
    print!("Are you sure? [y/N] ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

async fn run_delete_all(config: &Config) -> anyhow::Result<()> {
    if !config.assume_yes && !confirm_delete_all()? {
        println!("Cancelled.");
        return Ok(());
    }

    let _lock = LedgerLock::acquire(&config.ledger_path).await?;
    let shutdown_token = shutdown::install_signal_handler()?;
    let service = build_service(config);
    let ledger = SqliteLedger::new(&config.ledger_path);

    let report = sync::delete_all(&service, &ledger, &shutdown_token).await?;
    if report.interrupted {
        anyhow::bail!(
            "Stopped after deleting {} of {} photos; the ledger was kept",
            report.deleted,
            report.found
        );
    }
    tracing::info!("Deleted {} photos", report.deleted);
    Ok(())
}

async fn run_sync(config: &Config) -> anyhow::Result<()> {
    let started = Instant::now();
    let _lock = LedgerLock::acquire(&config.ledger_path).await?;
    let shutdown_token = shutdown::install_signal_handler()?;

    let snapshot = scan_tree(config.photo_dir.clone()).await?;
    tracing::info!(
        directories = snapshot.len(),
        files = snapshot.file_count(),
        "Scanned {}",
        config.photo_dir.display()
    );

    let service = build_service(config);
    let ledger = SqliteLedger::new(&config.ledger_path);
    tracing::debug!(
        ledger = %ledger.path().display(),
        lock = %_lock.path().display(),
        "Using ledger"
    );
    let sync_config = SyncConfig {
        photo_dir: config.photo_dir.clone(),
        retry: RetryConfig {
            max_retries: config.max_retries,
            base_delay_secs: config.retry_delay_secs,
            ..RetryConfig::default()
        },
        poll: PollConfig {
            interval: Duration::from_secs(config.poll_interval_secs),
            max_polls: config.max_polls,
        },
        dry_run: config.dry_run,
        no_progress_bar: config.no_progress_bar,
    };
    let ctx = SyncContext {
        service: &service,
        ledger: &ledger,
        sleeper: &TokioSleeper,
        config: &sync_config,
    };

    let report = sync::run(&ctx, &snapshot, &shutdown_token).await?;
    tracing::info!(
        "Sync ended after {}",
        sync::format_duration(started.elapsed())
    );

    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} of {} directories failed",
            report.failed.len(),
            report.directories_pending
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = match cli.log_level {
        types::LogLevel::Debug => "debug",
        types::LogLevel::Info => "info",
        types::LogLevel::Warn => "warn",
        types::LogLevel::Error => "error",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(e) => config_failure(e),
    };
    tracing::debug!(?config, "Starting photosyncr");

    if config.mode.is_remote() {
        if let Err(e) = config.require_endpoints() {
            config_failure(e);
        }
        if let Err(e) = config.require_api_key() {
            config_failure(e);
        }
    }

    match config.mode {
        Mode::DupeReport => run_dupe_report(&config).await,
        Mode::IgnoredReport => run_ignored_report(&config).await,
        Mode::DeleteAll => run_delete_all(&config).await,
        Mode::Sync => run_sync(&config).await,
    }
}
