//! Upload orchestration.
//!
//! For every directory in the delta: submit each file (with retries), poll
//! the batch until the service has processed it, put the resulting photos
//! in the directory's album and only then record the filenames in the
//! ledger. A directory that fails at any step leaves the ledger untouched
//! and is retried in full on the next run; other directories carry on.

pub mod album;
pub mod consistency;
pub mod error;
pub mod poll;
pub mod reset;

use std::collections::BTreeSet;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::delta::{load_delta, photo_tag, relative_directory, SyncDelta};
use crate::ledger::Ledger;
use crate::remote::{AlbumIndex, PhotoService, Ticket};
use crate::retry::{retry_with_backoff, RetryAction, RetryConfig};
use crate::scan::DirectorySnapshot;

pub use album::{album_title, assign_to_album};
pub use consistency::check_consistency;
pub use error::SyncError;
pub use poll::{await_completion, PollConfig, Sleeper, TokioSleeper};
pub use reset::{delete_all, DeleteReport};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Canonical photo root; ledger keys are relative to it.
    pub photo_dir: PathBuf,
    pub retry: RetryConfig,
    pub poll: PollConfig,
    pub dry_run: bool,
    pub no_progress_bar: bool,
}

/// Outcome of a sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Directories with something to upload at the start of the run.
    pub directories_pending: usize,
    pub directories_synced: usize,
    pub files_uploaded: usize,
    pub failed: Vec<(PathBuf, SyncError)>,
    /// A stop was requested before every directory was processed.
    pub interrupted: bool,
}

/// Collaborators shared by every directory of a run.
pub struct SyncContext<'a> {
    pub service: &'a dyn PhotoService,
    pub ledger: &'a dyn Ledger,
    pub sleeper: &'a dyn Sleeper,
    pub config: &'a SyncConfig,
}

/// Create a progress bar with a consistent template.
///
/// Returns `ProgressBar::hidden()` when the user passed `--no-progress-bar`
/// or stdout is not a TTY.
pub(crate) fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .expect("valid template")
        .progress_chars("=> "),
    );
    pb
}

pub(crate) fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

fn classify(e: &crate::remote::RemoteError) -> RetryAction {
    if e.is_retryable() {
        RetryAction::Retry
    } else {
        RetryAction::Abort
    }
}

/// Upload one directory's pending files and commit them to the ledger.
///
/// Returns the number of files committed.
pub async fn upload_directory(
    ctx: &SyncContext<'_>,
    albums: &mut AlbumIndex,
    directory: &Path,
    files: &BTreeSet<String>,
) -> Result<usize, SyncError> {
    let relative = relative_directory(&ctx.config.photo_dir, directory);
    let title = album_title(directory);

    let pb = create_progress_bar(ctx.config.no_progress_bar, files.len() as u64);
    pb.set_message(title.clone());

    let mut tickets: Vec<Ticket> = Vec::with_capacity(files.len());
    for filename in files {
        let path = directory.join(filename);
        let tags = photo_tag(&relative, filename);
        let label = format!("Upload of {}", path.display());
        let mut attempts = 0u32;

        let submitted = retry_with_backoff(&ctx.config.retry, &label, classify, || {
            attempts += 1;
            ctx.service.upload_async(&path, &tags)
        })
        .await;

        match submitted {
            Ok(ticket) => {
                pb.suspend(|| tracing::debug!("Submitted {} as ticket {}", filename, ticket));
                tickets.push(ticket);
            }
            Err(source) => {
                pb.finish_and_clear();
                return Err(SyncError::Submission {
                    path,
                    attempts,
                    source,
                });
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let photos = await_completion(
        ctx.service,
        ctx.sleeper,
        &ctx.config.poll,
        directory,
        &tickets,
    )
    .await?;
    assign_to_album(ctx.service, albums, &title, &photos).await?;
    let committed = ctx.ledger.put_union(&relative, files).await?;
    Ok(committed)
}

/// Process the delta one directory at a time.
///
/// A failing directory is logged and recorded in the report; the run moves
/// on to the next one. A cancelled `shutdown_token` stops the run before the
/// next directory starts.
pub async fn sync_directories(
    ctx: &SyncContext<'_>,
    albums: &mut AlbumIndex,
    delta: &SyncDelta,
    shutdown_token: &CancellationToken,
) -> SyncReport {
    let mut report = SyncReport {
        directories_pending: delta.len(),
        ..SyncReport::default()
    };

    for (directory, files) in delta {
        if shutdown_token.is_cancelled() {
            tracing::info!("Stop requested, leaving remaining directories for the next run");
            report.interrupted = true;
            break;
        }
        tracing::info!(
            directory = %directory.display(),
            files = files.len(),
            "Uploading"
        );
        match upload_directory(ctx, albums, directory, files).await {
            Ok(committed) => {
                report.directories_synced += 1;
                report.files_uploaded += files.len();
                tracing::info!(
                    "Uploaded {} files from {} ({} new in ledger)",
                    files.len(),
                    directory.display(),
                    committed
                );
            }
            Err(e) => {
                tracing::error!("Failed to sync {}: {}", directory.display(), e);
                report.failed.push((directory.clone(), e));
            }
        }
    }
    report
}

/// Full sync run: drift check, delta, then upload.
///
/// Drift refuses the run before any upload. In dry-run mode the pending
/// files are logged instead of uploaded.
pub async fn run(
    ctx: &SyncContext<'_>,
    snapshot: &DirectorySnapshot,
    shutdown_token: &CancellationToken,
) -> Result<SyncReport, SyncError> {
    let started = Instant::now();

    check_consistency(ctx.ledger, ctx.service).await?;
    let delta = load_delta(&ctx.config.photo_dir, snapshot, ctx.ledger).await?;

    if delta.is_empty() {
        tracing::info!("No new photos to upload");
        return Ok(SyncReport::default());
    }

    if ctx.config.dry_run {
        let files: usize = delta.values().map(BTreeSet::len).sum();
        tracing::info!("── Dry Run Summary ──");
        for (directory, names) in &delta {
            tracing::info!(
                "  {} files would be uploaded from {} to album {}",
                names.len(),
                directory.display(),
                album_title(directory)
            );
        }
        tracing::info!("  {} files in {} directories", files, delta.len());
        return Ok(SyncReport {
            directories_pending: delta.len(),
            ..SyncReport::default()
        });
    }

    let mut albums = ctx.service.list_albums().await?;
    let report = sync_directories(ctx, &mut albums, &delta, shutdown_token).await;

    tracing::info!("── Summary ──");
    tracing::info!(
        "  {} files uploaded, {} of {} directories synced, {} failed",
        report.files_uploaded,
        report.directories_synced,
        report.directories_pending,
        report.failed.len()
    );
    if report.interrupted {
        tracing::info!("  Interrupted before all directories were processed");
    }
    tracing::info!("  elapsed: {}", format_duration(started.elapsed()));
    Ok(report)
}
