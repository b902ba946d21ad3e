use clap::Parser;

use crate::types::{LogLevel, Mode};

#[derive(Parser, Debug)]
#[command(
    name = "photosyncr",
    version,
    about = "Upload new photos and videos from a local tree, one album per directory"
)]
pub struct Cli {
    /// Root of the local photo tree
    #[arg(short = 'd', long, env = "PHOTOSYNCR_PHOTO_DIR")]
    pub photo_dir: Option<String>,

    /// Ledger file recording what has already been uploaded
    #[arg(long, env = "PHOTOSYNCR_LEDGER", default_value = "~/.photosyncr_cache")]
    pub ledger: String,

    /// Find and report duplicate photos in the local tree
    #[arg(long, group = "mode")]
    pub dupe_report: bool,

    /// Only count files as duplicates when their sizes match too
    #[arg(long, requires = "dupe_report")]
    pub match_size: bool,

    /// Report files not recognized as photos or videos
    #[arg(long, group = "mode")]
    pub ignored_report: bool,

    /// Delete every photo in the remote account and remove the ledger
    #[arg(long, group = "mode")]
    pub delete_all: bool,

    /// Do not ask for confirmation before --delete-all
    #[arg(short = 'y', long, requires = "delete_all")]
    pub yes: bool,

    /// Scan and compare against the ledger, but upload nothing
    #[arg(long, group = "mode")]
    pub dry_run: bool,

    /// REST endpoint of a Flickr-compatible photo service.
    /// The service must answer both REST calls and uploads in JSON
    /// (`format=json`); there is no default.
    #[arg(long, env = "PHOTOSYNCR_API_URL")]
    pub api_url: Option<String>,

    /// Upload endpoint of the same service (multipart, `async=1`, JSON reply)
    #[arg(long, env = "PHOTOSYNCR_UPLOAD_URL")]
    pub upload_url: Option<String>,

    /// Photo service API key
    #[arg(long, env = "PHOTOSYNCR_API_KEY")]
    pub api_key: Option<String>,

    /// Auth token obtained out of band (if not provided, will prompt).
    /// WARNING: passing via --auth-token is visible in process listings.
    /// Prefer the PHOTOSYNCR_AUTH_TOKEN environment variable instead.
    #[arg(long, env = "PHOTOSYNCR_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Account whose albums and photos are listed
    #[arg(long, env = "PHOTOSYNCR_OWNER", default_value = "me")]
    pub owner: String,

    /// Retries per upload submission after the first attempt
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// Base delay in seconds between submission retries (0 = retry at once)
    #[arg(long, default_value_t = 0)]
    pub retry_delay: u64,

    /// Seconds between upload status checks
    #[arg(long, default_value_t = 1)]
    pub poll_interval: u64,

    /// Maximum number of upload status checks per directory
    #[arg(long, default_value_t = 1000)]
    pub max_polls: u32,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}

impl Cli {
    /// The selected mode; a plain invocation (or `--dry-run`) syncs.
    pub fn mode(&self) -> Mode {
        if self.dupe_report {
            Mode::DupeReport
        } else if self.ignored_report {
            Mode::IgnoredReport
        } else if self.delete_all {
            Mode::DeleteAll
        } else {
            Mode::Sync
        }
    }
}
