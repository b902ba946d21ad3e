use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Mode;

/// Problems with the supplied configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No photo directory configured; pass --photo-dir or set PHOTOSYNCR_PHOTO_DIR")]
    MissingPhotoDir,

    #[error("The photo directory '{0}' does not exist")]
    PhotoDirNotFound(PathBuf),

    #[error("The photo directory '{0}' is not a directory")]
    PhotoDirNotADirectory(PathBuf),

    #[error("Cannot resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The ledger path '{0}' is a directory")]
    LedgerIsDirectory(PathBuf),

    #[error("The directory holding the ledger '{0}' does not exist")]
    LedgerParentMissing(PathBuf),

    #[error("{0} is required to talk to the photo service")]
    MissingCredential(&'static str),

    #[error("{0} is required; there is no default photo service")]
    MissingEndpoint(&'static str),
}

/// Application configuration, validated once and passed down by reference.
pub struct Config {
    pub photo_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub api_url: Option<String>,
    pub upload_url: Option<String>,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    pub owner: String,

    pub retry_delay_secs: u64,
    pub poll_interval_secs: u64,
    pub max_retries: u32,
    pub max_polls: u32,

    pub mode: Mode,
    pub match_size: bool,
    pub dry_run: bool,
    pub assume_yes: bool,
    pub no_progress_bar: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("photo_dir", &self.photo_dir)
            .field("ledger_path", &self.ledger_path)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("owner", &self.owner)
            .field("mode", &self.mode)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Canonicalize the photo root so that relative ledger keys do not depend on
/// how the path was spelled on the command line.
fn resolve_photo_dir(raw: &str) -> Result<PathBuf, ConfigError> {
    let path = expand_tilde(raw);
    let resolved = match std::fs::canonicalize(&path) {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::PhotoDirNotFound(path));
        }
        Err(e) => return Err(ConfigError::Resolve { path, source: e }),
    };
    if !resolved.is_dir() {
        return Err(ConfigError::PhotoDirNotADirectory(resolved));
    }
    Ok(resolved)
}

fn check_ledger_path(path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        return Err(ConfigError::LedgerIsDirectory(path.to_path_buf()));
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(ConfigError::LedgerParentMissing(path.to_path_buf()))
        }
        _ => Ok(()),
    }
}

impl Config {
    pub fn from_cli(cli: crate::cli::Cli) -> Result<Self, ConfigError> {
        let mode = cli.mode();
        let raw_photo_dir = cli
            .photo_dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(ConfigError::MissingPhotoDir)?;
        let photo_dir = resolve_photo_dir(raw_photo_dir)?;

        let ledger_path = expand_tilde(&cli.ledger);
        check_ledger_path(&ledger_path)?;

        tracing::debug!(
            photo_dir = %photo_dir.display(),
            ledger = %ledger_path.display(),
            "Loaded configuration"
        );

        Ok(Self {
            photo_dir,
            ledger_path,
            api_url: cli.api_url.filter(|u| !u.trim().is_empty()),
            upload_url: cli.upload_url.filter(|u| !u.trim().is_empty()),
            api_key: cli.api_key.filter(|k| !k.is_empty()),
            auth_token: cli.auth_token.filter(|t| !t.is_empty()),
            owner: cli.owner,
            retry_delay_secs: cli.retry_delay,
            poll_interval_secs: cli.poll_interval,
            max_retries: cli.max_retries,
            max_polls: cli.max_polls.max(1),
            mode,
            match_size: cli.match_size,
            dry_run: cli.dry_run,
            assume_yes: cli.yes,
            no_progress_bar: cli.no_progress_bar,
        })
    }

    /// REST and upload endpoints, required by every mode that reaches the
    /// photo service.
    pub fn require_endpoints(&self) -> Result<(&str, &str), ConfigError> {
        let api_url = self
            .api_url
            .as_deref()
            .ok_or(ConfigError::MissingEndpoint("The REST endpoint (--api-url)"))?;
        let upload_url = self
            .upload_url
            .as_deref()
            .ok_or(ConfigError::MissingEndpoint("The upload endpoint (--upload-url)"))?;
        Ok((api_url, upload_url))
    }

    /// The API key, required by every mode that reaches the photo service.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential("An API key (--api-key)"))
    }
}
