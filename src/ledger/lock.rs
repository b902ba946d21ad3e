//! Single-writer guard for the ledger.

use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;

use super::error::LedgerError;

/// Exclusive advisory lock on `<ledger>.lock`, held for a whole sync or
/// delete-all run and released on drop.
#[derive(Debug)]
pub struct LedgerLock {
    _file: std::fs::File,
    path: PathBuf,
}

impl LedgerLock {
    pub async fn acquire(ledger_path: &Path) -> Result<Self, LedgerError> {
        let mut lock_path = ledger_path.as_os_str().to_os_string();
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);

        tokio::task::spawn_blocking(move || {
            let file = std::fs::File::create(&lock_path).map_err(|e| LedgerError::Lock {
                path: lock_path.clone(),
                source: e,
            })?;
            file.try_lock_exclusive()
                .map_err(|_| LedgerError::Locked(lock_path.clone()))?;
            tracing::debug!("Acquired ledger lock {}", lock_path.display());
            Ok(Self {
                _file: file,
                path: lock_path,
            })
        })
        .await?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
