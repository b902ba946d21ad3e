//! Upload ledger trait and SQLite implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OpenFlags};

use super::error::LedgerError;
use super::schema;

/// Everything the ledger has recorded: relative directory to uploaded filenames.
pub type RecordedUploads = BTreeMap<String, BTreeSet<String>>;

/// Persisted record of filenames confirmed uploaded, keyed by directory path
/// relative to the photo root.
///
/// Entries are only ever unioned in; the sole removal is [`Ledger::delete_all`].
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Whether the ledger store exists at all.
    async fn exists(&self) -> Result<bool, LedgerError>;

    /// Filenames recorded for one relative directory (empty when unknown).
    async fn get(&self, directory: &str) -> Result<BTreeSet<String>, LedgerError>;

    /// Every recorded directory with its filenames.
    async fn entries(&self) -> Result<RecordedUploads, LedgerError>;

    /// Union `filenames` into the set recorded for `directory` in a single
    /// transaction. Returns how many filenames were newly recorded.
    async fn put_union(
        &self,
        directory: &str,
        filenames: &BTreeSet<String>,
    ) -> Result<usize, LedgerError>;

    /// Number of filenames recorded across all directories.
    async fn total_count(&self) -> Result<u64, LedgerError>;

    /// Remove the ledger store entirely.
    async fn delete_all(&self) -> Result<(), LedgerError>;
}

/// SQLite implementation of the upload ledger.
///
/// Holds no connection: every operation opens the file on a blocking thread,
/// does its work and closes it again, so the store is never held open across
/// a network call. Reads open the file read-only and treat a missing file as
/// an empty ledger without creating it.
pub struct SqliteLedger {
    path: PathBuf,
}

impl std::fmt::Debug for SqliteLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedger")
            .field("path", &self.path)
            .finish()
    }
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl SqliteLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open read-only. `None` when the file is absent or has never been
    /// initialized.
    fn open_read(path: &Path) -> Result<Option<Connection>, LedgerError> {
        let present = path.try_exists().map_err(|e| LedgerError::Access {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !present {
            return Ok(None);
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| LedgerError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(LedgerError::Migration)?;

        let version = schema::get_schema_version(&conn)?;
        schema::check_supported(version)?;
        if version == 0 {
            return Ok(None);
        }
        Ok(Some(conn))
    }

    /// Open read-write, creating and migrating the file as needed.
    fn open_write(path: &Path) -> Result<Connection, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(LedgerError::Migration)?;
        schema::migrate(&conn)?;
        Ok(conn)
    }

    async fn with_read<T, F>(&self, empty: T, f: F) -> Result<T, LedgerError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, LedgerError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || match Self::open_read(&path)? {
            Some(conn) => f(&conn),
            None => Ok(empty),
        })
        .await?
    }
}

fn sidecar_paths(path: &Path) -> [PathBuf; 3] {
    let base = path.as_os_str();
    let with_suffix = |suffix: &str| {
        let mut s = base.to_os_string();
        s.push(suffix);
        PathBuf::from(s)
    };
    [path.to_path_buf(), with_suffix("-wal"), with_suffix("-shm")]
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn exists(&self) -> Result<bool, LedgerError> {
        tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| LedgerError::Access {
                path: self.path.clone(),
                source: e,
            })
    }

    async fn get(&self, directory: &str) -> Result<BTreeSet<String>, LedgerError> {
        let directory = directory.to_string();
        self.with_read(BTreeSet::new(), move |conn| {
            let mut stmt = conn
                .prepare("SELECT filename FROM uploads WHERE directory = ?1")
                .map_err(LedgerError::query)?;
            let names = stmt
                .query_map([&directory], |row| row.get::<_, String>(0))
                .map_err(LedgerError::query)?
                .collect::<Result<BTreeSet<_>, _>>()
                .map_err(LedgerError::query)?;
            Ok(names)
        })
        .await
    }

    async fn entries(&self) -> Result<RecordedUploads, LedgerError> {
        self.with_read(RecordedUploads::new(), |conn| {
            let mut stmt = conn
                .prepare("SELECT directory, filename FROM uploads")
                .map_err(LedgerError::query)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(LedgerError::query)?;

            let mut recorded = RecordedUploads::new();
            for row in rows {
                let (directory, filename) = row.map_err(LedgerError::query)?;
                recorded.entry(directory).or_default().insert(filename);
            }
            Ok(recorded)
        })
        .await
    }

    async fn put_union(
        &self,
        directory: &str,
        filenames: &BTreeSet<String>,
    ) -> Result<usize, LedgerError> {
        if filenames.is_empty() {
            return Ok(0);
        }
        let path = self.path.clone();
        let directory = directory.to_string();
        let filenames: Vec<String> = filenames.iter().cloned().collect();
        let uploaded_at = Utc::now().timestamp();

        tokio::task::spawn_blocking(move || {
            let mut conn = Self::open_write(&path)?;
            let tx = conn.transaction().map_err(LedgerError::query)?;
            let mut inserted = 0;
            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT OR IGNORE INTO uploads (directory, filename, uploaded_at) VALUES (?1, ?2, ?3)",
                    )
                    .map_err(LedgerError::query)?;
                for filename in &filenames {
                    inserted += stmt
                        .execute(rusqlite::params![&directory, filename, uploaded_at])
                        .map_err(LedgerError::query)?;
                }
            }
            tx.commit().map_err(LedgerError::query)?;
            tracing::debug!(
                directory = %directory,
                inserted,
                "Committed uploads to ledger"
            );
            Ok(inserted)
        })
        .await?
    }

    async fn total_count(&self) -> Result<u64, LedgerError> {
        self.with_read(0, |conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM uploads", [], |row| row.get(0))
                .map_err(LedgerError::query)?;
            Ok(count as u64)
        })
        .await
    }

    async fn delete_all(&self) -> Result<(), LedgerError> {
        for path in sidecar_paths(&self.path) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(LedgerError::Remove { path, source: e }),
            }
        }
        Ok(())
    }
}
