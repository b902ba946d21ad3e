//! Sync delta: local media not yet recorded in the ledger.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::ledger::{Ledger, LedgerError, RecordedUploads};
use crate::scan::DirectorySnapshot;

/// Directories with at least one file still to upload.
pub type SyncDelta = BTreeMap<PathBuf, BTreeSet<String>>;

/// Ledger key for `directory`: its path below `root`, `""` for the root
/// itself and `/a/b` for nested directories.
pub fn relative_directory(root: &Path, directory: &Path) -> String {
    match directory.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => String::new(),
        Ok(rel) => {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("/{}", parts.join("/"))
        }
        Err(_) => directory.to_string_lossy().into_owned(),
    }
}

/// Tag attached to an upload: the file's relative path with a leading `#`
/// and every space turned into `#`.
pub fn photo_tag(relative_dir: &str, filename: &str) -> String {
    format!("#{}/{}", relative_dir, filename).replace(' ', "#")
}

/// Subtract what the ledger has recorded from what the scan found.
///
/// `recorded` is `None` when no ledger exists yet, in which case every
/// directory's full set is pending.
pub fn compute_delta(
    root: &Path,
    snapshot: &DirectorySnapshot,
    recorded: Option<&RecordedUploads>,
) -> SyncDelta {
    let empty = BTreeSet::new();
    let mut delta = SyncDelta::new();

    for (directory, files) in snapshot.iter() {
        let uploaded = recorded
            .and_then(|r| r.get(&relative_directory(root, directory)))
            .unwrap_or(&empty);
        let pending: BTreeSet<String> = files
            .keys()
            .filter(|name| !uploaded.contains(*name))
            .cloned()
            .collect();
        if !pending.is_empty() {
            delta.insert(directory.clone(), pending);
        }
    }
    delta
}

/// Read the ledger and compute the delta for `snapshot`.
pub async fn load_delta(
    root: &Path,
    snapshot: &DirectorySnapshot,
    ledger: &dyn Ledger,
) -> Result<SyncDelta, LedgerError> {
    let recorded = if ledger.exists().await? {
        Some(ledger.entries().await?)
    } else {
        tracing::debug!("No ledger found, every local file is pending");
        None
    };
    let delta = compute_delta(root, snapshot, recorded.as_ref());
    tracing::debug!(
        "{} of {} directories have files to upload",
        delta.len(),
        snapshot.len()
    );
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SqliteLedger;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_relative_directory() {
        let root = Path::new("/root");
        assert_eq!(relative_directory(root, Path::new("/root")), "");
        assert_eq!(relative_directory(root, Path::new("/root/a")), "/a");
        assert_eq!(
            relative_directory(root, Path::new("/root/a/b c")),
            "/a/b c"
        );
    }

    #[test]
    fn test_photo_tag() {
        assert_eq!(photo_tag("/vacation", "img1.jpg"), "#/vacation/img1.jpg");
        assert_eq!(
            photo_tag("/summer trip", "beach day.jpg"),
            "#/summer#trip/beach#day.jpg"
        );
        assert_eq!(photo_tag("", "root.jpg"), "#/root.jpg");
    }

    #[test]
    fn test_delta_subtracts_recorded() {
        let mut snapshot = DirectorySnapshot::default();
        snapshot.insert("/root/a", [("1.jpg", 1), ("2.jpg", 1)]);
        let mut recorded = RecordedUploads::new();
        recorded.insert("/a".to_string(), set(&["1.jpg"]));

        let delta = compute_delta(Path::new("/root"), &snapshot, Some(&recorded));
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[Path::new("/root/a")], set(&["2.jpg"]));
    }

    #[test]
    fn test_fully_synced_directory_dropped() {
        let mut snapshot = DirectorySnapshot::default();
        snapshot.insert("/root/a", [("1.jpg", 1)]);
        snapshot.insert("/root/empty", Vec::<(String, u64)>::new());
        let mut recorded = RecordedUploads::new();
        recorded.insert("/a".to_string(), set(&["1.jpg"]));

        let delta = compute_delta(Path::new("/root"), &snapshot, Some(&recorded));
        assert!(delta.is_empty());
    }

    #[test]
    fn test_missing_ledger_means_everything_pending() {
        let mut snapshot = DirectorySnapshot::default();
        snapshot.insert("/root", [("top.jpg", 1)]);
        snapshot.insert("/root/a", [("1.jpg", 1), ("2.jpg", 1)]);

        let delta = compute_delta(Path::new("/root"), &snapshot, None);
        assert_eq!(delta[Path::new("/root")], set(&["top.jpg"]));
        assert_eq!(delta[Path::new("/root/a")], set(&["1.jpg", "2.jpg"]));
    }

    #[tokio::test]
    async fn test_load_delta_after_commit_excludes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = SqliteLedger::new(tmp.path().join("ledger"));
        let mut snapshot = DirectorySnapshot::default();
        snapshot.insert("/root/d", [("f.jpg", 1), ("g.jpg", 1)]);

        let before = load_delta(Path::new("/root"), &snapshot, &ledger)
            .await
            .unwrap();
        assert_eq!(before[Path::new("/root/d")], set(&["f.jpg", "g.jpg"]));

        ledger.put_union("/d", &set(&["f.jpg"])).await.unwrap();
        let after = load_delta(Path::new("/root"), &snapshot, &ledger)
            .await
            .unwrap();
        assert_eq!(after[Path::new("/root/d")], set(&["g.jpg"]));
    }
}
