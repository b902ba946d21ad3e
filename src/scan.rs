//! Local inventory scanner.
//!
//! Walks the photo tree and groups files by the directory that directly
//! contains them. A directory holding a `.skipsync` marker is left out
//! entirely; its subdirectories are still considered on their own.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::types::{extension_of, MediaExtensionSet};

/// Marker file that opts a directory out of syncing and reports.
pub const SKIP_MARKER: &str = ".skipsync";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Photo directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Photo directory is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Matched media files per directory, with their sizes in bytes.
///
/// Holds one entry for every directory that contains at least one file and
/// no skip marker; the entry's file map may be empty when none of the files
/// are media.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    directories: BTreeMap<PathBuf, BTreeMap<String, u64>>,
}

impl DirectorySnapshot {
    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    /// Directories in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &BTreeMap<String, u64>)> {
        self.directories.iter()
    }

    pub fn get(&self, directory: &Path) -> Option<&BTreeMap<String, u64>> {
        self.directories.get(directory)
    }

    /// Total number of matched media files.
    pub fn file_count(&self) -> usize {
        self.directories.values().map(BTreeMap::len).sum()
    }

    /// Record `files` (name, size) under `directory`.
    pub fn insert<I, S>(&mut self, directory: impl Into<PathBuf>, files: I)
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let entry = self.directories.entry(directory.into()).or_default();
        for (name, size) in files {
            entry.insert(name.into(), size);
        }
    }
}

struct ListedDirectory {
    files: Vec<(String, u64)>,
    skipped: bool,
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Every file under `root`, grouped by parent directory.
///
/// Symlinks to directories are not followed and not counted as files.
/// Unreadable entries are logged and skipped.
fn list_tree(root: &Path) -> Result<BTreeMap<PathBuf, ListedDirectory>, ScanError> {
    check_root(root)?;

    let mut listed: BTreeMap<PathBuf, ListedDirectory> = BTreeMap::new();
    for entry_result in WalkDir::new(root).follow_links(false) {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if entry.path_is_symlink() && path.is_dir() {
            continue;
        }
        let Some(parent) = path.parent() else {
            continue;
        };
        let dir = listed
            .entry(parent.to_path_buf())
            .or_insert_with(|| ListedDirectory {
                files: Vec::new(),
                skipped: false,
            });
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!("Skipping file with non UTF-8 name: {}", path.display());
            continue;
        };
        if name == SKIP_MARKER {
            dir.skipped = true;
            continue;
        }
        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };
        dir.files.push((name.to_string(), size));
    }

    for (dir, listing) in &listed {
        if listing.skipped {
            tracing::debug!("Skipping {} ({} present)", dir.display(), SKIP_MARKER);
        }
    }
    Ok(listed)
}

/// Build a [`DirectorySnapshot`] of the media files under `root`.
pub fn scan_directories(
    root: &Path,
    extensions: &MediaExtensionSet,
) -> Result<DirectorySnapshot, ScanError> {
    tracing::debug!(
        "Scanning {} recursively for files with extensions {:?}",
        root.display(),
        extensions.as_slice()
    );

    let mut snapshot = DirectorySnapshot::default();
    for (dir, listing) in list_tree(root)? {
        if listing.skipped {
            continue;
        }
        let matched = listing
            .files
            .into_iter()
            .filter(|(name, _)| extensions.matches(name));
        snapshot.insert(dir, matched);
    }

    tracing::debug!(
        "Found {} media files in {} directories",
        snapshot.file_count(),
        snapshot.len()
    );
    Ok(snapshot)
}

/// Count files whose extension is not a media extension, most common first.
///
/// Directories carrying the skip marker are not counted.
pub fn ignored_extensions(
    root: &Path,
    extensions: &MediaExtensionSet,
) -> Result<Vec<(String, usize)>, ScanError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for listing in list_tree(root)?.into_values() {
        if listing.skipped {
            continue;
        }
        for (name, _) in listing.files {
            let extension = extension_of(&name);
            if !extensions.contains(&extension) {
                *counts.entry(extension).or_default() += 1;
            }
        }
    }

    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(sorted)
}

/// Print the ignored-extension report to stdout.
pub fn report_ignored(counts: &[(String, usize)]) {
    if counts.is_empty() {
        println!("No ignored files found");
        return;
    }
    for (extension, count) in counts {
        println!(".{} files: {}", extension, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn names(snapshot: &DirectorySnapshot, dir: &Path) -> Vec<String> {
        snapshot
            .get(dir)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_extension_filtering() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("photo.JPG"), b"a");
        touch(&root.join("photo.txt"), b"b");
        touch(&root.join("clip.mov"), b"c");

        let snapshot = scan_directories(root, &MediaExtensionSet::default()).unwrap();
        assert_eq!(names(&snapshot, root), vec!["clip.mov", "photo.JPG"]);
    }

    #[test]
    fn test_records_file_sizes() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a.jpg"), b"12345");
        let snapshot = scan_directories(tmp.path(), &MediaExtensionSet::default()).unwrap();
        assert_eq!(snapshot.get(tmp.path()).unwrap()["a.jpg"], 5);
    }

    #[test]
    fn test_skip_marker_excludes_directory_but_not_children() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let skipped = root.join("private");
        let child = skipped.join("child");
        touch(&skipped.join(SKIP_MARKER), b"");
        touch(&skipped.join("secret.jpg"), b"x");
        touch(&child.join("kept.jpg"), b"y");

        let snapshot = scan_directories(root, &MediaExtensionSet::default()).unwrap();
        assert!(snapshot.get(&skipped).is_none());
        assert_eq!(names(&snapshot, &child), vec!["kept.jpg"]);
    }

    #[test]
    fn test_directory_without_media_has_empty_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        touch(&docs.join("notes.txt"), b"x");

        let snapshot = scan_directories(tmp.path(), &MediaExtensionSet::default()).unwrap();
        assert!(snapshot.get(&docs).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_with_only_non_utf8_names_is_kept() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().unwrap();
        let odd = tmp.path().join("odd");
        fs::create_dir_all(&odd).unwrap();
        fs::write(odd.join(OsStr::from_bytes(b"bad\xff.jpg")), b"x").unwrap();

        let snapshot = scan_directories(tmp.path(), &MediaExtensionSet::default()).unwrap();
        assert!(snapshot.get(&odd).unwrap().is_empty());
    }

    #[test]
    fn test_empty_directories_omitted() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("empty/nested")).unwrap();

        let snapshot = scan_directories(tmp.path(), &MediaExtensionSet::default()).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_missing_root_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = scan_directories(&tmp.path().join("nope"), &MediaExtensionSet::default())
            .unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }

    #[test]
    fn test_file_root_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.jpg");
        touch(&file, b"x");
        let err = scan_directories(&file, &MediaExtensionSet::default()).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn test_ignored_extensions_sorted_by_count() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a.txt"), b"");
        touch(&root.join("b.TXT"), b"");
        touch(&root.join("sub/c.txt"), b"");
        touch(&root.join("sub/d.xmp"), b"");
        touch(&root.join("sub/e.jpg"), b"");
        touch(&root.join("hidden/f.raw"), b"");
        touch(&root.join("hidden").join(SKIP_MARKER), b"");

        let counts = ignored_extensions(root, &MediaExtensionSet::default()).unwrap();
        assert_eq!(
            counts,
            vec![("txt".to_string(), 3), ("xmp".to_string(), 1)]
        );
    }
}
