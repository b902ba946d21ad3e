//! Cross-directory duplicate detection for local housekeeping.

use std::path::PathBuf;

use crate::scan::DirectorySnapshot;

/// What two files must share to count as duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Name,
    NameAndSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateFile {
    pub name: String,
    /// Present when matching on size as well.
    pub size: Option<u64>,
}

/// Two directories sharing at least one file. `first` sorts before `second`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePair {
    pub first: PathBuf,
    pub second: PathBuf,
    pub first_count: usize,
    pub second_count: usize,
    pub files: Vec<DuplicateFile>,
}

/// Every unordered pair of directories with a non-empty intersection,
/// largest intersection first. Ties keep directory-path order.
pub fn find_duplicates(snapshot: &DirectorySnapshot, mode: MatchMode) -> Vec<DuplicatePair> {
    tracing::debug!("Comparing files in directory pairs for duplicates ({:?})", mode);
    let dirs: Vec<_> = snapshot.iter().collect();

    let mut pairs = Vec::new();
    for (i, (first, first_files)) in dirs.iter().enumerate() {
        for (second, second_files) in &dirs[i + 1..] {
            let files: Vec<DuplicateFile> = first_files
                .iter()
                .filter(|(name, size)| match mode {
                    MatchMode::Name => second_files.contains_key(*name),
                    MatchMode::NameAndSize => second_files.get(*name) == Some(*size),
                })
                .map(|(name, size)| DuplicateFile {
                    name: name.clone(),
                    size: (mode == MatchMode::NameAndSize).then_some(*size),
                })
                .collect();

            if !files.is_empty() {
                pairs.push(DuplicatePair {
                    first: (*first).clone(),
                    second: (*second).clone(),
                    first_count: first_files.len(),
                    second_count: second_files.len(),
                    files,
                });
            }
        }
    }

    pairs.sort_by(|a, b| b.files.len().cmp(&a.files.len()));
    pairs
}

/// Log the duplicate report. File names are listed at debug level.
pub fn report_duplicates(pairs: &[DuplicatePair]) {
    if pairs.is_empty() {
        tracing::info!("No duplicate files found");
        return;
    }
    for pair in pairs {
        tracing::info!(
            "{} of {}/{} duplicates in {} and {}",
            pair.files.len(),
            pair.first_count,
            pair.second_count,
            pair.first.display(),
            pair.second.display()
        );
        for file in &pair.files {
            match file.size {
                Some(size) => tracing::debug!("Duplicate (file, size): {} ({} bytes)", file.name, size),
                None => tracing::debug!("Duplicate (file): {}", file.name),
            }
        }
    }
}
