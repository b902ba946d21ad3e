/// File extensions recognized as uploadable media. Matched case-insensitively.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "avi", "mpg", "mp4", "mpeg", "mov", "m2ts", "wmv",
];

/// Immutable set of media extensions consulted by the scanner.
#[derive(Debug, Clone, Copy)]
pub struct MediaExtensionSet {
    extensions: &'static [&'static str],
}

impl MediaExtensionSet {
    pub const fn new(extensions: &'static [&'static str]) -> Self {
        Self { extensions }
    }

    /// Whether `extension` (without the dot) is a media extension.
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Whether the extension of `filename` is a media extension.
    pub fn matches(&self, filename: &str) -> bool {
        self.contains(&extension_of(filename))
    }

    pub fn as_slice(&self) -> &'static [&'static str] {
        self.extensions
    }
}

impl Default for MediaExtensionSet {
    fn default() -> Self {
        Self::new(MEDIA_EXTENSIONS)
    }
}

/// Lowercased text after the final `.` of a filename.
///
/// A name without any dot yields the whole name, so `README` reports as the
/// extension `readme` in the ignored-files report.
pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or(filename)
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Which of the mutually exclusive top-level operations to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sync,
    DupeReport,
    IgnoredReport,
    DeleteAll,
}

impl Mode {
    /// Modes that talk to the photo service and need credentials.
    pub fn is_remote(&self) -> bool {
        matches!(self, Mode::Sync | Mode::DeleteAll)
    }
}
