//! Extension-based eligibility checks for scanned files.

use std::path::Path;

/// The allow-list used when no configuration overrides it.
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// An ordered allow-list of lowercase file extensions.
///
/// A file is eligible when the part of its name after the last `.` matches
/// one of the entries, compared case-insensitively. Names without a `.` are
/// never eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Builds a filter from arbitrary user input.
    ///
    /// Entries are trimmed, stripped of a leading `.` and lowercased. Empty
    /// entries and repeats are dropped; first-seen order is kept.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: normalize_extensions(extensions),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns `true` if `file_name` carries an allowed extension.
    pub fn is_supported(&self, file_name: &str) -> bool {
        match extension_of(file_name) {
            Some(ext) => {
                let ext_lower = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext_lower)
            }
            None => false,
        }
    }

    /// Path flavour of [`ExtensionFilter::is_supported`], checking the final component.
    pub fn is_supported_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.is_supported(name))
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

/// Returns the substring after the last `.` of `file_name`, in original case.
pub fn extension_of(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Lowercases, trims and dedups a list of extensions while keeping their order.
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for ext in extensions {
        let ext = ext.as_ref().trim();
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_lowercase();
        if ext.is_empty() || normalized.contains(&ext) {
            continue;
        }
        normalized.push(ext);
    }
    normalized
}
