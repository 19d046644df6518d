pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::{CoreError, TokioFileSystem, TreeBuilder};
use crate::utils::file_detection::{normalize_extensions, ExtensionFilter, DEFAULT_EXTENSIONS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Lowercase extensions (without the dot) that make a file eligible.
    pub allowed_extensions: Vec<String>,
    /// `.gitignore`-style patterns whose matches are never scanned.
    pub ignore_patterns: HashSet<String>,
    /// Descend into symbolic links. Cycles are not detected when enabled.
    pub follow_symlinks: bool,
    /// Upper bound on concurrent stat/list calls. `None` means unbounded.
    pub max_concurrent_io: Option<usize>,
    /// Roots present in the store the last time it changed.
    pub last_paths: Vec<PathBuf>,
    pub restore_last_paths: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// Returns a copy with the extension list normalized.
    pub fn normalized(mut self) -> Self {
        self.allowed_extensions = normalize_extensions(&self.allowed_extensions);
        self
    }

    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.allowed_extensions)
    }

    /// Creates a tree builder over the real filesystem honoring these settings.
    pub fn tree_builder(&self) -> Result<TreeBuilder, CoreError> {
        let fs = match self.max_concurrent_io {
            Some(limit) => TokioFileSystem::with_limit(limit),
            None => TokioFileSystem::new(),
        };
        Ok(TreeBuilder::new(Arc::new(fs), self.extension_filter())
            .with_ignore_patterns(&self.ignore_patterns)?
            .with_follow_symlinks(self.follow_symlinks))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore_patterns: HashSet::new(),
            follow_symlinks: false,
            max_concurrent_io: None,
            last_paths: Vec::new(),
            restore_last_paths: false,
        }
    }
}
