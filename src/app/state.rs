//! Defines the central, mutable state of the application.

use crate::config::{self, AppConfig};
use crate::core::FileStore;
use serde::Serialize;
use std::path::PathBuf;
use tokio::task::AbortHandle;

/// The outcome of the most recently finished scan.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub paths_requested: usize,
    pub roots_found: usize,
    pub roots_added: usize,
    pub elapsed_ms: u64,
}

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` and every command holds the
/// lock for the whole of one store operation. Scans build their trees without
/// the lock and only take it to merge the result.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Where the configuration is persisted. `None` uses the platform default.
    pub config_path: Option<PathBuf>,
    /// The forest of scanned roots and its totals.
    pub store: FileStore,
    /// Number of scans started but not yet merged or stopped.
    pub active_scans: usize,
    /// Handles of spawned scans, used to abort them.
    pub scan_tasks: Vec<AbortHandle>,
    pub last_scan: Option<ScanSummary>,
    /// A short, human-readable description of the last thing that happened.
    pub status_message: String,
}

impl Default for AppState {
    /// Creates a default `AppState` instance, loading the configuration from disk.
    fn default() -> Self {
        Self::new(AppConfig::load().unwrap_or_default(), None)
    }
}

impl AppState {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            store: FileStore::new(),
            active_scans: 0,
            scan_tasks: Vec::new(),
            last_scan: None,
            status_message: "Ready.".to_string(),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.active_scans > 0
    }

    /// Aborts every running scan. Their results are discarded and each one
    /// releases its `active_scans` slot once the runtime drops it.
    ///
    /// Returns `false` if nothing was running.
    pub fn cancel_scans(&mut self) -> bool {
        self.scan_tasks.retain(|handle| !handle.is_finished());
        if self.scan_tasks.is_empty() {
            tracing::warn!("Scan cancellation requested, but no scan is running.");
            return false;
        }
        tracing::info!("Cancelling {} scan(s)", self.scan_tasks.len());
        for handle in self.scan_tasks.drain(..) {
            handle.abort();
        }
        self.status_message = "Scan cancelled.".to_string();
        true
    }

    /// Records the current roots in the config and writes it out.
    pub fn sync_last_paths(&mut self) {
        self.config.last_paths = self.store.source_paths().to_vec();
        self.persist_config();
    }

    pub fn persist_config(&self) {
        if let Err(e) = config::settings::save_config(&self.config, self.config_path.as_deref()) {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}
