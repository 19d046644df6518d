//! Responsible for transforming the `AppState` into a `UiState` view model.

use serde::Serialize;
use std::path::PathBuf;

use super::state::{AppState, ScanSummary};
use crate::core::Node;

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub items: Vec<Node>,
    pub total_size: u64,
    pub total_items: u64,
    pub source_paths: Vec<PathBuf>,
    pub is_scanning: bool,
    pub status_message: String,
    pub allowed_extensions: Vec<String>,
    pub last_scan: Option<ScanSummary>,
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    UiState {
        items: state.store.items().to_vec(),
        total_size: state.store.total_size(),
        total_items: state.store.total_items(),
        source_paths: state.store.source_paths().to_vec(),
        is_scanning: state.is_scanning(),
        status_message: state.status_message.clone(),
        allowed_extensions: state.config.allowed_extensions.clone(),
        last_scan: state.last_scan.clone(),
    }
}
