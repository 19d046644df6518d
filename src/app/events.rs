//! Defines the event and message structures for communication between the backend and frontend.

use serde::Deserialize;

use super::view_model::UiState;
use crate::core::ScanProgress;

/// Events sent from the Rust backend to the frontend.
#[derive(Debug)]
pub enum UserEvent {
    /// A complete state update to re-render the UI.
    StateUpdate(Box<UiState>),
    /// An error message to be displayed to the user.
    ShowError(String),
    /// A progress update during a scan.
    ScanProgress(ScanProgress),
    /// A scan finished and its roots were merged into the store.
    ScanComplete { roots_added: usize },
    /// The result of a configuration export.
    ConfigExported(bool),
}

/// A message received from the frontend via the IPC channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}
