//! The application layer between a frontend and the core tree/store logic.
//!
//! A host feeds JSON messages into [`handle_ipc_message`] and receives
//! [`events::UserEvent`]s through its [`proxy::EventProxy`].

pub mod commands;
pub mod events;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use std::sync::{Arc, Mutex};

use events::IpcMessage;
use proxy::EventProxy;
use state::AppState;

/// Parses one IPC message and dispatches it to the matching command handler.
///
/// Malformed messages and unknown commands are logged and otherwise ignored.
/// Scans triggered here run in the background; completion is signalled with
/// a `ScanComplete` event.
pub fn handle_ipc_message<P: EventProxy>(message: &str, proxy: P, state: Arc<Mutex<AppState>>) {
    let msg = match serde_json::from_str::<IpcMessage>(message) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("Failed to parse IPC message: {} ({})", message, e);
            return;
        }
    };

    tracing::debug!("IPC command received: {}", msg.command);
    match msg.command.as_str() {
        "initialize" => {
            commands::initialize(proxy, state);
        }
        "addPaths" => {
            commands::add_paths(msg.payload, proxy, state);
        }
        "removeItem" => commands::remove_item(msg.payload, proxy, state),
        "toggleOpen" => commands::toggle_open(msg.payload, proxy, state),
        "clearAll" => commands::clear_all(proxy, state),
        "updateConfig" => commands::update_config(msg.payload, proxy, state),
        "cancelScan" => commands::cancel_scan(proxy, state),
        "getState" => commands::get_state(proxy, state),
        "exportConfig" => commands::export_config(msg.payload, proxy, state),
        "importConfig" => {
            commands::import_config(msg.payload, proxy, state);
        }
        other => tracing::warn!("Unknown IPC command: {}", other),
    }
}
