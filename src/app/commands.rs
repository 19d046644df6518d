//! Contains all the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! Handlers lock the `AppState` for the whole of one store operation and send
//! a `StateUpdate` afterwards.

use super::events::UserEvent;
use super::helpers::{lock_state, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks::start_scan_on_paths;
use super::view_model::generate_ui_state;
use crate::config::{self, AppConfig};
use crate::core::NodeId;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Handles the initial request for state from the frontend when it loads.
///
/// When `restore_last_paths` is set and the store is still empty, the roots
/// from the previous session are scanned again.
pub fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) -> Option<JoinHandle<()>> {
    let restore = {
        let state_guard = lock_state(&state);
        proxy.send_event(UserEvent::StateUpdate(Box::new(generate_ui_state(
            &state_guard,
        ))));
        if state_guard.config.restore_last_paths && state_guard.store.is_empty() {
            state_guard.config.last_paths.clone()
        } else {
            Vec::new()
        }
    };

    if restore.is_empty() {
        return None;
    }
    tracing::info!("Restoring {} path(s) from the last session", restore.len());
    start_scan_on_paths(restore, proxy, state)
}

/// Scans the given paths and adds the resulting roots to the store.
///
/// Payload: an array of path strings.
pub fn add_paths<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> Option<JoinHandle<()>> {
    match serde_json::from_value::<Vec<PathBuf>>(payload.clone()) {
        Ok(paths) => start_scan_on_paths(paths, proxy, state),
        Err(_) => {
            tracing::warn!(
                "Failed to deserialize path list from payload: {:?}",
                payload
            );
            None
        }
    }
}

/// Removes a file or folder, at any depth, by id.
///
/// Payload: the node id as a string. Unknown ids leave the store untouched.
pub fn remove_item<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(id) = parse_node_id(&payload) else {
        tracing::warn!("Failed to deserialize node id from payload: {:?}", payload);
        return;
    };

    with_state_and_notify(&state, &proxy, |s| {
        let roots_before = s.store.items().len();
        s.store.remove_by_id(id);
        if s.store.items().len() != roots_before {
            s.sync_last_paths();
        }
    });
}

/// Expands or collapses a folder.
///
/// Payload: the folder id as a string.
pub fn toggle_open<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(id) = parse_node_id(&payload) else {
        tracing::warn!("Failed to deserialize node id from payload: {:?}", payload);
        return;
    };

    with_state_and_notify(&state, &proxy, |s| {
        if !s.store.toggle_open(id) {
            tracing::debug!("toggleOpen: no folder with id {}", id);
        }
    });
}

/// Discards every root.
pub fn clear_all<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.store.clear_all();
        s.status_message = "Cleared.".to_string();
        s.sync_last_paths();
    });
}

/// Replaces and persists the configuration.
///
/// Only future scans are affected; roots already in the store are not rescanned.
pub fn update_config<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    match serde_json::from_value::<AppConfig>(payload.clone()) {
        Ok(new_config) => {
            with_state_and_notify(&state, &proxy, |s| {
                let mut new_config = new_config.normalized();
                new_config.last_paths = s.store.source_paths().to_vec();
                s.config = new_config;
                s.persist_config();
            });
        }
        Err(e) => {
            tracing::warn!(
                "Failed to deserialize AppConfig from payload: {:?} ({})",
                payload,
                e
            );
        }
    }
}

/// Aborts every running scan. Nothing from an aborted scan reaches the store.
pub fn cancel_scan<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.cancel_scans();
    });
}

/// Sends the current state, including whether a scan is running and the
/// summary of the last finished one.
pub fn get_state<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let state_guard = lock_state(&state);
    proxy.send_event(UserEvent::StateUpdate(Box::new(generate_ui_state(
        &state_guard,
    ))));
}

/// Writes the current configuration to a file.
///
/// Payload: the destination path. The outcome is reported with `ConfigExported`.
pub fn export_config<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(path) = parse_path(&payload) else {
        tracing::warn!("Failed to deserialize export path from payload: {:?}", payload);
        return;
    };

    let state_guard = lock_state(&state);
    let result = config::settings::export_config(&state_guard.config, &path);
    if let Err(e) = &result {
        tracing::warn!("Failed to export config to {:?}: {}", path, e);
    }
    proxy.send_event(UserEvent::ConfigExported(result.is_ok()));
}

/// Replaces the configuration with one read from a file.
///
/// Payload: the source path. Running scans are cancelled and the store is
/// cleared, since its roots were built with the old settings. When the
/// imported config asks for it, its `last_paths` are scanned again.
pub fn import_config<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> Option<JoinHandle<()>> {
    let Some(path) = parse_path(&payload) else {
        tracing::warn!("Failed to deserialize import path from payload: {:?}", payload);
        return None;
    };

    let new_config = match config::settings::import_config(&path) {
        Ok(new_config) => new_config,
        Err(e) => {
            tracing::warn!("Failed to import config from {:?}: {}", path, e);
            proxy.send_event(UserEvent::ShowError(format!("Could not import config: {e}")));
            return None;
        }
    };

    let restore = with_state_and_notify(&state, &proxy, |s| {
        s.scan_tasks.retain(|task| !task.is_finished());
        if !s.scan_tasks.is_empty() {
            s.cancel_scans();
        }
        s.store.clear_all();
        s.config = new_config;
        s.persist_config();
        s.status_message = format!("Imported config from {}", path.display());
        if s.config.restore_last_paths {
            s.config.last_paths.clone()
        } else {
            Vec::new()
        }
    });

    start_scan_on_paths(restore, proxy, state)
}

fn parse_path(payload: &serde_json::Value) -> Option<PathBuf> {
    payload
        .as_str()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

fn parse_node_id(payload: &serde_json::Value) -> Option<NodeId> {
    payload.as_str().and_then(NodeId::parse)
}
