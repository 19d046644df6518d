use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

use super::events::UserEvent;
use super::helpers::{lock_state, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::{AppState, ScanSummary};
use super::view_model::generate_ui_state;
use crate::core::TreeBuilder;

/// Releases a scan's `active_scans` slot if the task ends without merging,
/// because it was aborted or panicked.
struct ScanGuard<P: EventProxy> {
    state: Arc<Mutex<AppState>>,
    proxy: P,
    merged: bool,
}

impl<P: EventProxy> Drop for ScanGuard<P> {
    fn drop(&mut self) {
        if self.merged {
            return;
        }
        let panicked = std::thread::panicking();
        with_state_and_notify(&self.state, &self.proxy, |s| {
            s.active_scans = s.active_scans.saturating_sub(1);
            if panicked {
                s.status_message = "Scan failed unexpectedly.".to_string();
            }
        });
        if panicked {
            tracing::error!("Scan task panicked; its results were discarded.");
        } else {
            tracing::info!("Scan task stopped before merging.");
        }
    }
}

/// Starts a background scan of `paths` and merges the result into the store.
///
/// The builder is created from a snapshot of the current config, and the tree
/// is built without holding the state lock. Progress is forwarded as
/// `ScanProgress` events. Returns `None` when nothing was started (no paths,
/// or the scan settings are invalid).
pub fn start_scan_on_paths<P: EventProxy>(
    paths: Vec<PathBuf>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> Option<JoinHandle<()>> {
    if paths.is_empty() {
        tracing::debug!("Scan requested without paths, ignoring.");
        return None;
    }

    let mut state_guard = lock_state(&state);
    let builder = match state_guard.config.tree_builder() {
        Ok(builder) => builder,
        Err(e) => {
            tracing::error!("Cannot start scan: {}", e);
            proxy.send_event(UserEvent::ShowError(format!("Invalid scan settings: {e}")));
            return None;
        }
    };

    state_guard.active_scans += 1;
    state_guard.status_message = format!("Scanning {} path(s)...", paths.len());
    proxy.send_event(UserEvent::StateUpdate(Box::new(generate_ui_state(
        &state_guard,
    ))));

    let progress_proxy = proxy.clone();
    let builder = builder.with_progress(move |progress| {
        progress_proxy.send_event(UserEvent::ScanProgress(progress));
    });
    // Created before spawning so an abort that lands before the first poll
    // still releases the slot.
    let guard = ScanGuard {
        state: state.clone(),
        proxy,
        merged: false,
    };

    tracing::info!("Starting scan of {} path(s)", paths.len());
    let handle = tokio::spawn(run_scan(builder, paths, guard));
    state_guard.scan_tasks.retain(|task| !task.is_finished());
    state_guard.scan_tasks.push(handle.abort_handle());
    Some(handle)
}

async fn run_scan<P: EventProxy>(
    builder: TreeBuilder,
    paths: Vec<PathBuf>,
    mut guard: ScanGuard<P>,
) {
    let started = Instant::now();
    let roots = builder.process_paths(&paths).await;
    let found = roots.len();

    let roots_added = with_state_and_notify(&guard.state, &guard.proxy, |s| {
        let added = s.store.merge_roots(roots);
        s.active_scans = s.active_scans.saturating_sub(1);
        s.status_message = format!(
            "Added {added} of {} path(s) in {:.2?} ({} skipped as duplicates)",
            paths.len(),
            started.elapsed(),
            found - added
        );
        s.last_scan = Some(ScanSummary {
            paths_requested: paths.len(),
            roots_found: found,
            roots_added: added,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        });
        if added > 0 {
            s.sync_last_paths();
        }
        added
    });
    guard.merged = true;

    tracing::info!(
        "Scan finished: {} root(s) added in {:?}",
        roots_added,
        started.elapsed()
    );
    guard.proxy.send_event(UserEvent::ScanComplete { roots_added });
}
