//! Watch command implementation: continuous sync.
//!
//! Runs two loops on one runtime: a periodic full reconciliation pass
//! on the configured interval, and the change detector fed by
//! filesystem events on the source documents. A tick that lands while
//! a pass is still running is dropped, not queued.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use notify::{recommended_watcher, Event, EventKind, RecursiveMode, Watcher};
use tracing::debug;

use crate::asana::AsanaClient;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::sync::{try_begin_pass, ChangeDetector, ReconciliationEngine, WriteGuard};

use super::sync::report;

/// Floor for the periodic interval; anything lower hammers the API.
const MIN_INTERVAL_SECS: u64 = 30;

/// Watch documents and sync continuously until interrupted.
pub fn execute(config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = Settings::load(config_path.map(PathBuf::as_path))?;
    let token = settings.resolve_token()?;

    if settings.sources.is_empty() {
        return Err(Error::InvalidArgument(
            "no sources configured; add one with `taskmark sources add`".to_string(),
        ));
    }

    let client = Arc::new(AsanaClient::new(token));
    let store = DocumentStore::new(&settings.vault_dir);
    let guard = Arc::new(WriteGuard::default());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    rt.block_on(async {
        let detector = ChangeDetector::new(Arc::clone(&client), store.clone(), Arc::clone(&guard));

        // Resolved (and, where possible, canonical) paths of the
        // watched documents, used to filter watcher events.
        let mut watched: HashSet<PathBuf> = HashSet::new();
        let mut dirs: HashSet<PathBuf> = HashSet::new();
        for source in &settings.sources {
            let resolved = store.resolve(&source.file);
            if let Some(parent) = resolved.parent() {
                // The document may not exist until its first pass
                // bootstraps it; the parent must exist to be watched.
                let _ = std::fs::create_dir_all(parent);
                let dir = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
                if let Some(name) = resolved.file_name() {
                    // Events arrive with the canonical parent.
                    watched.insert(dir.join(name));
                }
                dirs.insert(dir);
            }
            watched.insert(resolved);
            detector.prime(&source.file);
        }

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<PathBuf>();
        let mut watcher = recommended_watcher(move |result: notify::Result<Event>| {
            let Ok(event) = result else { return };
            if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        })
        .map_err(|e| Error::Other(format!("failed to start file watcher: {e}")))?;

        for dir in &dirs {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| {
                    Error::Other(format!("failed to watch {}: {e}", dir.display()))
                })?;
        }

        let interval_secs = settings.sync_interval_secs.max(MIN_INTERVAL_SECS);
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

        if !json {
            println!(
                "Watching {} source{} (pass every {interval_secs}s). Ctrl-C to stop.",
                settings.sources.len(),
                if settings.sources.len() == 1 { "" } else { "s" }
            );
        }

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // Overlap control: drop the trigger if a pass is
                    // still running.
                    let Some(_pass) = try_begin_pass() else {
                        debug!("pass already in progress, trigger dropped");
                        continue;
                    };

                    let engine = ReconciliationEngine::new(
                        client.as_ref(),
                        &store,
                        settings.display,
                        Arc::clone(&guard),
                    );
                    let outcomes = engine.sync_all(&settings.sources).await;

                    let quiet_noop = !json
                        && outcomes.iter().all(|o| matches!(&o.result, Ok(s) if s.is_noop()));
                    if !quiet_noop {
                        // Failures are reported per source; the watch
                        // loop itself keeps running.
                        let _ = report(&outcomes, json);
                    }

                    // Passes rewrite documents from remote state; bring
                    // the detector baselines up to date so the next
                    // local edit diffs against what is actually on
                    // disk.
                    for source in &settings.sources {
                        detector.prime(&source.file);
                    }
                }
                Some(path) = rx.recv() => {
                    if watched.contains(&path) {
                        detector.observe(&path);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    if !json {
                        println!("\n{} Stopped.", "·".dimmed());
                    }
                    return Ok(());
                }
            }
        }
    })
}
