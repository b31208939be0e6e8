//! Local change detector.
//!
//! Watches synced documents for edits made outside reconciliation and
//! pushes completion toggles to the remote immediately, without waiting
//! for the next periodic pass.
//!
//! Per document path the detector is an independent debounce state
//! machine: quiescent → modification observed → pending timer (reset by
//! further modifications inside the window) → scan. A scan re-parses
//! the document, diffs identifier→completion against the last recorded
//! snapshot for that path, pushes every flip, and records the new
//! mapping regardless of push outcome — the next diff is always
//! relative to the most recently *observed* state, not the last
//! successfully synced one.
//!
//! Events on paths the engine has marked as its own writes are
//! discarded until the suppression window elapses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use colored::Colorize;
use tracing::{debug, warn};

use crate::asana::TaskApi;
use crate::document::Document;
use crate::store::DocumentStore;

use super::guard::WriteGuard;

/// Default debounce window collapsing bursts of rapid edits.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

/// Completion snapshot of one document: identifier → completed.
type Snapshot = HashMap<String, bool>;

struct DetectorInner<A> {
    api: Arc<A>,
    store: DocumentStore,
    guard: Arc<WriteGuard>,
    debounce: Duration,
    /// Last observed completion state per document path. Owned
    /// exclusively by the detector.
    snapshots: Mutex<HashMap<PathBuf, Snapshot>>,
    /// Pending debounce timers, keyed by document path.
    timers: Mutex<HashMap<PathBuf, tokio::task::JoinHandle<()>>>,
}

/// Debounced watcher pushing local completion toggles to the remote.
pub struct ChangeDetector<A> {
    inner: Arc<DetectorInner<A>>,
}

impl<A: TaskApi + 'static> ChangeDetector<A> {
    #[must_use]
    pub fn new(api: Arc<A>, store: DocumentStore, guard: Arc<WriteGuard>) -> Self {
        Self::with_debounce(api, store, guard, DEFAULT_DEBOUNCE)
    }

    #[must_use]
    pub fn with_debounce(
        api: Arc<A>,
        store: DocumentStore,
        guard: Arc<WriteGuard>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(DetectorInner {
                api,
                store,
                guard,
                debounce,
                snapshots: Mutex::new(HashMap::new()),
                timers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Record the current completion state of a document without
    /// pushing anything. Called once per source before watching starts
    /// so the first real edit diffs against a baseline.
    pub fn prime(&self, path: &Path) {
        let resolved = self.inner.store.resolve(path);
        let Ok(content) = self.inner.store.read(&resolved) else {
            return;
        };
        let snapshot = completion_snapshot(&Document::parse(&content));
        if let Ok(mut snapshots) = self.inner.snapshots.lock() {
            snapshots.insert(resolved, snapshot);
        }
    }

    /// Handle one filesystem modification event.
    ///
    /// Starts (or resets) the path's debounce timer unless the path is
    /// currently suppressed as an engine write.
    pub fn observe(&self, path: &Path) {
        let resolved = self.inner.store.resolve(path);

        if self.inner.guard.suppresses(&resolved) {
            debug!(path = %resolved.display(), "modification from reconciliation write, ignored");
            return;
        }

        let Ok(mut timers) = self.inner.timers.lock() else {
            return;
        };
        if let Some(pending) = timers.remove(&resolved) {
            pending.abort();
        }

        let inner = Arc::clone(&self.inner);
        let key = resolved.clone();
        timers.insert(
            resolved,
            tokio::spawn(async move {
                tokio::time::sleep(inner.debounce).await;
                scan(&inner, &key).await;
                if let Ok(mut timers) = inner.timers.lock() {
                    timers.remove(&key);
                }
            }),
        );
    }

    /// Scan a document now, bypassing the debounce timer.
    pub async fn scan_now(&self, path: &Path) {
        let resolved = self.inner.store.resolve(path);
        scan(&self.inner, &resolved).await;
    }
}

/// Diff the document against the recorded snapshot and push flips.
async fn scan<A: TaskApi>(inner: &DetectorInner<A>, path: &Path) {
    let content = match inner.store.read(path) {
        Ok(content) => content,
        Err(error) => {
            warn!(path = %path.display(), %error, "scan failed to read document");
            return;
        }
    };
    let doc = Document::parse(&content);
    let current = completion_snapshot(&doc);
    let titles: HashMap<&str, &str> = doc
        .sections
        .iter()
        .flat_map(|s| &s.tasks)
        .filter_map(|t| t.gid.as_deref().map(|gid| (gid, t.title.as_str())))
        .collect();

    let previous = inner
        .snapshots
        .lock()
        .ok()
        .and_then(|snapshots| snapshots.get(path).cloned());

    if let Some(previous) = previous {
        for (gid, &completed) in &current {
            if previous.get(gid).is_none_or(|&was| was == completed) {
                continue;
            }
            let title = titles.get(gid.as_str()).copied().unwrap_or(gid);
            match inner.api.set_completed(gid, completed).await {
                Ok(()) => {
                    if completed {
                        println!("{} Completed \"{title}\"", "✓".green());
                    } else {
                        println!("{} Reopened \"{title}\"", "↺".yellow());
                    }
                }
                Err(error) => {
                    // Report and keep going with the remaining flips.
                    eprintln!(
                        "{} Could not sync \"{title}\": {error}",
                        "!".red().bold()
                    );
                    warn!(%gid, %error, "completion push from detector failed");
                }
            }
        }
    }

    // Record the observed state even when pushes failed.
    if let Ok(mut snapshots) = inner.snapshots.lock() {
        snapshots.insert(path.to_path_buf(), current);
    }
}

/// Identifier → completion mapping for a parsed document.
fn completion_snapshot(doc: &Document) -> Snapshot {
    doc.tasks_by_gid()
        .into_iter()
        .map(|(gid, task)| (gid, task.completed))
        .collect()
}
