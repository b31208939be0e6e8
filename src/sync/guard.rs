//! Pass-overlap flag and write suppression.
//!
//! Two pieces of state are shared between the engine and the detector,
//! both ordering-disciplined rather than lock-heavy:
//!
//! - a process-wide "reconciliation in progress" flag — a trigger that
//!   arrives while a pass is active is dropped, not queued
//! - the set of paths the engine is about to write, so the detector can
//!   discard the file-change notifications those writes produce

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Process-wide "reconciliation in progress" flag.
static PASS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Token held for the duration of one full reconciliation pass.
///
/// Dropping it releases the flag.
pub struct PassToken(());

impl Drop for PassToken {
    fn drop(&mut self) {
        PASS_ACTIVE.store(false, Ordering::Release);
    }
}

/// Try to start a full pass. Returns `None` when one is already active;
/// the caller drops the trigger as a no-op.
#[must_use]
pub fn try_begin_pass() -> Option<PassToken> {
    PASS_ACTIVE
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .ok()
        .map(|_| PassToken(()))
}

/// Default suppression window after an engine write.
///
/// Long enough for the resulting file-change notification to be
/// observed and discarded.
pub const DEFAULT_HOLD: Duration = Duration::from_secs(3);

/// Marker set of paths currently being written by reconciliation.
///
/// The engine marks a path immediately before writing it; the detector
/// ignores modification events on a marked path until the hold window
/// has elapsed.
#[derive(Debug)]
pub struct WriteGuard {
    hold: Duration,
    marks: Mutex<HashMap<PathBuf, Instant>>,
}

impl WriteGuard {
    #[must_use]
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            marks: Mutex::new(HashMap::new()),
        }
    }

    /// Mark a path as engine-written. Call immediately before the
    /// write.
    pub fn mark(&self, path: &Path) {
        if let Ok(mut marks) = self.marks.lock() {
            marks.insert(path.to_path_buf(), Instant::now());
        }
    }

    /// Whether a modification event on this path should be discarded.
    ///
    /// Expired marks are removed so the map stays bounded by the number
    /// of configured sources.
    #[must_use]
    pub fn suppresses(&self, path: &Path) -> bool {
        let Ok(mut marks) = self.marks.lock() else {
            return false;
        };
        match marks.get(path) {
            Some(marked_at) if marked_at.elapsed() < self.hold => true,
            Some(_) => {
                marks.remove(path);
                false
            }
            None => false,
        }
    }
}

impl Default for WriteGuard {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_flag_drops_overlapping_trigger() {
        let token = try_begin_pass().unwrap();
        assert!(try_begin_pass().is_none());
        drop(token);
        assert!(try_begin_pass().is_some());
    }

    #[test]
    fn test_marked_path_is_suppressed_until_hold_elapses() {
        let guard = WriteGuard::new(Duration::from_secs(60));
        let path = Path::new("/vault/doc.md");

        assert!(!guard.suppresses(path));
        guard.mark(path);
        assert!(guard.suppresses(path));
    }

    #[test]
    fn test_expired_mark_is_cleared() {
        let guard = WriteGuard::new(Duration::ZERO);
        let path = Path::new("/vault/doc.md");

        guard.mark(path);
        assert!(!guard.suppresses(path));
        assert!(guard.marks.lock().unwrap().is_empty());
    }
}
