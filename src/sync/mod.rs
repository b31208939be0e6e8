//! Bidirectional reconciliation between documents and Asana.
//!
//! This module is the sync core:
//!
//! - **Engine**: the 7-phase merge run once per configured source —
//!   fetch, bootstrap-if-absent, join, conflict arbitration, refresh,
//!   rewrite, append, conditional write
//! - **Detector**: a debounced, per-document watcher that pushes local
//!   completion toggles to the remote without waiting for the next pass
//! - **Policy**: conflict arbitration on completion state (local wins)
//! - **Guard**: suppression of self-triggered file events plus the
//!   process-wide pass-overlap flag
//!
//! # Invariants
//!
//! The engine is idempotent (a pass with no remote change never
//! rewrites the file), conservative (a line is never removed just
//! because the remote stopped reporting its identifier), and never
//! invents task content: the visible form of a task is a pure function
//! of remote state and display options.

mod detector;
mod engine;
mod guard;
mod policy;

pub use detector::ChangeDetector;
pub use engine::{ReconciliationEngine, SourceOutcome, SyncStats};
pub use guard::{try_begin_pass, PassToken, WriteGuard};
pub use policy::{ConflictPolicy, Resolution};
