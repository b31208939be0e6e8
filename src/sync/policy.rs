//! Conflict arbitration policy.
//!
//! Neither side carries a trustworthy edit timestamp, so completion
//! conflicts are arbitrated by a fixed policy instead of "last writer".
//! The policy is a value, not hard-coded control flow, so alternate
//! strategies can be tested against the same fixtures. Only completion
//! state is ever arbitrated.

/// How a completion conflict between document and remote is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Push the document's value to the remote. A heuristic resting on
    /// a recency-of-edit assumption, not a guaranteed ordering.
    #[default]
    LocalWins,
    /// Accept the remote value; the rewrite phase applies it.
    RemoteWins,
}

/// Outcome of arbitrating one conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Update the remote task to this completion value.
    PushLocal(bool),
    /// Leave the remote untouched and let the rewrite adopt it.
    AcceptRemote,
}

impl ConflictPolicy {
    /// Arbitrate a conflict where the document shows `local_completed`
    /// and the remote disagrees.
    #[must_use]
    pub const fn resolve(self, local_completed: bool) -> Resolution {
        match self {
            Self::LocalWins => Resolution::PushLocal(local_completed),
            Self::RemoteWins => Resolution::AcceptRemote,
        }
    }
}
