//! Error types for the planning subsystem.

use thiserror::Error;

/// Errors raised by the decision components.
///
/// All of these are local, synchronous failures with no partial side
/// effects: a failed call changes nothing and returns no plan fragment.
/// Presenting them to operators and deciding on retries is the caller's
/// responsibility.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// The quota candidate set was empty. Callers treat this as a no-op.
    #[error("no filesystems with a priority attribute in the allocation pool")]
    NoPriorityFilesystems,

    /// The destination's recorded state is inconsistent with the source's
    /// retained history — it was rolled back or re-seeded out of band.
    /// Recovery requires an explicit, operator-triggered full resend; this
    /// is never silently resolved.
    #[error(
        "destination '{destination}' diverged: last-received snapshot \
         '{last_received}' is not in the source's retained history"
    )]
    DivergentLineage {
        /// The destination filesystem path.
        destination: String,
        /// The snapshot the destination last received.
        last_received: String,
    },

    /// A record set is structurally inconsistent.
    #[error("invalid input: {msg}")]
    InvalidInput {
        /// Description of the inconsistency.
        msg: String,
    },
}

impl PlanError {
    /// Shorthand for a [`PlanError::InvalidInput`] with a formatted message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        PlanError::InvalidInput { msg: msg.into() }
    }
}
