//! Error types for policy parsing.

use thiserror::Error;

/// Errors raised while parsing a policy string.
///
/// Always a caller configuration error; surfaced immediately, never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The policy grammar was violated.
    #[error("malformed policy: {reason} (in fragment '{fragment}')")]
    MalformedPolicy {
        /// The offending fragment of the policy string.
        fragment: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl PolicyError {
    /// Shorthand for a [`PolicyError::MalformedPolicy`].
    pub fn malformed(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        PolicyError::MalformedPolicy {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }
}
