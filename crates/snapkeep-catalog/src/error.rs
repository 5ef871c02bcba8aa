//! Error types for the catalog subsystem.

use thiserror::Error;

/// Errors raised while ingesting or resolving fleet metadata.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A record is structurally inconsistent with the rest of the catalog.
    #[error("invalid input: {msg}")]
    InvalidInput {
        /// Description of the inconsistency.
        msg: String,
    },

    /// A dataset URL string does not follow `zfs://host/pool[/fs[@snapshot]]`.
    #[error("malformed dataset url '{url}': {reason}")]
    MalformedUrl {
        /// The URL string that failed to parse.
        url: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl CatalogError {
    /// Shorthand for an [`CatalogError::InvalidInput`] with a formatted message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        CatalogError::InvalidInput { msg: msg.into() }
    }
}
