#![warn(missing_docs)]

//! Snapkeep policy subsystem: compact textual grammars for retention and quota rules
//!
//! Policies arrive as strings from configuration or commandline overrides.
//! They are parsed once into tagged data structures and passed by value;
//! evaluation never re-parses.

pub mod error;
pub mod quota;
pub mod retention;
pub mod units;

pub use error::PolicyError;
pub use quota::QuotaPolicy;
pub use retention::{PolicyBucket, RetentionPolicy};
