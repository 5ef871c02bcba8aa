//! Snapkeep test crate: property-based tests and end-to-end scenarios
//! spanning the catalog, policy and plan crates.

pub mod generators;
pub mod proptest_quota;
pub mod proptest_retention;
pub mod proptest_transfer;
pub mod scenarios;
