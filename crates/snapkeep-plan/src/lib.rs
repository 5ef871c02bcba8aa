#![warn(missing_docs)]

//! Snapkeep planning subsystem: the decision core over fleet snapshot metadata
//!
//! Four pure components: retention keep/delete classification, fair quota
//! allocation, clone/duplicate grouping, and incremental transfer planning.
//! All of them are synchronous functions over owned in-memory data — no
//! I/O, no shared state, no retries. Callers may run them concurrently per
//! filesystem or host; only two planners targeting the same destination
//! record need external serialization.

pub mod duplication;
pub mod error;
pub mod quota;
pub mod retention;
pub mod transfer;

pub use duplication::{equivalence, group};
pub use error::PlanError;
pub use quota::allocate;
pub use retention::{evaluate, retained};
pub use transfer::{plan, rank_candidates, CandidateDestination, PlanMode};
