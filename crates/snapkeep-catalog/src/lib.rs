#![warn(missing_docs)]

//! Snapkeep catalog subsystem: fleet metadata model — hosts, filesystems, snapshots, dataset URLs

pub mod catalog;
pub mod error;
pub mod types;
pub mod url;

pub use catalog::HostCatalog;
pub use error::CatalogError;
pub use types::{
    ClassMember, EquivalenceClass, FilesystemRecord, Reservation, RetentionVerdict, SendStep,
    SnapshotRecord, StepKind, TransferPlan, Verdict,
};
pub use url::DatasetUrl;
