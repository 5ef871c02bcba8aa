//! Input and output record shapes exchanged with the surrounding system.
//!
//! These are the data contracts of the decision core (metadata catalog rows
//! in, verdicts/reservations/plans out). Rendering them into scripts, SQL
//! rows, CSV or Graphite points is an external concern, so everything here
//! is a plain serde-derived struct with no format assumptions.

use serde::{Deserialize, Serialize};

/// A dataset path on one host of the fleet, as mined from the metadata catalog.
///
/// Snapshot-only rows carry `available: None`; a filesystem always reports
/// its available space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemRecord {
    /// Host keeping the dataset, like `storage03.domain.intern`.
    pub host: String,
    /// Full dataset path, like `archive/projects/ember`.
    pub filesystem_path: String,
    /// Last path segment, the clone identity of the filesystem.
    pub leaf_name: String,
    /// Parent filesystem path, `None` for pool filesystems.
    pub parent_path: Option<String>,
    /// Priority weight for quota allocation; unset filesystems take no part
    /// in allocation. Must be positive when present.
    pub priority: Option<i64>,
    /// Space used, in bytes.
    pub used: u64,
    /// Space available, in bytes.
    pub available: Option<u64>,
}

impl FilesystemRecord {
    /// Number of path segments, 1 for a pool filesystem.
    pub fn depth(&self) -> usize {
        self.filesystem_path.split('/').count()
    }

    /// True if this record is a pool filesystem (no parent).
    pub fn is_pool_filesystem(&self) -> bool {
        self.depth() == 1
    }
}

/// One snapshot row belonging to exactly one filesystem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Path of the owning filesystem.
    pub filesystem_path: String,
    /// Bare snapshot name, like `hourly-2026-08-23T14`.
    pub snapshot_name: String,
    /// Creation instant, seconds since the epoch. Unique per filesystem.
    pub created_at: u64,
    /// Snapshot size in bytes.
    pub size: u64,
}

impl SnapshotRecord {
    /// Age of the snapshot relative to `as_of`, clamped to zero for
    /// snapshots newer than the reference instant.
    pub fn age_secs(&self, as_of: u64) -> u64 {
        as_of.saturating_sub(self.created_at)
    }
}

/// Retention decision for a single snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The snapshot survives the policy.
    Keep,
    /// The snapshot is scheduled for deletion.
    Delete,
}

impl Verdict {
    /// True for [`Verdict::Keep`].
    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep)
    }
}

/// Output row of the retention evaluator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionVerdict {
    /// Path of the owning filesystem.
    pub filesystem_path: String,
    /// Name of the judged snapshot.
    pub snapshot_name: String,
    /// Keep or delete.
    pub verdict: Verdict,
}

/// Output row of the quota allocator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Path of the filesystem the reservation applies to.
    pub filesystem_path: String,
    /// Priority the share was computed from.
    pub priority: i64,
    /// Space currently used, carried over from the input record.
    pub used: u64,
    /// Space reserved for the filesystem, in bytes.
    pub reserved_space: u64,
    /// `reserved_space - used`; negative when the filesystem already
    /// outgrew its reservation.
    pub remaining: i64,
    /// `used / reserved_space` as a percentage.
    pub fill_percent: f64,
    /// True when the reservation is already below the used space. Operators
    /// should consider raising the filesystem's priority.
    pub underprovisioned: bool,
}

/// One member of an equivalence class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMember {
    /// Host keeping the member filesystem.
    pub host: String,
    /// Full path of the member filesystem.
    pub filesystem_path: String,
}

/// Filesystems sharing one leaf name, presumed clones of each other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceClass {
    /// The shared leaf name keying the class.
    pub leaf_name: String,
    /// Members, ordered by path then host.
    pub members: Vec<ClassMember>,
}

impl EquivalenceClass {
    /// Number of filesystems in the class.
    pub fn copies(&self) -> usize {
        self.members.len()
    }
}

/// Kind of a send step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Full send seeding a fresh destination.
    Full,
    /// Incremental send between two known snapshots.
    Incremental,
}

/// One step of a transfer plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendStep {
    /// Full or incremental.
    pub kind: StepKind,
    /// Base snapshot name; `None` for full sends.
    pub base_snapshot: Option<String>,
    /// Head snapshot name the step transfers up to.
    pub head_snapshot: String,
}

/// Ordered send plan for one (source, destination) pair. Never mutated
/// after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPlan {
    /// Source filesystem path.
    pub source_path: String,
    /// Destination filesystem path.
    pub destination_path: String,
    /// Steps in send order; empty when the destination is up to date.
    pub steps: Vec<SendStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_and_pool_detection() {
        let fs = FilesystemRecord {
            host: "h1".into(),
            filesystem_path: "archive".into(),
            leaf_name: "archive".into(),
            parent_path: None,
            priority: None,
            used: 0,
            available: Some(100),
        };
        assert_eq!(fs.depth(), 1);
        assert!(fs.is_pool_filesystem());
    }

    #[test]
    fn test_snapshot_age_clamps_to_zero() {
        let ss = SnapshotRecord {
            filesystem_path: "archive/a".into(),
            snapshot_name: "s".into(),
            created_at: 1000,
            size: 1,
        };
        assert_eq!(ss.age_secs(1500), 500);
        assert_eq!(ss.age_secs(500), 0);
    }

    #[test]
    fn test_verdict_serializes_lowercase() {
        let row = RetentionVerdict {
            filesystem_path: "archive/a".into(),
            snapshot_name: "s1".into(),
            verdict: Verdict::Delete,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"verdict\":\"delete\""));
    }

    #[test]
    fn test_send_step_roundtrips_base_null() {
        let step = SendStep {
            kind: StepKind::Full,
            base_snapshot: None,
            head_snapshot: "s1".into(),
        };
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"base_snapshot\":null"));
        let back: SendStep = serde_json::from_str(&json).unwrap();
        assert_eq!(back, step);
    }
}
