//! Clone detection: groups filesystems across hosts into equivalence
//! classes keyed by their leaf name, the fleet's clone identity.
//!
//! Represented as an index (name → members) rather than back-pointers, so
//! the many-filesystems-per-class fan-out stays acyclic. Classes are built
//! fresh per report invocation and never persisted.

use std::collections::BTreeMap;

use snapkeep_catalog::{ClassMember, EquivalenceClass, FilesystemRecord, SnapshotRecord};

/// Groups filesystems by leaf name.
///
/// Classes are ordered by member count descending (most-duplicated names
/// first), then by leaf name; members within a class by path, then host.
/// Empty input produces an empty tree.
pub fn group(filesystems: &[FilesystemRecord]) -> Vec<EquivalenceClass> {
    let mut index: BTreeMap<&str, Vec<ClassMember>> = BTreeMap::new();
    for fs in filesystems {
        index.entry(&fs.leaf_name).or_default().push(ClassMember {
            host: fs.host.clone(),
            filesystem_path: fs.filesystem_path.clone(),
        });
    }

    let mut classes: Vec<EquivalenceClass> = index
        .into_iter()
        .map(|(leaf_name, mut members)| {
            members.sort_by(|a, b| {
                a.filesystem_path
                    .cmp(&b.filesystem_path)
                    .then_with(|| a.host.cmp(&b.host))
            });
            EquivalenceClass {
                leaf_name: leaf_name.to_string(),
                members,
            }
        })
        .collect();
    classes.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then_with(|| a.leaf_name.cmp(&b.leaf_name))
    });
    tracing::debug!(classes = classes.len(), "equivalence classes built");
    classes
}

/// Scores how much of a master filesystem's snapshot timeline a shadow
/// copy covers.
///
/// Returns the equivalence as a value from 0.0 (nothing shared) to 1.0
/// (shadow holds the master's latest snapshot), together with the name of
/// the latest common snapshot. The fraction is the share of the master's
/// timeline up to that snapshot. Both lists are expected ascending by
/// creation time, the catalog's native order.
pub fn equivalence(
    master_snapshots: &[SnapshotRecord],
    shadow_snapshots: &[SnapshotRecord],
) -> (f64, Option<String>) {
    let common_idx = shadow_snapshots.iter().rev().find_map(|shadow| {
        master_snapshots
            .iter()
            .position(|m| m.snapshot_name == shadow.snapshot_name)
    });
    let Some(idx) = common_idx else {
        // The basename-is-identity convention is not upheld everywhere;
        // same-named filesystems can be entirely unrelated.
        return (0.0, None);
    };

    let common = master_snapshots[idx].snapshot_name.clone();
    if idx == master_snapshots.len() - 1 {
        return (1.0, Some(common));
    }
    let first = master_snapshots[0].created_at;
    let last = master_snapshots[master_snapshots.len() - 1].created_at;
    let total = last.saturating_sub(first);
    if total == 0 {
        return (1.0, Some(common));
    }
    let covered = master_snapshots[idx].created_at.saturating_sub(first);
    (covered as f64 / total as f64, Some(common))
}
