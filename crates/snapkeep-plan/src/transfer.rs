//! Transfer planning: minimal incremental send plans between a source
//! filesystem and a destination copy.
//!
//! Input is the source's retained snapshot view — snapshots already
//! scheduled for deletion are never planned — plus the destination's
//! last-received snapshot identity. The planner only decides; executing
//! sends and persisting destination state are external concerns. Callers
//! must serialize planners targeting the same destination record, since a
//! plan assumes the base snapshot it read.

use serde::{Deserialize, Serialize};

use snapkeep_catalog::{
    EquivalenceClass, FilesystemRecord, SendStep, SnapshotRecord, StepKind, TransferPlan,
};

use crate::error::PlanError;

/// How intervening snapshots are treated when chaining incrementals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Replay the source's retained lineage: one incremental per retained
    /// snapshot, never skipping an intermediate one. Destinations end up
    /// holding the same history that was retained, not just the endpoints.
    Lineage,
    /// Jump straight from the last-received snapshot to the current head in
    /// a single incremental.
    LatestOnly,
}

/// Computes the send plan for one (source, destination) pair.
///
/// `retained` is the source's keep-verdict snapshot list in any order;
/// `last_received` is the destination's last-received snapshot name, or
/// `None` when the destination filesystem does not exist yet. A fresh
/// destination gets a single full send seeding it — the oldest retained
/// snapshot in [`PlanMode::Lineage`], the newest in
/// [`PlanMode::LatestOnly`]; follow-up incrementals are planned on the next
/// round. An up-to-date destination yields an empty step list.
pub fn plan(
    source_path: &str,
    destination_path: &str,
    retained: &[SnapshotRecord],
    last_received: Option<&str>,
    mode: PlanMode,
) -> Result<TransferPlan, PlanError> {
    if let Some(stray) = retained
        .iter()
        .find(|ss| ss.filesystem_path != source_path)
    {
        return Err(PlanError::invalid(format!(
            "snapshot '{}' belongs to '{}', expected source '{}'",
            stray.snapshot_name, stray.filesystem_path, source_path
        )));
    }

    let mut lineage: Vec<&SnapshotRecord> = retained.iter().collect();
    lineage.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.snapshot_name.cmp(&b.snapshot_name))
    });

    let steps = match last_received {
        None => match mode {
            _ if lineage.is_empty() => Vec::new(),
            PlanMode::Lineage => vec![full_step(lineage[0])],
            PlanMode::LatestOnly => vec![full_step(lineage[lineage.len() - 1])],
        },
        Some(last) => {
            let pos = lineage
                .iter()
                .position(|ss| ss.snapshot_name == last)
                .ok_or_else(|| PlanError::DivergentLineage {
                    destination: destination_path.to_string(),
                    last_received: last.to_string(),
                })?;
            match mode {
                PlanMode::Lineage => lineage[pos..]
                    .windows(2)
                    .map(|pair| incremental_step(pair[0], pair[1]))
                    .collect(),
                PlanMode::LatestOnly => {
                    let head = lineage[lineage.len() - 1];
                    if pos == lineage.len() - 1 {
                        Vec::new()
                    } else {
                        vec![incremental_step(lineage[pos], head)]
                    }
                }
            }
        }
    };

    tracing::info!(
        source = source_path,
        destination = destination_path,
        steps = steps.len(),
        "transfer plan computed"
    );
    Ok(TransferPlan {
        source_path: source_path.to_string(),
        destination_path: destination_path.to_string(),
        steps,
    })
}

fn full_step(head: &SnapshotRecord) -> SendStep {
    SendStep {
        kind: StepKind::Full,
        base_snapshot: None,
        head_snapshot: head.snapshot_name.clone(),
    }
}

fn incremental_step(base: &SnapshotRecord, head: &SnapshotRecord) -> SendStep {
    SendStep {
        kind: StepKind::Incremental,
        base_snapshot: Some(base.snapshot_name.clone()),
        head_snapshot: head.snapshot_name.clone(),
    }
}

/// A proposed destination for a source filesystem. Advisory output of the
/// configured/list modes; never a hard constraint on plan correctness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDestination {
    /// Host keeping (or able to keep) the destination.
    pub host: String,
    /// Destination filesystem path, existing or to be created.
    pub filesystem_path: String,
    /// True if the filesystem already exists.
    pub exists: bool,
    /// Available space at the destination, bytes.
    pub available: u64,
}

/// Ranks candidate destinations for a source filesystem.
///
/// Existing same-name clones come first, ordered by available space
/// descending; then pool filesystems on other hosts with room for the
/// source's data, as to-be-created destinations.
pub fn rank_candidates(
    source: &FilesystemRecord,
    classes: &[EquivalenceClass],
    filesystems: &[FilesystemRecord],
) -> Vec<CandidateDestination> {
    let lookup = |host: &str, path: &str| {
        filesystems
            .iter()
            .find(|fs| fs.host == host && fs.filesystem_path == path)
    };

    let mut existing: Vec<CandidateDestination> = classes
        .iter()
        .find(|class| class.leaf_name == source.leaf_name)
        .map(|class| class.members.as_slice())
        .unwrap_or(&[])
        .iter()
        .filter(|m| !(m.host == source.host && m.filesystem_path == source.filesystem_path))
        .map(|m| CandidateDestination {
            host: m.host.clone(),
            filesystem_path: m.filesystem_path.clone(),
            exists: true,
            available: lookup(&m.host, &m.filesystem_path)
                .and_then(|fs| fs.available)
                .unwrap_or(0),
        })
        .collect();
    existing.sort_by(|a, b| {
        b.available
            .cmp(&a.available)
            .then_with(|| a.filesystem_path.cmp(&b.filesystem_path))
    });

    // Pools already carrying a candidate (or the source) are off the table;
    // no point in a second copy on the same pool.
    let mut pools_taken: Vec<(String, String)> = existing
        .iter()
        .map(|c| (c.host.clone(), pool_of(&c.filesystem_path).to_string()))
        .collect();
    pools_taken.push((
        source.host.clone(),
        pool_of(&source.filesystem_path).to_string(),
    ));

    let mut fresh: Vec<CandidateDestination> = filesystems
        .iter()
        .filter(|fs| {
            fs.is_pool_filesystem()
                && fs.host != source.host
                && fs.available.unwrap_or(0) > source.used
                && !pools_taken
                    .iter()
                    .any(|(h, p)| h == &fs.host && p == &fs.filesystem_path)
        })
        .map(|fs| CandidateDestination {
            host: fs.host.clone(),
            filesystem_path: format!("{}/{}", fs.filesystem_path, source.leaf_name),
            exists: false,
            available: fs.available.unwrap_or(0),
        })
        .collect();
    fresh.sort_by(|a, b| {
        b.available
            .cmp(&a.available)
            .then_with(|| a.filesystem_path.cmp(&b.filesystem_path))
    });

    existing.extend(fresh);
    existing
}

fn pool_of(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}
