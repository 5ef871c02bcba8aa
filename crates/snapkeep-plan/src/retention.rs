//! Retention evaluation: applies a parsed policy to one filesystem's
//! snapshot timeline.
//!
//! The walk is purely age-based. Each policy fragment covers a half-open
//! age window measured backward from the reference instant; within a
//! window, snapshots are partitioned into equal-length buckets of the
//! fragment's frequency and the newest snapshot of every non-empty bucket
//! survives. Evaluation is deterministic: identical input always yields
//! identical verdicts.

use snapkeep_catalog::{RetentionVerdict, SnapshotRecord, Verdict};
use snapkeep_policy::RetentionPolicy;

use crate::error::PlanError;

/// Classifies every snapshot of one filesystem as keep or delete.
///
/// `snapshots` must all belong to one filesystem; any order is accepted.
/// `as_of` is the reference instant (seconds since epoch) ages are measured
/// against. Verdicts are returned in descending creation order.
pub fn evaluate(
    policy: &RetentionPolicy,
    snapshots: &[SnapshotRecord],
    as_of: u64,
) -> Result<Vec<RetentionVerdict>, PlanError> {
    let classified = classify(policy, snapshots, as_of)?;

    if let Some((first, _)) = classified.first() {
        let kept = classified.iter().filter(|(_, v)| v.is_keep()).count();
        tracing::debug!(
            filesystem = %first.filesystem_path,
            total = classified.len(),
            kept,
            deleted = classified.len() - kept,
            "retention verdicts computed"
        );
    }

    Ok(classified
        .into_iter()
        .map(|(ss, verdict)| RetentionVerdict {
            filesystem_path: ss.filesystem_path.clone(),
            snapshot_name: ss.snapshot_name.clone(),
            verdict,
        })
        .collect())
}

/// Runs the verdict walk, pairing each snapshot with its verdict in
/// descending creation order. Shared by [`evaluate`] and [`retained`] so
/// the keep view never has to re-resolve records by name.
fn classify<'a>(
    policy: &RetentionPolicy,
    snapshots: &'a [SnapshotRecord],
    as_of: u64,
) -> Result<Vec<(&'a SnapshotRecord, Verdict)>, PlanError> {
    if snapshots.is_empty() {
        return Ok(Vec::new());
    }
    let path = &snapshots[0].filesystem_path;
    if let Some(stray) = snapshots.iter().find(|ss| &ss.filesystem_path != path) {
        return Err(PlanError::invalid(format!(
            "snapshot '{}' belongs to '{}', expected '{}'",
            stray.snapshot_name, stray.filesystem_path, path
        )));
    }

    // Newest first; identical timestamps break toward the lexicographically
    // greatest name, which therefore wins every later "newest" selection.
    let mut sorted: Vec<&SnapshotRecord> = snapshots.iter().collect();
    sorted.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.snapshot_name.cmp(&a.snapshot_name))
    });

    let mut verdicts = vec![Verdict::Delete; sorted.len()];
    let mut idx = 0;

    // The newest ignored-count snapshots are exempt from all rules. They do
    // not count toward any fragment's floor.
    let ignored = (policy.ignored_count() as usize).min(sorted.len());
    for v in verdicts.iter_mut().take(ignored) {
        *v = Verdict::Keep;
    }
    idx += ignored;

    // Snapshots newer than the reference instant fall outside any window
    // and are never pruned.
    while idx < sorted.len() && sorted[idx].created_at > as_of {
        verdicts[idx] = Verdict::Keep;
        idx += 1;
    }

    let mut window_start: u64 = 0;
    for bucket in policy.buckets() {
        let window_end = window_start.saturating_add(bucket.window_secs);

        // Ages ascend along the sorted list, so the window's population is
        // a contiguous run.
        let run_start = idx;
        while idx < sorted.len() && sorted[idx].age_secs(as_of) < window_end {
            idx += 1;
        }

        // Floor: the newest keep_count snapshots in the window survive
        // outright and occupy no sampling slot.
        let floor_end = (run_start + bucket.keep_count as usize).min(idx);
        for v in verdicts.iter_mut().take(floor_end).skip(run_start) {
            *v = Verdict::Keep;
        }

        // Sampling: one survivor per frequency-sized slot, the newest.
        let mut last_slot: Option<u64> = None;
        for i in floor_end..idx {
            let slot = (sorted[i].age_secs(as_of) - window_start) / bucket.frequency_secs;
            if last_slot != Some(slot) {
                verdicts[i] = Verdict::Keep;
                last_slot = Some(slot);
            }
        }

        window_start = window_end;
    }
    // Anything older than the last window stays deleted.

    Ok(sorted.into_iter().zip(verdicts).collect())
}

/// Convenience view for the transfer planner: the snapshots surviving the
/// policy, ascending by creation time.
pub fn retained(
    policy: &RetentionPolicy,
    snapshots: &[SnapshotRecord],
    as_of: u64,
) -> Result<Vec<SnapshotRecord>, PlanError> {
    let mut kept: Vec<SnapshotRecord> = classify(policy, snapshots, as_of)?
        .into_iter()
        .filter(|(_, verdict)| verdict.is_keep())
        .map(|(ss, _)| ss.clone())
        .collect();
    kept.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.snapshot_name.cmp(&b.snapshot_name))
    });
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapkeep_policy::units::{DAY_SECS, HOUR_SECS};

    const AS_OF: u64 = 100_000_000;

    fn hourly_snapshots(count: usize) -> Vec<SnapshotRecord> {
        (0..count)
            .map(|i| SnapshotRecord {
                filesystem_path: "archive/projects/ember".into(),
                snapshot_name: format!("auto-{i:04}"),
                created_at: AS_OF - i as u64 * HOUR_SECS,
                size: 1,
            })
            .collect()
    }

    fn kept_count(policy: &str, snapshots: &[SnapshotRecord]) -> usize {
        let policy: RetentionPolicy = policy.parse().unwrap();
        evaluate(&policy, snapshots, AS_OF)
            .unwrap()
            .iter()
            .filter(|r| r.verdict.is_keep())
            .count()
    }

    #[test]
    fn test_hourly_for_twenty_days_keeps_38() {
        // A day of hourlies, then one per day for 14 days, rest deleted.
        let snapshots = hourly_snapshots(20 * 24);
        assert_eq!(kept_count("1h:1d,1d:14d", &snapshots), 24 + 14);
    }

    #[test]
    fn test_count_floor_exceeding_population_keeps_all() {
        let snapshots = hourly_snapshots(3);
        assert_eq!(kept_count("5:1h:1d", &snapshots), 3);
    }

    #[test]
    fn test_older_than_horizon_is_deleted() {
        let snapshots = vec![SnapshotRecord {
            filesystem_path: "a/b".into(),
            snapshot_name: "ancient".into(),
            created_at: AS_OF - 40 * DAY_SECS,
            size: 1,
        }];
        assert_eq!(kept_count("1h:1d,1d:14d", &snapshots), 0);
    }

    #[test]
    fn test_ignored_count_always_survives() {
        let snapshots = vec![SnapshotRecord {
            filesystem_path: "a/b".into(),
            snapshot_name: "ancient".into(),
            created_at: AS_OF - 40 * DAY_SECS,
            size: 1,
        }];
        assert_eq!(kept_count("1-1h:1d,1d:14d", &snapshots), 1);
    }

    #[test]
    fn test_ignored_count_without_rules_keeps_only_newest() {
        let snapshots = hourly_snapshots(10);
        assert_eq!(kept_count("3-", &snapshots), 3);
    }

    #[test]
    fn test_bucket_keeps_newest_per_slot() {
        // Two snapshots in the same daily slot: only the newer survives.
        let snapshots = vec![
            SnapshotRecord {
                filesystem_path: "a/b".into(),
                snapshot_name: "newer".into(),
                created_at: AS_OF - 25 * HOUR_SECS,
                size: 1,
            },
            SnapshotRecord {
                filesystem_path: "a/b".into(),
                snapshot_name: "older".into(),
                created_at: AS_OF - 30 * HOUR_SECS,
                size: 1,
            },
        ];
        let policy: RetentionPolicy = "1h:1d,1d:14d".parse().unwrap();
        let verdicts = evaluate(&policy, &snapshots, AS_OF).unwrap();
        assert_eq!(verdicts[0].snapshot_name, "newer");
        assert_eq!(verdicts[0].verdict, Verdict::Keep);
        assert_eq!(verdicts[1].verdict, Verdict::Delete);
    }

    #[test]
    fn test_identical_timestamps_keep_greatest_name() {
        let mk = |name: &str| SnapshotRecord {
            filesystem_path: "a/b".into(),
            snapshot_name: name.into(),
            created_at: AS_OF - HOUR_SECS,
            size: 1,
        };
        let policy: RetentionPolicy = "1d:1d".parse().unwrap();
        let verdicts = evaluate(&policy, &[mk("alpha"), mk("beta")], AS_OF).unwrap();
        assert_eq!(verdicts[0].snapshot_name, "beta");
        assert_eq!(verdicts[0].verdict, Verdict::Keep);
        assert_eq!(verdicts[1].snapshot_name, "alpha");
        assert_eq!(verdicts[1].verdict, Verdict::Delete);
    }

    #[test]
    fn test_future_snapshots_are_kept() {
        let mut snapshots = hourly_snapshots(5);
        snapshots.push(SnapshotRecord {
            filesystem_path: "archive/projects/ember".into(),
            snapshot_name: "from-the-future".into(),
            created_at: AS_OF + HOUR_SECS,
            size: 1,
        });
        let policy: RetentionPolicy = "1d:1d".parse().unwrap();
        let verdicts = evaluate(&policy, &snapshots, AS_OF).unwrap();
        let future = verdicts
            .iter()
            .find(|r| r.snapshot_name == "from-the-future")
            .unwrap();
        assert_eq!(future.verdict, Verdict::Keep);
    }

    #[test]
    fn test_mixed_filesystems_rejected() {
        let mut snapshots = hourly_snapshots(2);
        snapshots[1].filesystem_path = "other/fs".into();
        let policy: RetentionPolicy = "1h:1d".parse().unwrap();
        let err = evaluate(&policy, &snapshots, AS_OF).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput { .. }));
    }

    #[test]
    fn test_idempotent_at_fixed_instant() {
        let snapshots = hourly_snapshots(100);
        let policy: RetentionPolicy = "2-5:1h:1d,1d:14d".parse().unwrap();
        let first = evaluate(&policy, &snapshots, AS_OF).unwrap();
        let second = evaluate(&policy, &snapshots, AS_OF).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_retained_is_ascending_keep_view() {
        let snapshots = hourly_snapshots(48);
        let policy: RetentionPolicy = "1h:1d,1d:14d".parse().unwrap();
        let kept = retained(&policy, &snapshots, AS_OF).unwrap();
        assert_eq!(kept.len(), 24 + 1);
        assert!(kept.windows(2).all(|w| w[0].created_at < w[1].created_at));
    }

    #[test]
    fn test_retained_resolves_same_named_snapshots_by_timestamp() {
        // Two snapshots share a name; only the in-window one survives and
        // the keep view must carry that one's timestamp, not the first
        // name match in input order.
        let mk = |created_at: u64| SnapshotRecord {
            filesystem_path: "a/b".into(),
            snapshot_name: "dup".into(),
            created_at,
            size: 1,
        };
        let snapshots = vec![mk(AS_OF - 30 * HOUR_SECS), mk(AS_OF - 10)];
        let policy: RetentionPolicy = "1d:1d".parse().unwrap();
        let kept = retained(&policy, &snapshots, AS_OF).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].created_at, AS_OF - 10);
    }
}
