//! Property-based tests for transfer planning, including the end-to-end
//! guarantee that plans only ever reference retained snapshots.

use std::collections::HashSet;

use proptest::prelude::*;

use snapkeep_plan::{plan, retained, PlanError, PlanMode};
use snapkeep_policy::RetentionPolicy;

use crate::generators::{arb_retention_policy, arb_timeline, AS_OF};

fn arb_mode() -> impl Strategy<Value = PlanMode> {
    prop_oneof![Just(PlanMode::Lineage), Just(PlanMode::LatestOnly)]
}

proptest! {
    /// Incremental chains are contiguous: every step's base is the
    /// previous step's head, and no retained snapshot in between is
    /// skipped in lineage mode.
    #[test]
    fn lineage_chain_is_contiguous(
        timeline in arb_timeline(60),
        start in 0usize..60,
    ) {
        prop_assume!(!timeline.is_empty());
        let start = start % timeline.len();
        let last = timeline[start].snapshot_name.clone();
        let result = plan("pool/data", "backup/data", &timeline, Some(&last), PlanMode::Lineage)
            .unwrap();

        prop_assert_eq!(result.steps.len(), timeline.len() - 1 - start);
        let mut expected_base = last;
        for (offset, step) in result.steps.iter().enumerate() {
            prop_assert_eq!(step.base_snapshot.as_ref().unwrap(), &expected_base);
            prop_assert_eq!(
                &step.head_snapshot,
                &timeline[start + offset + 1].snapshot_name
            );
            expected_base = step.head_snapshot.clone();
        }
    }

    /// A destination whose last-received snapshot is unknown to the source
    /// is reported as divergent, in both modes.
    #[test]
    fn unknown_last_received_diverges(
        timeline in arb_timeline(60),
        mode in arb_mode(),
    ) {
        let err = plan(
            "pool/data",
            "backup/data",
            &timeline,
            Some("not-in-lineage"),
            mode,
        )
        .unwrap_err();
        let is_divergent = matches!(err, PlanError::DivergentLineage { .. });
        prop_assert!(is_divergent);
    }

    /// Plans computed over the retention evaluator's keep view never
    /// reference a snapshot that was scheduled for deletion.
    #[test]
    fn plans_only_reference_retained_snapshots(
        timeline in arb_timeline(120),
        policy in arb_retention_policy(),
        mode in arb_mode(),
    ) {
        let policy: RetentionPolicy = policy.parse().unwrap();
        let kept = retained(&policy, &timeline, AS_OF).unwrap();
        let kept_names: HashSet<&str> =
            kept.iter().map(|ss| ss.snapshot_name.as_str()).collect();

        let result = plan("pool/data", "backup/data", &kept, None, mode).unwrap();
        for step in &result.steps {
            if let Some(base) = &step.base_snapshot {
                prop_assert!(kept_names.contains(base.as_str()));
            }
            prop_assert!(kept_names.contains(step.head_snapshot.as_str()));
        }

        // Same guarantee when chaining from an existing retained snapshot.
        if let Some(first) = kept.first() {
            let result = plan(
                "pool/data",
                "backup/data",
                &kept,
                Some(&first.snapshot_name),
                mode,
            )
            .unwrap();
            for step in &result.steps {
                if let Some(base) = &step.base_snapshot {
                    prop_assert!(kept_names.contains(base.as_str()));
                }
                prop_assert!(kept_names.contains(step.head_snapshot.as_str()));
            }
        }
    }

    /// Latest-only mode emits at most one step.
    #[test]
    fn latest_only_is_single_step(
        timeline in arb_timeline(60),
        start in 0usize..60,
    ) {
        prop_assume!(!timeline.is_empty());
        let start = start % timeline.len();
        let last = timeline[start].snapshot_name.clone();
        let result = plan(
            "pool/data",
            "backup/data",
            &timeline,
            Some(&last),
            PlanMode::LatestOnly,
        )
        .unwrap();
        prop_assert!(result.steps.len() <= 1);
        if let Some(step) = result.steps.first() {
            prop_assert_eq!(
                &step.head_snapshot,
                &timeline[timeline.len() - 1].snapshot_name
            );
        }
    }
}
