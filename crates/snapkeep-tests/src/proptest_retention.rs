//! Property-based tests for retention evaluation.

use proptest::prelude::*;

use snapkeep_plan::{evaluate, retained};
use snapkeep_policy::RetentionPolicy;

use crate::generators::{arb_retention_policy, arb_timeline, AS_OF};

proptest! {
    /// Every snapshot gets exactly one verdict.
    #[test]
    fn verdict_per_snapshot(
        timeline in arb_timeline(120),
        policy in arb_retention_policy(),
    ) {
        let policy: RetentionPolicy = policy.parse().unwrap();
        let verdicts = evaluate(&policy, &timeline, AS_OF).unwrap();
        prop_assert_eq!(verdicts.len(), timeline.len());
    }

    /// With an ignored-count of at least one, a non-empty timeline always
    /// retains something.
    #[test]
    fn ignored_count_guarantees_survivor(
        timeline in arb_timeline(120),
        policy in arb_retention_policy(),
    ) {
        prop_assume!(!timeline.is_empty());
        let mut policy: RetentionPolicy = policy.parse().unwrap();
        if policy.ignored_count() == 0 {
            policy = format!("1-{policy}").parse().unwrap();
        }
        let kept = retained(&policy, &timeline, AS_OF).unwrap();
        prop_assert!(!kept.is_empty());
    }

    /// Re-evaluating at the same reference instant yields identical
    /// verdicts, regardless of input order.
    #[test]
    fn idempotent_and_order_independent(
        timeline in arb_timeline(120),
        policy in arb_retention_policy(),
    ) {
        let policy: RetentionPolicy = policy.parse().unwrap();
        let first = evaluate(&policy, &timeline, AS_OF).unwrap();
        let second = evaluate(&policy, &timeline, AS_OF).unwrap();
        prop_assert_eq!(&first, &second);

        let mut shuffled = timeline.clone();
        shuffled.reverse();
        let third = evaluate(&policy, &shuffled, AS_OF).unwrap();
        prop_assert_eq!(&first, &third);
    }

    /// Nothing older than the policy horizon survives without an
    /// ignored-count exemption.
    #[test]
    fn horizon_is_hard(
        timeline in arb_timeline(120),
        policy in arb_retention_policy(),
    ) {
        let policy: RetentionPolicy = policy.parse().unwrap();
        prop_assume!(policy.ignored_count() == 0);
        let kept = retained(&policy, &timeline, AS_OF).unwrap();
        for ss in &kept {
            prop_assert!(ss.age_secs(AS_OF) < policy.horizon_secs());
        }
    }

    /// The keep count never exceeds the policy's stated capacity.
    #[test]
    fn capacity_bounds_keeps(
        timeline in arb_timeline(200),
        policy in arb_retention_policy(),
    ) {
        let policy: RetentionPolicy = policy.parse().unwrap();
        let kept = retained(&policy, &timeline, AS_OF).unwrap();
        prop_assert!(kept.len() as u64 <= policy.capacity());
    }
}
