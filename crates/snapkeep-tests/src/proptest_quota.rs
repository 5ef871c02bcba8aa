//! Property-based tests for quota allocation.

use proptest::prelude::*;

use snapkeep_plan::allocate;
use snapkeep_policy::QuotaPolicy;

use crate::generators::arb_prioritized_filesystems;

proptest! {
    /// Shares never over-commit the distributable space.
    #[test]
    fn shares_sum_within_pool(
        filesystems in arb_prioritized_filesystems(16),
        distribute in (1u64 << 30)..(1u64 << 50),
        cap in prop_oneof![Just(0u64), (1u64 << 28)..(1u64 << 45)],
    ) {
        let policy = QuotaPolicy::new(distribute, cap);
        let rows = allocate(&policy, &filesystems).unwrap();
        let total: u64 = rows.iter().map(|r| r.reserved_space).sum();
        prop_assert!(total <= distribute);
    }

    /// No share exceeds the cap when one is set.
    #[test]
    fn cap_is_respected(
        filesystems in arb_prioritized_filesystems(16),
        distribute in (1u64 << 30)..(1u64 << 50),
        cap in (1u64 << 28)..(1u64 << 45),
    ) {
        let policy = QuotaPolicy::new(distribute, cap);
        let rows = allocate(&policy, &filesystems).unwrap();
        for row in &rows {
            prop_assert!(row.reserved_space <= cap);
        }
    }

    /// Without caps, a strictly higher priority always gets a strictly
    /// larger share. Shares are truncating integer division, so strictness
    /// needs `distribute` to dominate the weight sum: the generator's
    /// 2^30 floor against at most 16 weights of 63 keeps every per-weight
    /// increment above one byte.
    #[test]
    fn priority_is_monotonic(
        filesystems in arb_prioritized_filesystems(16),
        distribute in (1u64 << 30)..(1u64 << 50),
    ) {
        let policy = QuotaPolicy::new(distribute, 0);
        let rows = allocate(&policy, &filesystems).unwrap();
        for a in &rows {
            for b in &rows {
                if a.priority > b.priority {
                    prop_assert!(
                        a.reserved_space > b.reserved_space,
                        "priority {} got {} but priority {} got {}",
                        a.priority, a.reserved_space, b.priority, b.reserved_space
                    );
                }
            }
        }
    }

    /// Allocation is deterministic.
    #[test]
    fn allocation_is_deterministic(
        filesystems in arb_prioritized_filesystems(16),
        distribute in (1u64 << 30)..(1u64 << 50),
        cap in prop_oneof![Just(0u64), (1u64 << 28)..(1u64 << 45)],
    ) {
        let policy = QuotaPolicy::new(distribute, cap);
        let first = allocate(&policy, &filesystems).unwrap();
        let second = allocate(&policy, &filesystems).unwrap();
        prop_assert_eq!(first, second);
    }
}
