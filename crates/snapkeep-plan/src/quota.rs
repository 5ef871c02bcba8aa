//! Quota allocation: divides a pool's distributable space among sibling
//! filesystems in proportion to their priority.
//!
//! A filesystem of priority 2 is twice as important as one of priority 1.
//! When a per-filesystem cap is set, capped filesystems leave the pool and
//! their freed share is redistributed proportionally among the remaining
//! ones, iterated until no share exceeds the cap or nothing is left
//! uncapped.

use snapkeep_catalog::{FilesystemRecord, Reservation};
use snapkeep_policy::QuotaPolicy;

use crate::error::PlanError;

/// Computes per-filesystem space reservations.
///
/// Only records carrying a priority attribute take part. Fails with
/// [`PlanError::NoPriorityFilesystems`] when the candidate set is empty and
/// [`PlanError::InvalidInput`] on non-positive priorities. The resulting
/// shares sum to at most the policy's distributable space, with equality
/// unless every filesystem got capped below its proportional share.
///
/// Shares are whole byte counts and division truncates, so two different
/// priorities only get strictly different shares when the distributable
/// space is large relative to the weight sum. A degenerate pool smaller
/// than the weight sum quantizes every share to zero. Real pools are
/// terabytes against two-digit weight sums, where truncation loses at most
/// one byte per filesystem.
pub fn allocate(
    policy: &QuotaPolicy,
    filesystems: &[FilesystemRecord],
) -> Result<Vec<Reservation>, PlanError> {
    let candidates: Vec<&FilesystemRecord> = filesystems
        .iter()
        .filter(|fs| fs.priority.is_some())
        .collect();
    if candidates.is_empty() {
        return Err(PlanError::NoPriorityFilesystems);
    }
    let mut priorities = Vec::with_capacity(candidates.len());
    for fs in &candidates {
        let priority = fs.priority.unwrap_or_default();
        if priority <= 0 {
            return Err(PlanError::invalid(format!(
                "filesystem '{}' has non-positive priority {priority}",
                fs.filesystem_path
            )));
        }
        priorities.push(priority);
    }
    let weights: Vec<u64> = priorities.iter().map(|p| policy.weight_for(*p)).collect();

    let distribute = policy.distribute_space();
    let cap = policy.max_cap();
    let n = candidates.len();
    let mut reserved = vec![0u64; n];
    let mut capped = vec![false; n];
    let mut capped_total: u64 = 0;

    loop {
        let pool_space = distribute - capped_total;
        let sum_weights: u128 = weights
            .iter()
            .zip(&capped)
            .filter(|(_, is_capped)| !**is_capped)
            .map(|(w, _)| *w as u128)
            .sum();
        if sum_weights == 0 {
            break;
        }

        let mut clamped_any = false;
        for i in 0..n {
            if capped[i] {
                continue;
            }
            let share = ((pool_space as u128 * weights[i] as u128) / sum_weights) as u64;
            if cap > 0 && share > cap {
                reserved[i] = cap;
                capped[i] = true;
                capped_total += cap;
                clamped_any = true;
            } else {
                reserved[i] = share;
            }
        }
        if !clamped_any {
            break;
        }
        // Clamping freed space for the remaining pool members; re-derive
        // their shares (and possibly clamp again) until a fixpoint.
    }

    let rows: Vec<Reservation> = candidates
        .iter()
        .zip(priorities)
        .zip(reserved)
        .map(|((fs, priority), reserved_space)| {
            let remaining = (reserved_space as i128 - fs.used as i128)
                .clamp(i64::MIN as i128, i64::MAX as i128) as i64;
            let fill_percent = if reserved_space == 0 {
                100.0
            } else {
                fs.used as f64 / reserved_space as f64 * 100.0
            };
            let underprovisioned = fs.used > reserved_space;
            if underprovisioned {
                tracing::warn!(
                    filesystem = %fs.filesystem_path,
                    used = fs.used,
                    reserved = reserved_space,
                    "reservation below used space, consider raising the priority"
                );
            }
            Reservation {
                filesystem_path: fs.filesystem_path.clone(),
                priority,
                used: fs.used,
                reserved_space,
                remaining,
                fill_percent,
                underprovisioned,
            }
        })
        .collect();

    let allocated: u64 = rows.iter().map(|r| r.reserved_space).sum();
    tracing::debug!(
        filesystems = rows.len(),
        distribute,
        cap,
        allocated,
        "quota allocation computed"
    );
    Ok(rows)
}
