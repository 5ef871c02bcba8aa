//! Shared proptest strategies for fleet metadata.

use proptest::prelude::*;
use snapkeep_catalog::{FilesystemRecord, SnapshotRecord};

/// Reference instant all generated timelines are measured against.
pub const AS_OF: u64 = 1_700_000_000;

/// Generates a snapshot timeline for one filesystem: distinct creation
/// times in the past, ascending order, stable names.
pub fn arb_timeline(max_len: usize) -> impl Strategy<Value = Vec<SnapshotRecord>> {
    prop::collection::btree_set(1u64..5_000_000, 0..max_len).prop_map(|ages| {
        ages.into_iter()
            .rev()
            .enumerate()
            .map(|(i, age)| SnapshotRecord {
                filesystem_path: "pool/data".into(),
                snapshot_name: format!("auto-{i:05}"),
                created_at: AS_OF - age,
                size: 1,
            })
            .collect()
    })
}

/// Generates a retention policy string from a small grammar-valid pool.
pub fn arb_retention_policy() -> impl Strategy<Value = String> {
    let fragments = prop_oneof![
        Just("1h:1d".to_string()),
        Just("5:1h:1d".to_string()),
        Just("10s:1h".to_string()),
        Just("1d:14d".to_string()),
        Just("1d:1m".to_string()),
        Just("14d:1y".to_string()),
        Just("1h:1d,1d:14d".to_string()),
        Just("2:1h:1d,1d:14d,14d:1m".to_string()),
    ];
    (0u32..4, fragments).prop_map(|(ignored, fragment)| {
        if ignored > 0 {
            format!("{ignored}-{fragment}")
        } else {
            fragment
        }
    })
}

/// Generates prioritized filesystem records under one pool.
pub fn arb_prioritized_filesystems(max_len: usize) -> impl Strategy<Value = Vec<FilesystemRecord>> {
    prop::collection::vec((1i64..64, 0u64..(1 << 30)), 1..max_len).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (priority, used))| FilesystemRecord {
                host: "h1".into(),
                filesystem_path: format!("pool/fs{i:03}"),
                leaf_name: format!("fs{i:03}"),
                parent_path: Some("pool".into()),
                priority: Some(priority),
                used,
                available: Some(1 << 40),
            })
            .collect()
    })
}
