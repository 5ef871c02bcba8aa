//! End-to-end scenarios: catalog ingestion feeding the decision
//! components, mirroring how the surrounding reporting system drives the
//! core.

use snapkeep_catalog::{FilesystemRecord, HostCatalog, SnapshotRecord};

/// Builds a catalog for one host with `fs_paths` filesystems.
pub fn catalog_with(host: &str, fs_paths: &[(&str, Option<i64>)]) -> HostCatalog {
    let mut cat = HostCatalog::new(host);
    for (path, priority) in fs_paths {
        cat.ingest_filesystem(FilesystemRecord {
            host: host.into(),
            filesystem_path: (*path).into(),
            leaf_name: path.rsplit('/').next().unwrap().into(),
            parent_path: path.rsplit_once('/').map(|(p, _)| p.to_string()),
            priority: *priority,
            used: 1 << 30,
            available: Some(1 << 40),
        })
        .unwrap();
    }
    cat
}

/// Ingests an hourly snapshot series for `path`, newest at `as_of`.
pub fn ingest_hourly(cat: &mut HostCatalog, path: &str, count: usize, as_of: u64) {
    for i in 0..count {
        cat.ingest_snapshot(SnapshotRecord {
            filesystem_path: path.into(),
            snapshot_name: format!("auto-{i:04}"),
            created_at: as_of - i as u64 * 3600,
            size: 1 << 20,
        })
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapkeep_catalog::{StepKind, Verdict};
    use snapkeep_plan::{allocate, evaluate, group, plan, rank_candidates, retained, PlanMode};
    use snapkeep_policy::{QuotaPolicy, RetentionPolicy};

    const AS_OF: u64 = 1_700_000_000;

    #[test]
    fn test_retention_report_over_catalog() {
        let mut cat = catalog_with("store01", &[("tank", None), ("tank/projects", None)]);
        ingest_hourly(&mut cat, "tank/projects", 20 * 24, AS_OF);

        let policy: RetentionPolicy = "1h:1d,1d:14d".parse().unwrap();
        let verdicts = evaluate(&policy, &cat.snapshots_desc("tank/projects"), AS_OF).unwrap();

        let kept = verdicts.iter().filter(|r| r.verdict == Verdict::Keep).count();
        assert_eq!(kept, 38);
        assert_eq!(verdicts.len(), 480);
    }

    #[test]
    fn test_quota_report_over_catalog() {
        let cat = catalog_with(
            "store01",
            &[("tank", None), ("tank/a", Some(1)), ("tank/b", Some(2))],
        );
        let policy: QuotaPolicy = "distribute=12t,cap=0".parse().unwrap();
        let rows = allocate(&policy, &cat.prioritized_filesystems()).unwrap();
        assert_eq!(rows[0].reserved_space, 4 << 40);
        assert_eq!(rows[1].reserved_space, 8 << 40);
    }

    #[test]
    fn test_replication_round_trip() {
        let mut cat = catalog_with("store01", &[("tank", None), ("tank/projects", None)]);
        ingest_hourly(&mut cat, "tank/projects", 48, AS_OF);

        let policy: RetentionPolicy = "1h:1d,1d:14d".parse().unwrap();
        let kept = retained(&policy, &cat.snapshots_desc("tank/projects"), AS_OF).unwrap();

        // Fresh destination: one full send seeding the oldest retained.
        let seed = plan(
            "tank/projects",
            "vault/projects",
            &kept,
            None,
            PlanMode::Lineage,
        )
        .unwrap();
        assert_eq!(seed.steps.len(), 1);
        assert_eq!(seed.steps[0].kind, StepKind::Full);
        assert_eq!(seed.steps[0].head_snapshot, kept[0].snapshot_name);

        // Next round: incrementals replay the retained lineage.
        let sync = plan(
            "tank/projects",
            "vault/projects",
            &kept,
            Some(&kept[0].snapshot_name),
            PlanMode::Lineage,
        )
        .unwrap();
        assert_eq!(sync.steps.len(), kept.len() - 1);
        assert_eq!(
            sync.steps.last().unwrap().head_snapshot,
            kept.last().unwrap().snapshot_name
        );
    }

    #[test]
    fn test_duplication_feeds_candidate_ranking() {
        let mut records = Vec::new();
        for (host, path) in [
            ("store01", "tank"),
            ("store01", "tank/projects"),
            ("store02", "mirror"),
            ("store02", "mirror/projects"),
            ("store03", "spare"),
        ] {
            records.push(FilesystemRecord {
                host: host.into(),
                filesystem_path: path.into(),
                leaf_name: path.rsplit('/').next().unwrap().into(),
                parent_path: path.rsplit_once('/').map(|(p, _)| p.to_string()),
                priority: None,
                used: 1 << 20,
                available: Some(1 << 40),
            });
        }
        let classes = group(&records);
        assert_eq!(classes[0].leaf_name, "projects");
        assert_eq!(classes[0].copies(), 2);

        let source = records
            .iter()
            .find(|fs| fs.host == "store01" && fs.leaf_name == "projects")
            .unwrap();
        let candidates = rank_candidates(source, &classes, &records);
        assert_eq!(candidates[0].filesystem_path, "mirror/projects");
        assert!(candidates[0].exists);
        assert_eq!(candidates[1].filesystem_path, "spare/projects");
        assert!(!candidates[1].exists);
    }

    #[test]
    fn test_output_contract_shapes() {
        let policy: RetentionPolicy = "1-1h:1d".parse().unwrap();
        let snapshots = vec![SnapshotRecord {
            filesystem_path: "tank/a".into(),
            snapshot_name: "s1".into(),
            created_at: AS_OF - 60,
            size: 1,
        }];
        let verdicts = evaluate(&policy, &snapshots, AS_OF).unwrap();
        let json = serde_json::to_value(&verdicts).unwrap();
        assert_eq!(json[0]["filesystem_path"], "tank/a");
        assert_eq!(json[0]["verdict"], "keep");

        let result = plan("tank/a", "vault/a", &snapshots, None, PlanMode::Lineage).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["steps"][0]["kind"], "full");
        assert_eq!(json["steps"][0]["base_snapshot"], serde_json::Value::Null);
    }
}
