//! In-memory catalog of one host's filesystem tree.
//!
//! Each host is evaluated independently (equivalence classing is the only
//! cross-host linkage), so the catalog holds exactly one host's records.
//! Records are mutated only by re-ingestion of fresh metadata; the planning
//! core never writes back.

use std::collections::BTreeMap;

use crate::error::CatalogError;
use crate::types::{FilesystemRecord, SnapshotRecord};

/// Validated view over one host's filesystem and snapshot records.
#[derive(Clone, Debug, Default)]
pub struct HostCatalog {
    host: String,
    filesystems: BTreeMap<String, FilesystemRecord>,
    /// Snapshots per filesystem path, kept ascending by creation time.
    snapshots: BTreeMap<String, Vec<SnapshotRecord>>,
}

impl HostCatalog {
    /// Creates an empty catalog for `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            filesystems: BTreeMap::new(),
            snapshots: BTreeMap::new(),
        }
    }

    /// The host this catalog describes.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Ingests or refreshes a filesystem record.
    ///
    /// Rejects records for a different host, records whose leaf name does
    /// not match the path, records whose parent is not the path one level
    /// up, and non-positive priorities.
    pub fn ingest_filesystem(&mut self, rec: FilesystemRecord) -> Result<(), CatalogError> {
        if rec.host != self.host {
            return Err(CatalogError::invalid(format!(
                "filesystem '{}' belongs to host '{}', catalog holds '{}'",
                rec.filesystem_path, rec.host, self.host
            )));
        }
        let leaf = rec
            .filesystem_path
            .rsplit('/')
            .next()
            .unwrap_or(&rec.filesystem_path);
        if leaf != rec.leaf_name || rec.filesystem_path.is_empty() {
            return Err(CatalogError::invalid(format!(
                "leaf name '{}' does not match path '{}'",
                rec.leaf_name, rec.filesystem_path
            )));
        }
        let expected_parent = rec.filesystem_path.rsplit_once('/').map(|(p, _)| p);
        if rec.parent_path.as_deref() != expected_parent {
            return Err(CatalogError::invalid(format!(
                "parent path {:?} does not match path '{}'",
                rec.parent_path, rec.filesystem_path
            )));
        }
        if matches!(rec.priority, Some(p) if p <= 0) {
            return Err(CatalogError::invalid(format!(
                "filesystem '{}' has non-positive priority {}",
                rec.filesystem_path,
                rec.priority.unwrap_or_default()
            )));
        }
        if self
            .filesystems
            .insert(rec.filesystem_path.clone(), rec)
            .is_some()
        {
            tracing::debug!(host = %self.host, "refreshed filesystem record");
        }
        Ok(())
    }

    /// Ingests a snapshot record.
    ///
    /// The owning filesystem must already be known, and creation timestamps
    /// must be unique within one filesystem.
    pub fn ingest_snapshot(&mut self, rec: SnapshotRecord) -> Result<(), CatalogError> {
        if !self.filesystems.contains_key(&rec.filesystem_path) {
            return Err(CatalogError::invalid(format!(
                "snapshot '{}' references unknown filesystem '{}'",
                rec.snapshot_name, rec.filesystem_path
            )));
        }
        let list = self.snapshots.entry(rec.filesystem_path.clone()).or_default();
        if list.iter().any(|ss| ss.created_at == rec.created_at) {
            return Err(CatalogError::invalid(format!(
                "snapshot '{}' duplicates creation time {} on '{}'",
                rec.snapshot_name, rec.created_at, rec.filesystem_path
            )));
        }
        let pos = list.partition_point(|ss| ss.created_at < rec.created_at);
        list.insert(pos, rec);
        Ok(())
    }

    /// Looks up a filesystem record by path.
    pub fn filesystem(&self, path: &str) -> Option<&FilesystemRecord> {
        self.filesystems.get(path)
    }

    /// All filesystem records, ordered by path.
    pub fn filesystems(&self) -> impl Iterator<Item = &FilesystemRecord> {
        self.filesystems.values()
    }

    /// Filesystems carrying a priority attribute, the quota candidate set.
    pub fn prioritized_filesystems(&self) -> Vec<FilesystemRecord> {
        self.filesystems
            .values()
            .filter(|fs| fs.priority.is_some())
            .cloned()
            .collect()
    }

    /// Direct children of `path`, ordered by path.
    pub fn children(&self, path: &str) -> Vec<&FilesystemRecord> {
        self.filesystems
            .values()
            .filter(|fs| fs.parent_path.as_deref() == Some(path))
            .collect()
    }

    /// Leaf filesystems (no children), the duplication-report population.
    pub fn leaf_filesystems(&self) -> Vec<&FilesystemRecord> {
        self.filesystems
            .values()
            .filter(|fs| !fs.is_pool_filesystem() && self.children(&fs.filesystem_path).is_empty())
            .collect()
    }

    /// Snapshots of `path`, ascending by creation time.
    pub fn snapshots_asc(&self, path: &str) -> &[SnapshotRecord] {
        self.snapshots.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Snapshots of `path`, descending by creation time (the retention
    /// evaluator's native order).
    pub fn snapshots_desc(&self, path: &str) -> Vec<SnapshotRecord> {
        let mut list = self.snapshots_asc(path).to_vec();
        list.reverse();
        list
    }

    /// The most recent snapshot of `path`, if any.
    pub fn latest_snapshot(&self, path: &str) -> Option<&SnapshotRecord> {
        self.snapshots_asc(path).last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs(path: &str, priority: Option<i64>) -> FilesystemRecord {
        FilesystemRecord {
            host: "h1".into(),
            filesystem_path: path.into(),
            leaf_name: path.rsplit('/').next().unwrap().into(),
            parent_path: path.rsplit_once('/').map(|(p, _)| p.to_string()),
            priority,
            used: 10,
            available: Some(100),
        }
    }

    fn ss(path: &str, name: &str, created_at: u64) -> SnapshotRecord {
        SnapshotRecord {
            filesystem_path: path.into(),
            snapshot_name: name.into(),
            created_at,
            size: 1,
        }
    }

    #[test]
    fn test_ingest_and_lookup() {
        let mut cat = HostCatalog::new("h1");
        cat.ingest_filesystem(fs("archive", None)).unwrap();
        cat.ingest_filesystem(fs("archive/projects", None)).unwrap();
        cat.ingest_filesystem(fs("archive/projects/ember", Some(2)))
            .unwrap();

        assert!(cat.filesystem("archive/projects/ember").is_some());
        assert_eq!(cat.children("archive").len(), 1);
        assert_eq!(cat.leaf_filesystems().len(), 1);
        assert_eq!(cat.prioritized_filesystems().len(), 1);
    }

    #[test]
    fn test_rejects_wrong_host() {
        let mut cat = HostCatalog::new("h1");
        let mut rec = fs("archive", None);
        rec.host = "h2".into();
        assert!(cat.ingest_filesystem(rec).is_err());
    }

    #[test]
    fn test_rejects_leaf_name_mismatch() {
        let mut cat = HostCatalog::new("h1");
        let mut rec = fs("archive/a", None);
        rec.leaf_name = "b".into();
        assert!(cat.ingest_filesystem(rec).is_err());
    }

    #[test]
    fn test_rejects_non_positive_priority() {
        let mut cat = HostCatalog::new("h1");
        assert!(cat.ingest_filesystem(fs("archive", Some(0))).is_err());
        assert!(cat.ingest_filesystem(fs("archive", Some(-3))).is_err());
    }

    #[test]
    fn test_snapshot_requires_known_filesystem() {
        let mut cat = HostCatalog::new("h1");
        let err = cat.ingest_snapshot(ss("archive/a", "s1", 10)).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput { .. }));
    }

    #[test]
    fn test_snapshots_kept_sorted_and_unique() {
        let mut cat = HostCatalog::new("h1");
        cat.ingest_filesystem(fs("archive", None)).unwrap();
        cat.ingest_filesystem(fs("archive/a", None)).unwrap();
        cat.ingest_snapshot(ss("archive/a", "s2", 20)).unwrap();
        cat.ingest_snapshot(ss("archive/a", "s1", 10)).unwrap();
        cat.ingest_snapshot(ss("archive/a", "s3", 30)).unwrap();

        let names: Vec<_> = cat
            .snapshots_asc("archive/a")
            .iter()
            .map(|s| s.snapshot_name.as_str())
            .collect();
        assert_eq!(names, ["s1", "s2", "s3"]);
        assert_eq!(cat.latest_snapshot("archive/a").unwrap().snapshot_name, "s3");

        let dup = cat.ingest_snapshot(ss("archive/a", "other", 20));
        assert!(dup.is_err());
    }

    #[test]
    fn test_refresh_replaces_record() {
        let mut cat = HostCatalog::new("h1");
        cat.ingest_filesystem(fs("archive", None)).unwrap();
        let mut fresh = fs("archive", None);
        fresh.used = 99;
        cat.ingest_filesystem(fresh).unwrap();
        assert_eq!(cat.filesystem("archive").unwrap().used, 99);
    }
}
