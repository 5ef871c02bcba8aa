//! Dataset URLs identifying any pool, filesystem or snapshot in the fleet.
//!
//! Format: `zfs://host/pool[/filesystem[@snapshot]]`. The URL is the
//! cross-host identity used everywhere a (host, dataset) pair would
//! otherwise be passed around loose.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// URL scheme of dataset identities.
pub const SCHEME: &str = "zfs";

/// Identity of a pool, filesystem or snapshot on a specific host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetUrl {
    host: String,
    /// Dataset path without the snapshot part, like `archive/projects/ember`.
    dataset: String,
    snapshot: Option<String>,
}

impl DatasetUrl {
    /// Builds a URL from its parts.
    ///
    /// `dataset` is the full path starting with the pool name; `snapshot`
    /// is the bare snapshot name, if any.
    pub fn new(
        host: impl Into<String>,
        dataset: impl Into<String>,
        snapshot: Option<String>,
    ) -> Result<Self, CatalogError> {
        let host = host.into();
        let dataset: String = dataset.into();
        let dataset = dataset.trim_matches('/').to_string();
        if host.is_empty() {
            return Err(CatalogError::MalformedUrl {
                url: format!("{SCHEME}://{host}/{dataset}"),
                reason: "empty host".into(),
            });
        }
        if dataset.is_empty() {
            return Err(CatalogError::MalformedUrl {
                url: format!("{SCHEME}://{host}/{dataset}"),
                reason: "empty dataset path".into(),
            });
        }
        if let Some(name) = &snapshot {
            if name.is_empty() || name.contains('@') || name.contains('/') {
                return Err(CatalogError::MalformedUrl {
                    url: format!("{SCHEME}://{host}/{dataset}@{name}"),
                    reason: "invalid snapshot name".into(),
                });
            }
        }
        Ok(Self {
            host,
            dataset,
            snapshot,
        })
    }

    /// Host portion of the URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The pool portion of the dataset path.
    pub fn pool(&self) -> &str {
        self.dataset.split('/').next().unwrap_or(&self.dataset)
    }

    /// The filesystem path. At least the pool, as each pool has a
    /// corresponding filesystem.
    pub fn filesystem(&self) -> &str {
        &self.dataset
    }

    /// Last segment of the filesystem path, the clone identity.
    pub fn basename(&self) -> &str {
        self.dataset.rsplit('/').next().unwrap_or(&self.dataset)
    }

    /// True if the URL points at a pool rather than a nested filesystem.
    pub fn is_pool(&self) -> bool {
        !self.dataset.contains('/') && self.snapshot.is_none()
    }

    /// True if the URL points at a snapshot.
    pub fn is_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Bare snapshot name, if this is a snapshot URL.
    pub fn snapshot_name(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Full dataset name as used in commands, `path@snapshot` for snapshots.
    pub fn name(&self) -> String {
        match &self.snapshot {
            Some(ss) => format!("{}@{}", self.dataset, ss),
            None => self.dataset.clone(),
        }
    }

    /// URL of the parent filesystem.
    ///
    /// For snapshots that is the owning filesystem; for nested filesystems
    /// the path one level up; for pool filesystems there is none.
    pub fn parent_filesystem_url(&self) -> Option<DatasetUrl> {
        if self.snapshot.is_some() {
            return Some(Self {
                host: self.host.clone(),
                dataset: self.dataset.clone(),
                snapshot: None,
            });
        }
        let (parent, _leaf) = self.dataset.rsplit_once('/')?;
        Some(Self {
            host: self.host.clone(),
            dataset: parent.to_string(),
            snapshot: None,
        })
    }

    /// A new URL with `name` joined onto the dataset path. The snapshot
    /// portion, if any, is kept.
    pub fn joined(&self, name: &str) -> Result<DatasetUrl, CatalogError> {
        let name = name.trim_matches('/');
        Self::new(
            self.host.clone(),
            format!("{}/{}", self.dataset, name),
            self.snapshot.clone(),
        )
    }
}

impl FromStr for DatasetUrl {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| CatalogError::MalformedUrl {
            url: s.to_string(),
            reason: reason.to_string(),
        };
        let rest = s
            .strip_prefix("zfs://")
            .ok_or_else(|| malformed("missing 'zfs://' scheme"))?;
        let (host, path) = rest
            .split_once('/')
            .ok_or_else(|| malformed("missing dataset path"))?;
        let (dataset, snapshot) = match path.split_once('@') {
            Some((ds, ss)) => (ds, Some(ss.to_string())),
            None => (path, None),
        };
        if matches!(&snapshot, Some(ss) if ss.contains('@')) {
            return Err(malformed("more than one '@' in dataset path"));
        }
        Self::new(host, dataset, snapshot).map_err(|_| malformed("empty component"))
    }
}

impl fmt::Display for DatasetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}://{}/{}", self.host, self.name())
    }
}

impl TryFrom<String> for DatasetUrl {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatasetUrl> for String {
    fn from(url: DatasetUrl) -> Self {
        url.to_string()
    }
}
