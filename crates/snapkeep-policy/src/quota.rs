//! The quota policy grammar.
//!
//! Comma-separated `key=value` assignments:
//!
//! - `distribute=<size>` — total capacity to divide among the pool
//!   (required), like `distribute=12t`
//! - `cap=<size>` — absolute per-filesystem ceiling, `0` for unbounded
//!   (the default)
//! - `<priority>=<weight>` — optional integer overrides mapping a priority
//!   to a distribution weight; without an override the weight equals the
//!   priority itself (priority 2 is twice as important as priority 1)
//!
//! Example: `distribute=12t,cap=4t,3=10`.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::units::parse_size_bytes;

/// A parsed quota rule set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    distribute_space: u64,
    max_cap: u64,
    weights: BTreeMap<u32, u64>,
}

impl QuotaPolicy {
    /// Builds a policy directly, bypassing the grammar. Mostly for tests
    /// and callers that already hold structured configuration.
    pub fn new(distribute_space: u64, max_cap: u64) -> Self {
        Self {
            distribute_space,
            max_cap,
            weights: BTreeMap::new(),
        }
    }

    /// Total capacity to divide among the pool, bytes.
    pub fn distribute_space(&self) -> u64 {
        self.distribute_space
    }

    /// Per-filesystem ceiling in bytes; `0` means unbounded.
    pub fn max_cap(&self) -> u64 {
        self.max_cap
    }

    /// Distribution weight for a filesystem of the given priority.
    ///
    /// Explicit overrides win; otherwise the weight is the priority itself.
    /// Priorities must be positive, which the allocator validates before
    /// calling this.
    pub fn weight_for(&self, priority: i64) -> u64 {
        u32::try_from(priority)
            .ok()
            .and_then(|p| self.weights.get(&p).copied())
            .unwrap_or(priority.max(0) as u64)
    }

    /// Adds or replaces a priority→weight override.
    pub fn set_weight(&mut self, priority: u32, weight: u64) {
        self.weights.insert(priority, weight);
    }
}

impl FromStr for QuotaPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PolicyError::malformed(s, "empty policy"));
        }

        let mut distribute_space = None;
        let mut max_cap = 0u64;
        let mut weights = BTreeMap::new();

        for fragment in s.split(',') {
            let fragment = fragment.trim();
            let (key, value) = fragment.split_once('=').ok_or_else(|| {
                PolicyError::malformed(fragment, "fragment must be 'key=value'")
            })?;
            match key.trim() {
                "distribute" => {
                    let space = parse_size_bytes(value)?;
                    if space == 0 {
                        return Err(PolicyError::malformed(
                            fragment,
                            "distribute space must be positive",
                        ));
                    }
                    distribute_space = Some(space);
                }
                "cap" => {
                    max_cap = parse_size_bytes(value)?;
                }
                prio => {
                    let priority: u32 = prio.parse().map_err(|_| {
                        PolicyError::malformed(
                            fragment,
                            "key must be 'distribute', 'cap' or a priority integer",
                        )
                    })?;
                    let weight: u64 = value.trim().parse().map_err(|_| {
                        PolicyError::malformed(fragment, "weight must be an integer")
                    })?;
                    if priority == 0 || weight == 0 {
                        return Err(PolicyError::malformed(
                            fragment,
                            "priority and weight must be positive",
                        ));
                    }
                    weights.insert(priority, weight);
                }
            }
        }

        let distribute_space = distribute_space.ok_or_else(|| {
            PolicyError::malformed(s, "missing required 'distribute=<size>' fragment")
        })?;

        tracing::debug!(
            distribute_space,
            max_cap,
            overrides = weights.len(),
            "parsed quota policy"
        );
        Ok(Self {
            distribute_space,
            max_cap,
            weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let policy: QuotaPolicy = "distribute=12t".parse().unwrap();
        assert_eq!(policy.distribute_space(), 12 << 40);
        assert_eq!(policy.max_cap(), 0);
    }

    #[test]
    fn test_parse_with_cap_and_overrides() {
        let policy: QuotaPolicy = "distribute=10g,cap=4g,3=10,1=1".parse().unwrap();
        assert_eq!(policy.max_cap(), 4 << 30);
        assert_eq!(policy.weight_for(3), 10);
        assert_eq!(policy.weight_for(1), 1);
        // no override: weight equals priority
        assert_eq!(policy.weight_for(2), 2);
    }

    #[test]
    fn test_requires_distribute() {
        assert!("cap=4g".parse::<QuotaPolicy>().is_err());
        assert!("distribute=0".parse::<QuotaPolicy>().is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", "distribute", "distribute=12q", "foo=1", "0=2", "2=0"] {
            assert!(bad.parse::<QuotaPolicy>().is_err(), "accepted '{bad}'");
        }
    }

    #[test]
    fn test_error_reports_fragment() {
        let err = "distribute=12t,frob=1".parse::<QuotaPolicy>().unwrap_err();
        let PolicyError::MalformedPolicy { fragment, .. } = err;
        assert_eq!(fragment, "frob=1");
    }
}
