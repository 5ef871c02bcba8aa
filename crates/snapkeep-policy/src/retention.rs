//! The retention policy grammar.
//!
//! A policy is a comma-separated list of fragments in strictly increasing
//! age order, each `[count:]frequency:history`:
//!
//! - `10s:14d` — one sample every 10 seconds for 14 days
//! - `1h:1d,1d:14d` — hourly samples for a day, then one per day for 14 days
//! - `5:1h:1d` — as above, but the 5 most recent samples in the first
//!   window are always kept regardless of spacing
//!
//! A leading `x-` prefix, as in `2-1h:1d`, exempts the `x` most recent
//! snapshots from all rules entirely.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::units::parse_duration_secs;

/// One fragment of a retention policy, covering the half-open age window
/// `[cumulative_prior_windows, cumulative_prior_windows + window_secs)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyBucket {
    /// Minimum number of most-recent snapshots in this window that are
    /// always kept regardless of frequency spacing.
    pub keep_count: u32,
    /// Sampling frequency within the window, seconds. Strictly positive.
    pub frequency_secs: u64,
    /// Window length, seconds. Strictly positive and at least the frequency.
    pub window_secs: u64,
}

/// A parsed retention rule set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    ignored_count: u32,
    buckets: Vec<PolicyBucket>,
}

impl RetentionPolicy {
    /// Number of most-recent snapshots exempt from all rules.
    pub fn ignored_count(&self) -> u32 {
        self.ignored_count
    }

    /// The fragments, in age order starting at the evaluation instant.
    pub fn buckets(&self) -> &[PolicyBucket] {
        &self.buckets
    }

    /// Total age span covered by the rule set, seconds. Snapshots older
    /// than this are always deleted.
    pub fn horizon_secs(&self) -> u64 {
        self.buckets.iter().map(|b| b.window_secs).sum()
    }

    /// Upper bound on the number of snapshots this rule set can retain,
    /// useful for sizing pools ahead of time.
    pub fn capacity(&self) -> u64 {
        self.ignored_count as u64
            + self
                .buckets
                .iter()
                .map(|b| {
                    // A window that does not divide evenly still has a
                    // partial slot at its old edge.
                    let slots = (b.window_secs + b.frequency_secs - 1) / b.frequency_secs;
                    b.keep_count as u64 + slots
                })
                .sum::<u64>()
    }
}

impl FromStr for RetentionPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PolicyError::malformed(s, "empty policy"));
        }

        // The `x-` prefix applies to the whole string and is stripped
        // before fragment parsing. An empty remainder is allowed: such a
        // policy keeps the most recent x snapshots and deletes the rest.
        let (ignored_count, rest) = match s.split_once('-') {
            Some((count, rest)) => {
                let count: u32 = count.trim().parse().map_err(|_| {
                    PolicyError::malformed(count, "ignored-count prefix is not an integer")
                })?;
                (count, rest.trim())
            }
            None => (0, s),
        };

        let mut buckets = Vec::new();
        if !rest.is_empty() {
            for fragment in rest.split(',') {
                let fragment = fragment.trim();
                buckets.push(parse_fragment(fragment)?);
                if buckets.len() > 1 {
                    let prev = buckets[buckets.len() - 2];
                    let cur = buckets[buckets.len() - 1];
                    if cur.frequency_secs < prev.frequency_secs {
                        return Err(PolicyError::malformed(
                            fragment,
                            "sampling must not get denser in later fragments",
                        ));
                    }
                }
            }
        }

        let policy = Self {
            ignored_count,
            buckets,
        };
        tracing::debug!(
            ignored = policy.ignored_count,
            fragments = policy.buckets.len(),
            horizon_secs = policy.horizon_secs(),
            "parsed retention policy"
        );
        Ok(policy)
    }
}

fn parse_fragment(fragment: &str) -> Result<PolicyBucket, PolicyError> {
    let tokens: Vec<&str> = fragment.split(':').collect();
    let (keep_count, freq_token, window_token) = match tokens.as_slice() {
        [freq, window] => (0u32, *freq, *window),
        [keep, freq, window] => {
            let keep: u32 = keep.trim().parse().map_err(|_| {
                PolicyError::malformed(fragment, "'count' portion must be an integer")
            })?;
            (keep, *freq, *window)
        }
        _ => {
            return Err(PolicyError::malformed(
                fragment,
                "fragment must be '[count:]frequency:history'",
            ))
        }
    };

    let frequency_secs = parse_duration_secs(freq_token)?;
    let window_secs = parse_duration_secs(window_token)?;
    if frequency_secs > window_secs {
        return Err(PolicyError::malformed(
            fragment,
            "frequency cannot be larger than the history window",
        ));
    }

    Ok(PolicyBucket {
        keep_count,
        frequency_secs,
        window_secs,
    })
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignored_count > 0 {
            write!(f, "{}-", self.ignored_count)?;
        }
        for (i, b) in self.buckets.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if b.keep_count > 0 {
                write!(f, "{}:", b.keep_count)?;
            }
            write!(f, "{}s:{}s", b.frequency_secs, b.window_secs)?;
        }
        Ok(())
    }
}
