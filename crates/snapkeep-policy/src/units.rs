//! Duration and size suffix parsing shared by both grammars.
//!
//! Durations use fixed conversion factors with no calendar arithmetic: a
//! month is 30 days and a year 365 days, applied consistently so that the
//! same policy string always spans the same number of seconds.

use crate::error::PolicyError;

/// Seconds per hour.
pub const HOUR_SECS: u64 = 3600;
/// Seconds per day.
pub const DAY_SECS: u64 = 24 * HOUR_SECS;
/// Seconds per month (fixed at 30 days).
pub const MONTH_SECS: u64 = 30 * DAY_SECS;
/// Seconds per year (fixed at 365 days).
pub const YEAR_SECS: u64 = 365 * DAY_SECS;

/// Parses a duration token like `10s`, `1h`, `14d`, `6m` or `1y` into
/// seconds. The value must be a positive integer.
pub fn parse_duration_secs(token: &str) -> Result<u64, PolicyError> {
    let token = token.trim();
    let (digits, suffix) = split_token(token)?;
    let factor = match suffix {
        "s" => 1,
        "h" => HOUR_SECS,
        "d" => DAY_SECS,
        "m" => MONTH_SECS,
        "y" => YEAR_SECS,
        "" => {
            return Err(PolicyError::malformed(
                token,
                "missing duration suffix (one of s, h, d, m, y)",
            ))
        }
        other => {
            return Err(PolicyError::malformed(
                token,
                format!("unknown duration suffix '{other}'"),
            ))
        }
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| PolicyError::malformed(token, "duration value is not an integer"))?;
    if value == 0 {
        return Err(PolicyError::malformed(token, "duration must be positive"));
    }
    value
        .checked_mul(factor)
        .ok_or_else(|| PolicyError::malformed(token, "duration overflows"))
}

/// Parses a size token like `512`, `100k`, `1g` or `12t` into bytes.
/// Suffixes are binary (factor 1024); a bare integer is taken as bytes and
/// `0` is allowed (it means "unbounded" for caps).
pub fn parse_size_bytes(token: &str) -> Result<u64, PolicyError> {
    let token = token.trim();
    let (digits, suffix) = split_token(token)?;
    let factor: u64 = match suffix.to_ascii_lowercase().as_str() {
        "" => 1,
        "k" => 1 << 10,
        "m" => 1 << 20,
        "g" => 1 << 30,
        "t" => 1 << 40,
        "p" => 1 << 50,
        other => {
            return Err(PolicyError::malformed(
                token,
                format!("unknown size suffix '{other}'"),
            ))
        }
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| PolicyError::malformed(token, "size value is not an integer"))?;
    value
        .checked_mul(factor)
        .ok_or_else(|| PolicyError::malformed(token, "size overflows"))
}

/// Splits a token into its leading digits and the trailing suffix.
fn split_token(token: &str) -> Result<(&str, &str), PolicyError> {
    if token.is_empty() {
        return Err(PolicyError::malformed(token, "empty fragment"));
    }
    let split = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    if split == 0 {
        return Err(PolicyError::malformed(token, "missing numeric value"));
    }
    Ok((&token[..split], &token[split..]))
}
