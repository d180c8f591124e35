//! TTL specification parsing
//!
//! A TTL is written as `<integer><unit>` where the unit is one of
//! `d` (days), `w` (weeks), `m` (months), or `y` (years). Months and years
//! use fixed 30/365-day multipliers; the arithmetic is calendar-inexact.

use chrono::{DateTime, Duration, Utc};

use crate::error::{MembankError, Result};

/// Parse a TTL specification into a whole number of days.
pub fn parse_ttl_days(spec: &str) -> Result<i64> {
    let spec = spec.trim();
    let unit = spec
        .chars()
        .last()
        .ok_or_else(|| MembankError::InvalidTtl("empty TTL".to_string()))?;
    let digits = &spec[..spec.len() - unit.len_utf8()];

    let multiplier = match unit {
        'd' => 1,
        'w' => 7,
        'm' => 30,
        'y' => 365,
        _ => {
            return Err(MembankError::InvalidTtl(format!(
                "{spec} (unit must be one of d, w, m, y)"
            )));
        }
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MembankError::InvalidTtl(format!(
            "{spec} (expected <integer><unit>, e.g. 7d)"
        )));
    }

    let count: i64 = digits
        .parse()
        .map_err(|_| MembankError::InvalidTtl(format!("{spec} (count out of range)")))?;

    count
        .checked_mul(multiplier)
        .ok_or_else(|| MembankError::InvalidTtl(format!("{spec} (count out of range)")))
}

/// Compute the expiry timestamp for a TTL specification relative to `now`.
pub fn expiry_from_ttl(spec: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let days = parse_ttl_days(spec)?;
    let duration = Duration::try_days(days)
        .ok_or_else(|| MembankError::InvalidTtl(format!("{spec} (count out of range)")))?;
    now.checked_add_signed(duration)
        .ok_or_else(|| MembankError::InvalidTtl(format!("{spec} (count out of range)")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ttl_units() {
        assert_eq!(parse_ttl_days("7d").unwrap(), 7);
        assert_eq!(parse_ttl_days("2w").unwrap(), 14);
        assert_eq!(parse_ttl_days("3m").unwrap(), 90);
        assert_eq!(parse_ttl_days("1y").unwrap(), 365);
        assert_eq!(parse_ttl_days("0d").unwrap(), 0);
    }

    #[test]
    fn test_parse_ttl_trims_whitespace() {
        assert_eq!(parse_ttl_days(" 10d ").unwrap(), 10);
    }

    #[test]
    fn test_parse_ttl_rejects_malformed() {
        for bad in ["abc", "7x", "d", "7", "", "-3d", "1.5d", "d7"] {
            let result = parse_ttl_days(bad);
            assert!(
                matches!(result, Err(MembankError::InvalidTtl(_))),
                "{bad:?} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_parse_ttl_rejects_overflowing_count() {
        let result = parse_ttl_days("99999999999999999999d");
        assert!(matches!(result, Err(MembankError::InvalidTtl(_))));
    }

    #[test]
    fn test_expiry_from_ttl() {
        let now = Utc::now();
        let expiry = expiry_from_ttl("7d", now).unwrap();
        assert_eq!(expiry - now, Duration::days(7));
    }
}
