//! Token coercion: integers, relative TTLs and absolute instants

use crate::error::{RedtapeError, Result};
use chrono::{DateTime, TimeDelta, Utc};

/// Resolution of a numeric time argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    fn to_millis(self, n: i64) -> Option<i64> {
        match self {
            TimeUnit::Seconds => n.checked_mul(1000),
            TimeUnit::Milliseconds => Some(n),
        }
    }
}

/// Parse a token as a signed 64-bit integer
pub fn parse_int(token: &[u8]) -> Result<i64> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or_else(|| not_an_integer(token))
}

/// Relative TTL of `n` units. Zero and negative values are kept as-is.
pub fn ttl(n: i64, unit: TimeUnit) -> Result<TimeDelta> {
    unit.to_millis(n)
        .and_then(TimeDelta::try_milliseconds)
        .ok_or_else(|| out_of_range(n))
}

/// Absolute instant `n` units after the Unix epoch
pub fn instant(n: i64, unit: TimeUnit) -> Result<DateTime<Utc>> {
    unit.to_millis(n)
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| out_of_range(n))
}

fn not_an_integer(token: &[u8]) -> RedtapeError {
    RedtapeError::NotAnInteger {
        value: String::from_utf8_lossy(token).into_owned(),
    }
}

fn out_of_range(n: i64) -> RedtapeError {
    RedtapeError::NotAnInteger {
        value: n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(b"5000").unwrap(), 5000);
        assert_eq!(parse_int(b"-1000").unwrap(), -1000);
        assert_eq!(parse_int(b"0").unwrap(), 0);

        let bad_tokens: [&[u8]; 6] = [b"age", b"", b"1.5", b" 1", b"99999999999999999999", b"\xff"];
        for bad in bad_tokens {
            let err = parse_int(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInt, "token {bad:?}");
        }
    }

    #[test]
    fn test_ttl_units() {
        assert_eq!(ttl(10, TimeUnit::Seconds).unwrap(), TimeDelta::seconds(10));
        assert_eq!(
            ttl(10, TimeUnit::Milliseconds).unwrap(),
            TimeDelta::milliseconds(10)
        );
        assert_eq!(ttl(-1, TimeUnit::Seconds).unwrap(), TimeDelta::seconds(-1));
        assert_eq!(
            ttl(i64::MAX, TimeUnit::Seconds).unwrap_err().kind(),
            ErrorKind::InvalidInt
        );
    }

    #[test]
    fn test_instant_units() {
        let want = Utc.with_ymd_and_hms(2020, 1, 1, 12, 34, 56).unwrap();
        assert_eq!(instant(1577882096, TimeUnit::Seconds).unwrap(), want);
        assert_eq!(instant(1577882096000, TimeUnit::Milliseconds).unwrap(), want);
        assert!(instant(i64::MAX / 10, TimeUnit::Seconds).is_err());
    }
}
