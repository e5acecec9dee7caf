//! Microsecond epoch timestamps.
//!
//! The chat protocol carries times as signed microseconds since
//! 1970-01-01T00:00:00Z. A missing timestamp is normal on the wire and
//! decodes to the epoch itself; negative offsets are real pre-epoch times
//! and are never clamped.

use chrono::{DateTime, Utc};
use thiserror::Error;

const MICROS_PER_SECOND: i64 = 1_000_000;
const NANOS_PER_MICRO: u32 = 1_000;

/// Timestamp conversion failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    /// The value lies outside the range chrono can represent.
    #[error("Timestamp {0}us is outside the representable range")]
    OutOfRange(i64),
}

/// Convert wire microseconds to a calendar time.
///
/// `None` maps to the epoch.
pub fn from_microseconds(micros: Option<i64>) -> Result<DateTime<Utc>, TimestampError> {
    let micros = micros.unwrap_or(0);
    DateTime::from_timestamp_micros(micros).ok_or(TimestampError::OutOfRange(micros))
}

/// Convert a calendar time to wire microseconds, rounding sub-microsecond
/// precision to the nearest microsecond.
pub fn to_microseconds(time: &DateTime<Utc>) -> i64 {
    // chrono keeps the seconds floored and the nanosecond part non-negative,
    // so rounding the fraction is correct before and after the epoch.
    let micros = (time.timestamp_subsec_nanos() + NANOS_PER_MICRO / 2) / NANOS_PER_MICRO;
    time.timestamp() * MICROS_PER_SECOND + i64::from(micros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_missing_timestamp_is_epoch() {
        let time = from_microseconds(None).unwrap();
        assert_eq!(time, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(time.to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_known_value() {
        let time = from_microseconds(Some(1_500_000_000_123_456)).unwrap();
        assert_eq!(
            time,
            Utc.with_ymd_and_hms(2017, 7, 14, 2, 40, 0).unwrap() + Duration::microseconds(123_456)
        );
        assert_eq!(to_microseconds(&time), 1_500_000_000_123_456);
    }

    #[test]
    fn test_pre_epoch_is_not_clamped() {
        let time = from_microseconds(Some(-1)).unwrap();
        assert!(time < DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(to_microseconds(&time), -1);

        let older = Utc.with_ymd_and_hms(1901, 12, 13, 20, 45, 52).unwrap();
        let micros = to_microseconds(&older);
        assert!(micros < 0);
        assert_eq!(from_microseconds(Some(micros)).unwrap(), older);
    }

    #[test]
    fn test_round_trip_whole_microseconds() {
        for micros in [0i64, 1, 999_999, 1_000_000, -999_999, -1_000_001, 1_700_000_000_000_001] {
            let time = from_microseconds(Some(micros)).unwrap();
            assert_eq!(to_microseconds(&time), micros, "round trip of {}", micros);
            assert_eq!(from_microseconds(Some(to_microseconds(&time))).unwrap(), time);
        }
    }

    #[test]
    fn test_sub_microsecond_rounds_to_nearest() {
        let base = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(to_microseconds(&(base + Duration::nanoseconds(1_499))), 1);
        assert_eq!(to_microseconds(&(base + Duration::nanoseconds(1_500))), 2);
        assert_eq!(to_microseconds(&(base - Duration::nanoseconds(400))), 0);
        assert_eq!(to_microseconds(&(base - Duration::nanoseconds(600))), -1);
    }

    #[test]
    fn test_out_of_range_is_error() {
        let result = from_microseconds(Some(i64::MAX));
        assert_eq!(result, Err(TimestampError::OutOfRange(i64::MAX)));
    }
}
