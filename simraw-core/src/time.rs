//! NT timestamp conversion
//!
//! Datagram timestamps are 64-bit counts of 100 ns ticks since
//! 1601-01-01T00:00:00 UTC, stored as two little-endian u32 halves.

use crate::constants::NT_EPOCH_OFFSET_MICROS;
use chrono::{DateTime, Utc};

/// The NT epoch, 1601-01-01T00:00:00 UTC
pub fn nt_epoch() -> DateTime<Utc> {
    // In range for chrono, which supports years back to -262143
    DateTime::from_timestamp_micros(NT_EPOCH_OFFSET_MICROS).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Join the two halves into a tick count
pub const fn nt_ticks(time_low: u32, time_high: u32) -> u64 {
    ((time_high as u64) << 32) | time_low as u64
}

/// Convert a split NT timestamp to a UTC instant, truncated to microseconds
pub fn nt_time_to_utc(time_low: u32, time_high: u32) -> DateTime<Utc> {
    let micros = nt_ticks(time_low, time_high) / 10;
    // u64::MAX / 10 fits in i64 and lands well before chrono's maximum year
    DateTime::from_timestamp_micros(NT_EPOCH_OFFSET_MICROS + micros as i64)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_zero_is_epoch() {
        let epoch = Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(nt_time_to_utc(0, 0), epoch);
        assert_eq!(nt_epoch(), epoch);
    }

    #[test]
    fn test_one_second_past_epoch() {
        let expected = Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 1).unwrap();
        assert_eq!(nt_time_to_utc(10_000_000, 0), expected);
    }

    #[test]
    fn test_high_half_is_shifted() {
        assert_eq!(nt_ticks(0, 1), 1u64 << 32);
        assert_eq!(nt_ticks(7, 1), (1u64 << 32) + 7);
    }

    #[test]
    fn test_sub_microsecond_ticks_truncate() {
        assert_eq!(nt_time_to_utc(9, 0), nt_epoch());
    }

    #[test]
    fn test_known_modern_timestamp() {
        // 2020-01-01T00:00:00Z
        let ticks: u64 = 132_223_104_000_000_000;
        let dt = nt_time_to_utc(ticks as u32, (ticks >> 32) as u32);
        assert_eq!(dt, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_max_ticks_do_not_panic() {
        let dt = nt_time_to_utc(u32::MAX, u32::MAX);
        assert!(dt > nt_epoch());
    }
}
