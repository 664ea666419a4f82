//! Daily free-usage gate
//!
//! One complimentary interpretation per UTC calendar day. This is a day
//! boundary comparison, not a rolling 24h window and not a token bucket:
//! there is no accumulation or rollover.

use crate::order::TimeStamp;
use chrono::{Datelike, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct FreeGate {
    pub is_daily_free_available: bool,
    /// Next UTC midnight when unavailable, `None` otherwise
    pub next_free_at: Option<TimeStamp<Utc>>,
}

/// Pure availability check against `last_free_dream_at`. The caller must
/// persist the new timestamp atomically with the order it authorizes.
pub fn free_gate(last_free_dream_at: Option<&TimeStamp<Utc>>, now: &TimeStamp<Utc>) -> FreeGate {
    let Some(last) = last_free_dream_at else {
        return FreeGate {
            is_daily_free_available: true,
            next_free_at: None,
        };
    };

    let last = last.to_datetime_utc();
    let today = now.to_datetime_utc();

    let same_day = last.year() == today.year()
        && last.month() == today.month()
        && last.day() == today.day();

    if !same_day {
        return FreeGate {
            is_daily_free_available: true,
            next_free_at: None,
        };
    }

    let midnight = today
        .date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("next UTC midnight is representable")
        .and_utc();

    FreeGate {
        is_daily_free_available: false,
        next_free_at: Some(midnight.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_timestamp_is_available() {
        let now = TimeStamp::new_with(2025, 6, 15, 12, 0, 0);
        let gate = free_gate(None, &now);
        assert!(gate.is_daily_free_available);
        assert_eq!(gate.next_free_at, None);
    }

    #[test]
    fn last_second_of_yesterday_is_available() {
        let last = TimeStamp::new_with(2025, 6, 14, 23, 59, 59);
        let now = TimeStamp::new_with(2025, 6, 15, 0, 0, 30);
        assert!(free_gate(Some(&last), &now).is_daily_free_available);
    }

    #[test]
    fn first_second_of_today_blocks_until_midnight() {
        let last = TimeStamp::new_with(2025, 6, 15, 0, 0, 1);
        let now = TimeStamp::new_with(2025, 6, 15, 22, 0, 0);
        let gate = free_gate(Some(&last), &now);
        assert!(!gate.is_daily_free_available);
        assert_eq!(
            gate.next_free_at,
            Some(TimeStamp::new_with(2025, 6, 16, 0, 0, 0))
        );
    }
}
