//! Property-based tests for settlement math and the daily free-usage gate
//!
//! Settlement runs once per order from the locked price, so its arithmetic
//! invariants must hold for every price/rate combination the platform could
//! ever configure. The gate is a pure calendar-day comparison and its
//! boundary behavior is checked across random timestamps.

use chrono::{Datelike, Timelike};
use proptest::prelude::*;

use dream_orders::gate::free_gate;
use dream_orders::order::TimeStamp;
use dream_orders::pricing::{commission, settle, BPS_DENOMINATOR};

// PROPERTY TEST STRATEGIES

/// Strategy for prices in cents, up to ten thousand dollars
fn price_strategy() -> impl Strategy<Value = u64> {
    0u64..=1_000_000u64
}

/// Strategy for commission rates across the valid 0..=100% range
fn rate_strategy() -> impl Strategy<Value = u64> {
    0u64..=BPS_DENOMINATOR
}

/// Strategy for an arbitrary time of day
fn time_of_day_strategy() -> impl Strategy<Value = (u32, u32, u32)> {
    (0u32..24, 0u32..60, 0u32..60)
}

/// Strategy for a calendar date safely inside month bounds, leaving room
/// for a next-day probe in any month
fn date_strategy() -> impl Strategy<Value = (i32, u32, u32)> {
    (2020i32..=2030, 1u32..=12, 1u32..=27)
}

// PROPERTY TESTS
proptest! {
    /// Property: commission + earning always equals the locked price
    ///
    /// Money is never created or destroyed by settlement, for any price and
    /// any configured rate.
    #[test]
    fn prop_settlement_conserves_money(
        price in price_strategy(),
        rate_bps in rate_strategy()
    ) {
        let s = settle(price, rate_bps);
        prop_assert_eq!(s.platform_commission + s.interpreter_earning, price);
    }

    /// Property: commission never exceeds the locked price
    #[test]
    fn prop_commission_bounded_by_price(
        price in price_strategy(),
        rate_bps in 0u64..=50_000u64
    ) {
        prop_assert!(commission(price, rate_bps) <= price);
    }

    /// Property: commission is monotonic in the rate
    #[test]
    fn prop_commission_monotonic_in_rate(
        price in price_strategy(),
        rate_a in rate_strategy(),
        rate_b in rate_strategy()
    ) {
        prop_assume!(rate_a <= rate_b);
        prop_assert!(commission(price, rate_a) <= commission(price, rate_b));
    }

    /// Property: a zero rate gives the whole price to the interpreter, a
    /// full rate gives it to the platform
    #[test]
    fn prop_rate_extremes(price in price_strategy()) {
        let zero = settle(price, 0);
        prop_assert_eq!(zero.platform_commission, 0);
        prop_assert_eq!(zero.interpreter_earning, price);

        let full = settle(price, BPS_DENOMINATOR);
        prop_assert_eq!(full.platform_commission, price);
        prop_assert_eq!(full.interpreter_earning, 0);
    }

    /// Property: any last-use on an earlier calendar day is available today,
    /// whatever the clock times involved
    #[test]
    fn prop_earlier_day_is_always_available(
        (year, month, day) in date_strategy(),
        (lh, lm, ls) in time_of_day_strategy(),
        (nh, nm, ns) in time_of_day_strategy()
    ) {
        let last = TimeStamp::new_with(year, month, day, lh, lm, ls);
        let now = TimeStamp::new_with(year, month, day + 1, nh, nm, ns);

        prop_assert!(free_gate(Some(&last), &now).is_daily_free_available);
    }

    /// Property: any same-day last-use blocks, and the next-free timestamp
    /// is the following UTC midnight
    #[test]
    fn prop_same_day_blocks_until_next_midnight(
        (year, month, day) in date_strategy(),
        (lh, lm, ls) in time_of_day_strategy(),
        (nh, nm, ns) in time_of_day_strategy()
    ) {
        let last = TimeStamp::new_with(year, month, day, lh, lm, ls);
        let now = TimeStamp::new_with(year, month, day, nh, nm, ns);

        let gate = free_gate(Some(&last), &now);
        prop_assert!(!gate.is_daily_free_available);

        let next = gate.next_free_at.unwrap().to_datetime_utc();
        prop_assert_eq!((next.hour(), next.minute(), next.second()), (0, 0, 0));
        prop_assert!(next > now.to_datetime_utc());
        prop_assert_eq!(
            next.num_days_from_ce(),
            now.to_datetime_utc().num_days_from_ce() + 1
        );
    }
}
