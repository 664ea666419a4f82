//! Locked-price settlement math
//!
//! All money is integer cents. Commission and earning are computed exactly
//! once, at completion, from the order's locked price. The interpreter's
//! live rate never enters this calculation.

/// Platform commission rate in basis points (2000 = 20%)
pub const DEFAULT_COMMISSION_RATE_BPS: u64 = 2000;

pub const BPS_DENOMINATOR: u64 = 10_000;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub struct Settlement {
    #[n(0)]
    pub platform_commission: u64,
    #[n(1)]
    pub interpreter_earning: u64,
}

/// Floor of `locked_price * rate_bps / 10_000`. Rounding favors the
/// interpreter; commission + earning always equals the locked price.
pub fn commission(locked_price: u64, rate_bps: u64) -> u64 {
    // a misconfigured rate above 100% still cannot take more than the price
    (locked_price.saturating_mul(rate_bps) / BPS_DENOMINATOR).min(locked_price)
}

pub fn settle(locked_price: u64, rate_bps: u64) -> Settlement {
    let platform_commission = commission(locked_price, rate_bps);
    Settlement {
        platform_commission,
        interpreter_earning: locked_price - platform_commission,
    }
}
