//! Composite rate rule for Series I savings bonds
//!
//! composite = fixed + 2 × semiannual inflation + fixed × semiannual inflation,
//! rounded to the fourth decimal place and never below zero.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Decimal places kept on interest rates
pub const INTEREST_RATE_DIGITS: u32 = 4;

/// Combine a fixed rate and a semiannual inflation rate into the annual composite rate
pub fn compose(fixed_rate: Decimal, inflation_rate: Decimal) -> Decimal {
    let composite = (fixed_rate + dec!(2)) * inflation_rate + fixed_rate;

    if composite.is_sign_negative() {
        return Decimal::ZERO;
    }

    composite.round_dp_with_strategy(INTEREST_RATE_DIGITS, RoundingStrategy::MidpointNearestEven)
}

/// Round a raw rate value the way rates are kept
pub fn clean_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(INTEREST_RATE_DIGITS, RoundingStrategy::MidpointNearestEven)
}
