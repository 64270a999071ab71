//! Rounding helpers matching the spreadsheet's `ROUND`/`ROUNDUP` cell semantics.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to a whole number, halves away from zero.
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_count(value: Decimal) -> u32 {
    to_count(round_whole(value))
}

pub fn ceil_count(value: Decimal) -> u32 {
    to_count(value.ceil())
}

pub fn floor_count(value: Decimal) -> u32 {
    to_count(value.floor())
}

fn to_count(value: Decimal) -> u32 {
    if value <= Decimal::ZERO {
        return 0;
    }
    value.to_u32().unwrap_or(u32::MAX)
}

/// `numerator / denominator`, or zero when the denominator is not positive.
pub fn guarded_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator / denominator
}
