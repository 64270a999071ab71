use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::errors::QuotationError;
use crate::tariff::rounding::floor_count;

/// Apportions `total` units across `weights` with the largest-remainder method.
///
/// Each slot first receives the floor of its exact share; the units left over go one at a
/// time to the slots with the largest fractional remainders, earlier slots winning ties.
/// The result always sums to `total`.
pub fn largest_remainder(total: u32, weights: &[Decimal]) -> Result<Vec<u32>, QuotationError> {
    if weights.is_empty() {
        return Err(QuotationError::invalid("weights", "[]", "no slots to allocate into"));
    }
    if let Some(negative) = weights.iter().find(|weight| **weight < Decimal::ZERO) {
        return Err(QuotationError::invalid("weights", negative, "weights must be >= 0"));
    }
    let weight_sum: Decimal = weights.iter().sum();
    if weight_sum <= Decimal::ZERO {
        return Err(QuotationError::invalid("weights", weight_sum, "weights must not all be zero"));
    }

    let total_units = Decimal::from(total);
    let shares: Vec<Decimal> =
        weights.iter().map(|weight| total_units * *weight / weight_sum).collect();
    let mut allocated: Vec<u32> = shares.iter().map(|share| floor_count(*share)).collect();

    let assigned: u32 = allocated.iter().sum();
    let remaining = total.saturating_sub(assigned) as usize;

    let mut order: Vec<(usize, Decimal)> = shares
        .iter()
        .zip(&allocated)
        .map(|(share, floor)| *share - Decimal::from(*floor))
        .enumerate()
        .collect();
    order.sort_by(|left, right| match right.1.cmp(&left.1) {
        Ordering::Equal => left.0.cmp(&right.0),
        other => other,
    });

    for (index, _) in order.into_iter().take(remaining) {
        allocated[index] += 1;
    }

    Ok(allocated)
}
