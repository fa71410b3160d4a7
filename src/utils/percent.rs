use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Stored percentages carry two decimal places.
pub fn to_decimal(percent: f64) -> Decimal {
    Decimal::from_f64(percent)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Arithmetic mean rounded to storage precision; empty input yields zero.
pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().copied().sum();
    (sum / Decimal::from(values.len() as u64)).round_dp(2)
}
