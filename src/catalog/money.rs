//! Conversions between caller-facing decimal amounts and stored minor units (kobo, cents).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

const MINOR_UNIT_SCALE: u32 = 2;

/// Round half away from zero at 2 decimal places and scale to minor units.
/// Negative or out-of-range amounts have no minor-unit representation.
pub fn to_minor_units(amount: Decimal) -> Option<u64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    let rounded = amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::ONE_HUNDRED).to_u64()
}

pub fn from_minor_units(minor: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(minor), MINOR_UNIT_SCALE)
}

/// Lenient numeric read of a JSON number or numeric string.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Minor units of an optional upstream decimal field; zero when absent or not numeric.
pub fn minor_units_from_value(value: Option<&Value>) -> u64 {
    value
        .and_then(decimal_from_value)
        .and_then(to_minor_units)
        .unwrap_or(0)
}
