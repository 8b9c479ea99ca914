//! Money calculation utilities using rust_decimal for precision
//!
//! All stake and commission arithmetic is done with `Decimal` internally,
//! then converted to `f64` for storage/serialization, rounded to 2 decimal
//! places with half-up semantics.

use crate::error::SaleError;
use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed stake per play
const MAX_STAKE: f64 = 1_000_000.0;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Commission amount for a play: stake * percent / 100, rounded half-up.
pub fn commission_amount(stake: f64, percent: f64) -> f64 {
    to_f64(to_decimal(stake) * to_decimal(percent) / Decimal::ONE_HUNDRED)
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), SaleError> {
    if !value.is_finite() {
        return Err(SaleError::InvalidPlay(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a play stake: finite, positive, within bounds.
pub fn validate_stake(amount: f64) -> Result<(), SaleError> {
    require_finite(amount, "amount")?;
    if amount <= 0.0 {
        return Err(SaleError::InvalidPlay(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    if amount > MAX_STAKE {
        return Err(SaleError::InvalidPlay(format!(
            "amount exceeds maximum allowed ({}), got {}",
            MAX_STAKE, amount
        )));
    }
    Ok(())
}

/// Validate a wagered number: exactly two ASCII digits ("00".."99").
pub fn validate_number(number: &str) -> Result<(), SaleError> {
    if number.len() != 2 || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SaleError::InvalidPlay(format!(
            "number must be two digits (\"00\"..\"99\"), got {:?}",
            number
        )));
    }
    Ok(())
}

/// Sum play stakes exactly and compare against the declared ticket total.
pub fn check_total(stakes: &[f64], declared_total: f64) -> Result<(), SaleError> {
    let sum: Decimal = stakes.iter().map(|a| to_decimal(*a)).sum();
    if to_f64(sum) != to_f64(to_decimal(declared_total)) {
        return Err(SaleError::InvalidPlay(format!(
            "play amounts sum to {} but ticket total is {}",
            to_f64(sum),
            declared_total
        )));
    }
    Ok(())
}
