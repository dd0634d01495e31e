//! Compounding of a target allocation toward an annualized growth rate

use crate::{MathError, Result};

/// Calendar days used to de-annualize a rate
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Convert an annual growth rate into the equivalent daily compounding rate.
///
/// `(1 + annual)^(1/365) - 1`
pub fn daily_rate(annual: f64) -> Result<f64> {
    if !annual.is_finite() || annual <= -1.0 {
        return Err(MathError::InvalidInput(format!(
            "Annual rate must be finite and greater than -1, got {}",
            annual
        )));
    }
    Ok((1.0 + annual).powf(1.0 / DAYS_PER_YEAR) - 1.0)
}

/// Grow `value` by `daily_rate` over `days` calendar days.
///
/// Weekend and holiday gaps are absorbed by passing the full calendar distance
/// between two bars. Non-positive day counts leave the value unchanged.
pub fn compound(value: f64, daily_rate: f64, days: i64) -> f64 {
    if days <= 0 {
        return value;
    }
    value * (1.0 + daily_rate).powf(days as f64)
}
