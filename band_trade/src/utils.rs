//! Utility functions and helpers
//!
//! Parameter validation, synthetic price series for tests and examples, and CSV
//! export of ledgers and cycle rows.

use crate::cycle::CycleRow;
use crate::rebalance::LedgerRow;
use crate::{DailyBar, TradeError};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;

/// Validate a floating-point parameter is finite and positive
pub fn validate_positive(value: f64, name: &str) -> Result<(), TradeError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TradeError::InvalidParameter(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate a value is within an inclusive range
pub fn validate_range(value: f64, min: f64, max: f64, name: &str) -> Result<(), TradeError> {
    if !value.is_finite() || value < min || value > max {
        return Err(TradeError::InvalidParameter(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

fn first_test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default()
}

/// Generate a seeded random-walk daily series for testing purposes
///
/// Weekends are skipped so that the series has the calendar gaps real daily
/// data has.
///
/// # Arguments
/// * `num_points` - Number of bars to generate
/// * `starting_price` - Open of the first bar
/// * `volatility` - Price volatility factor (0.0-1.0)
/// * `seed` - RNG seed; the same seed always produces the same series
pub fn generate_test_data(
    num_points: usize,
    starting_price: f64,
    volatility: f64,
    seed: u64,
) -> Vec<DailyBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(num_points);
    let mut current_price = starting_price;

    for date in trading_days(first_test_date()).take(num_points) {
        let price_change = current_price * volatility * (rng.gen::<f64>() - 0.5);
        let open = current_price;
        // keep the walk strictly positive
        let close = (open + price_change).max(starting_price * 0.01);

        let high = open.max(close) + rng.gen::<f64>() * volatility * open * 0.5;
        let low = (open.min(close) - rng.gen::<f64>() * volatility * open * 0.5)
            .max(open.min(close) * 0.5);

        data.push(DailyBar::new(date, open, high, low, close));
        current_price = close;
    }

    data
}

/// A series whose open, high, low and close are all `price`
pub fn flat_series(num_points: usize, price: f64) -> Vec<DailyBar> {
    trading_days(first_test_date())
        .take(num_points)
        .map(|date| DailyBar::new(date, price, price, price, price))
        .collect()
}

/// Weekdays from `start` onward
pub fn trading_days(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    use chrono::{Datelike, Weekday};

    (0u64..)
        .filter_map(move |offset| start.checked_add_days(Days::new(offset)))
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
}

fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<(), TradeError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Export a simulation ledger to CSV, one row per trading day
pub fn write_ledger_csv<P: AsRef<Path>>(path: P, rows: &[LedgerRow]) -> Result<(), TradeError> {
    write_csv(path, rows)
}

/// Export cycle-annotated rows to CSV
pub fn write_cycle_csv<P: AsRef<Path>>(path: P, rows: &[CycleRow]) -> Result<(), TradeError> {
    write_csv(path, rows)
}
