//! Strategy parameters for band rebalancing

use crate::utils::{validate_positive, validate_range};
use crate::TradeError;
use serde::{Deserialize, Serialize};
use trade_math::round_to;

/// Immutable inputs of one simulation run.
///
/// Percentages are fractions: `0.15` means 15%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Starting capital
    pub init_cash: f64,
    /// Share of starting capital allocated to the stock on day 0
    pub init_stock_pct: f64,
    /// Annual growth rate of the target allocation
    pub target_annual_rate: f64,
    /// Upper band distance above the target allocation
    pub upper_band_pct: f64,
    /// Lower band distance below the target allocation
    pub lower_band_pct: f64,
    /// Ladder step between limit prices, and lot size as a share of holdings
    pub unit_gap_pct: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            init_cash: 10_000.0,
            init_stock_pct: 0.5,
            target_annual_rate: 0.10,
            upper_band_pct: 0.15,
            lower_band_pct: 0.15,
            unit_gap_pct: 0.10,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), TradeError> {
        validate_positive(self.init_cash, "init_cash")?;
        validate_range(self.init_stock_pct, f64::MIN_POSITIVE, 1.0, "init_stock_pct")?;
        if !self.target_annual_rate.is_finite() || self.target_annual_rate <= -1.0 {
            return Err(TradeError::InvalidParameter(format!(
                "target_annual_rate must be greater than -1, got {}",
                self.target_annual_rate
            )));
        }
        validate_positive(self.upper_band_pct, "upper_band_pct")?;
        validate_open_fraction(self.lower_band_pct, "lower_band_pct")?;
        validate_open_fraction(self.unit_gap_pct, "unit_gap_pct")?;
        Ok(())
    }

    /// Stable identifier of a ticker + parameter combination, used as the storage key
    pub fn strategy_code(&self, ticker: &str) -> String {
        format!(
            "{}-C{}-S{}-R{}-U{}-L{}-G{}",
            ticker.trim().to_uppercase(),
            round_to(self.init_cash, 2),
            pct_label(self.init_stock_pct),
            pct_label(self.target_annual_rate),
            pct_label(self.upper_band_pct),
            pct_label(self.lower_band_pct),
            pct_label(self.unit_gap_pct),
        )
    }
}

fn pct_label(fraction: f64) -> String {
    round_to(fraction * 100.0, 2).to_string()
}

/// Strictly between 0 and 1
fn validate_open_fraction(value: f64, name: &str) -> Result<(), TradeError> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(TradeError::InvalidParameter(format!(
            "{} must be between 0 and 1 (exclusive), got {}",
            name, value
        )));
    }
    Ok(())
}
