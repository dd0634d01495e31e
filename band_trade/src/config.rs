//! Backtest configuration
//!
//! Loaded from a JSON file or from `BAND_*` environment variables. Unset or
//! unparsable variables fall back to the defaults.

use crate::bars::parse_date;
use crate::cycle::CycleThresholds;
use crate::rebalance::StrategyParams;
use crate::TradeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub ticker: String,
    /// Directory holding one `<TICKER>.csv` per ticker
    pub data_dir: PathBuf,
    /// Where ledgers, cycle rows and batch summaries are written
    pub output_dir: PathBuf,
    pub params: StrategyParams,
    pub cycle: CycleThresholds,
    pub bulk_start: Option<NaiveDate>,
    pub bulk_end: Option<NaiveDate>,
    pub target_end: Option<NaiveDate>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            ticker: "SPY".to_string(),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            params: StrategyParams::default(),
            cycle: CycleThresholds::default(),
            bulk_start: None,
            bulk_end: None,
            target_end: None,
        }
    }
}

impl BacktestConfig {
    /// Read a JSON config file; missing keys take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TradeError> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            TradeError::DataLoadError(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let defaults = Self::default();
        let p = defaults.params;

        Self {
            ticker: env.string("BAND_TICKER", &defaults.ticker),
            data_dir: PathBuf::from(env.string("BAND_DATA_DIR", "data")),
            output_dir: PathBuf::from(env.string("BAND_OUTPUT_DIR", "output")),
            params: StrategyParams {
                init_cash: env.f64("BAND_INIT_CASH", p.init_cash),
                init_stock_pct: env.f64("BAND_INIT_STOCK_PCT", p.init_stock_pct),
                target_annual_rate: env.f64("BAND_TARGET_RATE", p.target_annual_rate),
                upper_band_pct: env.f64("BAND_UPPER_PCT", p.upper_band_pct),
                lower_band_pct: env.f64("BAND_LOWER_PCT", p.lower_band_pct),
                unit_gap_pct: env.f64("BAND_UNIT_GAP_PCT", p.unit_gap_pct),
            },
            cycle: CycleThresholds {
                upper_pct: env.f64("BAND_CYCLE_UPPER", defaults.cycle.upper_pct),
                lower_pct: env.f64("BAND_CYCLE_LOWER", defaults.cycle.lower_pct),
            },
            bulk_start: env.date("BAND_BULK_START"),
            bulk_end: env.date("BAND_BULK_END"),
            target_end: env.date("BAND_TARGET_END"),
        }
    }

    pub fn validate(&self) -> Result<(), TradeError> {
        if self.ticker.trim().is_empty() {
            return Err(TradeError::InvalidParameter(
                "Ticker must not be empty".to_string(),
            ));
        }
        self.params.validate()?;
        self.cycle.validate()?;
        Ok(())
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn f64(&self, name: &str, default: f64) -> f64 {
        self.raw(name)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    fn date(&self, name: &str) -> Option<NaiveDate> {
        self.raw(name).and_then(|s| parse_date(&s))
    }
}
