//! # Band Trade
//!
//! `band_trade` runs two stateful reductions over an ordered daily price series:
//!
//! - **Cycle tracking**: classifies a series into alternating up/down regimes around
//!   running pivot extremes ([`CycleTracker`])
//! - **Band rebalancing**: simulates a laddered buy/sell strategy around a target
//!   allocation that compounds toward an annual rate ([`RebalanceSimulator`])
//!
//! plus a [`BatchRunner`] that re-runs the simulator for every start date in a window
//! and persists one summary row per run through a [`SummaryStore`].
//!
//! ## Usage Example
//!
//! ```no_run
//! use band_trade::{RebalanceSimulator, SimulationOutcome, StrategyParams};
//! use band_trade::utils::generate_test_data;
//!
//! let bars = generate_test_data(250, 100.0, 0.04, 7);
//! let simulator = RebalanceSimulator::new(StrategyParams::default()).unwrap();
//!
//! match simulator.run(&bars).unwrap() {
//!     SimulationOutcome::Completed(result) => {
//!         println!("End asset: {}", result.summary.end_asset());
//!         println!("Max drawdown: {:.2}%", result.summary.max_mdd_rate);
//!     }
//!     SimulationOutcome::EmptySeries => println!("no data"),
//! }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bars;
pub mod batch;
pub mod config;
pub mod cycle;
pub mod rebalance;
pub mod storage;
pub mod utils;

pub use bars::{load_daily_bars, parse_raw_bars, window, RawBar};
pub use batch::{BatchFailure, BatchReport, BatchRequest, BatchResultRow, BatchRunner};
pub use config::BacktestConfig;
pub use cycle::{CycleRow, CycleState, CycleStatus, CycleThresholds, CycleTracker};
pub use rebalance::{
    ChartSeries, LedgerRow, RebalanceSimulator, SimState, SimulationOutcome, SimulationResult,
    StrategyParams, Summary, BUY_COST_RATE,
};
pub use storage::{
    CsvPriceSource, CsvSummaryStore, MemoryPriceSource, MemoryStore, PriceSource, SummaryStore,
};

/// Errors that can occur in cycle tracking, simulation and batch operations
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Strategy calculation error: {0}")]
    CalculationError(String),

    #[error("Data loading error: {0}")]
    DataLoadError(String),

    #[error("Price source error: {0}")]
    PriceSource(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Math error: {0}")]
    Math(#[from] trade_math::MathError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Open, high, low and close prices for one trading day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcData {
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
}

/// Daily OHLC bar with a date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Trading date
    pub date: NaiveDate,
    /// Prices for the day
    pub data: OhlcData,
}

impl DailyBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            data: OhlcData {
                open,
                high,
                low,
                close,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_data() -> Vec<DailyBar> {
        vec![
            DailyBar::new(
                NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
                100.0,
                105.0,
                99.0,
                102.0,
            ),
            DailyBar::new(
                NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
                102.0,
                106.0,
                101.0,
                105.0,
            ),
        ]
    }

    #[test]
    fn test_daily_bar_creation() {
        let data = create_test_data();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].data.close, 102.0);
        assert!(data[1].date > data[0].date);
    }

    #[test]
    fn test_error_display() {
        let err = TradeError::InvalidParameter("unit gap must be below 1".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: unit gap must be below 1");

        let math = trade_math::MathError::InvalidInput("bad rate".to_string());
        let err = TradeError::from(math);
        assert!(matches!(err, TradeError::Math(_)));
        assert!(err.to_string().contains("bad rate"));
    }
}
