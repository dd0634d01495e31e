//! # Stock Bands
//!
//! `stock_bands` bundles the workspace crates behind one dependency:
//!
//! - [`band_trade`]: cycle tracking, band-rebalancing simulation and batch runs
//! - [`trade_math`]: ladder solves, compounding and drawdown primitives
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use stock_bands::{DailyBar, RebalanceSimulator, StrategyParams};
//!
//! let bar = DailyBar::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
//!     100.0,
//!     100.0,
//!     100.0,
//!     100.0,
//! );
//! let params = StrategyParams {
//!     init_cash: 1000.0,
//!     init_stock_pct: 0.5,
//!     ..StrategyParams::default()
//! };
//!
//! let result = RebalanceSimulator::new(params)
//!     .unwrap()
//!     .run(&[bar])
//!     .unwrap()
//!     .into_result()
//!     .unwrap();
//!
//! let day0 = &result.rows[0];
//! assert_eq!(day0.v_basis, 500.0);
//! assert_eq!(day0.cash, 500.0);
//! assert_eq!(day0.shares, 5);
//! ```

pub use band_trade;
pub use trade_math;

pub use band_trade::{
    BacktestConfig, BatchReport, BatchRequest, BatchResultRow, BatchRunner, CycleRow,
    CycleStatus, CycleThresholds, CycleTracker, DailyBar, LedgerRow, OhlcData, PriceSource,
    RawBar, RebalanceSimulator, SimulationOutcome, SimulationResult, StrategyParams,
    SummaryStore, TradeError,
};
