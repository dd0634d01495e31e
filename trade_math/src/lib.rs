//! # Trade Math
//!
//! Numeric primitives shared by the band-rebalancing simulator.
//!
//! - [`ladder`]: guarded ladder-step solve and geometric ladder prices
//! - [`compounding`]: annual-to-daily rate conversion and calendar-day compounding
//! - [`drawdown`]: running peak and maximum drawdown tracking
//! - [`rounding`]: display rounding for summary fields
//!
//! Everything here is a pure function of its inputs, so a single simulated day can
//! be recomputed without replaying history.

use thiserror::Error;

pub mod compounding;
pub mod drawdown;
pub mod ladder;
pub mod rounding;

pub use compounding::{compound, daily_rate, DAYS_PER_YEAR};
pub use drawdown::DrawdownTracker;
pub use ladder::{ladder_mean_price, ladder_price, ladder_step_count, LadderSide};
pub use rounding::{round2, round_to};

/// Errors that can occur in trading-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;
