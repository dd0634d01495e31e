//! Band rebalancing simulation
//!
//! A target allocation (`v_basis`) compounds daily toward an annual rate. Bands
//! sit a fixed percentage above and below it. When the holding's value opens
//! outside a band, or the day's range walks through the limit-order ladder laid
//! out beyond it, whole lots are bought below the lower band or sold above the
//! upper band. Every day produces a [`LedgerRow`].

mod ledger;
mod params;
mod state;

pub use ledger::{ChartSeries, LedgerRow, Summary};
pub use params::StrategyParams;
pub use state::{SimState, BUY_COST_RATE};

use crate::{DailyBar, TradeError};
use trade_math::daily_rate;

/// Full output of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub rows: Vec<LedgerRow>,
    pub chart: ChartSeries,
    pub summary: Summary,
}

/// A run either completes or finds nothing to simulate
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    Completed(SimulationResult),
    /// No bars were supplied
    EmptySeries,
}

impl SimulationOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, SimulationOutcome::EmptySeries)
    }

    pub fn into_result(self) -> Option<SimulationResult> {
        match self {
            SimulationOutcome::Completed(result) => Some(result),
            SimulationOutcome::EmptySeries => None,
        }
    }
}

/// Runs the band strategy over an ordered daily series
#[derive(Debug, Clone)]
pub struct RebalanceSimulator {
    params: StrategyParams,
    daily_rate: f64,
}

impl RebalanceSimulator {
    pub fn new(params: StrategyParams) -> Result<Self, TradeError> {
        params.validate()?;
        let daily_rate = daily_rate(params.target_annual_rate)?;
        Ok(Self { params, daily_rate })
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Daily compounding rate equivalent to the annual target rate
    pub fn daily_rate(&self) -> f64 {
        self.daily_rate
    }

    /// Simulate from the first bar to the last.
    ///
    /// `bars` must already be windowed to the desired start date and sorted
    /// ascending.
    pub fn run(&self, bars: &[DailyBar]) -> Result<SimulationOutcome, TradeError> {
        let Some((first, rest)) = bars.split_first() else {
            return Ok(SimulationOutcome::EmptySeries);
        };

        let mut rows = Vec::with_capacity(bars.len());
        let (mut state, row) = SimState::open(first, &self.params)?;
        rows.push(row);

        for bar in rest {
            let (next, row) = state.step(bar, &self.params, self.daily_rate)?;
            state = next;
            rows.push(row);
        }

        let chart = ChartSeries::from_rows(&rows);
        let summary = Summary {
            last: rows[rows.len() - 1].clone(),
            max_mdd_rate: state.max_mdd_rate(),
        };

        Ok(SimulationOutcome::Completed(SimulationResult {
            rows,
            chart,
            summary,
        }))
    }
}
