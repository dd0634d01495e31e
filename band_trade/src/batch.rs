//! Batch re-runs of the rebalance simulator over a window of start dates
//!
//! For every distinct trading date in the window the simulator runs from that
//! date to a common end date, and one summary row is persisted per run. Existing
//! rows for the same strategy and window are deleted first. The delete and the
//! inserts are not transactional; re-running the batch converges to the same
//! rows, so a crash mid-batch is repaired by running it again.

use crate::rebalance::{RebalanceSimulator, SimulationOutcome, StrategyParams, Summary};
use crate::storage::{PriceSource, SummaryStore};
use crate::TradeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// What to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub ticker: String,
    /// First candidate start date
    pub bulk_start: NaiveDate,
    /// Last candidate start date
    pub bulk_end: NaiveDate,
    /// Every run ends here
    pub target_end: NaiveDate,
    pub params: StrategyParams,
}

impl BatchRequest {
    pub fn strategy_code(&self) -> String {
        self.params.strategy_code(&self.ticker)
    }
}

/// One persisted summary per start date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResultRow {
    pub strategy_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub end_asset: f64,
    pub end_stock_rate: f64,
    pub max_mdd_rate: f64,
    pub average_price: f64,
}

impl BatchResultRow {
    pub fn from_summary(
        strategy_code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        summary: &Summary,
    ) -> Self {
        Self {
            strategy_code: strategy_code.to_string(),
            start_date,
            end_date,
            end_asset: summary.end_asset(),
            end_stock_rate: summary.end_stock_rate(),
            max_mdd_rate: summary.max_mdd_display(),
            average_price: summary.average_price(),
        }
    }
}

/// A start date whose run or insert failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub start_date: NaiveDate,
    pub message: String,
}

/// Outcome of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub strategy_code: String,
    /// Rows removed before the batch
    pub deleted: usize,
    /// Rows written
    pub persisted: usize,
    /// Start dates whose run had no bars
    pub skipped: Vec<NaiveDate>,
    pub failures: Vec<BatchFailure>,
}

/// Drives the simulator once per start date, strictly in order
pub struct BatchRunner<P, S> {
    prices: P,
    store: S,
}

impl<P: PriceSource, S: SummaryStore> BatchRunner<P, S> {
    pub fn new(prices: P, store: S) -> Self {
        Self { prices, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (P, S) {
        (self.prices, self.store)
    }

    /// Run the batch.
    ///
    /// Fails up front on invalid parameters, an inverted window, or when the
    /// window's trading dates or the pre-batch delete cannot be obtained. After
    /// that, per-date failures are recorded in the report and the loop moves on.
    pub fn run(&mut self, request: &BatchRequest) -> Result<BatchReport, TradeError> {
        if request.bulk_start > request.bulk_end {
            return Err(TradeError::InvalidParameter(format!(
                "Batch window start {} is after its end {}",
                request.bulk_start, request.bulk_end
            )));
        }

        let simulator = RebalanceSimulator::new(request.params)?;
        let strategy_code = request.strategy_code();

        let start_dates: BTreeSet<NaiveDate> = self
            .prices
            .fetch_bars(&request.ticker, request.bulk_start, request.bulk_end)?
            .into_iter()
            .map(|bar| bar.date)
            .collect();

        info!(
            strategy = %strategy_code,
            dates = start_dates.len(),
            bulk_start = %request.bulk_start,
            bulk_end = %request.bulk_end,
            "starting batch"
        );

        let deleted =
            self.store
                .delete_range(&strategy_code, request.bulk_start, request.bulk_end)?;

        let mut report = BatchReport {
            strategy_code: strategy_code.clone(),
            deleted,
            ..BatchReport::default()
        };

        for start_date in start_dates {
            let outcome = self
                .run_one(&simulator, request, &strategy_code, start_date)
                .and_then(|row| match row {
                    Some(row) => self.store.insert(row).map(|()| true),
                    None => Ok(false),
                });

            match outcome {
                Ok(true) => report.persisted += 1,
                Ok(false) => {
                    debug!(start = %start_date, "no bars for start date, skipping");
                    report.skipped.push(start_date);
                }
                Err(e) => {
                    warn!(start = %start_date, error = %e, "batch item failed");
                    report.failures.push(BatchFailure {
                        start_date,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            strategy = %strategy_code,
            persisted = report.persisted,
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "batch finished"
        );

        Ok(report)
    }

    fn run_one(
        &self,
        simulator: &RebalanceSimulator,
        request: &BatchRequest,
        strategy_code: &str,
        start_date: NaiveDate,
    ) -> Result<Option<BatchResultRow>, TradeError> {
        let bars = self
            .prices
            .fetch_bars(&request.ticker, start_date, request.target_end)?;

        match simulator.run(&bars)? {
            SimulationOutcome::EmptySeries => Ok(None),
            SimulationOutcome::Completed(result) => Ok(Some(BatchResultRow::from_summary(
                strategy_code,
                start_date,
                request.target_end,
                &result.summary,
            ))),
        }
    }
}
