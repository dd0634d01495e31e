//! Pivot cycle tracking
//!
//! Classifies a daily series into alternating up and down regimes. Two pivots are
//! carried: a running max (the peak a drop is judged from) and a running min (the
//! trough a rise is judged from). A drop of `lower_pct` from the running max turns
//! the cycle down; a rise of `upper_pct` from the running min turns it up. Down is
//! checked before up.

use crate::bars::parse_raw_bars;
use crate::{DailyBar, RawBar, TradeError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Regime of the cycle state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CycleStatus {
    /// No threshold has been crossed yet
    #[default]
    Unset,
    /// Last crossing was a rise from the running min
    Up,
    /// Last crossing was a drop from the running max
    Down,
}

/// Percentage thresholds that flip the cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleThresholds {
    /// Rise from the running min that turns the cycle up, in percent
    pub upper_pct: f64,
    /// Drop from the running max that turns the cycle down, in percent
    pub lower_pct: f64,
}

impl Default for CycleThresholds {
    fn default() -> Self {
        Self {
            upper_pct: 30.0,
            lower_pct: 15.0,
        }
    }
}

impl CycleThresholds {
    pub fn validate(&self) -> Result<(), TradeError> {
        for (name, value) in [("upper_pct", self.upper_pct), ("lower_pct", self.lower_pct)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TradeError::InvalidParameter(format!(
                    "Cycle threshold {} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Flags produced by folding one bar into the state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Transition {
    turn_to_up: bool,
    turn_to_down: bool,
    renewed_high: bool,
    renewed_low: bool,
}

/// Pivot state carried from bar to bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleState {
    pub running_max: f64,
    pub running_min: f64,
    /// Highest high since the start filter; `None` before it
    pub historic_max: Option<f64>,
    pub status: CycleStatus,
}

impl CycleState {
    /// Seed both pivots from the first bar
    pub fn seed(bar: &DailyBar) -> Self {
        Self {
            running_max: bar.data.high,
            running_min: bar.data.low,
            historic_max: None,
            status: CycleStatus::Unset,
        }
    }

    fn advance(&mut self, bar: &DailyBar, thresholds: &CycleThresholds) -> Transition {
        let high = bar.data.high;
        let low = bar.data.low;

        // Both pivots are seeded from real, positive prices before first use.
        let judge_drop = (low - self.running_max) / self.running_max * 100.0;
        let judge_rise = (high - self.running_min) / self.running_min * 100.0;

        let mut flags = Transition::default();

        if self.status != CycleStatus::Down && judge_drop <= -thresholds.lower_pct {
            self.status = CycleStatus::Down;
            self.running_min = low;
            flags.turn_to_down = true;
        } else if self.status != CycleStatus::Up && judge_rise >= thresholds.upper_pct {
            self.status = CycleStatus::Up;
            self.running_max = high;
            flags.turn_to_up = true;
        } else {
            if high > self.running_max {
                self.running_max = high;
                flags.renewed_high = true;
            }
            if low < self.running_min {
                self.running_min = low;
                flags.renewed_low = true;
            }
        }

        flags
    }

    fn track_historic(&mut self, high: f64) -> f64 {
        let hmax = self.historic_max.map_or(high, |h| h.max(high));
        self.historic_max = Some(hmax);
        hmax
    }
}

/// One annotated output row per bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRow {
    pub date: NaiveDate,
    pub close: f64,
    pub historic_max: f64,
    /// Close relative to the historic max, in percent
    pub drop_from_hmax_pct: f64,
    pub running_max: f64,
    pub running_min: f64,
    pub close_from_rmax_pct: f64,
    pub close_from_rmin_pct: f64,
    /// Running min relative to running max, in percent
    pub min_from_rmax_pct: f64,
    /// Running max relative to running min, in percent
    pub max_from_rmin_pct: f64,
    pub renewed_high: bool,
    pub renewed_low: bool,
    pub turn_to_up: bool,
    pub turn_to_down: bool,
    pub cycle_status: CycleStatus,
}

fn pct_from(value: f64, base: f64) -> f64 {
    (value - base) / base * 100.0
}

/// Pivot cycle tracker over a daily series
#[derive(Debug, Clone, Default)]
pub struct CycleTracker {
    thresholds: CycleThresholds,
    start_filter: Option<NaiveDate>,
}

impl CycleTracker {
    /// Create a tracker with rise/drop thresholds in percent
    pub fn new(upper_pct: f64, lower_pct: f64) -> Result<Self, TradeError> {
        Self::with_thresholds(CycleThresholds {
            upper_pct,
            lower_pct,
        })
    }

    pub fn with_thresholds(thresholds: CycleThresholds) -> Result<Self, TradeError> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            start_filter: None,
        })
    }

    /// Only emit rows on or after `start`, and measure the historic max from there.
    ///
    /// Bars before `start` still drive the pivot state machine.
    pub fn with_start_filter(mut self, start: NaiveDate) -> Self {
        self.start_filter = Some(start);
        self
    }

    pub fn thresholds(&self) -> CycleThresholds {
        self.thresholds
    }

    /// Annotate parseable raw bars, dropping malformed ones
    pub fn track_raw(&self, raw: &[RawBar]) -> Vec<CycleRow> {
        self.track(&parse_raw_bars(raw))
    }

    /// Annotate ordered bars
    pub fn track(&self, bars: &[DailyBar]) -> Vec<CycleRow> {
        let Some(first) = bars.first() else {
            return Vec::new();
        };

        let mut state = CycleState::seed(first);
        let mut rows = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            let flags = if i == 0 {
                Transition::default()
            } else {
                state.advance(bar, &self.thresholds)
            };

            if self.start_filter.is_some_and(|start| bar.date < start) {
                continue;
            }

            let historic_max = state.track_historic(bar.data.high);
            let close = bar.data.close;

            rows.push(CycleRow {
                date: bar.date,
                close,
                historic_max,
                drop_from_hmax_pct: pct_from(close, historic_max),
                running_max: state.running_max,
                running_min: state.running_min,
                close_from_rmax_pct: pct_from(close, state.running_max),
                close_from_rmin_pct: pct_from(close, state.running_min),
                min_from_rmax_pct: pct_from(state.running_min, state.running_max),
                max_from_rmin_pct: pct_from(state.running_max, state.running_min),
                renewed_high: flags.renewed_high,
                renewed_low: flags.renewed_low,
                turn_to_up: flags.turn_to_up,
                turn_to_down: flags.turn_to_down,
                cycle_status: state.status,
            });
        }

        rows
    }
}
