//! The simulator's loop-carried state and its one-day transition

use super::ledger::LedgerRow;
use super::params::StrategyParams;
use crate::{DailyBar, TradeError};
use chrono::NaiveDate;
use tracing::debug;
use trade_math::{
    compound, ladder_mean_price, ladder_price, ladder_step_count, DrawdownTracker, LadderSide,
};

/// Transaction cost charged on buys only. Sell proceeds are not reduced.
pub const BUY_COST_RATE: f64 = 0.0007;

/// State threaded from one trading day to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimState {
    pub date: NaiveDate,
    /// Target allocation; only ever changed by compounding
    pub v_basis: f64,
    pub upper: f64,
    pub lower: f64,
    pub cash: f64,
    pub shares: u64,
    pub total_purchase_amt: f64,
    drawdown: DrawdownTracker,
}

/// Fills of one side of the book for one day
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SideFills {
    anchor: f64,
    open_count: u64,
    open_qty: u64,
    open_price: f64,
    ext_count: u64,
    ext_qty: u64,
    ext_price: f64,
    amount: f64,
}

impl SideFills {
    fn qty(&self) -> u64 {
        self.open_qty + self.ext_qty
    }
}

impl SimState {
    /// Day 0: split the starting capital and buy the initial position
    pub fn open(bar: &DailyBar, params: &StrategyParams) -> Result<(Self, LedgerRow), TradeError> {
        let close = bar.data.close;
        if !close.is_finite() || close <= 0.0 {
            return Err(TradeError::InvalidData(format!(
                "First close on {} must be positive, got {}",
                bar.date, close
            )));
        }

        let v_basis = params.init_cash * params.init_stock_pct;
        let cash = params.init_cash - v_basis;
        let shares = (v_basis / close).floor() as u64;
        let total_purchase_amt = shares as f64 * close;
        let asset = cash + shares as f64 * close;

        let state = Self {
            date: bar.date,
            v_basis,
            upper: v_basis * (1.0 + params.upper_band_pct),
            lower: v_basis * (1.0 - params.lower_band_pct),
            cash,
            shares,
            total_purchase_amt,
            drawdown: DrawdownTracker::new(asset),
        };

        let unit_shares = ((shares as f64 * params.unit_gap_pct).floor() as u64).max(1);
        let row = state.ledger_row(
            bar,
            0,
            unit_shares,
            SideFills::default(),
            SideFills::default(),
            0.0,
        );
        Ok((state, row))
    }

    /// Fold one more bar into the state.
    ///
    /// Pure: `self` is left untouched and the next state is returned with the
    /// bar's ledger row.
    pub fn step(
        &self,
        bar: &DailyBar,
        params: &StrategyParams,
        daily_rate: f64,
    ) -> Result<(Self, LedgerRow), TradeError> {
        let gap = params.unit_gap_pct;
        let prev_shares = self.shares;

        let diff_days = (bar.date - self.date).num_days();
        let v_basis = compound(self.v_basis, daily_rate, diff_days);
        let upper = v_basis * (1.0 + params.upper_band_pct);
        let lower = v_basis * (1.0 - params.lower_band_pct);
        let unit_shares = ((prev_shares as f64 * gap).floor() as u64).max(1);

        let buys = self.buy_side(bar, gap, unit_shares);
        let sells = self.sell_side(bar, gap, unit_shares);

        let bought = buys.qty();
        let sold = sells.qty();

        let shares = prev_shares - sold + bought;
        let cash = self.cash - buys.amount + sells.amount;

        let mut total_purchase_amt = self.total_purchase_amt;
        if sold > 0 {
            total_purchase_amt -= sold as f64 * (total_purchase_amt / prev_shares as f64);
        }
        total_purchase_amt += buys.amount;

        let asset = cash + shares as f64 * bar.data.close;
        if !asset.is_finite() || !v_basis.is_finite() {
            return Err(TradeError::CalculationError(format!(
                "Non-finite ledger value on {} (asset {}, v_basis {})",
                bar.date, asset, v_basis
            )));
        }

        if bought > 0 || sold > 0 {
            debug!(
                date = %bar.date,
                bought,
                sold,
                buy_amount = buys.amount,
                sell_amount = sells.amount,
                "band ladder filled"
            );
        }

        let mut drawdown = self.drawdown;
        let drawdown_pct = drawdown.update(asset);

        let next = Self {
            date: bar.date,
            v_basis,
            upper,
            lower,
            cash,
            shares,
            total_purchase_amt,
            drawdown,
        };

        let row = next.ledger_row(bar, diff_days, unit_shares, buys, sells, drawdown_pct);
        Ok((next, row))
    }

    /// Running peak of the asset
    pub fn high_asset(&self) -> f64 {
        self.drawdown.high_water()
    }

    /// Most negative drawdown so far, in percent
    pub fn max_mdd_rate(&self) -> f64 {
        self.drawdown.max_drawdown_pct()
    }

    /// Open buy on a gap below the previous lower band, then a deeper buy if the
    /// low walks further down the ladder. Both are limited by cash.
    fn buy_side(&self, bar: &DailyBar, gap: f64, unit_shares: u64) -> SideFills {
        let prev_shares = self.shares;
        if prev_shares == 0 {
            return SideFills::default();
        }

        let anchor = self.lower / prev_shares as f64;
        let unit_cost = 1.0 + BUY_COST_RATE;
        let mut fills = SideFills {
            anchor,
            ..SideFills::default()
        };
        let mut remaining_cash = self.cash;

        if prev_shares as f64 * bar.data.open < self.lower * (1.0 - gap) {
            fills.open_count = ladder_step_count(anchor, bar.data.open, gap, prev_shares);
            fills.open_price = bar.data.open;
            fills.open_qty = affordable(
                fills.open_count * unit_shares,
                bar.data.open * unit_cost,
                remaining_cash,
            );
            let paid = fills.open_qty as f64 * bar.data.open * unit_cost;
            remaining_cash -= paid;
            fills.amount += paid;
        }

        let next_rung = ladder_price(anchor, gap, fills.open_count + 1, LadderSide::Buy);
        if bar.data.low < next_rung {
            let residual = ladder_price(anchor, gap, fills.open_count, LadderSide::Buy);
            fills.ext_count = ladder_step_count(residual, bar.data.low, gap, prev_shares);
            if let Some(price) =
                ladder_mean_price(anchor, gap, fills.open_count, fills.ext_count, LadderSide::Buy)
            {
                fills.ext_price = price;
                fills.ext_qty = affordable(
                    fills.ext_count * unit_shares,
                    price * unit_cost,
                    remaining_cash,
                );
                fills.amount += fills.ext_qty as f64 * price * unit_cost;
            }
        }

        fills
    }

    /// Mirror of [`Self::buy_side`] against the upper band, limited by shares held
    fn sell_side(&self, bar: &DailyBar, gap: f64, unit_shares: u64) -> SideFills {
        let prev_shares = self.shares;
        if prev_shares == 0 {
            return SideFills::default();
        }

        let anchor = self.upper / prev_shares as f64;
        let mut fills = SideFills {
            anchor,
            ..SideFills::default()
        };
        let mut remaining_shares = prev_shares;

        if prev_shares as f64 * bar.data.open > self.upper * (1.0 + gap) {
            fills.open_count = ladder_step_count(bar.data.open, anchor, gap, prev_shares);
            fills.open_price = bar.data.open;
            fills.open_qty = (fills.open_count * unit_shares).min(remaining_shares);
            remaining_shares -= fills.open_qty;
            fills.amount += fills.open_qty as f64 * bar.data.open;
        }

        let next_rung = ladder_price(anchor, gap, fills.open_count + 1, LadderSide::Sell);
        if bar.data.high > next_rung {
            let residual = ladder_price(anchor, gap, fills.open_count, LadderSide::Sell);
            fills.ext_count = ladder_step_count(bar.data.high, residual, gap, prev_shares);
            if let Some(price) =
                ladder_mean_price(anchor, gap, fills.open_count, fills.ext_count, LadderSide::Sell)
            {
                fills.ext_price = price;
                fills.ext_qty = (fills.ext_count * unit_shares).min(remaining_shares);
                fills.amount += fills.ext_qty as f64 * price;
            }
        }

        fills
    }

    fn ledger_row(
        &self,
        bar: &DailyBar,
        diff_days: i64,
        unit_shares: u64,
        buys: SideFills,
        sells: SideFills,
        drawdown_pct: f64,
    ) -> LedgerRow {
        let close = bar.data.close;
        let evaluation = self.shares as f64 * close;
        let average_price = if self.shares > 0 {
            self.total_purchase_amt / self.shares as f64
        } else {
            0.0
        };

        LedgerRow {
            date: bar.date,
            open: bar.data.open,
            high: bar.data.high,
            low: bar.data.low,
            close,
            diff_days,
            v_basis: self.v_basis,
            cur_upper: self.upper,
            cur_lower: self.lower,
            unit_shares,
            buy_anchor: buys.anchor,
            open_buy_count: buys.open_count,
            open_buy_qty: buys.open_qty,
            open_buy_price: buys.open_price,
            low_buy_count: buys.ext_count,
            low_buy_qty: buys.ext_qty,
            low_buy_price: buys.ext_price,
            sell_anchor: sells.anchor,
            open_sell_count: sells.open_count,
            open_sell_qty: sells.open_qty,
            open_sell_price: sells.open_price,
            high_sell_count: sells.ext_count,
            high_sell_qty: sells.ext_qty,
            high_sell_price: sells.ext_price,
            buy_amount: buys.amount,
            sell_amount: sells.amount,
            shares: self.shares,
            cash: self.cash,
            evaluation,
            asset: self.cash + evaluation,
            total_purchase_amt: self.total_purchase_amt,
            average_price,
            high_asset: self.high_asset(),
            drawdown_pct,
        }
    }
}

/// Largest quantity up to `wanted` whose cost at `unit_cost` fits in `cash`
fn affordable(wanted: u64, unit_cost: f64, cash: f64) -> u64 {
    if wanted == 0 || !unit_cost.is_finite() || unit_cost <= 0.0 || cash <= 0.0 {
        return 0;
    }
    let mut qty = wanted.min((cash / unit_cost).floor() as u64);
    if qty > 0 && qty as f64 * unit_cost > cash {
        qty -= 1;
    }
    qty
}
