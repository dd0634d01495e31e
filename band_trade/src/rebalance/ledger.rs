//! Per-day ledger, chart series and run summary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_math::round2;

/// Everything computed for one bar.
///
/// Values are kept at full precision; `cash + shares * close == asset` holds
/// exactly on every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Calendar days since the previous bar
    pub diff_days: i64,

    pub v_basis: f64,
    pub cur_upper: f64,
    pub cur_lower: f64,
    pub unit_shares: u64,

    /// Price at which the previous holding sat exactly on the previous lower band
    pub buy_anchor: f64,
    pub open_buy_count: u64,
    pub open_buy_qty: u64,
    pub open_buy_price: f64,
    pub low_buy_count: u64,
    pub low_buy_qty: u64,
    pub low_buy_price: f64,

    /// Price at which the previous holding sat exactly on the previous upper band
    pub sell_anchor: f64,
    pub open_sell_count: u64,
    pub open_sell_qty: u64,
    pub open_sell_price: f64,
    pub high_sell_count: u64,
    pub high_sell_qty: u64,
    pub high_sell_price: f64,

    /// Cash paid for buys, including the transaction cost
    pub buy_amount: f64,
    /// Cash received for sells
    pub sell_amount: f64,

    pub shares: u64,
    pub cash: f64,
    /// Market value of the holding at close
    pub evaluation: f64,
    pub asset: f64,
    pub total_purchase_amt: f64,
    pub average_price: f64,
    pub high_asset: f64,
    pub drawdown_pct: f64,
}

impl LedgerRow {
    pub fn bought(&self) -> u64 {
        self.open_buy_qty + self.low_buy_qty
    }

    pub fn sold(&self) -> u64 {
        self.open_sell_qty + self.high_sell_qty
    }
}

/// Series for plotting the bands against the holding value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub dates: Vec<NaiveDate>,
    pub v_basis: Vec<f64>,
    pub cur_upper: Vec<f64>,
    pub cur_lower: Vec<f64>,
    pub evaluation: Vec<f64>,
}

impl ChartSeries {
    pub fn from_rows(rows: &[LedgerRow]) -> Self {
        let mut chart = Self {
            dates: Vec::with_capacity(rows.len()),
            v_basis: Vec::with_capacity(rows.len()),
            cur_upper: Vec::with_capacity(rows.len()),
            cur_lower: Vec::with_capacity(rows.len()),
            evaluation: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            chart.dates.push(row.date);
            chart.v_basis.push(round2(row.v_basis));
            chart.cur_upper.push(round2(row.cur_upper));
            chart.cur_lower.push(round2(row.cur_lower));
            chart.evaluation.push(round2(row.evaluation));
        }
        chart
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Last ledger row of a run plus its maximum drawdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub last: LedgerRow,
    /// Most negative drawdown over the run, in percent (always `<= 0`)
    pub max_mdd_rate: f64,
}

impl Summary {
    pub fn end_date(&self) -> NaiveDate {
        self.last.date
    }

    /// Final asset, rounded for display
    pub fn end_asset(&self) -> f64 {
        round2(self.last.asset)
    }

    /// Stock share of the final asset in percent, rounded for display
    pub fn end_stock_rate(&self) -> f64 {
        if self.last.asset <= 0.0 {
            return 0.0;
        }
        round2(self.last.evaluation / self.last.asset * 100.0)
    }

    /// Average cost per held share, rounded for display
    pub fn average_price(&self) -> f64 {
        round2(self.last.average_price)
    }

    /// Maximum drawdown, rounded for display
    pub fn max_mdd_display(&self) -> f64 {
        round2(self.max_mdd_rate)
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Band Rebalancing Summary ({}):", self.end_date())?;
        writeln!(f, "  End Asset:      {:.2}", self.end_asset())?;
        writeln!(f, "  Shares:         {}", self.last.shares)?;
        writeln!(f, "  Cash:           {:.2}", self.last.cash)?;
        writeln!(f, "  Stock Rate:     {:.2}%", self.end_stock_rate())?;
        writeln!(f, "  Average Price:  {:.2}", self.average_price())?;
        writeln!(f, "  Max Drawdown:   {:.2}%", self.max_mdd_display())?;
        Ok(())
    }
}
