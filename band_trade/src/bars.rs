//! Price series parsing, loading and windowing
//!
//! Bars arrive from collaborators as loosely typed records. A record with an
//! unparsable date or price is dropped, never fatal: one bad row in a price feed
//! must not sink a whole backtest.

use crate::{DailyBar, TradeError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Date formats accepted for raw bars, tried in order
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// An unvalidated bar as delivered by a price feed or CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl RawBar {
    pub fn new(date: &str, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date: date.to_string(),
            open: open.to_string(),
            high: high.to_string(),
            low: low.to_string(),
            close: close.to_string(),
        }
    }

    /// Parse into a [`DailyBar`], or `None` if any field is malformed
    pub fn parse(&self) -> Option<DailyBar> {
        let date = parse_date(&self.date)?;
        let open = parse_price(&self.open)?;
        let high = parse_price(&self.high)?;
        let low = parse_price(&self.low)?;
        let close = parse_price(&self.close)?;
        Some(DailyBar::new(date, open, high, low, close))
    }
}

/// Parse a trading date in any of the accepted formats
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Prices must be finite and strictly positive
fn parse_price(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// Parse raw bars, silently dropping malformed ones.
///
/// Input order is preserved; no sorting is performed.
pub fn parse_raw_bars(raw: &[RawBar]) -> Vec<DailyBar> {
    raw.iter()
        .filter_map(|bar| {
            let parsed = bar.parse();
            if parsed.is_none() {
                debug!(date = %bar.date, "dropping malformed bar");
            }
            parsed
        })
        .collect()
}

/// Sort bars ascending by date and keep the first bar seen for each date
pub fn normalize(mut bars: Vec<DailyBar>) -> Vec<DailyBar> {
    bars.sort_by_key(|bar| bar.date);
    bars.dedup_by_key(|bar| bar.date);
    bars
}

/// Load daily bars from a CSV file.
///
/// The expected CSV format is:
/// `date,open,high,low,close[,volume]`
///
/// Extra columns are ignored. Rows that cannot be parsed are dropped. The result
/// is sorted ascending with one bar per date.
///
/// # Arguments
/// * `path` - Path to the CSV file
pub fn load_daily_bars<P: AsRef<Path>>(path: P) -> Result<Vec<DailyBar>, TradeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        TradeError::DataLoadError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let mut raw = Vec::new();
    for (i, record) in reader.deserialize::<RawBar>().enumerate() {
        match record {
            Ok(bar) => raw.push(bar),
            Err(e) => debug!(line = i + 2, error = %e, "skipping unreadable CSV row"),
        }
    }

    Ok(normalize(parse_raw_bars(&raw)))
}

/// Bars dated within `start..=end`.
///
/// `bars` must be sorted ascending by date.
pub fn window(bars: &[DailyBar], start: NaiveDate, end: NaiveDate) -> &[DailyBar] {
    let from = bars.partition_point(|bar| bar.date < start);
    let to = bars.partition_point(|bar| bar.date <= end);
    if from >= to {
        return &[];
    }
    &bars[from..to]
}
