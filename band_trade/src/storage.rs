//! Collaborator seams: where bars come from and where batch summaries go
//!
//! The core never talks to a market-data service or a database directly. It
//! reads through a [`PriceSource`] and writes through a [`SummaryStore`]; the
//! in-memory and CSV implementations here back the CLI and the tests.

use crate::bars::{load_daily_bars, normalize, window};
use crate::batch::BatchResultRow;
use crate::{DailyBar, TradeError};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Supplies ordered daily bars for a ticker
pub trait PriceSource {
    /// Bars dated within `start..=end`, ascending, one per date
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, TradeError>;
}

/// Persists batch summary rows keyed by strategy code and start date
pub trait SummaryStore {
    /// Remove rows for `strategy_code` whose start date lies in `start..=end`.
    /// Returns how many rows were removed.
    fn delete_range(
        &mut self,
        strategy_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, TradeError>;

    fn insert(&mut self, row: BatchResultRow) -> Result<(), TradeError>;
}

impl<T: PriceSource + ?Sized> PriceSource for &T {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, TradeError> {
        (**self).fetch_bars(ticker, start, end)
    }
}

impl<T: SummaryStore + ?Sized> SummaryStore for &mut T {
    fn delete_range(
        &mut self,
        strategy_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, TradeError> {
        (**self).delete_range(strategy_code, start, end)
    }

    fn insert(&mut self, row: BatchResultRow) -> Result<(), TradeError> {
        (**self).insert(row)
    }
}

fn ticker_key(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn in_range(row: &BatchResultRow, strategy_code: &str, start: NaiveDate, end: NaiveDate) -> bool {
    row.strategy_code == strategy_code && row.start_date >= start && row.start_date <= end
}

/// Price series held in memory, keyed by upper-cased ticker
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    series: HashMap<String, Vec<DailyBar>>,
}

impl MemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series; bars are sorted and de-duplicated by date
    pub fn insert(&mut self, ticker: &str, bars: Vec<DailyBar>) {
        self.series.insert(ticker_key(ticker), normalize(bars));
    }

    pub fn with_series(mut self, ticker: &str, bars: Vec<DailyBar>) -> Self {
        self.insert(ticker, bars);
        self
    }
}

impl PriceSource for MemoryPriceSource {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, TradeError> {
        let bars = self
            .series
            .get(&ticker_key(ticker))
            .ok_or_else(|| TradeError::PriceSource(format!("Unknown ticker {}", ticker)))?;
        Ok(window(bars, start, end).to_vec())
    }
}

/// One CSV file per ticker (`<dir>/<TICKER>.csv`), re-read on every fetch
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker_key(ticker)))
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, TradeError> {
        let bars = load_daily_bars(self.path_for(ticker))
            .map_err(|e| TradeError::PriceSource(e.to_string()))?;
        Ok(window(&bars, start, end).to_vec())
    }
}

/// Summary rows kept in memory in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Vec<BatchResultRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[BatchResultRow] {
        &self.rows
    }
}

impl SummaryStore for MemoryStore {
    fn delete_range(
        &mut self,
        strategy_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, TradeError> {
        let before = self.rows.len();
        self.rows.retain(|row| !in_range(row, strategy_code, start, end));
        Ok(before - self.rows.len())
    }

    fn insert(&mut self, row: BatchResultRow) -> Result<(), TradeError> {
        self.rows.push(row);
        Ok(())
    }
}

/// Summary rows in a single CSV file.
///
/// Deletes rewrite the file without the matching rows; inserts append.
#[derive(Debug, Clone)]
pub struct CsvSummaryStore {
    path: PathBuf,
}

impl CsvSummaryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All persisted rows; a missing file reads as empty
    pub fn read_all(&self) -> Result<Vec<BatchResultRow>, TradeError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(storage_error)?;
        reader
            .deserialize()
            .collect::<Result<Vec<BatchResultRow>, csv::Error>>()
            .map_err(storage_error)
    }

    fn is_empty_file(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true)
    }
}

fn storage_error<E: std::fmt::Display>(err: E) -> TradeError {
    TradeError::Storage(err.to_string())
}

impl SummaryStore for CsvSummaryStore {
    fn delete_range(
        &mut self,
        strategy_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, TradeError> {
        let rows = self.read_all()?;
        let before = rows.len();
        let kept: Vec<BatchResultRow> = rows
            .into_iter()
            .filter(|row| !in_range(row, strategy_code, start, end))
            .collect();
        let removed = before - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let file = File::create(&self.path).map_err(storage_error)?;
        let mut writer = csv::Writer::from_writer(file);
        for row in &kept {
            writer.serialize(row).map_err(storage_error)?;
        }
        writer.flush().map_err(storage_error)?;
        Ok(removed)
    }

    fn insert(&mut self, row: BatchResultRow) -> Result<(), TradeError> {
        let write_header = self.is_empty_file();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(storage_error)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(&row).map_err(storage_error)?;
        writer.flush().map_err(storage_error)?;
        Ok(())
    }
}
