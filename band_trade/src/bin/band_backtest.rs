use band_trade::utils::{generate_test_data, write_cycle_csv, write_ledger_csv};
use band_trade::{
    load_daily_bars, window, BacktestConfig, BatchRequest, BatchRunner, CsvSummaryStore,
    CycleTracker, DailyBar, MemoryPriceSource, RebalanceSimulator, SimulationOutcome, TradeError,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Cycle tracking and band-rebalancing backtests over daily bars
#[derive(Parser, Debug)]
#[command(name = "band_backtest", version)]
struct Cli {
    /// JSON config file; BAND_* environment variables are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bars CSV (date,open,high,low,close). Defaults to <data_dir>/<TICKER>.csv
    #[arg(long)]
    data: Option<PathBuf>,

    /// Use a seeded synthetic series of this many bars instead of a CSV
    #[arg(long)]
    synthetic: Option<usize>,

    #[arg(long)]
    ticker: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate the series with pivot cycle regimes
    Cycle {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        upper: Option<f64>,
        #[arg(long)]
        lower: Option<f64>,
        /// Write the annotated rows to this CSV
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run one band-rebalancing simulation
    Simulate {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Write the full ledger to this CSV
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Re-run the simulation for every start date in a window
    Batch {
        #[arg(long)]
        bulk_start: Option<NaiveDate>,
        #[arg(long)]
        bulk_end: Option<NaiveDate>,
        #[arg(long)]
        target_end: Option<NaiveDate>,
        /// Summary store CSV. Defaults to <output_dir>/batch_results.csv
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

fn load_bars(cli: &Cli, config: &BacktestConfig) -> Result<Vec<DailyBar>, TradeError> {
    if let Some(points) = cli.synthetic {
        return Ok(generate_test_data(points, 100.0, 0.05, 7));
    }
    let path = cli.data.clone().unwrap_or_else(|| {
        config
            .data_dir
            .join(format!("{}.csv", config.ticker.trim().to_uppercase()))
    });
    info!(path = %path.display(), "loading bars");
    load_daily_bars(path)
}

fn required(
    value: Option<NaiveDate>,
    fallback: Option<NaiveDate>,
    name: &str,
) -> Result<NaiveDate, TradeError> {
    value
        .or(fallback)
        .ok_or_else(|| TradeError::InvalidParameter(format!("{} is required", name)))
}

fn run(cli: Cli) -> Result<(), TradeError> {
    let mut config = match &cli.config {
        Some(path) => BacktestConfig::from_json_file(path)?,
        None => BacktestConfig::from_env(),
    };
    if let Some(ticker) = &cli.ticker {
        config.ticker = ticker.clone();
    }
    config.validate()?;

    let bars = load_bars(&cli, &config)?;
    info!(bars = bars.len(), ticker = %config.ticker, "bars ready");

    match cli.command {
        Command::Cycle {
            start,
            upper,
            lower,
            out,
        } => {
            let mut tracker = CycleTracker::new(
                upper.unwrap_or(config.cycle.upper_pct),
                lower.unwrap_or(config.cycle.lower_pct),
            )?;
            if let Some(start) = start {
                tracker = tracker.with_start_filter(start);
            }
            let rows = tracker.track(&bars);
            let turns = rows.iter().filter(|r| r.turn_to_up || r.turn_to_down).count();

            println!("Cycle Tracking: {}", config.ticker);
            println!("  Rows:   {}", rows.len());
            println!("  Turns:  {}", turns);
            if let Some(last) = rows.last() {
                println!("  Status: {:?} as of {}", last.cycle_status, last.date);
                println!("  Drop from historic max: {:.2}%", last.drop_from_hmax_pct);
            }
            if let Some(out) = out {
                write_cycle_csv(&out, &rows)?;
                println!("  Exported cycle rows to {}", out.display());
            }
        }
        Command::Simulate { start, end, out } => {
            let start = start.or_else(|| bars.first().map(|b| b.date));
            let end = end.or_else(|| bars.last().map(|b| b.date));
            let slice = match (start, end) {
                (Some(start), Some(end)) => window(&bars, start, end),
                _ => &bars[..],
            };

            let simulator = RebalanceSimulator::new(config.params)?;
            match simulator.run(slice)? {
                SimulationOutcome::EmptySeries => println!("No bars in the requested range"),
                SimulationOutcome::Completed(result) => {
                    print!("{}", result.summary);
                    if let Some(out) = out {
                        write_ledger_csv(&out, &result.rows)?;
                        println!("  Exported ledger to {}", out.display());
                    }
                }
            }
        }
        Command::Batch {
            bulk_start,
            bulk_end,
            target_end,
            store,
        } => {
            let request = BatchRequest {
                ticker: config.ticker.clone(),
                bulk_start: required(bulk_start, config.bulk_start, "bulk_start")?,
                bulk_end: required(bulk_end, config.bulk_end, "bulk_end")?,
                target_end: required(target_end, config.target_end, "target_end")?,
                params: config.params,
            };

            let store_path = match store {
                Some(path) => path,
                None => {
                    fs::create_dir_all(&config.output_dir)?;
                    config.output_dir.join("batch_results.csv")
                }
            };

            let prices = MemoryPriceSource::new().with_series(&config.ticker, bars);
            let mut runner = BatchRunner::new(prices, CsvSummaryStore::new(&store_path));
            let report = runner.run(&request)?;

            println!("Batch: {}", report.strategy_code);
            println!("  Replaced:  {}", report.deleted);
            println!("  Persisted: {}", report.persisted);
            println!("  Skipped:   {}", report.skipped.len());
            println!("  Failed:    {}", report.failures.len());
            for failure in &report.failures {
                println!("    {}: {}", failure.start_date, failure.message);
            }
            println!("  Results in {}", store_path.display());
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse())?;
    Ok(())
}
