//! Band Comparison Example
//!
//! This example demonstrates how to:
//! 1. Run the band-rebalancing simulator with several band widths
//! 2. Compare end asset, stock weight and drawdown on the same series
//! 3. Line the trades up against the pivot cycle regimes

use band_trade::utils::generate_test_data;
use band_trade::{CycleStatus, CycleTracker, RebalanceSimulator, SimulationOutcome, StrategyParams};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating test data...");
    let data = generate_test_data(500, 100.0, 0.06, 21);

    println!("\nBand Width Comparison:");
    println!("----------------------");
    for band in [0.05, 0.10, 0.15, 0.25] {
        let params = StrategyParams {
            upper_band_pct: band,
            lower_band_pct: band,
            ..StrategyParams::default()
        };
        let simulator = RebalanceSimulator::new(params)?;

        let SimulationOutcome::Completed(result) = simulator.run(&data)? else {
            continue;
        };
        let trades = result
            .rows
            .iter()
            .filter(|r| r.bought() > 0 || r.sold() > 0)
            .count();

        println!(
            "{}: end asset {:.2}, stock {:.2}%, max drawdown {:.2}%, {} trading days",
            params.strategy_code("DEMO"),
            result.summary.end_asset(),
            result.summary.end_stock_rate(),
            result.summary.max_mdd_display(),
            trades
        );
    }

    println!("\nTrades by Cycle Regime:");
    println!("-----------------------");
    let cycles = CycleTracker::new(20.0, 10.0)?.track(&data);
    let result = RebalanceSimulator::new(StrategyParams::default())?
        .run(&data)?
        .into_result()
        .ok_or("no bars generated")?;

    for status in [CycleStatus::Unset, CycleStatus::Up, CycleStatus::Down] {
        let (bought, sold) = cycles
            .iter()
            .zip(&result.rows)
            .filter(|(c, _)| c.cycle_status == status)
            .fold((0, 0), |(b, s), (_, r)| (b + r.bought(), s + r.sold()));
        println!("{:?}: bought {} shares, sold {} shares", status, bought, sold);
    }

    Ok(())
}
