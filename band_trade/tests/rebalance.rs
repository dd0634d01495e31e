use approx::assert_relative_eq;
use band_trade::utils::{flat_series, generate_test_data};
use band_trade::{DailyBar, RebalanceSimulator, SimulationResult, StrategyParams, BUY_COST_RATE};
use chrono::NaiveDate;
use rstest::rstest;
use trade_math::compound;

fn params() -> StrategyParams {
    StrategyParams {
        init_cash: 1000.0,
        init_stock_pct: 0.5,
        target_annual_rate: 0.0,
        upper_band_pct: 0.15,
        lower_band_pct: 0.15,
        unit_gap_pct: 0.1,
    }
}

fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> DailyBar {
    DailyBar::new(
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
        open,
        high,
        low,
        close,
    )
}

fn simulate(params: StrategyParams, bars: &[DailyBar]) -> SimulationResult {
    RebalanceSimulator::new(params)
        .unwrap()
        .run(bars)
        .unwrap()
        .into_result()
        .unwrap()
}

#[test]
fn test_single_bar() {
    let result = simulate(params(), &[bar(1, 100.0, 100.0, 100.0, 100.0)]);
    let row = &result.rows[0];

    assert_eq!(result.rows.len(), 1);
    assert_eq!(row.v_basis, 500.0);
    assert_eq!(row.cash, 500.0);
    assert_eq!(row.shares, 5);
    assert_eq!(row.total_purchase_amt, 500.0);
    assert_eq!(row.asset, 1000.0);
    assert_eq!(row.cur_upper, 575.0);
    assert_eq!(row.cur_lower, 425.0);
    assert_eq!(result.summary.end_date(), row.date);
}

#[test]
fn test_flat_prices_never_trade() {
    let bars = flat_series(30, 100.0);
    let result = simulate(
        StrategyParams {
            target_annual_rate: 0.10,
            ..params()
        },
        &bars,
    );

    assert_eq!(result.rows.len(), 30);
    for row in &result.rows {
        assert_eq!(row.bought(), 0);
        assert_eq!(row.sold(), 0);
        assert_eq!(row.shares, 5);
        assert_eq!(row.asset, 1000.0);
    }
    assert_eq!(result.summary.max_mdd_rate, 0.0);
    // the target still compounds
    assert!(result.rows[29].v_basis > result.rows[0].v_basis);
    // init_cash * init_stock_pct is a whole number of shares at 100
    assert_eq!(result.rows[0].cash + result.rows[0].evaluation, 1000.0);
}

#[test]
fn test_low_walks_down_the_buy_ladder() {
    let bars = [
        bar(1, 100.0, 100.0, 100.0, 100.0),
        // no gap at the open, but the low crosses two rungs below the 85 anchor
        bar(2, 95.0, 96.0, 70.0, 80.0),
    ];
    let result = simulate(params(), &bars);
    let row = &result.rows[1];

    assert_eq!(row.buy_anchor, 85.0);
    assert_eq!(row.open_buy_count, 0);
    assert_eq!(row.low_buy_count, 2);
    assert_eq!(row.low_buy_qty, 2);
    // mean of the 76.5 and 68.85 rungs
    assert_relative_eq!(row.low_buy_price, 72.675, epsilon = 1e-9);
    assert_relative_eq!(
        row.buy_amount,
        2.0 * 72.675 * (1.0 + BUY_COST_RATE),
        epsilon = 1e-9
    );
    assert_eq!(row.shares, 7);
    assert_relative_eq!(row.total_purchase_amt, 500.0 + row.buy_amount, epsilon = 1e-9);
}

#[test]
fn test_open_and_low_buys_on_one_day() {
    let bars = [
        bar(1, 100.0, 100.0, 100.0, 100.0),
        bar(2, 60.0, 61.0, 50.0, 55.0),
    ];
    let result = simulate(params(), &bars);
    let row = &result.rows[1];

    // floor(ln(85 / 60) / ln(1.1)) = 3 at the open
    assert_eq!(row.open_buy_count, 3);
    assert_eq!(row.open_buy_qty, 3);
    // then from the fourth rung down to 50
    assert_eq!(row.low_buy_count, 2);
    assert_eq!(row.low_buy_qty, 2);
    let expected = (85.0 * 0.9_f64.powi(4) + 85.0 * 0.9_f64.powi(5)) / 2.0;
    assert_relative_eq!(row.low_buy_price, expected, epsilon = 1e-9);
    assert_eq!(row.shares, 10);
}

#[test]
fn test_high_walks_up_the_sell_ladder() {
    let bars = [
        bar(1, 100.0, 100.0, 100.0, 100.0),
        bar(2, 100.0, 140.0, 99.0, 120.0),
    ];
    let result = simulate(params(), &bars);
    let row = &result.rows[1];

    assert_eq!(row.sell_anchor, 115.0);
    assert_eq!(row.open_sell_count, 0);
    assert_eq!(row.high_sell_count, 2);
    assert_eq!(row.high_sell_qty, 2);
    assert_relative_eq!(row.high_sell_price, 132.825, epsilon = 1e-9);
    // sells carry no fee
    assert_relative_eq!(row.sell_amount, 2.0 * 132.825, epsilon = 1e-9);
    assert_eq!(row.shares, 3);
    assert_relative_eq!(row.cash, 500.0 + 265.65, epsilon = 1e-9);
    assert_relative_eq!(row.total_purchase_amt, 300.0, epsilon = 1e-9);
    assert_relative_eq!(row.average_price, 100.0, epsilon = 1e-9);
}

#[test]
fn test_buys_are_capped_by_cash() {
    let bars = [
        bar(1, 100.0, 100.0, 100.0, 100.0),
        bar(2, 60.0, 60.0, 60.0, 60.0),
    ];
    let result = simulate(
        StrategyParams {
            init_stock_pct: 0.99,
            ..params()
        },
        &bars,
    );
    let row = &result.rows[1];

    // 10 in cash cannot pay for a single share at 60
    assert_eq!(result.rows[0].shares, 9);
    assert_eq!(row.open_buy_count, 4);
    assert_eq!(row.open_buy_qty, 0);
    assert_eq!(row.shares, 9);
    assert_relative_eq!(row.cash, result.rows[0].cash, epsilon = 1e-9);
}

#[test]
fn test_sells_are_capped_by_shares_held() {
    let bars = [
        bar(1, 100.0, 100.0, 100.0, 100.0),
        bar(2, 300.0, 300.0, 300.0, 300.0),
        bar(3, 300.0, 300.0, 300.0, 300.0),
    ];
    let result = simulate(params(), &bars);
    let row = &result.rows[1];

    // floor(ln(300 / 115) / ln(1.1)) = 10 rungs, but only 5 shares are held
    assert_eq!(row.open_sell_count, 10);
    assert_eq!(row.open_sell_qty, 5);
    assert_eq!(row.high_sell_qty, 0);
    assert_eq!(row.shares, 0);
    assert_eq!(row.sell_amount, 1500.0);
    assert_eq!(row.cash, 2000.0);
    assert_eq!(row.total_purchase_amt, 0.0);
    assert_eq!(row.average_price, 0.0);

    // with no position left, neither ladder exists
    let next = &result.rows[2];
    assert_eq!(next.bought() + next.sold(), 0);
    assert_eq!(next.asset, 2000.0);
}

#[test]
fn test_flat_prices_buy_back_the_floor_remainder() {
    // 550 of target at 100 a share buys only 5 shares, leaving the holding
    // below a 1% lower band on the first step
    let p = StrategyParams {
        init_stock_pct: 0.55,
        upper_band_pct: 0.9,
        lower_band_pct: 0.01,
        unit_gap_pct: 0.01,
        ..params()
    };
    let result = simulate(p, &flat_series(10, 100.0));

    let day0 = &result.rows[0];
    assert_eq!(day0.shares, 5);
    assert_relative_eq!(day0.cash, 450.0, epsilon = 1e-9);
    assert_relative_eq!(day0.asset, 950.0, epsilon = 1e-9);

    let day1 = &result.rows[1];
    // floor(ln(108.9 / 100) / ln(1.01)) = 8 rungs, cash affords 4 shares
    assert_eq!(day1.open_buy_count, 8);
    assert_eq!(day1.open_buy_qty, 4);
    assert_eq!(day1.shares, 9);
    assert_relative_eq!(day1.asset, 950.0 - 400.0 * BUY_COST_RATE, epsilon = 1e-9);

    for row in &result.rows[2..] {
        assert_eq!(row.bought() + row.sold(), 0);
        assert_eq!(row.shares, 9);
        assert_eq!(row.asset, day1.asset);
    }

    // an even split leaves no remainder and never trades
    let even = simulate(StrategyParams { init_stock_pct: 0.5, ..p }, &flat_series(10, 100.0));
    assert!(even.rows.iter().all(|r| r.bought() + r.sold() == 0));
}

#[test]
fn test_bands_follow_compounding() {
    let bars = generate_test_data(120, 100.0, 0.03, 11);
    let p = StrategyParams {
        target_annual_rate: 0.2,
        ..params()
    };
    let simulator = RebalanceSimulator::new(p).unwrap();
    let result = simulator.run(&bars).unwrap().into_result().unwrap();

    for pair in result.rows.windows(2) {
        let (prev, row) = (&pair[0], &pair[1]);
        assert_eq!(row.diff_days, (row.date - prev.date).num_days());
        assert_eq!(
            row.v_basis,
            compound(prev.v_basis, simulator.daily_rate(), row.diff_days)
        );
        assert_eq!(row.cur_upper, row.v_basis * (1.0 + 0.15));
        assert_eq!(row.cur_lower, row.v_basis * (1.0 - 0.15));
    }
}

#[rstest]
#[case(3, 0.05)]
#[case(17, 0.10)]
#[case(99, 0.15)]
#[case(2024, 0.08)]
fn test_ledger_invariants(#[case] seed: u64, #[case] volatility: f64) {
    let bars = generate_test_data(500, 50.0, volatility, seed);
    let result = simulate(StrategyParams::default(), &bars);

    assert_eq!(result.rows.len(), bars.len());
    assert_eq!(result.chart.len(), bars.len());

    let mut min_drawdown = 0.0_f64;
    for pair in result.rows.windows(2) {
        let (prev, row) = (&pair[0], &pair[1]);
        assert_eq!(row.shares, prev.shares + row.bought() - row.sold());
        assert!(row.sold() <= prev.shares);
        assert!(row.cash >= -1e-9, "cash went negative on {}", row.date);
    }
    for row in &result.rows {
        assert_eq!(row.cash + row.shares as f64 * row.close, row.asset);
        assert!(row.drawdown_pct <= 0.0);
        assert!(row.high_asset >= row.asset);
        min_drawdown = min_drawdown.min(row.drawdown_pct);
    }

    assert!(result.summary.max_mdd_rate <= 0.0);
    assert_eq!(result.summary.max_mdd_rate, min_drawdown);
}

#[test]
fn test_runs_are_deterministic() {
    let bars = generate_test_data(250, 80.0, 0.1, 5);
    let a = simulate(StrategyParams::default(), &bars);
    let b = simulate(StrategyParams::default(), &bars);

    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a.rows).unwrap(),
        serde_json::to_string(&b.rows).unwrap()
    );
}
