use band_trade::utils::generate_test_data;
use band_trade::{CycleStatus, CycleTracker, DailyBar, RawBar};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn bar(day: u32, high: f64, low: f64) -> DailyBar {
    let mid = (high + low) / 2.0;
    DailyBar::new(date(day), mid, high, low, mid)
}

/// Down at day 3, up at day 5, down again at day 7
fn swing_series() -> Vec<DailyBar> {
    vec![
        bar(1, 100.0, 100.0),
        bar(2, 105.0, 98.0),
        bar(3, 90.0, 85.0),
        bar(4, 100.0, 88.0),
        bar(5, 112.0, 95.0),
        bar(6, 120.0, 110.0),
        bar(7, 101.0, 100.0),
    ]
}

#[test]
fn test_swing_statuses() {
    let rows = CycleTracker::default().track(&swing_series());

    let statuses: Vec<CycleStatus> = rows.iter().map(|r| r.cycle_status).collect();
    assert_eq!(
        statuses,
        vec![
            CycleStatus::Unset,
            CycleStatus::Unset,
            CycleStatus::Down,
            CycleStatus::Down,
            CycleStatus::Up,
            CycleStatus::Up,
            CycleStatus::Down,
        ]
    );

    let turns: Vec<(bool, bool)> = rows.iter().map(|r| (r.turn_to_up, r.turn_to_down)).collect();
    assert_eq!(
        turns,
        vec![
            (false, false),
            (false, false),
            (false, true),
            (false, false),
            (true, false),
            (false, false),
            (false, true),
        ]
    );
}

#[test]
fn test_pivots_ratchet_and_reseed() {
    let rows = CycleTracker::default().track(&swing_series());

    // day 2 widens both pivots
    assert!(rows[1].renewed_high && rows[1].renewed_low);
    assert_eq!((rows[1].running_max, rows[1].running_min), (105.0, 98.0));

    // the turn down reseeds the min from the day's low and keeps the max
    assert_eq!((rows[2].running_max, rows[2].running_min), (105.0, 85.0));

    // the turn up reseeds the max from the day's high
    assert_eq!((rows[4].running_max, rows[4].running_min), (112.0, 85.0));

    // while up, a new high ratchets the max
    assert!(rows[5].renewed_high);
    assert_eq!(rows[5].running_max, 120.0);

    assert_eq!(rows[6].running_min, 100.0);
}

#[test]
fn test_derived_percentages() {
    let rows = CycleTracker::default().track(&swing_series());
    let row = &rows[3];

    assert_eq!(row.historic_max, 105.0);
    assert_eq!(row.drop_from_hmax_pct, (94.0 - 105.0) / 105.0 * 100.0);
    assert_eq!(row.close_from_rmax_pct, (94.0 - 105.0) / 105.0 * 100.0);
    assert_eq!(row.close_from_rmin_pct, (94.0 - 85.0) / 85.0 * 100.0);
    assert_eq!(row.min_from_rmax_pct, (85.0 - 105.0) / 105.0 * 100.0);
    assert_eq!(row.max_from_rmin_pct, (105.0 - 85.0) / 85.0 * 100.0);
}

#[test]
fn test_start_filter_skips_rows_but_not_state() {
    let bars = swing_series();
    let full = CycleTracker::default().track(&bars);
    let filtered = CycleTracker::default()
        .with_start_filter(date(4))
        .track(&bars);

    assert_eq!(filtered.len(), 4);
    assert_eq!(filtered[0].date, date(4));

    // pivots and regime carry over from the skipped bars
    for (f, r) in filtered.iter().zip(&full[3..]) {
        assert_eq!(f.running_max, r.running_max);
        assert_eq!(f.running_min, r.running_min);
        assert_eq!(f.cycle_status, r.cycle_status);
    }

    // historic max restarts at the filter date
    let hmax: Vec<f64> = filtered.iter().map(|r| r.historic_max).collect();
    assert_eq!(hmax, vec![100.0, 112.0, 120.0, 120.0]);
}

#[test]
fn test_malformed_raw_bars_are_dropped() {
    let raw = vec![
        RawBar::new("2024-03-01", 100.0, 101.0, 99.0, 100.0),
        RawBar::new("not a date", 100.0, 101.0, 99.0, 100.0),
        RawBar::new("2024-03-04", 100.0, f64::NAN, 99.0, 100.0),
        RawBar::new("2024-03-05", 100.0, 102.0, -1.0, 100.0),
        RawBar::new("2024-03-06", 101.0, 103.0, 100.0, 102.0),
    ];

    let rows = CycleTracker::default().track_raw(&raw);
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date(1), date(6)]);
}

#[test]
fn test_empty_input() {
    assert!(CycleTracker::default().track(&[]).is_empty());
    assert!(CycleTracker::default().track_raw(&[]).is_empty());
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(2024)]
fn test_invariants_on_random_walks(#[case] seed: u64) {
    let bars = generate_test_data(400, 100.0, 0.08, seed);
    let rows = CycleTracker::new(20.0, 10.0).unwrap().track(&bars);

    assert_eq!(rows.len(), bars.len());
    let mut historic_max = f64::MIN;
    for row in &rows {
        assert!(row.running_max >= row.running_min, "pivots crossed on {}", row.date);
        assert!(!(row.turn_to_up && row.turn_to_down));
        assert!(row.historic_max >= historic_max);
        historic_max = row.historic_max;
        if row.turn_to_up {
            assert_eq!(row.cycle_status, CycleStatus::Up);
        }
        if row.turn_to_down {
            assert_eq!(row.cycle_status, CycleStatus::Down);
        }
    }
}
