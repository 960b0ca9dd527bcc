use chrono::{DateTime, TimeZone, Utc};

use common::{Advisory, AlertEvent, Bar, Classification, Error};
use engine::run_cycle;
use monitor::{MonitorConfig, SessionMonitor};
use signal::{CompositeScorer, IndicatorPipeline, RadarConfig};

fn series(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3600, 0).unwrap(),
            open: close - 0.5,
            high: close + 0.5,
            low: if i == 0 { 98.0 } else { close - 0.5 },
            close,
        })
        .collect()
}

/// 61 hourly closes rising monotonically from 100 to 160; series low is 98.
fn rising() -> Vec<f64> {
    (0..=60).map(|i| 100.0 + i as f64).collect()
}

fn falling() -> Vec<f64> {
    (0..=60).map(|i| 160.0 - i as f64).collect()
}

fn pipeline() -> IndicatorPipeline {
    IndicatorPipeline::from_config(&RadarConfig::default())
}

fn scorer() -> CompositeScorer {
    CompositeScorer::from_config(&RadarConfig::default())
}

fn monitor() -> SessionMonitor {
    SessionMonitor::new(MonitorConfig::default())
}

fn t(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_300_000 + offset_secs, 0).unwrap()
}

#[test]
fn rising_series_is_a_premium_buy_scoring_80() {
    let bars = series(&rising());
    let mut state = monitor();

    let outcome = run_cycle(&bars, &bars, t(0), &mut state, &pipeline(), &scorer()).unwrap();

    // Zero losses across the window force RSI to exactly 100
    assert_eq!(outcome.snapshot.rsi, 100.0);
    assert_eq!(outcome.classification, Classification::PremiumBuy);
    // Trend + momentum bonuses, no level within the default tolerance
    assert_eq!(outcome.score, 80);
    assert!((outcome.price - 160.0).abs() < 1e-9);

    assert_eq!(state.archive_entries().len(), 1);
    assert_eq!(state.reference().unwrap().price, 160.0);
    assert!(matches!(
        outcome.alerts.as_slice(),
        [AlertEvent::SignalRecorded { .. }]
    ));
}

#[test]
fn fib_proximity_caps_the_score_at_99() {
    let bars = series(&rising());
    let mut state = monitor();

    // Widen the tolerance until the close sits inside a retracement zone
    let scorer = CompositeScorer {
        fib_tolerance: 30.0,
        ..scorer()
    };

    let outcome = run_cycle(&bars, &bars, t(0), &mut state, &pipeline(), &scorer).unwrap();
    assert_eq!(outcome.score, 99);
}

#[test]
fn disagreeing_timeframes_accept_nothing() {
    let primary = series(&rising());
    let confirm = series(&falling());
    let mut state = monitor();

    let outcome =
        run_cycle(&primary, &confirm, t(0), &mut state, &pipeline(), &scorer()).unwrap();

    assert_eq!(outcome.classification, Classification::Neutral);
    assert!(outcome.alerts.is_empty());
    assert!(state.archive_entries().is_empty());
    assert!(state.reference().is_none());
}

#[test]
fn neutral_confirm_timeframe_blocks_a_strong_primary() {
    let primary = series(&rising());
    // Flat tail keeps the confirm close at the MA — neutral
    let mut confirm_closes = rising();
    confirm_closes.extend(std::iter::repeat(130.0).take(30));
    let confirm = series(&confirm_closes);
    let mut state = monitor();

    let outcome =
        run_cycle(&primary, &confirm, t(0), &mut state, &pipeline(), &scorer()).unwrap();

    assert_eq!(outcome.classification, Classification::Neutral);
    assert!(state.archive_entries().is_empty());
}

#[test]
fn lock_in_fires_before_the_reference_is_overwritten() {
    let mut closes = rising();
    let mut state = monitor();

    run_cycle(&series(&closes), &series(&closes), t(0), &mut state, &pipeline(), &scorer())
        .unwrap();
    assert_eq!(state.reference().unwrap().price, 160.0);

    // Next cycle: price ran 4.5 in favor while the BUY still holds
    closes.push(164.5);
    let bars = series(&closes);
    let outcome =
        run_cycle(&bars, &bars, t(3600), &mut state, &pipeline(), &scorer()).unwrap();

    assert_eq!(outcome.advisory, Some(Advisory::LockIn));
    assert!(matches!(
        outcome.alerts.as_slice(),
        [AlertEvent::LockInReached { .. }, AlertEvent::SignalRecorded { .. }]
    ));
    // The accepted signal then moved the reference to the new price
    assert_eq!(state.reference().unwrap().price, 164.5);
}

#[test]
fn reversal_fires_when_price_pulls_back_while_the_buy_holds() {
    let mut closes = rising();
    let mut state = monitor();

    run_cycle(&series(&closes), &series(&closes), t(0), &mut state, &pipeline(), &scorer())
        .unwrap();

    // Pullback of 2.6 — adverse beyond the 2.5 threshold, classification
    // still PREMIUM BUY (close above MA, RSI well above 62)
    closes.push(157.4);
    let bars = series(&closes);
    let outcome =
        run_cycle(&bars, &bars, t(3600), &mut state, &pipeline(), &scorer()).unwrap();

    assert_eq!(outcome.classification, Classification::PremiumBuy);
    assert_eq!(outcome.advisory, Some(Advisory::Reversal));
    assert!(outcome
        .alerts
        .iter()
        .any(|a| matches!(a, AlertEvent::ReversalWarning { .. })));
}

#[test]
fn same_minute_duplicate_is_suppressed_but_reference_moves() {
    let mut closes = rising();
    let mut state = monitor();

    run_cycle(&series(&closes), &series(&closes), t(0), &mut state, &pipeline(), &scorer())
        .unwrap();

    closes.push(160.5);
    let bars = series(&closes);
    let outcome =
        run_cycle(&bars, &bars, t(30), &mut state, &pipeline(), &scorer()).unwrap();

    // No SignalRecorded alert and no second archive row within the minute
    assert!(!outcome
        .alerts
        .iter()
        .any(|a| matches!(a, AlertEvent::SignalRecorded { .. })));
    assert_eq!(state.archive_entries().len(), 1);
    assert_eq!(state.reference().unwrap().price, 160.5);
}

#[test]
fn short_series_yields_insufficient_data_and_no_state_change() {
    let bars = series(&[100.0, 101.0, 102.0]);
    let mut state = monitor();

    let result = run_cycle(&bars, &bars, t(0), &mut state, &pipeline(), &scorer());

    assert!(matches!(result, Err(Error::InsufficientData { .. })));
    assert!(state.archive_entries().is_empty());
    assert!(state.reference().is_none());
}
