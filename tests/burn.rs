use sirius::config::BurnConfig;
use sirius::data::burn::*;
use sirius::data::channels::TimeUnit;

fn ts(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 * 1_000_000.0).collect()
}

#[test]
fn single_burn_with_hysteresis() {
    let vs = [0.0, 1000.0, 3000.0, 3500.0, 2000.0, 1600.0, 1400.0, 100.0];
    let w = detect_burns(&ts(vs.len()), &vs, &BurnConfig::default(), TimeUnit::Microseconds);
    assert_eq!(w.len(), 1);
    assert_eq!(w[0].start, 2_000_000.0);
    assert_eq!(w[0].stop, 6_000_000.0);
    assert!((w[0].duration - 4.0).abs() < 1e-12);
    assert_eq!(w[0].peak, 3500.0);
}

#[test]
fn open_window_closes_at_last_sample() {
    let vs = [0.0, 3000.0, 3100.0, f64::NAN];
    let w = detect_burns(&ts(vs.len()), &vs, &BurnConfig::default(), TimeUnit::Microseconds);
    assert_eq!(w.len(), 1);
    assert_eq!(w[0].start, 1_000_000.0);
    assert_eq!(w[0].stop, 3_000_000.0);
    assert_eq!(w[0].peak, 3100.0);
}

#[test]
fn multiple_windows_and_min_duration() {
    let vs = [3000.0, 1000.0, 3000.0, 3000.0, 3000.0, 1000.0];
    let cfg = BurnConfig {
        min_duration_s: 2.0,
        ..BurnConfig::default()
    };
    let all = detect_burns(&ts(vs.len()), &vs, &BurnConfig::default(), TimeUnit::Microseconds);
    assert_eq!(all.len(), 2);
    let long = detect_burns(&ts(vs.len()), &vs, &cfg, TimeUnit::Microseconds);
    assert_eq!(long.len(), 1);
    assert_eq!(long[0].start, 2_000_000.0);
}

#[test]
fn never_crossing_yields_nothing() {
    let vs = [0.0, 2900.0, 2500.0, f64::NAN];
    let mut d = BurnDetector::new(&BurnConfig::default(), TimeUnit::Milliseconds);
    d.process_all(&ts(vs.len()), &vs);
    assert_eq!(d.state(), BurnState::BelowThreshold);
    assert!(d.finish().is_empty());
}

#[test]
fn duration_follows_time_unit() {
    let vs = [3000.0, 1000.0];
    let w = detect_burns(&[0.0, 1500.0], &vs, &BurnConfig::default(), TimeUnit::Milliseconds);
    assert!((w[0].duration - 1.5).abs() < 1e-12);
}
