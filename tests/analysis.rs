use std::io::Cursor;

use sirius::analysis::*;
use sirius::config::{LogOptions, SiriusConfig};
use sirius::data::calibration::{Calibrator, FormulaId};
use sirius::data::channels::TelemetryLog;
use sirius::data::csv_log::read_log;
use sirius::data::export::{self, ExportTracker};
use sirius::SiriusError;

/// `rows` lines of `timeStamp,ADC_0..ADC_{n-1},` with timestamps 1000 us apart.
fn make_log(n_channels: usize, rows: usize, sample: impl Fn(usize, usize) -> i64) -> TelemetryLog {
    let mut s = String::from("timeStamp");
    for c in 0..n_channels {
        s.push_str(&format!(",ADC_{c}"));
    }
    s.push_str(",\n");
    for r in 0..rows {
        s.push_str(&format!("{}", 1_000_000 + r * 1000));
        for c in 0..n_channels {
            s.push_str(&format!(",{}", sample(r, c)));
        }
        s.push_str(",\n");
    }
    let opts = LogOptions {
        drop_last_column: true,
        ..LogOptions::default()
    };
    read_log(Cursor::new(s), &opts).unwrap()
}

fn small_window() -> SiriusConfig {
    let mut cfg = SiriusConfig::default();
    cfg.smoothing.window = 5;
    cfg.smoothing.poly_order = 2;
    cfg
}

#[test]
fn constant_thrust_run() {
    let log = make_log(1, 1500, |_, _| 2048);
    let cfg = SiriusConfig::default();
    let an = Analyzer::new(&log, &cfg).unwrap();
    let a = an.run(AnalysisKind::Force(FormulaId::Thrust), &Selection::new("ADC_0")).unwrap();

    let expected = Calibrator::standard().apply(FormulaId::Thrust, 2048.0);
    assert_eq!(a.plot.title, format!("THRUST - MAX : {:.2}", expected));
    assert_eq!(a.plot.y_label, "NEWTON");
    assert_eq!(a.plot.x_label, "TimeStamp (us)");
    assert_eq!(a.rows().len(), 1500);
    assert!((a.rows()[0].adc - 2048.0).abs() < 1e-6);
    // ~11.7 kN is above the rising threshold for the whole log.
    assert_eq!(a.burns.len(), 1);
    assert_eq!(a.plot.markers.len(), 2);
    match &a.export {
        Some(ExportPayload::Derived { file_name, .. }) => assert_eq!(*file_name, export::THRUST_CSV),
        other => panic!("unexpected export {other:?}"),
    }
}

#[test]
fn tank_has_no_burn_detection() {
    let log = make_log(1, 50, |_, _| 2048);
    let cfg = small_window();
    let a = Analyzer::new(&log, &cfg)
        .unwrap()
        .force(&Selection::new("ADC_0"), FormulaId::Tank)
        .unwrap();
    assert!(a.plot.title.starts_with("TANK - MAX : "));
    assert_eq!(a.plot.y_label, "LBS");
    assert!(a.burns.is_empty());
}

#[test]
fn burn_window_found_in_step_profile() {
    let log = make_log(1, 60, |r, _| if (20..40).contains(&r) { 1000 } else { 0 });
    let cfg = small_window();
    let a = Analyzer::new(&log, &cfg)
        .unwrap()
        .force(&Selection::new("ADC_0"), FormulaId::Thrust)
        .unwrap();
    assert_eq!(a.burns.len(), 1);
    let w = &a.burns[0];
    assert!(w.start > 1_017_000.0 && w.start < 1_022_000.0, "{}", w.start);
    assert!(w.stop > 1_037_000.0 && w.stop < 1_042_000.0, "{}", w.stop);
    assert!((w.duration - 0.02).abs() < 0.0035);
}

#[test]
fn raw_and_denoise_titles() {
    let log = make_log(2, 20, |r, c| (r + c * 100) as i64);
    let cfg = small_window();
    let an = Analyzer::new(&log, &cfg).unwrap();

    let raw = an.raw(&Selection::new("ADC_1")).unwrap();
    assert_eq!(raw.plot.title, "ADC VALUES MAX : 119");
    assert_eq!(raw.peak, Some(119.0));

    // A linear ramp survives a quadratic fit unchanged.
    let den = an.denoise(&Selection::new("ADC_1")).unwrap();
    assert_eq!(den.plot.title, "FILTERED ADC VALUES MAX : 119.00");
}

#[test]
fn selection_slices_rows() {
    let log = make_log(1, 20, |r, _| r as i64);
    let cfg = small_window();
    let an = Analyzer::new(&log, &cfg).unwrap();
    let a = an.raw(&Selection::new("ADC_0").with_range(5, Some(10))).unwrap();
    let pts = &a.plot.series[0].points;
    assert_eq!(pts.len(), 5);
    assert_eq!(pts[0], [1_005_000.0, 5.0]);
    assert_eq!(pts[4], [1_009_000.0, 9.0]);

    assert!(matches!(
        an.raw(&Selection::new("ADC_0").with_range(25, None)),
        Err(SiriusError::InvalidRange { .. })
    ));
    assert!(matches!(
        an.raw(&Selection::new("ADC_7")),
        Err(SiriusError::UnknownChannel(_))
    ));
}

#[test]
fn short_slice_fails_smoothing() {
    let log = make_log(1, 20, |_, _| 100);
    let cfg = small_window();
    let an = Analyzer::new(&log, &cfg).unwrap();
    let err = an.chamber(&Selection::new("ADC_0").with_range(17, None)).unwrap_err();
    assert!(matches!(err, SiriusError::InsufficientSamples { required: 5, available: 3 }));
}

#[test]
fn pressure_and_chamber() {
    let log = make_log(1, 30, |_, _| 1000);
    let cfg = small_window();
    let an = Analyzer::new(&log, &cfg).unwrap();

    let pt = an.pressure(&Selection::new("ADC_0"), FormulaId::PtTank).unwrap();
    assert_eq!(pt.plot.title, format!("PT- MAX : {:.2}", 0.9202 * 1000.0 - 43.0));
    assert_eq!(pt.plot.y_label, "PSI");
    assert!(an.pressure(&Selection::new("ADC_0"), FormulaId::Thrust).is_err());

    let ch = an.chamber(&Selection::new("ADC_0")).unwrap();
    assert_eq!(ch.plot.title, format!("PT CHAMBER MAX : {:.2}", (1000.0 - 807.62) / 1.019));
    match &ch.export {
        Some(ExportPayload::Derived { file_name, rows, .. }) => {
            assert_eq!(*file_name, export::CHAMBER_CSV);
            assert_eq!(rows.len(), 30);
        }
        other => panic!("unexpected export {other:?}"),
    }
}

#[test]
fn thermistance_runs_all_eight_inputs() {
    let log = make_log(8, 40, |r, c| 1000 + (c * 100 + r) as i64);
    let cfg = small_window();
    let an = Analyzer::new(&log, &cfg).unwrap();
    let a = an.thermistance(&Selection::new("ADC_3")).unwrap();

    assert_eq!(a.plot.series.len(), 8);
    assert_eq!(a.plot.y_label, "CELSIUS");
    let hottest = Calibrator::standard().apply(FormulaId::Thermistance, 1339.0);
    assert_eq!(a.plot.title, format!("THERMISTANCE C MAX : {:.2}", hottest));
    let batch = a.batch.as_ref().unwrap();
    assert_eq!(batch.len(), 8);
    match &a.export {
        Some(ExportPayload::Thermistance(map)) => assert_eq!(map.len(), 8),
        other => panic!("unexpected export {other:?}"),
    }
    let summary = a.summary();
    assert_eq!(summary.channels.len(), 8);
    assert!(summary.channels.iter().all(|c| c.error.is_none()));
}

#[test]
fn thermistance_needs_inputs() {
    let cfg = small_window();

    let empty = TelemetryLog::default();
    let an = Analyzer::new(&empty, &cfg).unwrap();
    assert!(an.thermistance(&Selection::new("ADC_0")).is_err());

    let opts = LogOptions {
        drop_last_column: false,
        ..LogOptions::default()
    };
    let src: String = std::iter::once("t,X\n".to_string())
        .chain((0..10).map(|r| format!("{},{}\n", 1000 * r, r)))
        .collect();
    let log = read_log(Cursor::new(src), &opts).unwrap();
    let an = Analyzer::new(&log, &cfg).unwrap();
    match an.thermistance(&Selection::new("X")) {
        Err(SiriusError::UnknownChannel(name)) => assert_eq!(name, "ADC_0"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn overview_draws_every_adc_column() {
    let log = make_log(3, 20, |r, c| (r * c) as i64);
    let cfg = small_window();
    let a = Analyzer::new(&log, &cfg).unwrap().overview(&Selection::new("ADC_0")).unwrap();
    assert_eq!(a.plot.title, "ADC ALL");
    let names: Vec<&str> = a.plot.series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["ADC_0", "ADC_1", "ADC_2"]);
}

#[test]
fn find_index_and_export_range() {
    let log = make_log(1, 10, |r, _| r as i64 * 2);
    let cfg = small_window();
    let an = Analyzer::new(&log, &cfg).unwrap();
    assert_eq!(an.find_index(1_003_400.0).unwrap(), Some((3, 1_003_000.0)));
    assert_eq!(an.find_index(1_003_500.0).unwrap(), Some((3, 1_003_000.0)));

    let a = an.export_range(&Selection::new("ADC_0").with_range(2, Some(4))).unwrap();
    assert_eq!(
        a.export,
        Some(ExportPayload::Range {
            xs: vec![1_002_000.0, 1_003_000.0],
            ys: vec![4.0, 6.0],
        })
    );
}

#[test]
fn scheduled_exports_land_in_out_dir() {
    let dir = std::env::temp_dir().join(format!("sirius_analysis_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let log = make_log(1, 30, |_, _| 1000);
    let mut cfg = small_window();
    cfg.export.out_dir = dir.clone();
    let a = Analyzer::new(&log, &cfg).unwrap().chamber(&Selection::new("ADC_0")).unwrap();

    let mut tracker = ExportTracker::new(&cfg.export);
    a.schedule_exports(&mut tracker);
    assert!(tracker.wait_all().iter().all(|r| r.is_ok()));

    let csv = std::fs::read_to_string(dir.join(export::CHAMBER_CSV)).unwrap();
    assert!(csv.starts_with("Time [s] (starting at 1000000 us),PSI,ADC,\n0.0000,"));
    assert_eq!(csv.lines().count(), 31);
    assert!(dir.join(export::SUMMARY_JSON).exists());
    let _ = std::fs::remove_dir_all(&dir);
}
