use sirius::config::SiriusConfig;
use sirius::data::calibration::*;
use sirius::data::smoothing::smooth;
use sirius::data::thermistor::temperature_from_adc;

fn thrust_closed_form(raw: f64) -> f64 {
    ((raw * 3.3 / 4096.0 / 209.0 * 5000.0) / (0.003 * 5.0)) * (9.81 / 2.2)
}

#[test]
fn intercepts_match_documented_formulas() {
    assert_eq!(calibrate(FormulaId::Tank, &[0.0]).values, vec![0.0]);
    assert_eq!(calibrate(FormulaId::Thrust, &[0.0]).values, vec![0.0]);
    assert_eq!(calibrate(FormulaId::PtChamber, &[0.0]).values, vec![43.0]);
    assert_eq!(calibrate(FormulaId::PtTank, &[0.0]).values, vec![-43.0]);
    let lin = calibrate(FormulaId::PtChamberLinear, &[807.62]).values[0];
    assert!(lin.abs() < 1e-12);
}

#[test]
fn single_sample_values() {
    let cal = Calibrator::standard();
    let thrust = cal.apply(FormulaId::Thrust, 2048.0);
    assert!((thrust - thrust_closed_form(2048.0)).abs() < 1e-9);

    let tank = cal.apply(FormulaId::Tank, 1000.0);
    let expected = (1000.0 * 3.3 / 4096.0 / 209.0 * 200.0) / (0.003 * 5.0);
    assert!((tank - expected).abs() < 1e-9);

    assert!((cal.apply(FormulaId::PtChamber, 100.0) - (0.9438 * 100.0 + 43.0)).abs() < 1e-12);
    assert!((cal.apply(FormulaId::PtChamberLinear, 1826.62) - 1000.0).abs() < 1e-9);
    assert_eq!(cal.apply(FormulaId::Thermistance, 2000.0), temperature_from_adc(2000.0));
}

#[test]
fn thrust_offset_comes_from_config() {
    let mut cfg = SiriusConfig::default();
    cfg.formulas.thrust.offset = 10.0;
    let cal = Calibrator::from_config(&cfg);
    assert_eq!(cal.apply(FormulaId::Thrust, 10.0), 0.0);
    let v = cal.apply(FormulaId::Thrust, 2058.0);
    assert!((v - thrust_closed_form(2048.0)).abs() < 1e-9);
}

#[test]
fn nan_propagates_and_is_counted() {
    for f in FormulaId::ALL {
        let r = calibrate(*f, &[f64::NAN, 1000.0]);
        assert_eq!(r.len(), 2);
        assert!(r.values[0].is_nan(), "{f}");
        assert!(!r.values[1].is_nan(), "{f}");
        assert_eq!(r.invalid_count, 1, "{f}");
    }
}

#[test]
fn thermistance_domain_failures_are_counted() {
    let r = calibrate(FormulaId::Thermistance, &[0.0, -3.0, 2000.0, 1.0]);
    assert_eq!(r.invalid_count, 3);
    assert!(r.values[2].is_finite());
    assert_eq!(r.peak(), Some((2, r.values[2])));
}

#[test]
fn constant_thrust_end_to_end() {
    let raw = vec![2048.0; 1500];
    let smoothed = smooth(&raw).unwrap();
    let result = calibrate(FormulaId::Thrust, &smoothed);
    let expected = thrust_closed_form(2048.0);
    assert_eq!(result.len(), 1500);
    assert_eq!(result.invalid_count, 0);
    for v in &result.values {
        assert!((v - expected).abs() <= expected * 1e-9, "{v} vs {expected}");
    }
}

#[test]
fn units_and_labels() {
    assert_eq!(FormulaId::Thrust.axis_label(), "NEWTON");
    assert_eq!(FormulaId::Tank.axis_label(), "LBS");
    assert_eq!(FormulaId::PtTank.unit(), "psi");
    assert_eq!(FormulaId::Thermistance.axis_label(), "CELSIUS");
}
