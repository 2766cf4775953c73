use sirius::data::thermistor::*;

#[test]
fn non_positive_adc_is_nan() {
    for adc in [0.0, -1.0, -4096.0, f64::NAN] {
        assert!(temperature_from_adc(adc).is_nan(), "adc {adc}");
    }
}

#[test]
fn exact_table_resistance_returns_table_temperature() {
    let table = standard_table();
    let pts = table.points();
    for (i, p) in pts.iter().enumerate() {
        // Repeated values resolve to the first row carrying them.
        let first = pts.iter().position(|q| q.resistance == p.resistance).unwrap();
        let t = table.temperature_from_resistance(p.resistance);
        assert_eq!(t, pts[first].temperature, "row {i}");
    }
}

#[test]
fn interpolation_stays_between_bracketing_rows() {
    let table = standard_table();
    for w in table.points().windows(2) {
        if w[0].resistance == w[1].resistance {
            continue;
        }
        for frac in [0.1, 0.5, 0.9] {
            let r = w[0].resistance + frac * (w[1].resistance - w[0].resistance);
            let t = table.temperature_from_resistance(r);
            assert!(t > w[0].temperature && t < w[1].temperature, "r {r} -> {t}");
        }
    }
}

#[test]
fn resistance_outside_table_is_nan() {
    let table = standard_table();
    assert!(table.temperature_from_resistance(1_733_201.0).is_nan());
    assert!(table.temperature_from_resistance(22.9).is_nan());
    // 1 count reads ~41 MOhm, far above the cold end.
    assert!(temperature_from_adc(1.0).is_nan());
}

#[test]
fn adc_reading_matches_divider_math() {
    // 4096 counts -> 3.3 V -> 10 kOhm, between 87 C (10001) and 88 C (9689).
    let t = temperature_from_adc(4096.0);
    let expected = 87.0 + (10_000.0 - 10_001.0) / (9_689.0 - 10_001.0);
    assert!((t - expected).abs() < 1e-9, "{t} vs {expected}");
}

#[test]
fn hotter_sensor_reads_higher() {
    // More counts -> lower resistance -> higher temperature.
    let cold = temperature_from_adc(500.0);
    let warm = temperature_from_adc(2000.0);
    let hot = temperature_from_adc(40_000.0);
    assert!(cold < warm && warm < hot, "{cold} {warm} {hot}");
}

#[test]
fn custom_table_and_front_end() {
    use sirius::config::{AdcConfig, ThermistorConfig};
    let table = ThermistorTable::new(vec![
        RtPoint { temperature: 0.0, resistance: 20_000.0 },
        RtPoint { temperature: 100.0, resistance: 0.0 },
    ])
    .unwrap();
    let therm = ThermistorConfig {
        control_resistance_ohms: 10_000.0,
        additive_factor: 1000.0,
    };
    let th = Thermistor::from_config(&table, &AdcConfig::default(), &therm);
    // 1000 counts of 1000 -> full vref -> 10 kOhm -> halfway.
    assert!((th.temperature_from_adc(1000.0) - 50.0).abs() < 1e-9);
}
