//! Calibration formulas: raw ADC counts to physical units.
//!
//! Every formula is a pure per-sample function. NaN goes in, NaN comes out.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{AdcConfig, LoadCellConstants, SiriusConfig};
use crate::data::thermistor::{standard_table, Thermistor, ThermistorTable};
use crate::error::SiriusError;

pub use crate::config::FormulaConstants;

/// Selects the transform applied to a raw channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaId {
    /// Load cell, newtons.
    Thrust,
    /// Tank weight load cell, pounds.
    Tank,
    /// Chamber pressure transducer, affine fit.
    PtChamber,
    /// Tank pressure transducer, affine fit.
    PtTank,
    /// Chamber pressure transducer, alternative linear fit.
    PtChamberLinear,
    /// Thermistor temperature through the lookup table.
    Thermistance,
}

impl FormulaId {
    pub const ALL: &'static [FormulaId] = &[
        FormulaId::Thrust,
        FormulaId::Tank,
        FormulaId::PtChamber,
        FormulaId::PtTank,
        FormulaId::PtChamberLinear,
        FormulaId::Thermistance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormulaId::Thrust => "thrust",
            FormulaId::Tank => "tank",
            FormulaId::PtChamber => "pt-chamber",
            FormulaId::PtTank => "pt-tank",
            FormulaId::PtChamberLinear => "pt-chamber-linear",
            FormulaId::Thermistance => "thermistance",
        }
    }

    /// Physical unit of the output.
    pub fn unit(&self) -> &'static str {
        match self {
            FormulaId::Thrust => "N",
            FormulaId::Tank => "lbs",
            FormulaId::PtChamber | FormulaId::PtTank | FormulaId::PtChamberLinear => "psi",
            FormulaId::Thermistance => "°C",
        }
    }

    /// Y axis label used on plots.
    pub fn axis_label(&self) -> &'static str {
        match self {
            FormulaId::Thrust => "NEWTON",
            FormulaId::Tank => "LBS",
            FormulaId::PtChamber | FormulaId::PtTank | FormulaId::PtChamberLinear => "PSI",
            FormulaId::Thermistance => "CELSIUS",
        }
    }
}

impl std::fmt::Display for FormulaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for FormulaId {
    type Err = SiriusError;

    /// Accepts the labels above, plus the stand operators' numeric shortcuts
    /// `1` (thrust) and `2` (tank).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "1" => return Ok(FormulaId::Thrust),
            "2" => return Ok(FormulaId::Tank),
            _ => {}
        }
        FormulaId::ALL
            .iter()
            .copied()
            .find(|f| f.label() == key || f.label().replace('-', "_") == key)
            .ok_or_else(|| SiriusError::UnknownFormula(s.to_string()))
    }
}

/// Calibrated channel: one value per input sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub formula: FormulaId,
    pub values: Vec<f64>,
    /// Outputs that are NaN (NaN input or out-of-domain sample).
    pub invalid_count: usize,
}

impl CalibrationResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest finite value and its index.
    pub fn peak(&self) -> Option<(usize, f64)> {
        peak(&self.values)
    }
}

/// Largest non-NaN value and its first index.
pub fn peak(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, bv)) if v <= bv => best,
            _ => Some((i, v)),
        })
}

/// Applies calibration formulas with a fixed set of constants.
#[derive(Debug, Clone)]
pub struct Calibrator<'t> {
    constants: FormulaConstants,
    adc: AdcConfig,
    thermistor: Thermistor<'t>,
}

impl Calibrator<'static> {
    /// Default constants and the standard thermistor table.
    pub fn standard() -> Self {
        Self::from_config(&SiriusConfig::default())
    }

    pub fn from_config(cfg: &SiriusConfig) -> Self {
        Self::with_table(cfg, standard_table())
    }
}

impl<'t> Calibrator<'t> {
    pub fn with_table(cfg: &SiriusConfig, table: &'t ThermistorTable) -> Self {
        Self {
            constants: cfg.formulas.clone(),
            adc: cfg.adc.clone(),
            thermistor: Thermistor::from_config(table, &cfg.adc, &cfg.thermistor),
        }
    }

    pub fn constants(&self) -> &FormulaConstants {
        &self.constants
    }

    pub fn thermistor(&self) -> &Thermistor<'t> {
        &self.thermistor
    }

    /// Calibrate a single sample.
    pub fn apply(&self, formula: FormulaId, raw: f64) -> f64 {
        let c = &self.constants;
        match formula {
            FormulaId::Thrust => self.load_cell(&c.thrust, raw),
            FormulaId::Tank => self.load_cell(&c.tank, raw),
            FormulaId::PtChamber => c.pt_chamber.a * raw + c.pt_chamber.b,
            FormulaId::PtTank => c.pt_tank.a * raw + c.pt_tank.b,
            FormulaId::PtChamberLinear => {
                (raw - c.pt_chamber_linear.offset) / c.pt_chamber_linear.divisor
            }
            FormulaId::Thermistance => self.thermistor.temperature_from_adc(raw),
        }
    }

    /// Calibrate a sequence elementwise.
    pub fn calibrate(&self, formula: FormulaId, samples: &[f64]) -> CalibrationResult {
        let values: Vec<f64> = samples.iter().map(|&s| self.apply(formula, s)).collect();
        let invalid_count = values.iter().filter(|v| v.is_nan()).count();
        if invalid_count > 0 {
            log::debug!(
                "{}: {} of {} samples outside the calibrated domain",
                formula,
                invalid_count,
                values.len()
            );
        }
        CalibrationResult {
            formula,
            values,
            invalid_count,
        }
    }

    fn load_cell(&self, k: &LoadCellConstants, raw: f64) -> f64 {
        let volts = (raw - k.offset) * self.adc.vref / self.adc.full_scale;
        (volts / k.gain_divisor * k.full_scale_load) / (k.sensitivity * k.excitation) * k.unit_factor
    }
}

/// [`Calibrator::calibrate`] with default constants.
pub fn calibrate(formula: FormulaId, samples: &[f64]) -> CalibrationResult {
    Calibrator::standard().calibrate(formula, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_shortcuts() {
        assert_eq!("thrust".parse::<FormulaId>().unwrap(), FormulaId::Thrust);
        assert_eq!("2".parse::<FormulaId>().unwrap(), FormulaId::Tank);
        assert_eq!("PT_Chamber".parse::<FormulaId>().unwrap(), FormulaId::PtChamber);
        assert_eq!("pt-chamber-linear".parse::<FormulaId>().unwrap(), FormulaId::PtChamberLinear);
        assert!("bogus".parse::<FormulaId>().is_err());
    }

    #[test]
    fn peak_skips_nan_and_keeps_first_index() {
        assert_eq!(peak(&[1.0, f64::NAN, 3.0, 3.0, 2.0]), Some((2, 3.0)));
        assert_eq!(peak(&[f64::NAN]), None);
        assert_eq!(peak(&[]), None);
    }
}
