//! Configuration for the calibration pipeline.
//!
//! Every sensor fit parameter lives here rather than inline in the formulas so
//! a recalibrated sensor only needs a new config file. All sections default to
//! the values used on the test stand, so a partial YAML/JSON file is enough.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::channels::TimeUnit;
use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// ADC / thermistor front end
// ─────────────────────────────────────────────────────────────────────────────

/// Electrical parameters of the 12-bit converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcConfig {
    /// Reference voltage in volts.
    pub vref: f64,
    /// Count divisor used by the load cell formulas.
    pub full_scale: f64,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            vref: 3.3,
            full_scale: 4096.0,
        }
    }
}

/// Voltage divider feeding the thermistor input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermistorConfig {
    /// Reference (control) resistor of the divider, in ohms.
    pub control_resistance_ohms: f64,
    /// Count divisor of the thermistor path only ("additive factor").
    ///
    /// Separate from [`AdcConfig::full_scale`] because the thermistor board
    /// was read with a different count convention; both are 4096 until the
    /// firmware owners confirm the thermistor one.
    pub additive_factor: f64,
}

impl Default for ThermistorConfig {
    fn default() -> Self {
        Self {
            control_resistance_ohms: 10_000.0,
            additive_factor: 4096.0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Calibration formula constants
// ─────────────────────────────────────────────────────────────────────────────

/// Load cell bridge followed by an instrumentation amplifier.
///
/// `force = ((raw - offset) * vref / full_scale / gain_divisor * full_scale_load)
///          / (sensitivity * excitation) * unit_factor`
///
/// A section given in a config file must list every field; thrust and tank
/// have different defaults, so there is no single fallback for a missing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCellConstants {
    pub gain_divisor: f64,
    pub full_scale_load: f64,
    /// Bridge sensitivity in V/V.
    pub sensitivity: f64,
    /// Bridge excitation in volts.
    pub excitation: f64,
    /// Final unit conversion (9.81 / 2.2 takes thrust from pounds to newtons).
    pub unit_factor: f64,
    /// Raw-count bias subtracted before scaling.
    pub offset: f64,
}

impl LoadCellConstants {
    pub fn thrust() -> Self {
        Self {
            gain_divisor: 209.0,
            full_scale_load: 5000.0,
            sensitivity: 0.003,
            excitation: 5.0,
            unit_factor: 9.81 / 2.2,
            offset: 0.0,
        }
    }

    pub fn tank() -> Self {
        Self {
            gain_divisor: 209.0,
            full_scale_load: 200.0,
            sensitivity: 0.003,
            excitation: 5.0,
            unit_factor: 1.0,
            offset: 0.0,
        }
    }
}

impl Default for LoadCellConstants {
    fn default() -> Self {
        Self::thrust()
    }
}

/// `value = a * raw + b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineConstants {
    pub a: f64,
    pub b: f64,
}

/// `value = (raw - offset) / divisor`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearConstants {
    pub offset: f64,
    pub divisor: f64,
}

/// All calibration fit parameters, one entry per formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaConstants {
    pub thrust: LoadCellConstants,
    pub tank: LoadCellConstants,
    pub pt_chamber: AffineConstants,
    pub pt_tank: AffineConstants,
    pub pt_chamber_linear: LinearConstants,
}

impl Default for FormulaConstants {
    fn default() -> Self {
        Self {
            thrust: LoadCellConstants::thrust(),
            tank: LoadCellConstants::tank(),
            pt_chamber: AffineConstants { a: 0.9438, b: 43.0 },
            pt_tank: AffineConstants { a: 0.9202, b: -43.0 },
            pt_chamber_linear: LinearConstants {
                offset: 807.62,
                divisor: 1.019,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Processing
// ─────────────────────────────────────────────────────────────────────────────

/// Savitzky-Golay smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of samples per local fit.
    pub window: usize,
    /// Degree of the fitted polynomial.
    pub poly_order: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window: 1000,
            poly_order: 3,
        }
    }
}

/// Hysteresis thresholds for burn window detection on calibrated thrust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnConfig {
    /// A value strictly above this opens a burn window.
    pub rising: f64,
    /// A value strictly below this closes the open window.
    pub falling: f64,
    /// Windows shorter than this (seconds) are discarded.
    pub min_duration_s: f64,
}

impl Default for BurnConfig {
    fn default() -> Self {
        Self {
            rising: 2900.0,
            falling: 1500.0,
            min_duration_s: 0.0,
        }
    }
}

/// How the CSV log is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Discard the last field of the header and of every row.
    pub drop_last_column: bool,
    /// Unit of the timestamp column.
    pub time_unit: TimeUnit,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            drop_last_column: false,
            time_unit: TimeUnit::Microseconds,
        }
    }
}

/// Where and how derived files are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub out_dir: PathBuf,
    /// Attempts per file before giving up.
    pub retries: u32,
    /// Backoff step between attempts; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            retries: 3,
            retry_backoff_ms: 50,
        }
    }
}

/// Native plot window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Sirius".to_string(),
            width: 1400.0,
            height: 900.0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SiriusConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
///
/// | Field        | Purpose |
/// |--------------|---------|
/// | `adc`        | Converter reference and count scale |
/// | `thermistor` | Divider resistor for the temperature inputs |
/// | `formulas`   | Sensor fit parameters |
/// | `smoothing`  | Window filter applied before calibration |
/// | `burn`       | Burn window thresholds |
/// | `log`        | CSV reading options |
/// | `export`     | Output directory and retry policy |
/// | `viewer`     | Plot window |
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiriusConfig {
    pub adc: AdcConfig,
    pub thermistor: ThermistorConfig,
    pub formulas: FormulaConstants,
    pub smoothing: SmoothingConfig,
    pub burn: BurnConfig,
    pub log: LogOptions,
    pub export: ExportConfig,
    pub viewer: ViewerConfig,
}

impl SiriusConfig {
    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)?;
        let cfg = if is_json(path) {
            serde_json::from_str(&s)?
        } else {
            serde_yaml::from_str(&s)?
        };
        log::debug!("loaded config from {:?}", path);
        Ok(cfg)
    }

    /// Save in the format implied by the extension (see [`SiriusConfig::load`]).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let s = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
