//! Sirius crate root: re-exports and module wiring.
//!
//! Offline processing of rocket-engine test stand logs: raw ADC channels are
//! smoothed, calibrated into physical units (N, lbs, psi, °C) and plotted.
//!
//! - `data`: channels, the CSV reader, thermistor table, calibration,
//!   smoothing, burn detection, batch processing and exports
//! - `analysis`: the analyses offered by the command line tool
//! - `plot`: renderer-independent chart description
//! - `config`: sensor constants and pipeline settings
//! - `app` (feature `viewer`): native plot window

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod plot;

#[cfg(feature = "viewer")]
pub mod app;

// Public re-exports for a compact external API
pub use analysis::{Analysis, AnalysisKind, Analyzer, Selection};
pub use config::SiriusConfig;
pub use data::batch::{calibrate_all_channels, BatchResult};
pub use data::calibration::{calibrate, CalibrationResult, Calibrator, FormulaId};
pub use data::channels::{Channel, TelemetryLog, TimeUnit};
pub use data::csv_log::{read_log, read_log_path};
pub use data::export::ExportTracker;
pub use data::smoothing::{smooth, SavitzkyGolay};
pub use data::thermistor::{temperature_from_adc, ThermistorTable};
pub use error::{Result, SiriusError};
pub use plot::PlotSpec;

#[cfg(feature = "viewer")]
pub use app::{run_viewer, SiriusViewer};
