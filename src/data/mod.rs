//! Data side of the pipeline: channels, sensor models and exports.

pub mod batch;
pub mod burn;
pub mod calibration;
pub mod channels;
pub mod csv_log;
pub mod export;
pub mod smoothing;
pub mod thermistor;
