//! Error types shared by the calibration pipeline.
//!
//! Out-of-domain samples are not errors: calibration marks them with NaN and
//! counts them in [`CalibrationResult`](crate::data::calibration::CalibrationResult).
//! Malformed CSV rows are skipped by the reader and recorded on the log.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiriusError {
    #[error("insufficient samples: smoothing window needs {required}, channel has {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("invalid smoothing window {window} for polynomial order {poly_order}")]
    InvalidWindow { window: usize, poly_order: usize },

    #[error("invalid thermistor table: {0}")]
    InvalidTable(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("unknown formula or analysis: {0}")]
    UnknownFormula(String),

    #[error("log contains no data rows")]
    EmptyLog,

    #[error("invalid index range {start}..{stop} for {len} samples")]
    InvalidRange { start: usize, stop: usize, len: usize },

    #[error("log has no header line")]
    MissingHeader,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Parquet export error: {0}")]
    Parquet(String),
}

impl SiriusError {
    /// Whether a failed write is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            SiriusError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ResourceBusy
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SiriusError>;
