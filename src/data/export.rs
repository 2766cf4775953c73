//! Export helpers: derived CSV, range CSV, thermistance JSON, optional Parquet,
//! the run summary, and a tracker for writes running in the background.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;
use crate::data::batch::BatchResult;
use crate::data::channels::TimeUnit;
use crate::error::{Result, SiriusError};
use crate::plot::PlotSpec;

pub const THRUST_CSV: &str = "Thrust.csv";
pub const CHAMBER_CSV: &str = "Chamber.csv";
pub const RANGE_CSV: &str = "Export.csv";
pub const THERMISTANCE_JSON: &str = "thermistance.json";
pub const THERMISTANCE_PARQUET: &str = "thermistance.parquet";
pub const SUMMARY_JSON: &str = "summary.json";

// ─────────────────────────────────────────────────────────────────────────────
// File formats
// ─────────────────────────────────────────────────────────────────────────────

/// One row of a derived export: raw timestamp, calibrated value, smoothed ADC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    pub timestamp: f64,
    pub value: f64,
    pub adc: f64,
}

/// Derived CSV: elapsed seconds from the first row, calibrated value, ADC.
///
/// ```text
/// Time [s] (starting at 1000 us),PSI,ADC,
/// 0.0000,812.5,2048,
/// ```
pub fn write_derived_csv<W: Write + ?Sized>(w: &mut W, rows: &[DerivedRow], unit: TimeUnit) -> Result<()> {
    let t0 = rows.first().map(|r| r.timestamp).unwrap_or(0.0);
    writeln!(w, "Time [s] (starting at {} {}),PSI,ADC,", t0, unit.label())?;
    for r in rows {
        writeln!(w, "{:.4},{},{},", unit.to_seconds(r.timestamp - t0), r.value, r.adc)?;
    }
    Ok(())
}

/// Raw range export: `timeStamp,Data,` then one `<x>,<y>,` line per sample.
pub fn write_range_csv<W: Write + ?Sized>(w: &mut W, xs: &[f64], ys: &[f64]) -> Result<()> {
    writeln!(w, "timeStamp,Data,")?;
    for (x, y) in xs.iter().zip(ys) {
        writeln!(w, "{},{},", x, y)?;
    }
    Ok(())
}

/// Every series of a chart as a long table: `series,timestamp,value`.
pub fn write_plot_csv<W: Write + ?Sized>(w: &mut W, plot: &PlotSpec) -> Result<()> {
    writeln!(w, "series,timestamp,value")?;
    for s in &plot.series {
        for p in &s.points {
            writeln!(w, "{},{},{}", s.name, p[0], p[1])?;
        }
    }
    Ok(())
}

/// Channel name to calibrated values, as pretty JSON. NaN becomes `null`.
pub fn write_thermistance_json<W: Write + ?Sized>(w: &mut W, values: &BTreeMap<String, Vec<f64>>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, values)?;
    writeln!(w)?;
    Ok(())
}

/// Long table `(channel, index, value)` in Parquet.
#[cfg(feature = "parquet")]
pub fn write_parquet<P: AsRef<Path>>(path: P, values: &BTreeMap<String, Vec<f64>>) -> Result<()> {
    use std::sync::Arc;

    use arrow_array::{Float64Array, RecordBatch, StringArray, UInt64Array};
    use arrow_schema::{DataType, Field, Schema};
    use parquet::arrow::arrow_writer::ArrowWriter;
    use parquet::file::properties::WriterProperties;

    let mut channel_col: Vec<String> = Vec::new();
    let mut index_col: Vec<u64> = Vec::new();
    let mut value_col: Vec<f64> = Vec::new();
    for (name, vs) in values {
        for (i, v) in vs.iter().enumerate() {
            channel_col.push(name.clone());
            index_col.push(i as u64);
            value_col.push(*v);
        }
    }
    let schema = Arc::new(Schema::new(vec![
        Field::new("channel", DataType::Utf8, false),
        Field::new("index", DataType::UInt64, false),
        Field::new("value", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(channel_col)) as _,
            Arc::new(UInt64Array::from(index_col)) as _,
            Arc::new(Float64Array::from(value_col)) as _,
        ],
    )
    .map_err(|e| SiriusError::Parquet(e.to_string()))?;
    let file = fs::File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).map_err(|e| SiriusError::Parquet(e.to_string()))?;
    writer.write(&batch).map_err(|e| SiriusError::Parquet(e.to_string()))?;
    writer.close().map_err(|e| SiriusError::Parquet(e.to_string()))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Run summary
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub name: String,
    pub samples: usize,
    pub invalid: usize,
    pub peak: Option<f64>,
    pub error: Option<String>,
}

/// What a run produced, written next to the exports as `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub analysis: String,
    pub channels: Vec<ChannelSummary>,
}

impl RunSummary {
    pub fn new<S: Into<String>>(analysis: S) -> Self {
        Self {
            generated_at: Utc::now(),
            analysis: analysis.into(),
            channels: Vec::new(),
        }
    }

    pub fn push_values(&mut self, name: &str, values: &[f64]) {
        self.channels.push(ChannelSummary {
            name: name.to_string(),
            samples: values.len(),
            invalid: values.iter().filter(|v| v.is_nan()).count(),
            peak: crate::data::calibration::peak(values).map(|(_, v)| v),
            error: None,
        });
    }

    pub fn push_batch(&mut self, batch: &BatchResult) {
        for (name, outcome) in &batch.outcomes {
            let entry = match outcome {
                Ok(r) => ChannelSummary {
                    name: name.clone(),
                    samples: r.len(),
                    invalid: r.invalid_count,
                    peak: r.peak().map(|(_, v)| v),
                    error: None,
                },
                Err(e) => ChannelSummary {
                    name: name.clone(),
                    samples: 0,
                    invalid: 0,
                    peak: None,
                    error: Some(e.to_string()),
                },
            };
            self.channels.push(entry);
        }
    }

    pub fn write_json<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *w, self)?;
        writeln!(w)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Background writes
// ─────────────────────────────────────────────────────────────────────────────

/// Run `op` up to `retries` times, waiting `attempt * backoff_ms` between
/// attempts. Only transient I/O errors are retried.
pub fn with_retries<T, F>(retries: u32, backoff_ms: u64, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = retries.max(1);
    let mut attempt = 1u32;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < attempts => {
                log::warn!("{}: attempt {}/{} failed: {}", label, attempt, attempts, e);
                thread::sleep(Duration::from_millis(backoff_ms * attempt as u64));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Create `path` (and its directory) and fill it through `write`.
pub fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut w = BufWriter::new(fs::File::create(path)?);
    write(&mut w)?;
    w.flush()?;
    Ok(())
}

struct PendingExport {
    label: String,
    handle: JoinHandle<Result<PathBuf>>,
}

/// Keeps track of exports running on their own threads.
///
/// Spawning returns immediately. [`ExportTracker::wait_all`] joins every
/// pending write; dropping the tracker does the same, so no export is lost
/// when the process winds down.
pub struct ExportTracker {
    out_dir: PathBuf,
    retries: u32,
    retry_backoff_ms: u64,
    pending: Vec<PendingExport>,
}

impl ExportTracker {
    pub fn new(cfg: &ExportConfig) -> Self {
        Self {
            out_dir: cfg.out_dir.clone(),
            retries: cfg.retries,
            retry_backoff_ms: cfg.retry_backoff_ms,
            pending: Vec::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Path of an export file inside the output directory.
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.out_dir.join(file_name)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Run `job` on a background thread with the retry policy.
    pub fn spawn<F>(&mut self, label: &str, job: F)
    where
        F: Fn() -> Result<PathBuf> + Send + 'static,
    {
        let (retries, backoff) = (self.retries, self.retry_backoff_ms);
        let thread_label = label.to_string();
        let handle = thread::spawn(move || with_retries(retries, backoff, &thread_label, &job));
        self.pending.push(PendingExport {
            label: label.to_string(),
            handle,
        });
    }

    /// Write `file_name` in the output directory in the background.
    pub fn spawn_file<F>(&mut self, file_name: &str, write: F)
    where
        F: Fn(&mut dyn Write) -> Result<()> + Send + 'static,
    {
        let path = self.path(file_name);
        self.spawn(file_name, move || {
            write_file(&path, |w| write(w))?;
            Ok(path.clone())
        });
    }

    /// Join every pending export, in spawn order.
    pub fn wait_all(&mut self) -> Vec<Result<PathBuf>> {
        self.pending
            .drain(..)
            .map(|p| {
                let res = p.handle.join().unwrap_or_else(|_| {
                    Err(SiriusError::Io(std::io::Error::other(format!(
                        "export thread for {} panicked",
                        p.label
                    ))))
                });
                match &res {
                    Ok(path) => log::info!("wrote {:?}", path),
                    Err(e) => log::warn!("export {} failed: {}", p.label, e),
                }
                res
            })
            .collect()
    }
}

impl Drop for ExportTracker {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            self.wait_all();
        }
    }
}
