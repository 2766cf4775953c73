//! Analyses over a loaded telemetry log.
//!
//! Each analysis slices the selected channel, runs it through smoothing and
//! calibration as needed, and returns an [`Analysis`]: a [`PlotSpec`] plus
//! whatever the run should export. Nothing here touches the filesystem;
//! exports are handed to an [`ExportTracker`] by [`Analysis::schedule_exports`].

use std::collections::BTreeMap;
use std::ops::Range;
use std::str::FromStr;

use crate::config::SiriusConfig;
use crate::data::batch::{calibrate_all_channels, BatchResult};
use crate::data::burn::{detect_burns, BurnWindow};
use crate::data::calibration::{peak, Calibrator, FormulaId};
use crate::data::channels::{nearest_index, resolve_range, TelemetryLog, TimeUnit};
use crate::data::export::{self, DerivedRow, ExportTracker, RunSummary};
use crate::data::smoothing::SavitzkyGolay;
use crate::error::{Result, SiriusError};
use crate::plot::{PlotSpec, Series};

/// Thermistor inputs processed together by the thermistance analysis.
pub const THERMISTOR_CHANNELS: usize = 8;
/// Upper bound of `ADC_<i>` columns drawn by the overview.
pub const OVERVIEW_CHANNELS: usize = 16;

pub fn adc_channel_name(i: usize) -> String {
    format!("ADC_{}", i)
}

// ─────────────────────────────────────────────────────────────────────────────
// AnalysisKind
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Raw,
    Denoise,
    /// Load cell: `Thrust` or `Tank`.
    Force(FormulaId),
    /// Pressure transducer affine fit: `PtChamber` or `PtTank`.
    Pressure(FormulaId),
    /// Chamber pressure through the alternative linear fit.
    Chamber,
    Thermistance,
    Overview,
    FindIndex,
    ExportRange,
}

impl AnalysisKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisKind::Raw => "raw",
            AnalysisKind::Denoise => "denoise",
            AnalysisKind::Force(FormulaId::Tank) => "tank",
            AnalysisKind::Force(_) => "thrust",
            AnalysisKind::Pressure(FormulaId::PtTank) => "pt-tank",
            AnalysisKind::Pressure(_) => "pt-chamber",
            AnalysisKind::Chamber => "chamber",
            AnalysisKind::Thermistance => "thermistance",
            AnalysisKind::Overview => "overview",
            AnalysisKind::FindIndex => "find-index",
            AnalysisKind::ExportRange => "export",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for AnalysisKind {
    type Err = SiriusError;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "raw" | "adc" => AnalysisKind::Raw,
            "denoise" | "filtered" => AnalysisKind::Denoise,
            "thrust" => AnalysisKind::Force(FormulaId::Thrust),
            "tank" => AnalysisKind::Force(FormulaId::Tank),
            "pt-chamber" | "pt" => AnalysisKind::Pressure(FormulaId::PtChamber),
            "pt-tank" => AnalysisKind::Pressure(FormulaId::PtTank),
            "chamber" => AnalysisKind::Chamber,
            "thermistance" => AnalysisKind::Thermistance,
            "overview" | "all" => AnalysisKind::Overview,
            "find-index" | "find" => AnalysisKind::FindIndex,
            "export" | "export-range" => AnalysisKind::ExportRange,
            _ => return Err(SiriusError::UnknownFormula(s.to_string())),
        };
        Ok(kind)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection and result
// ─────────────────────────────────────────────────────────────────────────────

/// Channel plus `[start, stop)` row bounds. `stop = None` runs to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub channel: String,
    pub start: usize,
    pub stop: Option<usize>,
}

impl Selection {
    pub fn new<S: Into<String>>(channel: S) -> Self {
        Self {
            channel: channel.into(),
            start: 0,
            stop: None,
        }
    }

    pub fn with_range(mut self, start: usize, stop: Option<usize>) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }
}

/// Files an analysis wants written.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPayload {
    Derived {
        file_name: &'static str,
        rows: Vec<DerivedRow>,
        unit: TimeUnit,
    },
    Range {
        xs: Vec<f64>,
        ys: Vec<f64>,
    },
    Thermistance(BTreeMap<String, Vec<f64>>),
}

#[derive(Debug)]
pub struct Analysis {
    pub kind: AnalysisKind,
    pub plot: PlotSpec,
    /// Peak of the primary series, if it has a non-NaN value.
    pub peak: Option<f64>,
    pub burns: Vec<BurnWindow>,
    pub export: Option<ExportPayload>,
    pub batch: Option<BatchResult>,
}

impl Analysis {
    fn new(kind: AnalysisKind, plot: PlotSpec) -> Self {
        Self {
            kind,
            plot,
            peak: None,
            burns: Vec::new(),
            export: None,
            batch: None,
        }
    }

    /// Rows of the derived CSV export, if this analysis produces one.
    pub fn rows(&self) -> &[DerivedRow] {
        match &self.export {
            Some(ExportPayload::Derived { rows, .. }) => rows,
            _ => &[],
        }
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::new(self.kind.label());
        match &self.batch {
            Some(batch) => summary.push_batch(batch),
            None => {
                for s in &self.plot.series {
                    let ys: Vec<f64> = s.points.iter().map(|p| p[1]).collect();
                    summary.push_values(&s.name, &ys);
                }
            }
        }
        summary
    }

    /// Queue this analysis' files and the run summary on `tracker`.
    pub fn schedule_exports(&self, tracker: &mut ExportTracker) {
        match self.export.clone() {
            Some(ExportPayload::Derived { file_name, rows, unit }) => {
                tracker.spawn_file(file_name, move |w| export::write_derived_csv(w, &rows, unit));
            }
            Some(ExportPayload::Range { xs, ys }) => {
                tracker.spawn_file(export::RANGE_CSV, move |w| export::write_range_csv(w, &xs, &ys));
            }
            Some(ExportPayload::Thermistance(values)) => {
                #[cfg(feature = "parquet")]
                {
                    let values = values.clone();
                    let path = tracker.path(export::THERMISTANCE_PARQUET);
                    tracker.spawn(export::THERMISTANCE_PARQUET, move || {
                        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                            std::fs::create_dir_all(dir)?;
                        }
                        export::write_parquet(&path, &values)?;
                        Ok(path.clone())
                    });
                }
                tracker.spawn_file(export::THERMISTANCE_JSON, move |w| {
                    export::write_thermistance_json(w, &values)
                });
            }
            None => {}
        }
        let summary = self.summary();
        tracker.spawn_file(export::SUMMARY_JSON, move |w| summary.write_json(w));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Analyzer
// ─────────────────────────────────────────────────────────────────────────────

/// Runs analyses over one log with one configuration.
pub struct Analyzer<'a> {
    log: &'a TelemetryLog,
    cfg: &'a SiriusConfig,
    filter: SavitzkyGolay,
    calibrator: Calibrator<'static>,
}

impl<'a> Analyzer<'a> {
    pub fn new(log: &'a TelemetryLog, cfg: &'a SiriusConfig) -> Result<Self> {
        Ok(Self {
            log,
            cfg,
            filter: SavitzkyGolay::from_config(&cfg.smoothing)?,
            calibrator: Calibrator::from_config(cfg),
        })
    }

    pub fn log(&self) -> &TelemetryLog {
        self.log
    }

    /// Dispatch by kind. [`AnalysisKind::FindIndex`] has no plot and is
    /// served by [`Analyzer::find_index`] instead.
    pub fn run(&self, kind: AnalysisKind, sel: &Selection) -> Result<Analysis> {
        match kind {
            AnalysisKind::Raw => self.raw(sel),
            AnalysisKind::Denoise => self.denoise(sel),
            AnalysisKind::Force(f) => self.force(sel, f),
            AnalysisKind::Pressure(f) => self.pressure(sel, f),
            AnalysisKind::Chamber => self.chamber(sel),
            AnalysisKind::Thermistance => self.thermistance(sel),
            AnalysisKind::Overview => self.overview(sel),
            AnalysisKind::ExportRange => self.export_range(sel),
            AnalysisKind::FindIndex => Err(SiriusError::UnknownFormula(kind.label().to_string())),
        }
    }

    fn x_label(&self) -> String {
        format!("TimeStamp ({})", self.log.time_unit.label())
    }

    fn range(&self, sel: &Selection) -> Result<Range<usize>> {
        resolve_range(sel.start, sel.stop, self.log.len())
    }

    /// Timestamps and samples of the selected channel within the range.
    fn slice(&self, sel: &Selection) -> Result<(Vec<f64>, Vec<f64>)> {
        let r = self.range(sel)?;
        let xs = self.log.timestamps()?[r.clone()].to_vec();
        let ys = self.log.channel(&sel.channel)?.values()[r].to_vec();
        Ok((xs, ys))
    }

    pub fn raw(&self, sel: &Selection) -> Result<Analysis> {
        let (xs, ys) = self.slice(sel)?;
        let max = peak(&ys).map(|(_, v)| v).unwrap_or(f64::NAN);
        let plot = PlotSpec::new(format!("ADC VALUES MAX : {}", max), self.x_label(), "ADC")
            .with_series(Series::from_xy(&sel.channel, &xs, &ys));
        let mut a = Analysis::new(AnalysisKind::Raw, plot);
        a.peak = peak(&ys).map(|(_, v)| v);
        Ok(a)
    }

    pub fn denoise(&self, sel: &Selection) -> Result<Analysis> {
        let (xs, ys) = self.slice(sel)?;
        let smoothed = self.filter.smooth(&ys)?;
        let max = peak(&smoothed).map(|(_, v)| v);
        let plot = PlotSpec::new(
            format!("FILTERED ADC VALUES MAX : {:.2}", max.unwrap_or(f64::NAN)),
            self.x_label(),
            "ADC",
        )
        .with_series(Series::from_xy(&sel.channel, &xs, &smoothed));
        let mut a = Analysis::new(AnalysisKind::Denoise, plot);
        a.peak = max;
        Ok(a)
    }

    /// Thrust or tank load cell. Thrust also runs burn detection.
    pub fn force(&self, sel: &Selection, formula: FormulaId) -> Result<Analysis> {
        let title = match formula {
            FormulaId::Thrust => "THRUST",
            FormulaId::Tank => "TANK",
            other => return Err(SiriusError::UnknownFormula(other.label().to_string())),
        };
        let (xs, ys) = self.slice(sel)?;
        let smoothed = self.filter.smooth(&ys)?;
        let result = self.calibrator.calibrate(formula, &smoothed);
        let max = result.peak().map(|(_, v)| v);

        let mut plot = PlotSpec::new(
            format!("{} - MAX : {:.2}", title, max.unwrap_or(f64::NAN)),
            self.x_label(),
            formula.axis_label(),
        )
        .with_series(Series::from_xy(&sel.channel, &xs, &result.values));

        let burns = if formula == FormulaId::Thrust {
            detect_burns(&xs, &result.values, &self.cfg.burn, self.log.time_unit)
        } else {
            Vec::new()
        };
        if let Some(first) = burns.first() {
            log::info!("burn time: {:.3} s, peak {:.2} {}", first.duration, first.peak, formula.unit());
            plot = plot
                .with_marker("burn start", first.start)
                .with_marker("burn stop", first.stop);
        }

        let rows = derived_rows(&xs, &result.values, &smoothed);
        let mut a = Analysis::new(AnalysisKind::Force(formula), plot);
        a.peak = max;
        a.burns = burns;
        a.export = Some(ExportPayload::Derived {
            file_name: export::THRUST_CSV,
            rows,
            unit: self.log.time_unit,
        });
        Ok(a)
    }

    /// Pressure transducer through its affine fit.
    pub fn pressure(&self, sel: &Selection, formula: FormulaId) -> Result<Analysis> {
        if !matches!(formula, FormulaId::PtChamber | FormulaId::PtTank) {
            return Err(SiriusError::UnknownFormula(formula.label().to_string()));
        }
        let (xs, ys) = self.slice(sel)?;
        let smoothed = self.filter.smooth(&ys)?;
        let result = self.calibrator.calibrate(formula, &smoothed);
        let max = result.peak().map(|(_, v)| v);
        let plot = PlotSpec::new(
            format!("PT- MAX : {:.2}", max.unwrap_or(f64::NAN)),
            self.x_label(),
            formula.axis_label(),
        )
        .with_series(Series::from_xy(&sel.channel, &xs, &result.values));
        let mut a = Analysis::new(AnalysisKind::Pressure(formula), plot);
        a.peak = max;
        Ok(a)
    }

    /// Chamber pressure through the alternative linear fit, exported as `Chamber.csv`.
    pub fn chamber(&self, sel: &Selection) -> Result<Analysis> {
        let formula = FormulaId::PtChamberLinear;
        let (xs, ys) = self.slice(sel)?;
        let smoothed = self.filter.smooth(&ys)?;
        let result = self.calibrator.calibrate(formula, &smoothed);
        let max = result.peak().map(|(_, v)| v);
        let plot = PlotSpec::new(
            format!("PT CHAMBER MAX : {:.2}", max.unwrap_or(f64::NAN)),
            self.x_label(),
            formula.axis_label(),
        )
        .with_series(Series::from_xy(&sel.channel, &xs, &result.values));
        let mut a = Analysis::new(AnalysisKind::Chamber, plot);
        a.peak = max;
        a.export = Some(ExportPayload::Derived {
            file_name: export::CHAMBER_CSV,
            rows: derived_rows(&xs, &result.values, &smoothed),
            unit: self.log.time_unit,
        });
        Ok(a)
    }

    /// All thermistor inputs in parallel. The title reports the temperature
    /// of the hottest raw reading on the selected channel.
    pub fn thermistance(&self, sel: &Selection) -> Result<Analysis> {
        let r = self.range(sel)?;
        let xs = self.log.timestamps()?[r.clone()].to_vec();

        let names: Vec<String> = (0..THERMISTOR_CHANNELS)
            .map(adc_channel_name)
            .filter(|n| self.log.channels.contains_key(n))
            .collect();
        if names.is_empty() {
            return Err(SiriusError::UnknownChannel(adc_channel_name(0)));
        }
        let mut inputs = self.log.raw_channels(&names)?;
        for v in inputs.values_mut() {
            *v = v[r.clone()].to_vec();
        }

        let batch = calibrate_all_channels(&inputs, &self.filter, &self.calibrator, FormulaId::Thermistance);

        let raw = self.log.channel(&sel.channel)?.values();
        let hottest = peak(&raw[r]).map(|(_, v)| v).unwrap_or(f64::NAN);
        let t_max = self.calibrator.apply(FormulaId::Thermistance, hottest);

        let mut plot = PlotSpec::new(
            format!("THERMISTANCE C MAX : {:.2}", t_max),
            self.x_label(),
            FormulaId::Thermistance.axis_label(),
        );
        for (name, result) in batch.successes() {
            plot = plot.with_series(Series::from_xy(name, &xs, &result.values));
        }

        let mut a = Analysis::new(AnalysisKind::Thermistance, plot);
        a.peak = if t_max.is_nan() { None } else { Some(t_max) };
        a.export = Some(ExportPayload::Thermistance(batch.value_map()));
        a.batch = Some(batch);
        Ok(a)
    }

    /// Every `ADC_<i>` column present, smoothed, on one chart.
    pub fn overview(&self, sel: &Selection) -> Result<Analysis> {
        let r = self.range(sel)?;
        let xs = self.log.timestamps()?[r.clone()].to_vec();
        let mut plot = PlotSpec::new("ADC ALL", self.x_label(), "ADC");
        for name in (0..OVERVIEW_CHANNELS).map(adc_channel_name) {
            let Ok(ch) = self.log.channel(&name) else {
                continue;
            };
            match self.filter.smooth(&ch.values()[r.clone()]) {
                Ok(ys) => plot = plot.with_series(Series::from_xy(name, &xs, &ys)),
                Err(e) => log::warn!("overview: {} skipped: {}", name, e),
            }
        }
        Ok(Analysis::new(AnalysisKind::Overview, plot))
    }

    /// Index and value of the timestamp nearest to `value`.
    pub fn find_index(&self, value: f64) -> Result<Option<(usize, f64)>> {
        Ok(nearest_index(&self.log.timestamps()?, value))
    }

    /// Raw `(timestamp, sample)` pairs of the range, exported as `Export.csv`.
    pub fn export_range(&self, sel: &Selection) -> Result<Analysis> {
        let (xs, ys) = self.slice(sel)?;
        let plot = PlotSpec::new(format!("EXPORT {}", sel.channel), self.x_label(), "ADC")
            .with_series(Series::from_xy(&sel.channel, &xs, &ys));
        let mut a = Analysis::new(AnalysisKind::ExportRange, plot);
        a.peak = peak(&ys).map(|(_, v)| v);
        a.export = Some(ExportPayload::Range { xs, ys });
        Ok(a)
    }
}

fn derived_rows(xs: &[f64], values: &[f64], adc: &[f64]) -> Vec<DerivedRow> {
    xs.iter()
        .zip(values)
        .zip(adc)
        .map(|((&timestamp, &value), &adc)| DerivedRow { timestamp, value, adc })
        .collect()
}
