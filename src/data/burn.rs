//! Burn window detection on calibrated thrust.
//!
//! A two-state scan with hysteresis: a sample strictly above `rising` opens a
//! window, a sample strictly below `falling` closes it. NaN samples never
//! change state.

use serde::{Deserialize, Serialize};

use crate::config::BurnConfig;
use crate::data::channels::TimeUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BurnState {
    #[default]
    BelowThreshold,
    AboveThreshold,
}

/// A detected burn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnWindow {
    /// Timestamp of the first sample above `rising` (raw log unit).
    pub start: f64,
    /// Timestamp of the first sample below `falling`, or the last timestamp
    /// when the log ends mid-burn.
    pub stop: f64,
    /// `stop - start` in seconds.
    pub duration: f64,
    /// Largest value seen inside the window.
    pub peak: f64,
}

/// Incremental detector. Feed samples with [`BurnDetector::process`], then call
/// [`BurnDetector::finish`] to close a window left open at the end.
#[derive(Debug, Clone)]
pub struct BurnDetector {
    rising: f64,
    falling: f64,
    min_duration_s: f64,
    time_unit: TimeUnit,
    state: BurnState,
    start_t: f64,
    peak: f64,
    last_t: Option<f64>,
    windows: Vec<BurnWindow>,
}

impl BurnDetector {
    pub fn new(cfg: &BurnConfig, time_unit: TimeUnit) -> Self {
        Self {
            rising: cfg.rising,
            falling: cfg.falling,
            min_duration_s: cfg.min_duration_s,
            time_unit,
            state: BurnState::BelowThreshold,
            start_t: 0.0,
            peak: f64::NEG_INFINITY,
            last_t: None,
            windows: Vec::new(),
        }
    }

    pub fn state(&self) -> BurnState {
        self.state
    }

    /// Windows closed so far.
    pub fn windows(&self) -> &[BurnWindow] {
        &self.windows
    }

    /// Consume one `(timestamp, value)` sample.
    pub fn process(&mut self, t: f64, v: f64) {
        self.last_t = Some(t);
        if v.is_nan() {
            return;
        }
        match self.state {
            BurnState::BelowThreshold if v > self.rising => {
                self.state = BurnState::AboveThreshold;
                self.start_t = t;
                self.peak = v;
            }
            BurnState::AboveThreshold => {
                if v < self.falling {
                    self.close(t);
                } else if v > self.peak {
                    self.peak = v;
                }
            }
            BurnState::BelowThreshold => {}
        }
    }

    /// Process a whole sequence. Extra values beyond the shorter slice are ignored.
    pub fn process_all(&mut self, ts: &[f64], vs: &[f64]) {
        for (&t, &v) in ts.iter().zip(vs) {
            self.process(t, v);
        }
    }

    /// Close any open window at the last timestamp seen and return all windows.
    pub fn finish(mut self) -> Vec<BurnWindow> {
        if self.state == BurnState::AboveThreshold {
            if let Some(t) = self.last_t {
                self.close(t);
            }
        }
        self.windows
    }

    fn close(&mut self, stop: f64) {
        let duration = self.time_unit.to_seconds(stop - self.start_t);
        if duration >= self.min_duration_s {
            let w = BurnWindow {
                start: self.start_t,
                stop,
                duration,
                peak: self.peak,
            };
            log::debug!("burn window {:.3}s, peak {:.2}", w.duration, w.peak);
            self.windows.push(w);
        }
        self.state = BurnState::BelowThreshold;
        self.peak = f64::NEG_INFINITY;
    }
}

/// Run a detector over a full sequence.
pub fn detect_burns(ts: &[f64], vs: &[f64], cfg: &BurnConfig, time_unit: TimeUnit) -> Vec<BurnWindow> {
    let mut det = BurnDetector::new(cfg, time_unit);
    det.process_all(ts, vs);
    det.finish()
}
