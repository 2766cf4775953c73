//! Batch orchestration: smooth and calibrate many channels in parallel.
//!
//! Each channel is independent. The result map is assembled only after every
//! channel has finished, and a failing channel is reported next to the
//! successful ones instead of aborting the batch.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::data::calibration::{CalibrationResult, Calibrator, FormulaId};
use crate::data::smoothing::SavitzkyGolay;
use crate::error::SiriusError;

pub type ChannelOutcome = Result<CalibrationResult, SiriusError>;

/// Per-channel outcomes keyed by channel name.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: BTreeMap<String, ChannelOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ChannelOutcome> {
        self.outcomes.get(name)
    }

    /// Successful channels only.
    pub fn successes(&self) -> impl Iterator<Item = (&String, &CalibrationResult)> {
        self.outcomes
            .iter()
            .filter_map(|(k, v)| v.as_ref().ok().map(|r| (k, r)))
    }

    /// Failed channels only.
    pub fn failures(&self) -> impl Iterator<Item = (&String, &SiriusError)> {
        self.outcomes
            .iter()
            .filter_map(|(k, v)| v.as_ref().err().map(|e| (k, e)))
    }

    /// Values of every successful channel, the shape written to `thermistance.json`.
    pub fn value_map(&self) -> BTreeMap<String, Vec<f64>> {
        self.successes()
            .map(|(k, r)| (k.clone(), r.values.clone()))
            .collect()
    }
}

/// Smooth then calibrate one channel.
pub fn process_channel(
    samples: &[f64],
    filter: &SavitzkyGolay,
    calibrator: &Calibrator<'_>,
    formula: FormulaId,
) -> ChannelOutcome {
    let smoothed = filter.smooth(samples)?;
    Ok(calibrator.calibrate(formula, &smoothed))
}

/// Run [`process_channel`] over every channel on the rayon pool.
pub fn calibrate_all_channels(
    channels: &BTreeMap<String, Vec<f64>>,
    filter: &SavitzkyGolay,
    calibrator: &Calibrator<'_>,
    formula: FormulaId,
) -> BatchResult {
    let outcomes: BTreeMap<String, ChannelOutcome> = channels
        .par_iter()
        .map(|(name, samples)| {
            log::debug!("{}: {} samples", name, samples.len());
            (name.clone(), process_channel(samples, filter, calibrator, formula))
        })
        .collect();

    let result = BatchResult { outcomes };
    for (name, err) in result.failures() {
        log::warn!("channel {} failed: {}", name, err);
    }
    log::info!(
        "{} batch: {} of {} channels calibrated",
        formula,
        result.successes().count(),
        result.len()
    );
    result
}
