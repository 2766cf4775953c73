//! Channels: named columns of a telemetry log sharing one timestamp axis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiriusError};

// ─────────────────────────────────────────────────────────────────────────────
// TimeUnit
// ─────────────────────────────────────────────────────────────────────────────

/// The unit in which raw timestamps are expressed.
///
/// Timestamps stay in their raw unit throughout the pipeline; this tells the
/// exporters and the burn detector how to turn a difference into seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    #[default]
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// How many of this unit make up one second.
    ///
    /// ```
    /// # use sirius::data::channels::TimeUnit;
    /// assert_eq!(TimeUnit::Milliseconds.units_per_second(), 1_000.0);
    /// ```
    pub fn units_per_second(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1_000.0,
            TimeUnit::Microseconds => 1_000_000.0,
            TimeUnit::Nanoseconds => 1_000_000_000.0,
        }
    }

    /// Convert a value expressed in this unit to seconds.
    pub fn to_seconds(&self, value: f64) -> f64 {
        value / self.units_per_second()
    }

    /// Short label used in axis titles and CSV headers.
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cells and channels
// ─────────────────────────────────────────────────────────────────────────────

/// One CSV field. Fields that do not parse as integers are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Int(i64),
    Text(String),
}

impl Cell {
    pub fn parse(field: &str) -> Self {
        match field.trim().parse::<i64>() {
            Ok(v) => Cell::Int(v),
            Err(_) => Cell::Text(field.to_string()),
        }
    }

    /// Numeric view of the cell; text cells read as NaN.
    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Int(v) => *v as f64,
            Cell::Text(_) => f64::NAN,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Cell::Text(_))
    }
}

/// A named column of raw samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Channel {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn from_values<S: Into<String>>(name: S, values: &[i64]) -> Self {
        Self {
            name: name.into(),
            cells: values.iter().map(|v| Cell::Int(*v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Samples as floats, NaN where the log held text.
    pub fn values(&self) -> Vec<f64> {
        self.cells.iter().map(Cell::as_f64).collect()
    }

    /// Number of cells that did not parse as integers.
    pub fn text_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_text()).count()
    }
}

/// A row that the reader refused, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the source file (the header is line 1).
    pub line: usize,
    pub expected_fields: usize,
    pub found_fields: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// TelemetryLog
// ─────────────────────────────────────────────────────────────────────────────

/// A parsed log: header order, the columns, and rows that were dropped.
///
/// The first header column is the timestamp axis. Every channel has the same
/// length, because malformed rows are dropped whole.
#[derive(Debug, Clone, Default)]
pub struct TelemetryLog {
    pub header: Vec<String>,
    pub channels: BTreeMap<String, Channel>,
    pub skipped_rows: Vec<SkippedRow>,
    pub time_unit: TimeUnit,
}

impl TelemetryLog {
    pub fn new(header: Vec<String>, time_unit: TimeUnit) -> Self {
        let channels = header
            .iter()
            .map(|h| (h.clone(), Channel::new(h.clone())))
            .collect();
        Self {
            header,
            channels,
            skipped_rows: Vec::new(),
            time_unit,
        }
    }

    /// Name of the timestamp column.
    pub fn time_column(&self) -> Option<&str> {
        self.header.first().map(|s| s.as_str())
    }

    /// Timestamps as floats.
    pub fn timestamps(&self) -> Result<Vec<f64>> {
        let name = self.time_column().ok_or(SiriusError::MissingHeader)?;
        Ok(self.channel(name)?.values())
    }

    pub fn channel(&self, name: &str) -> Result<&Channel> {
        self.channels
            .get(name)
            .ok_or_else(|| SiriusError::UnknownChannel(name.to_string()))
    }

    /// Number of retained rows.
    pub fn len(&self) -> usize {
        self.time_column()
            .and_then(|n| self.channels.get(n))
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Data channel names (every column but the timestamp), in header order.
    pub fn data_channel_names(&self) -> Vec<String> {
        self.header.iter().skip(1).cloned().collect()
    }

    /// Numeric samples for the named channels, keyed by name.
    pub fn raw_channels(&self, names: &[String]) -> Result<BTreeMap<String, Vec<f64>>> {
        names
            .iter()
            .map(|n| Ok((n.clone(), self.channel(n)?.values())))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Index helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve a `start..stop` selection against a sequence of `len` items.
///
/// `stop` is exclusive and clamped to `len`; `None` means "to the end".
pub fn resolve_range(start: usize, stop: Option<usize>, len: usize) -> Result<std::ops::Range<usize>> {
    let stop = stop.unwrap_or(len).min(len);
    if start >= len || start > stop {
        return Err(SiriusError::InvalidRange { start, stop, len });
    }
    Ok(start..stop)
}

/// Index and value of the timestamp nearest to `value`. The first index wins ties.
pub fn nearest_index(xs: &[f64], value: f64) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64, f64)> = None;
    for (i, &x) in xs.iter().enumerate() {
        let d = (x - value).abs();
        if d.is_nan() {
            continue;
        }
        match best {
            Some((_, _, bd)) if d >= bd => {}
            _ => best = Some((i, x, d)),
        }
    }
    best.map(|(i, x, _)| (i, x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_parse_keeps_text_verbatim() {
        assert_eq!(Cell::parse("42"), Cell::Int(42));
        assert_eq!(Cell::parse(" 7 "), Cell::Int(7));
        assert_eq!(Cell::parse("ERR"), Cell::Text("ERR".to_string()));
        assert!(Cell::parse("1.5").is_text());
        assert!(Cell::parse("x").as_f64().is_nan());
    }

    #[test]
    fn resolve_range_clamps_stop() {
        assert_eq!(resolve_range(2, Some(100), 10).unwrap(), 2..10);
        assert_eq!(resolve_range(0, None, 5).unwrap(), 0..5);
        assert!(resolve_range(5, None, 5).is_err());
        assert!(resolve_range(4, Some(3), 10).is_err());
    }

    #[test]
    fn nearest_index_prefers_first_on_tie() {
        let xs = [0.0, 10.0, 20.0, 30.0];
        assert_eq!(nearest_index(&xs, 14.0), Some((1, 10.0)));
        assert_eq!(nearest_index(&xs, 15.0), Some((1, 10.0)));
        assert_eq!(nearest_index(&xs, 99.0), Some((3, 30.0)));
        assert_eq!(nearest_index(&[], 1.0), None);
    }
}
