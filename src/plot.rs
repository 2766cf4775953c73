//! Renderer-independent description of a chart.
//!
//! Analyses produce a [`PlotSpec`]; the viewer (feature `viewer`) draws it,
//! and the CLI can print or export it without any GUI.

use serde::{Deserialize, Serialize};

/// One named line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

impl Series {
    /// Zip `xs` and `ys` into points. NaN values are kept; renderers break
    /// the line there.
    pub fn from_xy<S: Into<String>>(name: S, xs: &[f64], ys: &[f64]) -> Self {
        Self {
            name: name.into(),
            points: xs.iter().zip(ys).map(|(x, y)| [*x, *y]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Vertical line at an x position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub x: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub markers: Vec<Marker>,
}

impl PlotSpec {
    pub fn new<T: Into<String>, X: Into<String>, Y: Into<String>>(title: T, x_label: X, y_label: Y) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            series: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_marker<S: Into<String>>(mut self, name: S, x: f64) -> Self {
        self.markers.push(Marker { name: name.into(), x });
        self
    }

    /// Total number of points across all series.
    pub fn point_count(&self) -> usize {
        self.series.iter().map(Series::len).sum()
    }
}
