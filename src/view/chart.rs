//! Chart wrappers
//!
//! Small uniform interface over chart instances so view-models can update
//! a series in place instead of destroying and recreating render objects.

use std::collections::BTreeMap;

/// One renderable data series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// A chart instance owned by a view-model
pub trait Chart {
    /// Replace the chart's data with a new series
    fn update(&mut self, data: &ChartData);

    /// Render the current series to text
    fn render(&self) -> String;

    /// Release the chart; a destroyed chart renders nothing
    fn destroy(&mut self);
}

/// Horizontal bar chart rendered as text
#[derive(Debug)]
pub struct TextChart {
    width: usize,
    data: ChartData,
    destroyed: bool,
}

impl TextChart {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            data: ChartData::default(),
            destroyed: false,
        }
    }
}

impl Default for TextChart {
    fn default() -> Self {
        Self::new(40)
    }
}

impl Chart for TextChart {
    fn update(&mut self, data: &ChartData) {
        if !self.destroyed {
            self.data = data.clone();
        }
    }

    fn render(&self) -> String {
        if self.destroyed || self.data.values.is_empty() {
            return String::new();
        }

        let max = self
            .data
            .values
            .iter()
            .cloned()
            .fold(f64::MIN, f64::max)
            .max(f64::MIN_POSITIVE);

        let mut out = String::new();
        out.push_str(&self.data.title);
        out.push('\n');
        for (label, value) in self.data.labels.iter().zip(&self.data.values) {
            let filled = ((value / max) * self.width as f64).round() as usize;
            let bar: String = "█".repeat(filled.min(self.width));
            out.push_str(&format!("{label:>16} │{bar:<width$}│ {value:.2}\n", width = self.width));
        }
        out
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.data = ChartData::default();
    }
}

/// View-model owning one chart per analytics series
#[derive(Default)]
pub struct Dashboard {
    charts: BTreeMap<String, Box<dyn Chart>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the chart registered under `key`, creating it on first use
    pub fn update(&mut self, key: &str, data: &ChartData) {
        self.charts
            .entry(key.to_string())
            .or_insert_with(|| Box::new(TextChart::default()))
            .update(data);
    }

    /// Render every chart, in key order
    pub fn render_all(&self) -> String {
        let mut out = String::new();
        for chart in self.charts.values() {
            let rendered = chart.render();
            if !rendered.is_empty() {
                out.push_str(&rendered);
                out.push('\n');
            }
        }
        out
    }

    /// Destroy and drop every chart
    pub fn destroy_all(&mut self) {
        for chart in self.charts.values_mut() {
            chart.destroy();
        }
        self.charts.clear();
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}
