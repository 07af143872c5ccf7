//! Result rendering
//!
//! The `ResultsPane` trait is the per-test-kind results target: everything
//! a run shows the user (running state, recoverable notices, scores,
//! errors) goes through it. Console and in-memory implementations cover
//! the CLI and tests; `chart` holds the dashboard view-model.

mod chart;

pub use chart::{Chart, ChartData, Dashboard, TextChart};

use crate::api::{AnalyticsSummary, DeviceInventory, Recommendations};
use crate::runner::TestReport;
use crate::tone::TestKind;
use std::cmp::Ordering;

// ============================================================================
// Results pane
// ============================================================================

/// The output region associated with one test kind
pub trait ResultsPane {
    /// Clear the pane and show the running state
    fn set_running(&mut self, kind: TestKind);

    /// Show a dismissible recoverable notice; the run continues
    fn show_notice(&mut self, message: &str);

    /// Render a completed test report
    fn show_result(&mut self, report: &TestReport);

    /// Render a failure
    fn show_error(&mut self, message: &str);
}

/// Pane that prints to stdout
#[derive(Debug, Default)]
pub struct ConsolePane;

impl ResultsPane for ConsolePane {
    fn set_running(&mut self, kind: TestKind) {
        println!("Running {} test...", kind.display_name());
    }

    fn show_notice(&mut self, message: &str) {
        println!("Notice: {message}");
    }

    fn show_result(&mut self, report: &TestReport) {
        for line in format_report(report) {
            println!("{line}");
        }
    }

    fn show_error(&mut self, message: &str) {
        println!("Error: {message}");
    }
}

/// Pane that accumulates lines in memory
#[derive(Debug, Default)]
pub struct MemoryPane {
    lines: Vec<String>,
}

impl MemoryPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whole pane content as one string
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl ResultsPane for MemoryPane {
    fn set_running(&mut self, kind: TestKind) {
        self.lines.clear();
        self.lines.push(format!("Running {} test...", kind.display_name()));
    }

    fn show_notice(&mut self, message: &str) {
        self.lines.push(format!("Notice: {message}"));
    }

    fn show_result(&mut self, report: &TestReport) {
        self.lines.extend(format_report(report));
    }

    fn show_error(&mut self, message: &str) {
        self.lines.push(format!("Error: {message}"));
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Format a completed report into display lines
///
/// The score renders without decimals; per-frequency measurements are
/// listed in ascending frequency order as percentages.
pub fn format_report(report: &TestReport) -> Vec<String> {
    let mut lines = vec![
        "Test Results".to_string(),
        format!("Score: {:.0}/100", report.score),
    ];

    if let Some(results) = &report.results {
        lines.push(format!("{}:", report.kind.display_name()));
        let mut entries: Vec<(&String, f64)> = results.iter().map(|(k, v)| (k, *v)).collect();
        entries.sort_by(|a, b| numeric_label_order(a.0, b.0));
        for (freq, response) in entries {
            lines.push(format!("  {freq} Hz: {:.1}%", response * 100.0));
        }
    }

    if let Some(distortion) = report.distortion_percentage {
        lines.push(format!("Distortion: {distortion:.2}%"));
    }

    lines
}

/// Order labels numerically where possible ("1000" after "100", not before)
fn numeric_label_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Render the analytics summary, updating the dashboard charts in place
pub fn render_analytics(summary: &AnalyticsSummary, dashboard: &mut Dashboard) -> String {
    let mut out = String::new();
    out.push_str("Testing Analytics\n");
    out.push_str(&format!("Total tests conducted: {}\n", summary.total_tests));
    out.push_str(&format!(
        "Average score across all tests: {:.1}\n",
        summary.average_score
    ));

    if !summary.test_types.is_empty() {
        out.push_str("\nTest Types\n");
        for (test_type, count) in &summary.test_types {
            out.push_str(&format!("  {test_type}: {count} tests\n"));
        }
    }

    if !summary.speaker_models.is_empty() {
        out.push_str("\nSpeaker Models\n");
        for (model, count) in &summary.speaker_models {
            let average = summary
                .average_scores_by_model
                .get(model)
                .copied()
                .unwrap_or(0.0);
            out.push_str(&format!("  {model}: {count} tests, avg {average:.1}\n"));
        }
    }

    dashboard.update(
        "scores-by-model",
        &ChartData {
            title: "Average score by model".to_string(),
            labels: summary.average_scores_by_model.keys().cloned().collect(),
            values: summary.average_scores_by_model.values().copied().collect(),
        },
    );
    dashboard.update(
        "frequency-response",
        &ChartData {
            title: "Average frequency response".to_string(),
            labels: summary.frequency_data.labels.clone(),
            values: summary.frequency_data.average_response.clone(),
        },
    );
    dashboard.update(
        "ratings",
        &ChartData {
            title: "Ratings distribution".to_string(),
            labels: (1..=summary.ratings_distribution.len())
                .map(|stars| format!("{stars} star"))
                .collect(),
            values: summary
                .ratings_distribution
                .iter()
                .map(|&count| count as f64)
                .collect(),
        },
    );

    out.push('\n');
    out.push_str(&dashboard.render_all());
    out
}

/// Render speaker recommendations as display text
pub fn render_recommendations(recommendations: &Recommendations) -> String {
    let mut out = String::new();
    out.push_str("Recommended Speakers\n");
    for (rank, speaker) in recommendations.best_speakers.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} — avg {:.1} over {} tests\n",
            rank + 1,
            speaker.model,
            speaker.average_score,
            speaker.test_count
        ));
    }

    if !recommendations.personalized_recommendations.is_empty() {
        out.push_str("\nPersonalized For You\n");
        for pick in &recommendations.personalized_recommendations {
            out.push_str(&format!(
                "  {} — {:.1} (base {:.1})\n",
                pick.model, pick.personalized_score, pick.base_score
            ));
        }
    }

    if !recommendations.explanation.is_empty() {
        out.push('\n');
        out.push_str(&recommendations.explanation);
        out.push('\n');
    }
    out
}

/// Render the detected output device inventory
pub fn render_devices(inventory: &DeviceInventory) -> String {
    let device = &inventory.default_device;
    format!(
        "Default device: {} ({} ch @ {} Hz)\nAudio API {}, {} devices available\n",
        device.name,
        device.channels,
        device.default_samplerate,
        inventory.system_info.api_version,
        inventory.system_info.available_devices
    )
}
