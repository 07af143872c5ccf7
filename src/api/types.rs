//! Wire types for the scoring service
//!
//! Request and response bodies for every endpoint the harness talks to.
//! Shapes follow the service contract; unknown fields are ignored on
//! decode so the service can grow without breaking older clients.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier the service assigns to a recorded test
pub type TestId = i64;

// ============================================================================
// Test runs
// ============================================================================

/// Body of `POST /test/{kind}`
#[derive(Debug, Clone, Serialize)]
pub struct TestRequest {
    pub speaker_model: String,
}

/// Response of `POST /test/{kind}`
///
/// `results` carries the per-frequency measurement map for sweep and bass
/// tests; `distortion_percentage` is set for distortion tests.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestResponse {
    #[serde(default)]
    pub test: Option<String>,
    pub id: TestId,
    pub score: f64,
    #[serde(default)]
    pub results: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub distortion_percentage: Option<f64>,
}

// ============================================================================
// Ratings
// ============================================================================

/// Body of `POST /submit-rating`
#[derive(Debug, Clone, Serialize)]
pub struct RatingRequest {
    pub test_id: Option<TestId>,
    pub rating: u8,
    pub speaker_model: String,
}

/// Response of `POST /submit-rating`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatingAck {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl RatingAck {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Analytics
// ============================================================================

/// Response of `GET /analytics`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyticsSummary {
    pub total_tests: u64,
    pub average_score: f64,
    #[serde(default)]
    pub test_types: BTreeMap<String, u64>,
    #[serde(default)]
    pub speaker_models: BTreeMap<String, u64>,
    #[serde(default)]
    pub average_scores_by_model: BTreeMap<String, f64>,
    pub frequency_data: FrequencyData,
    /// Counts of 1..5 star ratings, lowest first
    #[serde(default)]
    pub ratings_distribution: Vec<u64>,
}

/// Aggregated frequency-response series
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrequencyData {
    pub labels: Vec<String>,
    pub average_response: Vec<f64>,
}

// ============================================================================
// Recommendations
// ============================================================================

/// Response of `GET /recommendations`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub best_speakers: Vec<SpeakerRanking>,
    #[serde(default)]
    pub personalized_recommendations: Vec<PersonalizedPick>,
    #[serde(default)]
    pub explanation: String,
}

/// One entry of the global ranking
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeakerRanking {
    pub model: String,
    pub average_score: f64,
    pub test_count: u64,
    #[serde(default)]
    pub scores_by_type: BTreeMap<String, f64>,
}

/// One entry of the per-user ranking
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonalizedPick {
    pub model: String,
    pub base_score: f64,
    pub personalized_score: f64,
    pub test_count: u64,
    #[serde(default)]
    pub preferred_type_scores: BTreeMap<String, f64>,
}

// ============================================================================
// Devices & sessions
// ============================================================================

/// Response of `GET /detect-speakers`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceInventory {
    pub status: String,
    pub default_device: DeviceInfo,
    pub system_info: SystemInfo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub channels: u16,
    pub default_samplerate: u32,
    pub hostapi: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemInfo {
    pub api_version: String,
    pub available_devices: u32,
}

/// Body of `POST /user/start-session`
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Response of `POST /user/start-session`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionAck {
    pub status: String,
    pub user_id: String,
    pub user_name: String,
}

// ============================================================================
// Exports
// ============================================================================

/// Formats accepted by `GET /export-results`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "excel" | "xlsx" => Some(Self::Excel),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// File extension for downloaded exports
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
            Self::Json => "json",
        }
    }
}

/// A downloaded export file
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDownload {
    /// Filename from Content-Disposition, or a generated fallback
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_test_response_with_results() {
        let body = r#"{
            "test": "frequency_response",
            "id": 7,
            "score": 82.5,
            "results": {"100": 0.9, "1000": 0.95}
        }"#;
        let decoded: TestResponse = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.id, 7);
        assert_eq!(decoded.score, 82.5);
        let results = decoded.results.unwrap();
        assert_eq!(results.get("100"), Some(&0.9));
        assert_eq!(decoded.distortion_percentage, None);
    }

    #[test]
    fn test_decode_test_response_distortion_shape() {
        let body = r#"{"test": "distortion", "id": 3, "score": 74.0, "distortion_percentage": 2.6}"#;
        let decoded: TestResponse = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.distortion_percentage, Some(2.6));
        assert_eq!(decoded.results, None);
    }

    #[test]
    fn test_decode_rejects_missing_score() {
        let body = r#"{"id": 3}"#;
        assert!(serde_json::from_str::<TestResponse>(body).is_err());
    }

    #[test]
    fn test_rating_ack_success() {
        let ack: RatingAck =
            serde_json::from_str(r#"{"status": "success", "message": "Rating submitted"}"#).unwrap();
        assert!(ack.is_success());

        let ack: RatingAck = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(!ack.is_success());
        assert_eq!(ack.message, None);
    }

    #[test]
    fn test_rating_request_serializes_all_fields() {
        let request = RatingRequest {
            test_id: Some(7),
            rating: 4,
            speaker_model: "ModelX".to_string(),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["test_id"], 7);
        assert_eq!(body["rating"], 4);
        assert_eq!(body["speaker_model"], "ModelX");
    }

    #[test]
    fn test_decode_analytics() {
        let body = r#"{
            "total_tests": 12,
            "average_score": 81.3,
            "test_types": {"frequency_response": 7, "distortion": 5},
            "speaker_models": {"ModelX": 12},
            "average_scores_by_model": {"ModelX": 81.3},
            "frequency_data": {
                "labels": ["100Hz", "1kHz"],
                "average_response": [0.82, 0.91]
            },
            "ratings_distribution": [0, 1, 2, 5, 4]
        }"#;
        let summary: AnalyticsSummary = serde_json::from_str(body).unwrap();
        assert_eq!(summary.total_tests, 12);
        assert_eq!(summary.frequency_data.labels.len(), 2);
        assert_eq!(summary.ratings_distribution, vec![0, 1, 2, 5, 4]);
    }

    #[test]
    fn test_export_format_round_trip() {
        for format in [ExportFormat::Csv, ExportFormat::Excel, ExportFormat::Json] {
            assert_eq!(ExportFormat::from_str(format.as_str()), Some(format));
        }
        assert_eq!(ExportFormat::from_str("xlsx"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::from_str("pdf"), None);
    }
}
