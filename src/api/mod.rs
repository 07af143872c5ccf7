//! Scoring-service interface
//!
//! Typed wire contracts plus the async client. The orchestrator and the
//! rating flow depend only on the narrow `ScoringBackend` seam so they can
//! be exercised against an in-process fake.

mod client;
mod types;

pub use client::ApiClient;
pub use types::{
    AnalyticsSummary, DeviceInfo, DeviceInventory, ExportDownload, ExportFormat, FrequencyData,
    PersonalizedPick, RatingAck, RatingRequest, Recommendations, SessionAck, SpeakerRanking,
    StartSessionRequest, SystemInfo, TestId, TestRequest, TestResponse,
};

use crate::error::Result;
use crate::tone::TestKind;

/// The slice of the service the test orchestrator needs
///
/// `ApiClient` implements this over HTTP; tests substitute a fake.
#[allow(async_fn_in_trait)]
pub trait ScoringBackend {
    /// Record a finished test run and receive its score
    async fn run_test(&self, kind: TestKind, request: &TestRequest) -> Result<TestResponse>;

    /// Attach a 1–5 star rating to a previously recorded test
    async fn submit_rating(&self, request: &RatingRequest) -> Result<RatingAck>;
}
