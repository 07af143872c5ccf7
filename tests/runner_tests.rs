//! Orchestrator integration tests
//!
//! End-to-end runs against an in-process scoring backend: score rendering,
//! error containment, the one-run-per-target invariant, and the rating
//! flow.

use resona::api::{RatingAck, RatingRequest, ScoringBackend, TestRequest, TestResponse};
use resona::progress::ProgressSink;
use resona::tone::AudioOutput;
use resona::view::MemoryPane;
use resona::{Config, ResonaError, Result, RunOutcome, TestKind, TestRunner, TestSession};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// Test doubles
// ============================================================================

/// What the fake backend answers to test submissions
#[derive(Debug, Clone)]
enum Script {
    Respond(TestResponse),
    FailWithStatus(u16),
}

/// In-process `ScoringBackend` recording every call it receives
struct FakeBackend {
    script: Script,
    test_calls: Mutex<Vec<(TestKind, String)>>,
    rating_calls: Mutex<Vec<RatingRequest>>,
}

impl FakeBackend {
    fn returning(response: TestResponse) -> Self {
        Self {
            script: Script::Respond(response),
            test_calls: Mutex::new(Vec::new()),
            rating_calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_with_status(status: u16) -> Self {
        Self {
            script: Script::FailWithStatus(status),
            test_calls: Mutex::new(Vec::new()),
            rating_calls: Mutex::new(Vec::new()),
        }
    }

    fn test_calls(&self) -> Vec<(TestKind, String)> {
        self.test_calls.lock().unwrap().clone()
    }

    fn rating_calls(&self) -> Vec<RatingRequest> {
        self.rating_calls.lock().unwrap().clone()
    }
}

impl ScoringBackend for FakeBackend {
    async fn run_test(&self, kind: TestKind, request: &TestRequest) -> Result<TestResponse> {
        self.test_calls
            .lock()
            .unwrap()
            .push((kind, request.speaker_model.clone()));
        match &self.script {
            Script::Respond(response) => Ok(response.clone()),
            Script::FailWithStatus(status) => Err(ResonaError::Network { status: *status }),
        }
    }

    async fn submit_rating(&self, request: &RatingRequest) -> Result<RatingAck> {
        self.rating_calls.lock().unwrap().push(request.clone());
        Ok(RatingAck {
            status: "success".to_string(),
            message: Some("Rating submitted".to_string()),
        })
    }
}

fn sweep_response() -> TestResponse {
    let mut results = BTreeMap::new();
    results.insert("100".to_string(), 0.9);
    results.insert("1000".to_string(), 0.95);
    TestResponse {
        test: Some("frequency_response".to_string()),
        id: 7,
        score: 82.5,
        results: Some(results),
        distortion_percentage: None,
    }
}

/// Progress sink that records every emitted fraction
fn progress_collector() -> (ProgressSink, Arc<Mutex<Vec<f32>>>) {
    let values = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&values);
    let sink: ProgressSink = Arc::new(move |fraction| {
        recorded.lock().unwrap().push(fraction);
    });
    (sink, values)
}

/// Runner wired to the silent audio path
fn silent_runner<'a>(
    backend: &'a FakeBackend,
    session: &'a TestSession,
) -> TestRunner<'a, FakeBackend> {
    TestRunner::new(backend, session, Config::default()).with_output(AudioOutput::disabled())
}

// ============================================================================
// Scoring scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sweep_run_renders_score_and_records_id() {
    let backend = FakeBackend::returning(sweep_response());
    let session = TestSession::new();
    let runner = silent_runner(&backend, &session);
    let mut pane = MemoryPane::new();
    let (progress, fractions) = progress_collector();

    let outcome = runner
        .run_test(TestKind::FrequencyResponse, "ModelX", &mut pane, progress)
        .await;

    assert!(outcome.is_completed(), "outcome: {outcome:?}");
    let report = outcome.report().unwrap();
    assert_eq!(report.test_id, 7);
    assert_eq!(report.score, 82.5);

    // Rendered output: rounded score plus the per-frequency breakdown
    assert!(pane.contains("Score: 82/100"), "pane: {}", pane.text());
    assert!(pane.contains("100 Hz: 90.0%"));
    assert!(pane.contains("1000 Hz: 95.0%"));

    // The id is stored for a later rating submission
    assert_eq!(session.last_test_id(), Some(7));
    assert_eq!(session.last_test_kind(), Some(TestKind::FrequencyResponse));

    // Exactly one request, carrying the speaker model
    assert_eq!(
        backend.test_calls(),
        vec![(TestKind::FrequencyResponse, "ModelX".to_string())]
    );

    // Progress ran to completion before the request was issued
    let fractions = fractions.lock().unwrap();
    assert_eq!(*fractions.last().unwrap(), 1.0);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_silent_mode_notice_is_rendered_and_run_continues() {
    let backend = FakeBackend::returning(sweep_response());
    let session = TestSession::new();
    let runner = silent_runner(&backend, &session);
    let mut pane = MemoryPane::new();
    let (progress, _) = progress_collector();

    let outcome = runner
        .run_test(TestKind::FrequencyResponse, "ModelX", &mut pane, progress)
        .await;

    assert!(outcome.is_completed());
    assert!(
        pane.contains("continuing without audio"),
        "probe failure must surface a notice: {}",
        pane.text()
    );
}

#[tokio::test(start_paused = true)]
async fn test_http_500_renders_error_and_records_nothing() {
    let backend = FakeBackend::failing_with_status(500);
    let session = TestSession::new();
    let runner = silent_runner(&backend, &session);
    let mut pane = MemoryPane::new();
    let (progress, _) = progress_collector();

    let outcome = runner
        .run_test(TestKind::Distortion, "ModelX", &mut pane, progress)
        .await;

    assert!(matches!(outcome, RunOutcome::Failed(_)));
    assert!(
        pane.contains("500"),
        "error must reference the status: {}",
        pane.text()
    );
    assert_eq!(session.last_test_id(), None);

    // The request was issued exactly once; no retries
    assert_eq!(backend.test_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_run_releases_the_target() {
    let backend = FakeBackend::failing_with_status(503);
    let session = TestSession::new();
    let runner = silent_runner(&backend, &session);
    let mut pane = MemoryPane::new();
    let (progress, _) = progress_collector();

    runner
        .run_test(TestKind::BassResponse, "ModelX", &mut pane, progress.clone())
        .await;
    assert!(!session.is_active(TestKind::BassResponse));

    // The target accepts a new run afterwards
    let outcome = runner
        .run_test(TestKind::BassResponse, "ModelX", &mut pane, progress)
        .await;
    assert!(matches!(outcome, RunOutcome::Failed(_)));
    assert_eq!(backend.test_calls().len(), 2);
}

// ============================================================================
// Concurrency invariant
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_busy_target_rejected_without_audio_or_network_activity() {
    let backend = FakeBackend::returning(sweep_response());
    let session = TestSession::new();
    let runner = silent_runner(&backend, &session);
    let mut pane = MemoryPane::new();
    let (progress, fractions) = progress_collector();

    // Hold the target as if a run were mid-flight
    let _claim = session.begin(TestKind::FrequencyResponse).unwrap();

    let outcome = runner
        .run_test(TestKind::FrequencyResponse, "ModelX", &mut pane, progress)
        .await;

    assert!(matches!(outcome, RunOutcome::Rejected(_)));
    assert!(pane.contains("already running"), "pane: {}", pane.text());
    assert!(backend.test_calls().is_empty(), "no duplicate request");
    assert!(fractions.lock().unwrap().is_empty(), "no duplicate ticks");
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_runs_on_same_target_yield_one_completion() {
    let backend = FakeBackend::returning(sweep_response());
    let session = TestSession::new();
    let runner = silent_runner(&backend, &session);
    let mut pane_a = MemoryPane::new();
    let mut pane_b = MemoryPane::new();
    let (progress, _) = progress_collector();

    let (first, second) = tokio::join!(
        runner.run_test(
            TestKind::FrequencyResponse,
            "ModelX",
            &mut pane_a,
            progress.clone()
        ),
        runner.run_test(
            TestKind::FrequencyResponse,
            "ModelX",
            &mut pane_b,
            progress.clone()
        ),
    );

    let completed = [&first, &second].iter().filter(|o| o.is_completed()).count();
    let rejected = [&first, &second]
        .iter()
        .filter(|o| matches!(o, RunOutcome::Rejected(_)))
        .count();
    assert_eq!((completed, rejected), (1, 1));
    assert_eq!(backend.test_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_runs_on_different_targets_proceed_independently() {
    let backend = FakeBackend::returning(sweep_response());
    let session = TestSession::new();
    let runner = silent_runner(&backend, &session);
    let mut pane_a = MemoryPane::new();
    let mut pane_b = MemoryPane::new();
    let (progress, _) = progress_collector();

    let (first, second) = tokio::join!(
        runner.run_test(
            TestKind::FrequencyResponse,
            "ModelX",
            &mut pane_a,
            progress.clone()
        ),
        runner.run_test(TestKind::BassResponse, "ModelX", &mut pane_b, progress.clone()),
    );

    assert!(first.is_completed());
    assert!(second.is_completed());
    assert_eq!(backend.test_calls().len(), 2);
}

// ============================================================================
// Rating flow
// ============================================================================

#[tokio::test]
async fn test_rating_of_zero_is_blocked_before_any_request() {
    let backend = FakeBackend::returning(sweep_response());
    let session = TestSession::new();

    let err = session
        .submit_rating(&backend, "ModelX")
        .await
        .expect_err("unset rating must be rejected");
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(backend.rating_calls().is_empty(), "nothing may be sent");
}

#[tokio::test]
async fn test_rating_submission_carries_last_test_and_resets() {
    let backend = FakeBackend::returning(sweep_response());
    let session = TestSession::new();
    session.record_result(7, TestKind::FrequencyResponse);
    session.set_rating(4).unwrap();

    let ack = session.submit_rating(&backend, "ModelX").await.unwrap();
    assert!(ack.is_success());

    let calls = backend.rating_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].test_id, Some(7));
    assert_eq!(calls[0].rating, 4);
    assert_eq!(calls[0].speaker_model, "ModelX");

    // A successful acknowledgement clears the pending rating
    assert_eq!(session.current_rating(), 0);
}
