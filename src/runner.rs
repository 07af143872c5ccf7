//! Test orchestration
//!
//! `TestRunner` sequences one full run: claim the results target, probe
//! audio output, play the tone while the progress animator counts up,
//! post the result to the scoring service, and render the response. All
//! failures are converted to pane output; nothing propagates past
//! `run_test`.

use crate::api::{ScoringBackend, TestId, TestRequest, TestResponse};
use crate::config::Config;
use crate::error::Result;
use crate::progress::{ProgressAnimator, ProgressSink};
use crate::session::TestSession;
use crate::tone::{AudioOutput, AudioSink, NullSink, TestKind, ToneGenerator, ToneTest};
use crate::view::ResultsPane;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of a completed run, kept for the caller after rendering
#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    pub run_id: Uuid,
    pub kind: TestKind,
    pub test_id: TestId,
    pub score: f64,
    /// Per-frequency measurement map (sweep and bass tests)
    pub results: Option<BTreeMap<String, f64>>,
    /// Measured distortion (distortion tests)
    pub distortion_percentage: Option<f64>,
}

impl TestReport {
    fn from_response(run_id: Uuid, kind: TestKind, response: TestResponse) -> Self {
        Self {
            run_id,
            kind,
            test_id: response.id,
            score: response.score,
            results: response.results,
            distortion_percentage: response.distortion_percentage,
        }
    }
}

/// How a `run_test` invocation ended
///
/// Failures are already rendered on the pane by the time the outcome is
/// returned; the variants exist so callers can sequence follow-up work.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Tone played, response decoded and rendered
    Completed(TestReport),
    /// Another run already owned the results target; nothing was started
    Rejected(String),
    /// A step failed after the run started; the error was rendered
    Failed(String),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn report(&self) -> Option<&TestReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Sequences tone playback, progress animation and the scoring round trip
pub struct TestRunner<'a, B: ScoringBackend> {
    backend: &'a B,
    session: &'a TestSession,
    output: AudioOutput,
    config: Config,
}

impl<'a, B: ScoringBackend> TestRunner<'a, B> {
    pub fn new(backend: &'a B, session: &'a TestSession, config: Config) -> Self {
        Self {
            backend,
            session,
            output: AudioOutput::new(),
            config,
        }
    }

    /// Replace the audio output factory (silent runs, tests)
    pub fn with_output(mut self, output: AudioOutput) -> Self {
        self.output = output;
        self
    }

    /// Run one test end to end
    ///
    /// One-shot: no retries, no mid-flight cancellation. The network
    /// request is only issued after the tone/progress phase has fully
    /// completed, and the result renders only after a successful decode.
    pub async fn run_test(
        &self,
        kind: TestKind,
        speaker_model: &str,
        pane: &mut dyn ResultsPane,
        progress: ProgressSink,
    ) -> RunOutcome {
        let guard = match self.session.begin(kind) {
            Ok(guard) => guard,
            Err(err) => {
                tracing::info!(target_kind = %kind, "run rejected: {err}");
                pane.show_error(&err.to_string());
                return RunOutcome::Rejected(err.to_string());
            }
        };

        pane.set_running(kind);
        match self
            .execute(guard.run_id(), kind, speaker_model, pane, progress)
            .await
        {
            Ok(report) => {
                self.session.record_result(report.test_id, kind);
                pane.show_result(&report);
                RunOutcome::Completed(report)
            }
            Err(err) => {
                tracing::warn!(run_id = %guard.run_id(), "run failed: {err}");
                pane.show_error(&err.to_string());
                RunOutcome::Failed(err.to_string())
            }
        }
    }

    async fn execute(
        &self,
        run_id: Uuid,
        kind: TestKind,
        speaker_model: &str,
        pane: &mut dyn ResultsPane,
        progress: ProgressSink,
    ) -> Result<TestReport> {
        let plan = ToneTest::for_kind(kind);

        // Best-effort probe; a dead audio path downgrades the run to the
        // silent sink instead of failing it.
        let mut sink: Box<dyn AudioSink> = match self.output.probe(self.config.probe_grace).await {
            Ok(()) => self.output.open_sink(),
            Err(err) => {
                tracing::info!(%run_id, "audio probe failed: {err}");
                pane.show_notice(&format!("{err}; continuing without audio"));
                Box::new(NullSink::new())
            }
        };

        let generator = ToneGenerator::new(self.config.sample_rate).with_block(self.config.tick);
        let animator = ProgressAnimator::new(self.config.tick);
        let (played, progress_state) = tokio::join!(
            generator.play(&plan, sink.as_mut()),
            animator.run(plan.duration(), progress),
        );
        if let Err(err) = played {
            // Playback trouble is recoverable; the scored run proceeds.
            tracing::warn!(%run_id, "tone playback failed: {err}");
            pane.show_notice(&format!("{err}; test ran silently"));
        }
        debug_assert!(progress_state.is_complete());

        let request = TestRequest {
            speaker_model: speaker_model.to_string(),
        };
        let response = self.backend.run_test(kind, &request).await?;
        tracing::info!(%run_id, test_id = response.id, score = response.score, "run scored");

        Ok(TestReport::from_response(run_id, kind, response))
    }
}
