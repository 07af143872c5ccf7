//! Test session state
//!
//! `TestSession` is the explicit view-model for one testing context: the
//! pending star rating, the id of the last recorded test, the backend user
//! id, and the registry of results targets with a run in flight. It
//! replaces ad-hoc globals so state resets are a single call and the
//! one-run-per-target invariant has a single owner.

use crate::api::{RatingAck, RatingRequest, ScoringBackend, TestId};
use crate::error::{ResonaError, Result};
use crate::tone::TestKind;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Highest accepted star rating
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Default)]
struct SessionState {
    current_rating: u8,
    last_test_id: Option<TestId>,
    last_test_kind: Option<TestKind>,
    user_id: Option<String>,
    active: HashSet<TestKind>,
}

/// View-model for one testing context
#[derive(Debug, Default)]
pub struct TestSession {
    inner: Mutex<SessionState>,
}

impl TestSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned lock only means a panicking reader; the state itself
        // stays valid.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ========================================================================
    // Run registry
    // ========================================================================

    /// Claim the results target for `kind`
    ///
    /// Fails with `TestBusy` when a run is already active on that target.
    /// The returned guard releases the claim when dropped.
    pub fn begin(&self, kind: TestKind) -> Result<RunGuard<'_>> {
        let mut state = self.lock();
        if !state.active.insert(kind) {
            return Err(ResonaError::TestBusy {
                target: kind.as_str().to_string(),
            });
        }
        let run_id = Uuid::new_v4();
        tracing::debug!(%run_id, surface = %kind, "run started");
        Ok(RunGuard {
            session: self,
            kind,
            run_id,
        })
    }

    /// Whether a run is active on the target for `kind`
    pub fn is_active(&self, kind: TestKind) -> bool {
        self.lock().active.contains(&kind)
    }

    /// Record the outcome of a completed run for later rating submission
    pub fn record_result(&self, id: TestId, kind: TestKind) {
        let mut state = self.lock();
        state.last_test_id = Some(id);
        state.last_test_kind = Some(kind);
    }

    pub fn last_test_id(&self) -> Option<TestId> {
        self.lock().last_test_id
    }

    pub fn last_test_kind(&self) -> Option<TestKind> {
        self.lock().last_test_kind
    }

    // ========================================================================
    // Rating
    // ========================================================================

    /// Set the pending star rating (1 to 5)
    pub fn set_rating(&self, rating: u8) -> Result<()> {
        if rating == 0 || rating > MAX_RATING {
            return Err(ResonaError::Validation {
                reason: format!("Rating must be between 1 and {MAX_RATING}"),
            });
        }
        self.lock().current_rating = rating;
        Ok(())
    }

    pub fn current_rating(&self) -> u8 {
        self.lock().current_rating
    }

    pub fn clear_rating(&self) {
        self.lock().current_rating = 0;
    }

    /// Submit the pending rating for the last recorded test
    ///
    /// Blocked client-side when no rating has been selected; nothing is
    /// sent in that case. A successful acknowledgement resets the pending
    /// rating.
    pub async fn submit_rating<B: ScoringBackend>(
        &self,
        backend: &B,
        speaker_model: &str,
    ) -> Result<RatingAck> {
        let request = {
            let state = self.lock();
            if state.current_rating == 0 {
                return Err(ResonaError::Validation {
                    reason: "Please select a rating first".to_string(),
                });
            }
            RatingRequest {
                test_id: state.last_test_id,
                rating: state.current_rating,
                speaker_model: speaker_model.to_string(),
            }
        };

        let ack = backend.submit_rating(&request).await?;
        if ack.is_success() {
            self.clear_rating();
        }
        Ok(ack)
    }

    // ========================================================================
    // User session
    // ========================================================================

    pub fn set_user(&self, user_id: impl Into<String>) {
        self.lock().user_id = Some(user_id.into());
    }

    pub fn user_id(&self) -> Option<String> {
        self.lock().user_id.clone()
    }

    /// Reset everything except the active-run registry
    ///
    /// Used when switching to a new page context; in-flight runs keep
    /// their claims.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.current_rating = 0;
        state.last_test_id = None;
        state.last_test_kind = None;
        state.user_id = None;
    }
}

/// Claim on a results target for the duration of one run
#[derive(Debug)]
pub struct RunGuard<'a> {
    session: &'a TestSession,
    kind: TestKind,
    run_id: Uuid,
}

impl RunGuard<'_> {
    pub fn kind(&self) -> TestKind {
        self.kind
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.session.lock().active.remove(&self.kind);
        tracing::debug!(run_id = %self.run_id, surface = %self.kind, "run finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_rejects_concurrent_run_on_same_target() {
        let session = TestSession::new();
        let guard = session.begin(TestKind::Distortion).unwrap();

        let err = session.begin(TestKind::Distortion).unwrap_err();
        assert_eq!(err.error_code(), "TEST_BUSY");
        assert!(err.to_string().contains("distortion"));

        drop(guard);
        assert!(session.begin(TestKind::Distortion).is_ok());
    }

    #[test]
    fn test_different_targets_run_independently() {
        let session = TestSession::new();
        let _a = session.begin(TestKind::FrequencyResponse).unwrap();
        let _b = session.begin(TestKind::BassResponse).unwrap();
        assert!(session.is_active(TestKind::FrequencyResponse));
        assert!(session.is_active(TestKind::BassResponse));
        assert!(!session.is_active(TestKind::Distortion));
    }

    #[test]
    fn test_guard_drop_releases_claim() {
        let session = TestSession::new();
        {
            let _guard = session.begin(TestKind::BassResponse).unwrap();
            assert!(session.is_active(TestKind::BassResponse));
        }
        assert!(!session.is_active(TestKind::BassResponse));
    }

    #[test]
    fn test_rating_bounds() {
        let session = TestSession::new();
        assert!(session.set_rating(0).is_err());
        assert!(session.set_rating(6).is_err());
        session.set_rating(4).unwrap();
        assert_eq!(session.current_rating(), 4);
    }

    #[test]
    fn test_record_result() {
        let session = TestSession::new();
        assert_eq!(session.last_test_id(), None);
        session.record_result(7, TestKind::FrequencyResponse);
        assert_eq!(session.last_test_id(), Some(7));
        assert_eq!(session.last_test_kind(), Some(TestKind::FrequencyResponse));
    }

    #[test]
    fn test_reset_clears_view_state_only() {
        let session = TestSession::new();
        let _guard = session.begin(TestKind::Distortion).unwrap();
        session.set_rating(5).unwrap();
        session.record_result(9, TestKind::Distortion);
        session.set_user("user_abc");

        session.reset();

        assert_eq!(session.current_rating(), 0);
        assert_eq!(session.last_test_id(), None);
        assert_eq!(session.user_id(), None);
        assert!(session.is_active(TestKind::Distortion), "claims survive reset");
    }
}
