//! Progress animation
//!
//! Maps elapsed wall-clock time against a fixed test duration to a
//! completion fraction in [0, 1], emitted on a fixed tick. The emitted
//! sequence is monotone, clamped, and ends exactly at 1.0; the animator
//! finishing doubles as the completion signal for the tone phase.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// Default tick interval between fraction updates
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Consumer of fraction updates; called once per tick with the latest value
pub type ProgressSink = Arc<dyn Fn(f32) + Send + Sync>;

/// A sink that drops every update (headless runs)
pub fn null_sink() -> ProgressSink {
    Arc::new(|_| {})
}

/// State of one animated run
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// When the run started
    pub started_at: Instant,
    /// Total test duration
    pub duration: Duration,
    /// Most recently emitted fraction; 1.0 means the run is terminal
    pub last_fraction: f32,
}

impl ProgressState {
    pub fn is_complete(&self) -> bool {
        self.last_fraction >= 1.0
    }
}

/// Drives a fraction sequence for a fixed duration on a fixed tick
#[derive(Debug, Clone)]
pub struct ProgressAnimator {
    tick: Duration,
}

impl Default for ProgressAnimator {
    fn default() -> Self {
        Self { tick: DEFAULT_TICK }
    }
}

impl ProgressAnimator {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    /// Animate to completion, emitting each fraction through `sink`
    ///
    /// A non-positive duration completes immediately with fraction 1.0 and
    /// no ticks emitted. Otherwise fractions are sampled every tick,
    /// clamped to [0, 1], never decrease, and the final emission is
    /// exactly 1.0.
    pub async fn run(&self, duration: Duration, sink: ProgressSink) -> ProgressState {
        let started_at = Instant::now();
        let mut state = ProgressState {
            started_at,
            duration,
            last_fraction: 0.0,
        };

        if duration.is_zero() {
            state.last_fraction = 1.0;
            return state;
        }

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick resolves immediately; consume it so the
        // first emission happens one tick into the run.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let elapsed = started_at.elapsed();
            let fraction = (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0);
            // Guard against clock quirks; the sequence never goes backwards.
            let fraction = fraction.max(state.last_fraction);
            state.last_fraction = fraction;
            sink(fraction);
            if fraction >= 1.0 {
                break;
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records every emitted fraction
    fn collector() -> (ProgressSink, Arc<Mutex<Vec<f32>>>) {
        let values = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&values);
        let sink: ProgressSink = Arc::new(move |fraction| {
            recorded.lock().unwrap().push(fraction);
        });
        (sink, values)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fractions_monotone_and_terminate_at_one() {
        let animator = ProgressAnimator::new(Duration::from_millis(50));
        let (sink, values) = collector();

        let state = animator.run(Duration::from_millis(500), sink).await;

        let values = values.lock().unwrap();
        assert!(!values.is_empty());
        assert!(values[0] >= 0.0);
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "must not decrease");
        assert_eq!(*values.last().unwrap(), 1.0);
        assert!(values.iter().all(|&f| f <= 1.0), "must never exceed 1.0");
        assert!(state.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_one_terminal_value() {
        let animator = ProgressAnimator::new(Duration::from_millis(50));
        let (sink, values) = collector();

        animator.run(Duration::from_millis(200), sink).await;

        let values = values.lock().unwrap();
        let terminal = values.iter().filter(|&&f| f >= 1.0).count();
        assert_eq!(terminal, 1, "1.0 is emitted exactly once");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_completes_without_ticks() {
        let animator = ProgressAnimator::default();
        let (sink, values) = collector();

        let state = animator.run(Duration::ZERO, sink).await;

        assert!(state.is_complete());
        assert_eq!(state.last_fraction, 1.0);
        assert!(values.lock().unwrap().is_empty(), "no ticks for zero duration");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_count_matches_duration() {
        let animator = ProgressAnimator::new(Duration::from_millis(50));
        let (sink, values) = collector();

        animator.run(Duration::from_millis(500), sink).await;

        // 500 ms at a 50 ms tick: ten emissions, the last one terminal
        assert_eq!(values.lock().unwrap().len(), 10);
    }
}
