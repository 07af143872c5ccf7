//! Frequency sweep tone
//!
//! Continuous tone whose frequency glides from a start to an end frequency
//! over the test duration. The glide is exponential, so equal fractions of
//! elapsed time cover equal musical intervals rather than equal Hz.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default sweep start frequency in Hz
pub const DEFAULT_START_FREQ: f32 = 50.0;

/// Default sweep end frequency in Hz
pub const DEFAULT_END_FREQ: f32 = 15_000.0;

/// Default sweep duration
pub const DEFAULT_SWEEP_DURATION: Duration = Duration::from_millis(5_000);

/// Output gain for sweep playback
pub const SWEEP_GAIN: f32 = 0.2;

/// Parameters for a frequency sweep test tone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepTone {
    /// Frequency at the start of the sweep in Hz
    pub start_freq: f32,
    /// Frequency at the end of the sweep in Hz
    pub end_freq: f32,
    /// Total sweep duration
    pub duration: Duration,
    /// Linear output gain
    pub gain: f32,
}

impl Default for SweepTone {
    fn default() -> Self {
        Self {
            start_freq: DEFAULT_START_FREQ,
            end_freq: DEFAULT_END_FREQ,
            duration: DEFAULT_SWEEP_DURATION,
            gain: SWEEP_GAIN,
        }
    }
}

impl SweepTone {
    /// Instantaneous frequency at elapsed fraction `p` in [0, 1]
    ///
    /// `frequency_at(0.0)` is the start frequency and `frequency_at(1.0)`
    /// the end frequency; between them the frequency follows
    /// `start * (end/start)^p`.
    pub fn frequency_at(&self, p: f32) -> f32 {
        let p = p.clamp(0.0, 1.0);
        self.start_freq * (self.end_freq / self.start_freq).powf(p)
    }
}
