//! Bass step sequence
//!
//! Low-frequency response test: a fixed ordered list of discrete tones,
//! each held for the same per-step duration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Frequencies played by the bass test, in order, in Hz
pub const BASS_FREQUENCIES: [f32; 8] = [20.0, 30.0, 40.0, 60.0, 80.0, 100.0, 150.0, 200.0];

/// How long each bass step is held
pub const DEFAULT_STEP_DURATION: Duration = Duration::from_millis(500);

/// Output gain for bass playback
pub const BASS_GAIN: f32 = 0.3;

/// Parameters for a bass step-sequence test tone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BassSequence {
    /// Ordered test frequencies in Hz
    pub frequencies: Vec<f32>,
    /// Hold time for each frequency
    pub per_step: Duration,
    /// Linear output gain
    pub gain: f32,
}

impl Default for BassSequence {
    fn default() -> Self {
        Self {
            frequencies: BASS_FREQUENCIES.to_vec(),
            per_step: DEFAULT_STEP_DURATION,
            gain: BASS_GAIN,
        }
    }
}

impl BassSequence {
    /// Number of discrete steps in the sequence
    pub fn steps(&self) -> usize {
        self.frequencies.len()
    }

    /// Total duration: steps × per-step hold time
    pub fn duration(&self) -> Duration {
        self.per_step * self.frequencies.len() as u32
    }

    /// Frequency of the step active at elapsed fraction `p` in [0, 1]
    ///
    /// Returns `None` for an empty sequence.
    pub fn frequency_at(&self, p: f32) -> Option<f32> {
        if self.frequencies.is_empty() {
            return None;
        }
        let p = p.clamp(0.0, 1.0);
        let index = ((p * self.frequencies.len() as f32) as usize).min(self.frequencies.len() - 1);
        Some(self.frequencies[index])
    }
}
