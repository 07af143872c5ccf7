//! Distortion test tone
//!
//! A fixed sine carrier pushed through a waveshaping curve whose intensity
//! ramps up over the test, so the listener hears the tone degrade from
//! clean to heavily clipped.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Shaping amount at the start of the test
pub const DEFAULT_START_AMOUNT: f32 = 400.0;

/// Shaping amount at the end of the test
pub const DEFAULT_END_AMOUNT: f32 = 1_000.0;

/// Carrier frequency in Hz
pub const DEFAULT_CARRIER_FREQ: f32 = 1_000.0;

/// Default distortion test duration
pub const DEFAULT_DISTORTION_DURATION: Duration = Duration::from_millis(4_000);

/// Output gain for distortion playback
pub const DISTORTION_GAIN: f32 = 0.1;

/// Number of points the shaping curve is sampled at
pub const CURVE_RESOLUTION: usize = 44_100;

// ============================================================================
// Waveshaping
// ============================================================================

/// Sample the nonlinearity curve for shaping amount `k`
///
/// The curve maps input samples x ∈ [-1, 1] through
/// `(3 + k) * x * (20·π/180) / (π + k·|x|)`, sampled at `resolution`
/// evenly spaced points.
pub fn distortion_curve(k: f32, resolution: usize) -> Vec<f32> {
    let deg = 20.0 * PI / 180.0;
    let n = resolution as f32;
    (0..resolution)
        .map(|i| {
            let x = (i as f32 * 2.0 / n) - 1.0;
            (3.0 + k) * x * deg / (PI + k * x.abs())
        })
        .collect()
}

/// Shape a single sample through a sampled curve
///
/// Input is clamped to [-1, 1] and mapped onto the nearest curve point.
#[inline]
pub fn shape_sample(curve: &[f32], x: f32) -> f32 {
    if curve.is_empty() {
        return x;
    }
    let x = x.clamp(-1.0, 1.0);
    let index = ((x + 1.0) * 0.5 * (curve.len() - 1) as f32).round() as usize;
    curve[index]
}

// ============================================================================
// Distortion Tone
// ============================================================================

/// Parameters for a distortion test tone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistortionTone {
    /// Shaping amount at fraction 0
    pub start_amount: f32,
    /// Shaping amount at fraction 1
    pub end_amount: f32,
    /// Sine carrier frequency in Hz
    pub carrier_freq: f32,
    /// Total test duration
    pub duration: Duration,
    /// Linear output gain
    pub gain: f32,
}

impl Default for DistortionTone {
    fn default() -> Self {
        Self {
            start_amount: DEFAULT_START_AMOUNT,
            end_amount: DEFAULT_END_AMOUNT,
            carrier_freq: DEFAULT_CARRIER_FREQ,
            duration: DEFAULT_DISTORTION_DURATION,
            gain: DISTORTION_GAIN,
        }
    }
}

impl DistortionTone {
    /// Shaping amount at elapsed fraction `p` in [0, 1] (linear ramp)
    pub fn amount_at(&self, p: f32) -> f32 {
        let p = p.clamp(0.0, 1.0);
        self.start_amount + (self.end_amount - self.start_amount) * p
    }
}
