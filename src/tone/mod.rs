//! Diagnostic test tones
//!
//! One tone plan per test kind: an exponential frequency sweep, a stepped
//! bass sequence, and a progressively distorted sine. Plans are immutable
//! once a run starts; the generator streams them to an audio sink or
//! renders them offline for capture.

mod bass;
mod distortion;
mod generator;
mod sink;
mod sweep;

pub use bass::{BassSequence, BASS_FREQUENCIES, BASS_GAIN, DEFAULT_STEP_DURATION};
pub use distortion::{
    distortion_curve, shape_sample, DistortionTone, CURVE_RESOLUTION, DEFAULT_CARRIER_FREQ,
    DEFAULT_DISTORTION_DURATION, DEFAULT_END_AMOUNT, DEFAULT_START_AMOUNT, DISTORTION_GAIN,
};
pub use generator::ToneGenerator;
pub use sink::{AudioOutput, AudioSink, NullSink, StreamSpec};
pub use sweep::{
    SweepTone, DEFAULT_END_FREQ, DEFAULT_START_FREQ, DEFAULT_SWEEP_DURATION, SWEEP_GAIN,
};

use crate::error::{ResonaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Test Kind
// ============================================================================

/// The diagnostic test families the harness can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    /// Full-range frequency sweep
    FrequencyResponse,
    /// Low-frequency step sequence
    BassResponse,
    /// Progressive waveshaping of a fixed carrier
    Distortion,
}

impl TestKind {
    /// Identifier used in endpoint paths and results-target names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrequencyResponse => "frequency-response",
            Self::BassResponse => "bass-response",
            Self::Distortion => "distortion",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "frequency-response" | "frequency_response" | "sweep" => Some(Self::FrequencyResponse),
            "bass-response" | "bass_response" | "bass" => Some(Self::BassResponse),
            "distortion" => Some(Self::Distortion),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FrequencyResponse => "Frequency Response",
            Self::BassResponse => "Bass Response",
            Self::Distortion => "Distortion",
        }
    }

    /// All kinds, in the order they appear in the UI
    pub fn all() -> [TestKind; 3] {
        [
            Self::FrequencyResponse,
            Self::BassResponse,
            Self::Distortion,
        ]
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tone plan
// ============================================================================

/// A fully parameterized test tone, immutable once a run starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ToneTest {
    Sweep(SweepTone),
    Bass(BassSequence),
    Distortion(DistortionTone),
}

impl ToneTest {
    /// Default tone plan for a test kind
    pub fn for_kind(kind: TestKind) -> Self {
        match kind {
            TestKind::FrequencyResponse => Self::Sweep(SweepTone::default()),
            TestKind::BassResponse => Self::Bass(BassSequence::default()),
            TestKind::Distortion => Self::Distortion(DistortionTone::default()),
        }
    }

    pub fn kind(&self) -> TestKind {
        match self {
            Self::Sweep(_) => TestKind::FrequencyResponse,
            Self::Bass(_) => TestKind::BassResponse,
            Self::Distortion(_) => TestKind::Distortion,
        }
    }

    /// Total playback duration of the tone
    pub fn duration(&self) -> Duration {
        match self {
            Self::Sweep(sweep) => sweep.duration,
            Self::Bass(bass) => bass.duration(),
            Self::Distortion(tone) => tone.duration,
        }
    }

    /// Linear output gain of the tone
    pub fn gain(&self) -> f32 {
        match self {
            Self::Sweep(sweep) => sweep.gain,
            Self::Bass(bass) => bass.gain,
            Self::Distortion(tone) => tone.gain,
        }
    }
}

// ============================================================================
// Capture
// ============================================================================

/// Render a tone plan into a mono 32-bit float WAV file
pub fn capture_tone(plan: &ToneTest, sample_rate: u32, path: &Path) -> Result<()> {
    let samples = ToneGenerator::new(sample_rate).render(plan);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| ResonaError::Capture {
        reason: e.to_string(),
    })?;
    for sample in &samples {
        writer
            .write_sample(*sample)
            .map_err(|e| ResonaError::Capture {
                reason: e.to_string(),
            })?;
    }
    writer.finalize().map_err(|e| ResonaError::Capture {
        reason: e.to_string(),
    })?;

    tracing::debug!(
        samples = samples.len(),
        path = %path.display(),
        "captured tone"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_kind_round_trip() {
        for kind in TestKind::all() {
            assert_eq!(TestKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test_case("sweep", TestKind::FrequencyResponse ; "sweep alias")]
    #[test_case("frequency_response", TestKind::FrequencyResponse ; "snake case")]
    #[test_case("Frequency-Response", TestKind::FrequencyResponse ; "mixed case")]
    #[test_case("bass", TestKind::BassResponse ; "bass alias")]
    #[test_case("distortion", TestKind::Distortion ; "distortion")]
    fn test_kind_aliases(input: &str, expected: TestKind) {
        assert_eq!(TestKind::from_str(input), Some(expected));
    }

    #[test]
    fn test_kind_rejects_unknown() {
        assert_eq!(TestKind::from_str("soundstage"), None);
    }

    #[test]
    fn test_default_plan_durations() {
        assert_eq!(
            ToneTest::for_kind(TestKind::FrequencyResponse).duration(),
            Duration::from_millis(5_000)
        );
        assert_eq!(
            ToneTest::for_kind(TestKind::BassResponse).duration(),
            Duration::from_millis(4_000)
        );
        assert_eq!(
            ToneTest::for_kind(TestKind::Distortion).duration(),
            Duration::from_millis(4_000)
        );
    }

    #[test]
    fn test_default_plan_gains() {
        assert_eq!(ToneTest::for_kind(TestKind::FrequencyResponse).gain(), 0.2);
        assert_eq!(ToneTest::for_kind(TestKind::BassResponse).gain(), 0.3);
        assert_eq!(ToneTest::for_kind(TestKind::Distortion).gain(), 0.1);
    }

    #[test]
    fn test_plan_kind_mapping() {
        for kind in TestKind::all() {
            assert_eq!(ToneTest::for_kind(kind).kind(), kind);
        }
    }
}
