//! Tone generation
//!
//! `ToneSynth` turns a tone plan into mono sample blocks; `ToneGenerator`
//! either renders a plan offline in one go or streams it to an `AudioSink`
//! in real time, block by block on the runtime clock.

use crate::tone::distortion::{distortion_curve, shape_sample, DistortionTone, CURVE_RESOLUTION};
use crate::tone::sink::{AudioSink, StreamSpec};
use crate::tone::{BassSequence, SweepTone, ToneTest};
use crate::error::Result;
use std::f64::consts::TAU;
use std::time::Duration;

/// Default render block length (matches the progress tick)
const DEFAULT_BLOCK: Duration = Duration::from_millis(50);

// ============================================================================
// Sample synthesis
// ============================================================================

/// Incremental synthesizer for one tone plan
///
/// Tracks sample position and oscillator phase so blocks join without
/// discontinuities, whatever the block size.
struct ToneSynth<'a> {
    plan: &'a ToneTest,
    sample_rate: u32,
    total: u64,
    pos: u64,
    phase: f64,
    curve: Vec<f32>,
    curve_amount: f32,
}

impl<'a> ToneSynth<'a> {
    fn new(plan: &'a ToneTest, sample_rate: u32) -> Self {
        let total = (plan.duration().as_secs_f64() * sample_rate as f64).round() as u64;
        Self {
            plan,
            sample_rate,
            total,
            pos: 0,
            phase: 0.0,
            curve: Vec::new(),
            curve_amount: f32::NAN,
        }
    }

    fn finished(&self) -> bool {
        self.pos >= self.total
    }

    /// Fill `out` with the next samples; returns how many were written
    fn next_block(&mut self, out: &mut [f32]) -> usize {
        let remaining = (self.total - self.pos) as usize;
        let n = out.len().min(remaining);
        if n == 0 {
            return 0;
        }
        let plan = self.plan;
        match plan {
            ToneTest::Sweep(sweep) => self.fill_sweep(sweep, &mut out[..n]),
            ToneTest::Bass(bass) => self.fill_bass(bass, &mut out[..n]),
            ToneTest::Distortion(tone) => self.fill_distortion(tone, &mut out[..n]),
        }
        n
    }

    fn fill_sweep(&mut self, sweep: &SweepTone, out: &mut [f32]) {
        let sr = self.sample_rate as f64;
        for slot in out.iter_mut() {
            let p = self.pos as f32 / self.total as f32;
            let freq = sweep.frequency_at(p) as f64;
            self.phase = (self.phase + TAU * freq / sr) % TAU;
            *slot = self.phase.sin() as f32 * sweep.gain;
            self.pos += 1;
        }
    }

    fn fill_bass(&mut self, bass: &BassSequence, out: &mut [f32]) {
        let sr = self.sample_rate as f64;
        let per_step = ((bass.per_step.as_secs_f64() * sr).round() as u64).max(1);
        let last = bass.frequencies.len() - 1;
        for slot in out.iter_mut() {
            let step = ((self.pos / per_step) as usize).min(last);
            let freq = bass.frequencies[step] as f64;
            self.phase = (self.phase + TAU * freq / sr) % TAU;
            *slot = self.phase.sin() as f32 * bass.gain;
            self.pos += 1;
        }
    }

    fn fill_distortion(&mut self, tone: &DistortionTone, out: &mut [f32]) {
        // The shaping amount ramps per block, not per sample; one curve
        // rebuild per block keeps the hot loop to a table lookup.
        let p = self.pos as f32 / self.total as f32;
        let k = tone.amount_at(p);
        if self.curve.is_empty() || k != self.curve_amount {
            self.curve = distortion_curve(k, CURVE_RESOLUTION);
            self.curve_amount = k;
        }

        let sr = self.sample_rate as f64;
        for slot in out.iter_mut() {
            self.phase = (self.phase + TAU * tone.carrier_freq as f64 / sr) % TAU;
            let carrier = self.phase.sin() as f32;
            *slot = shape_sample(&self.curve, carrier) * tone.gain;
            self.pos += 1;
        }
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Renders tone plans offline or streams them to a sink in real time
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    sample_rate: u32,
    block: Duration,
}

impl ToneGenerator {
    /// Create a generator for the given output sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            block: DEFAULT_BLOCK,
        }
    }

    /// Override the streaming block duration
    pub fn with_block(mut self, block: Duration) -> Self {
        self.block = block;
        self
    }

    fn block_len(&self) -> usize {
        ((self.sample_rate as f64 * self.block.as_secs_f64()).round() as usize).max(1)
    }

    /// Render the complete tone into a sample buffer
    ///
    /// Deterministic and clock-free; used for WAV capture and for checking
    /// tone content without an output device.
    pub fn render(&self, plan: &ToneTest) -> Vec<f32> {
        let mut synth = ToneSynth::new(plan, self.sample_rate);
        let mut buf = vec![0.0_f32; self.block_len()];
        let mut samples = Vec::with_capacity(synth.total as usize);
        while !synth.finished() {
            let n = synth.next_block(&mut buf);
            samples.extend_from_slice(&buf[..n]);
        }
        samples
    }

    /// Play the tone through a sink, paced on the runtime clock
    ///
    /// The sink is stopped on every exit path, success or error, so a
    /// failed run never leaves a stream open.
    pub async fn play(&self, plan: &ToneTest, sink: &mut dyn AudioSink) -> Result<()> {
        sink.start(StreamSpec {
            sample_rate: self.sample_rate,
            channels: 1,
        })?;
        let result = self.stream_blocks(plan, sink).await;
        sink.stop();
        result
    }

    async fn stream_blocks(&self, plan: &ToneTest, sink: &mut dyn AudioSink) -> Result<()> {
        let mut synth = ToneSynth::new(plan, self.sample_rate);
        let mut buf = vec![0.0_f32; self.block_len()];
        let mut ticker = tokio::time::interval(self.block);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !synth.finished() {
            let n = synth.next_block(&mut buf);
            sink.write(&buf[..n])?;
            // First tick resolves immediately, keeping playback one block
            // ahead of the clock.
            ticker.tick().await;
        }
        Ok(())
    }
}
