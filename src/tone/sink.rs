//! Audio output sinks
//!
//! The generator writes rendered samples through the `AudioSink` trait.
//! `NullSink` is the silent/simulated mode used when no output device is
//! available (and the double used by tests); `CpalSink` plays through the
//! system device when the crate is built with the `playback` feature.

use crate::error::{ResonaError, Result};
use std::time::Duration;

/// Stream parameters handed to a sink when a tone starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (tones are rendered mono)
    pub channels: u16,
}

/// Destination for rendered tone samples
///
/// A sink is opened once per test run and must release whatever it
/// allocated when `stop` is called; the generator calls `stop` on every
/// exit path so repeated runs cannot leak streams.
pub trait AudioSink {
    /// Open the sink for a stream with the given parameters
    fn start(&mut self, spec: StreamSpec) -> Result<()>;

    /// Write a block of mono samples
    fn write(&mut self, samples: &[f32]) -> Result<()>;

    /// Release all resources held by the sink
    fn stop(&mut self);

    /// Whether the sink currently holds an open stream
    fn is_open(&self) -> bool;
}

// ============================================================================
// Null sink (silent / simulated mode)
// ============================================================================

/// Sink that discards samples while tracking what passed through it
#[derive(Debug, Default)]
pub struct NullSink {
    open: bool,
    samples_written: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total samples written since creation
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }
}

impl AudioSink for NullSink {
    fn start(&mut self, _spec: StreamSpec) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn write(&mut self, samples: &[f32]) -> Result<()> {
        if !self.open {
            return Err(ResonaError::AudioInit {
                reason: "sink not started".to_string(),
            });
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    fn stop(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

// ============================================================================
// Device probe and sink selection
// ============================================================================

/// Check whether a system output device can be opened
#[cfg(feature = "playback")]
fn probe_output_device() -> Result<()> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| ResonaError::AudioInit {
            reason: "no default output device".to_string(),
        })?;
    device
        .default_output_config()
        .map_err(|e| ResonaError::AudioInit {
            reason: e.to_string(),
        })?;
    Ok(())
}

#[cfg(not(feature = "playback"))]
fn probe_output_device() -> Result<()> {
    Err(ResonaError::AudioInit {
        reason: "built without the playback feature; tones run silently".to_string(),
    })
}

/// Factory for the audio path of a test run
///
/// The orchestrator probes before each run; a failed or timed-out probe
/// downgrades the run to the silent sink instead of aborting it.
#[derive(Debug, Clone)]
pub struct AudioOutput {
    enabled: bool,
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput {
    /// Output that plays through the system device when possible
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Output that always stays silent (used by tests and `--silent` runs)
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Probe output viability, bounded by `grace`
    ///
    /// Device enumeration can hang on misconfigured systems, so the check
    /// runs on the blocking pool under a timeout.
    pub async fn probe(&self, grace: Duration) -> Result<()> {
        if !self.enabled {
            return Err(ResonaError::AudioInit {
                reason: "audio output disabled".to_string(),
            });
        }

        match tokio::time::timeout(grace, tokio::task::spawn_blocking(probe_output_device)).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ResonaError::AudioInit {
                reason: join_err.to_string(),
            }),
            Err(_) => Err(ResonaError::AudioInit {
                reason: format!("device probe timed out after {grace:?}"),
            }),
        }
    }

    /// Open a sink for one test run
    pub fn open_sink(&self) -> Box<dyn AudioSink> {
        #[cfg(feature = "playback")]
        {
            if self.enabled {
                return Box::new(playback::CpalSink::new());
            }
        }
        Box::new(NullSink::new())
    }
}

// ============================================================================
// Device playback (optional)
// ============================================================================

#[cfg(feature = "playback")]
pub mod playback {
    //! Real output through the default system device.

    use super::{AudioSink, StreamSpec};
    use crate::error::{ResonaError, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::mpsc;

    /// Sink backed by a cpal output stream
    ///
    /// Samples are handed to the device callback through a channel; the
    /// callback substitutes silence when the generator falls behind.
    pub struct CpalSink {
        stream: Option<cpal::Stream>,
        tx: Option<mpsc::Sender<f32>>,
    }

    impl CpalSink {
        pub fn new() -> Self {
            Self {
                stream: None,
                tx: None,
            }
        }
    }

    impl Default for CpalSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioSink for CpalSink {
        fn start(&mut self, spec: StreamSpec) -> Result<()> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| ResonaError::AudioInit {
                    reason: "no default output device".to_string(),
                })?;
            let supported =
                device
                    .default_output_config()
                    .map_err(|e| ResonaError::AudioInit {
                        reason: e.to_string(),
                    })?;

            let mut config: cpal::StreamConfig = supported.into();
            config.sample_rate = cpal::SampleRate(spec.sample_rate);
            let channels = config.channels as usize;

            let (tx, rx) = mpsc::channel::<f32>();
            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _| {
                        for frame in data.chunks_mut(channels) {
                            let sample = rx.try_recv().unwrap_or(0.0);
                            for slot in frame {
                                *slot = sample;
                            }
                        }
                    },
                    |err| tracing::warn!("output stream error: {err}"),
                    None,
                )
                .map_err(|e| ResonaError::AudioInit {
                    reason: e.to_string(),
                })?;
            stream.play().map_err(|e| ResonaError::AudioInit {
                reason: e.to_string(),
            })?;

            self.stream = Some(stream);
            self.tx = Some(tx);
            Ok(())
        }

        fn write(&mut self, samples: &[f32]) -> Result<()> {
            let tx = self.tx.as_ref().ok_or_else(|| ResonaError::AudioInit {
                reason: "sink not started".to_string(),
            })?;
            for sample in samples {
                tx.send(*sample).map_err(|_| ResonaError::AudioInit {
                    reason: "output stream closed".to_string(),
                })?;
            }
            Ok(())
        }

        fn stop(&mut self) {
            self.tx = None;
            self.stream = None;
        }

        fn is_open(&self) -> bool {
            self.stream.is_some()
        }
    }
}
