//! Runtime configuration
//!
//! Defaults match the hosted scoring service; every knob can be overridden
//! through `RESONA_*` environment variables.

use std::env;
use std::time::Duration;

/// Default scoring-service base URL
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default progress/render tick interval
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Default grace period for the audio-output probe
pub const DEFAULT_PROBE_GRACE: Duration = Duration::from_millis(2_000);

/// Runtime configuration for the test harness
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the scoring service
    pub base_url: String,
    /// Sample rate used for tone synthesis
    pub sample_rate: u32,
    /// Tick interval driving progress updates and tone block rendering
    pub tick: Duration,
    /// Upper bound on how long the audio-output probe may take
    pub probe_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            tick: DEFAULT_TICK,
            probe_grace: DEFAULT_PROBE_GRACE,
        }
    }
}

impl Config {
    /// Build a configuration from the environment
    ///
    /// Recognized variables: `RESONA_API_URL`, `RESONA_SAMPLE_RATE`,
    /// `RESONA_TICK_MS`, `RESONA_PROBE_GRACE_MS`. Unset or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("RESONA_API_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        if let Some(rate) = env_u64("RESONA_SAMPLE_RATE") {
            config.sample_rate = rate as u32;
        }
        if let Some(ms) = env_u64("RESONA_TICK_MS") {
            config.tick = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("RESONA_PROBE_GRACE_MS") {
            config.probe_grace = Duration::from_millis(ms);
        }

        config
    }

    /// Override the base URL, keeping everything else
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
