// src/config.rs
use crate::clamp::{padding_samples, ClampConfig};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Everything needed to run a protocol from the command line.
///
/// ```json
/// { "file": "trace.txt", "reversal_potential_mv": 0, "repeat": 5, "period_us": 100 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(flatten)]
    pub clamp: ClampConfig,
    /// Real-time period in microseconds.
    pub period_us: u64,
    pub raster: bool,
    pub report_every: u64,
    /// Seed for the model cell noise; random when absent.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clamp: ClampConfig::default(),
            period_us: 100, // 10 kHz
            raster: true,
            report_every: 10_000,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        let config: SessionConfig = serde_json::from_str(&text)
            .with_context(|| format!("invalid session file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.period_us > 0, "period_us must be greater than zero");
        ensure!(
            self.clamp.wait_s.is_finite() && self.clamp.wait_s >= 0.0,
            "wait_s must be a finite, non-negative number of seconds"
        );
        padding_samples(self.clamp.wait_s, self.period())?;
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_micros(self.period_us)
    }

    /// Upper bound on how long the whole protocol should take, given the
    /// trial length of the loaded waveform.
    pub fn expected_duration(&self, trial_length: f64) -> Duration {
        let seconds = (trial_length + self.clamp.wait_s) * f64::from(self.clamp.repeat);
        Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
    }
}
