use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use crate::clamp::controller::ParameterField;
use crate::clamp::ClampError;
/// Most holding samples one trial may be padded with (about 1.9 h at 10 kHz).
pub const MAX_PADDING_SAMPLES: usize = 1 << 26;
/// Conductance trace (siemens) followed by the inter-trial holding samples.
///
/// One sample is consumed per real-time tick, so the trace is only meaningful
/// together with the period it was padded for.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>, // trial samples, then padding
    trial_samples: usize,
    period_s: f64,
}
impl Waveform {
    /// Waveform with no samples: the executor replays silence.
    pub fn empty(period: Duration) -> Result<Self, ClampError> {
        Ok(Self {
            samples: Vec::new(),
            trial_samples: 0,
            period_s: period_seconds(period)?,
        })
    }
    /// Append `floor(wait / dt)` copies of `holding` to `trial`.
    pub fn padded(
        trial: Vec<f64>,
        period: Duration,
        holding: f64,
        wait_s: f64,
    ) -> Result<Self, ClampError> {
        let period_s = period_seconds(period)?;
        let trial_samples = trial.len();
        let padding = padding_samples(wait_s, period)?;
        let mut samples = trial;
        samples.reserve_exact(padding);
        samples.extend(std::iter::repeat(holding).take(padding));
        Ok(Self {
            samples,
            trial_samples,
            period_s,
        })
    }
    /// Rebuild the padding for a new period, holding value or wait time.
    pub fn repadded(&self, period: Duration, holding: f64, wait_s: f64) -> Result<Self, ClampError> {
        Self::padded(self.trial().to_vec(), period, holding, wait_s)
    }
    /// Seconds of recorded conductance, excluding the wait.
    pub fn trial_length(&self) -> f64 {
        self.trial_samples as f64 * self.period_s
    }
    pub fn period_s(&self) -> f64 {
        self.period_s
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn trial_samples(&self) -> usize {
        self.trial_samples
    }
    pub fn padding_samples(&self) -> usize {
        self.samples.len() - self.trial_samples
    }
    pub fn trial(&self) -> &[f64] {
        &self.samples[..self.trial_samples]
    }
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.samples.get(index).copied()
    }
    /// `(time, conductance)` pairs over the whole padded trace.
    pub fn preview(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, &g)| (i as f64 * self.period_s, g))
            .collect()
    }
}
/// Number of holding samples for a wait interval. Truncates, so the wait may
/// come up one tick short when `wait_s` is not a multiple of the period.
///
/// The wait is rounded to whole nanoseconds first so that decimal waits such
/// as 0.3 s divide evenly into a 100 us period.
pub fn padding_samples(wait_s: f64, period: Duration) -> Result<usize, ClampError> {
    if period.is_zero() {
        return Err(ClampError::InvalidPeriod);
    }
    if !(wait_s > 0.0) {
        return Ok(0);
    }
    let period_ns = period.as_nanos();
    let wait_ns = (wait_s * 1e9).round();
    if !(wait_ns / period_ns as f64 <= MAX_PADDING_SAMPLES as f64) {
        return Err(ClampError::Configuration {
            field: ParameterField::WaitTime.name(),
            value: wait_s.to_string(),
            reason: "too many holding samples for the real-time period",
        });
    }
    Ok((wait_ns as u128 / period_ns) as usize)
}
fn period_seconds(period: Duration) -> Result<f64, ClampError> {
    if period.is_zero() {
        return Err(ClampError::InvalidPeriod);
    }
    Ok(period.as_secs_f64())
}
/// Read whitespace separated samples in file order.
pub fn read_samples(path: &Path) -> Result<Vec<f64>, ClampError> {
    let file = File::open(path).map_err(|source| ClampError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    parse_samples(BufReader::new(file), path)
}
/// Parse a sample stream; `path` is only used to label errors.
pub fn parse_samples<R: BufRead>(reader: R, path: &Path) -> Result<Vec<f64>, ClampError> {
    let mut samples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ClampError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| ClampError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                token: token.to_owned(),
            })?;
            samples.push(value);
        }
    }
    Ok(samples)
}
/// Owns the active waveform and the file it came from.
///
/// Every load builds a fresh [`Waveform`] and swaps the shared handle, so a
/// reader holding the previous `Arc` keeps a complete buffer.
pub struct WaveformStore {
    current: Arc<Waveform>,
    source: Option<PathBuf>,
}
impl WaveformStore {
    pub fn new(period: Duration) -> Result<Self, ClampError> {
        Ok(Self {
            current: Arc::new(Waveform::empty(period)?),
            source: None,
        })
    }
    pub fn current(&self) -> &Arc<Waveform> {
        &self.current
    }
    /// Path of the last file that loaded successfully.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
    pub fn trial_length(&self) -> f64 {
        self.current.trial_length()
    }
    /// Load `path` and make it current. On error the store is unchanged.
    pub fn load(
        &mut self,
        path: &Path,
        period: Duration,
        holding: f64,
        wait_s: f64,
    ) -> Result<Arc<Waveform>, ClampError> {
        let trial = read_samples(path)?;
        let waveform = Waveform::padded(trial, period, holding, wait_s)?;
        log::info!(
            "loaded {:?}: {} samples ({:.3} s) + {} holding samples",
            path,
            waveform.trial_samples(),
            waveform.trial_length(),
            waveform.padding_samples()
        );
        self.source = Some(path.to_path_buf());
        Ok(self.install(waveform))
    }
    /// Keep the current trial samples and rebuild only the padding.
    pub fn repad(
        &mut self,
        period: Duration,
        holding: f64,
        wait_s: f64,
    ) -> Result<Arc<Waveform>, ClampError> {
        let waveform = self.current.repadded(period, holding, wait_s)?;
        Ok(self.install(waveform))
    }
    /// Re-read the last loaded file, e.g. after the real-time period changed.
    /// Without a source file only the padding is rebuilt.
    pub fn reload(
        &mut self,
        period: Duration,
        holding: f64,
        wait_s: f64,
    ) -> Result<Arc<Waveform>, ClampError> {
        match self.source.clone() {
            Some(path) => self.load(&path, period, holding, wait_s),
            None => self.repad(period, holding, wait_s),
        }
    }
    fn install(&mut self, waveform: Waveform) -> Arc<Waveform> {
        self.current = Arc::new(waveform);
        Arc::clone(&self.current)
    }
}
