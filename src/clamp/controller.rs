use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::clamp::executor::ClampParams;
use crate::clamp::waveform::{Waveform, WaveformStore};
use crate::clamp::ClampError;
/// Shown in place of a path when no waveform file is active.
pub const NO_FILE_LOADED: &str = "No file loaded.";
/// Scale between the holding-current field and the stored value.
///
/// The field is multiplied by this on commit and divided by it for display,
/// so the stored number is not amps. Kept as is for compatibility with
/// existing protocols.
pub const HOLDING_FIELD_SCALE: f64 = 1e9;
/// Protocol settings in the units the user types them in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampConfig {
    pub file: String,
    pub reversal_potential_mv: f64,
    pub gain: f64,
    pub wait_s: f64,
    pub holding_current: f64,
    pub repeat: u32,
}
impl Default for ClampConfig {
    fn default() -> Self {
        Self {
            file: NO_FILE_LOADED.to_owned(),
            reversal_potential_mv: -70.0,
            gain: 1.0,
            wait_s: 1.0,
            holding_current: 0.0,
            repeat: 1,
        }
    }
}
impl ClampConfig {
    /// Convert to the units the executor works in.
    pub fn params(&self) -> ClampParams {
        ClampParams {
            reversal_potential: self.reversal_potential_mv / 1000.0,
            gain: self.gain,
            wait_s: self.wait_s,
            holding_current: self.holding_current * HOLDING_FIELD_SCALE,
            repeat: self.repeat,
        }
    }
    /// Inverse of [`ClampConfig::params`], for display.
    pub fn displayed(file: impl Into<String>, params: &ClampParams) -> Self {
        Self {
            file: file.into(),
            reversal_potential_mv: params.reversal_potential * 1000.0,
            gain: params.gain,
            wait_s: params.wait_s,
            holding_current: params.holding_current / HOLDING_FIELD_SCALE,
            repeat: params.repeat,
        }
    }
    pub fn has_file(&self) -> bool {
        self.file != NO_FILE_LOADED
    }
}
/// Editable parameter fields exposed to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterField {
    FileName,
    ReversalPotential,
    Gain,
    WaitTime,
    HoldingCurrent,
    Repeat,
}
impl ParameterField {
    pub const ALL: [ParameterField; 6] = [
        ParameterField::FileName,
        ParameterField::ReversalPotential,
        ParameterField::Gain,
        ParameterField::WaitTime,
        ParameterField::HoldingCurrent,
        ParameterField::Repeat,
    ];
    pub fn name(self) -> &'static str {
        match self {
            ParameterField::FileName => "File Name",
            ParameterField::ReversalPotential => "Reversal Potential (mV)",
            ParameterField::Gain => "Gain",
            ParameterField::WaitTime => "Wait Time (s)",
            ParameterField::HoldingCurrent => "Holding Current",
            ParameterField::Repeat => "Repeat",
        }
    }
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}
/// Raw text of every parameter field, as the host edits it.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterEntry {
    values: [String; 6],
}
impl ParameterEntry {
    pub fn from_config(config: &ClampConfig) -> Self {
        Self {
            values: [
                config.file.clone(),
                config.reversal_potential_mv.to_string(),
                config.gain.to_string(),
                config.wait_s.to_string(),
                config.holding_current.to_string(),
                config.repeat.to_string(),
            ],
        }
    }
    pub fn get(&self, field: ParameterField) -> &str {
        &self.values[field as usize]
    }
    pub fn set(&mut self, field: ParameterField, value: impl Into<String>) {
        self.values[field as usize] = value.into();
    }
    /// Validate every field. Nothing here touches the protocol state.
    pub fn parse(&self) -> Result<ClampConfig, ClampError> {
        let file = self.get(ParameterField::FileName).trim();
        let file = if file.is_empty() { NO_FILE_LOADED } else { file };
        let wait_s = self.number(ParameterField::WaitTime)?;
        if wait_s < 0.0 {
            return Err(self.rejected(ParameterField::WaitTime, "must not be negative"));
        }
        Ok(ClampConfig {
            file: file.to_owned(),
            reversal_potential_mv: self.number(ParameterField::ReversalPotential)?,
            gain: self.number(ParameterField::Gain)?,
            wait_s,
            holding_current: self.number(ParameterField::HoldingCurrent)?,
            repeat: self.count(ParameterField::Repeat)?,
        })
    }
    fn number(&self, field: ParameterField) -> Result<f64, ClampError> {
        let value = self
            .get(field)
            .trim()
            .parse::<f64>()
            .map_err(|_| self.rejected(field, "not a number"))?;
        if !value.is_finite() {
            return Err(self.rejected(field, "not a finite number"));
        }
        Ok(value)
    }
    fn count(&self, field: ParameterField) -> Result<u32, ClampError> {
        let value = self.number(field)?;
        if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
            return Err(self.rejected(field, "must be a whole number of trials"));
        }
        Ok(value as u32)
    }
    fn rejected(&self, field: ParameterField, reason: &'static str) -> ClampError {
        ClampError::Configuration {
            field: field.name(),
            value: self.get(field).to_owned(),
            reason,
        }
    }
}
impl Default for ParameterEntry {
    fn default() -> Self {
        Self::from_config(&ClampConfig::default())
    }
}
/// A fully prepared protocol, ready to be swapped into the executor.
#[derive(Clone, Debug)]
pub struct Commit {
    pub waveform: Arc<Waveform>,
    pub params: ClampParams,
}
/// Applies committed configuration: converts units, reloads the waveform and
/// hands back what the executor needs.
pub struct ParameterController {
    store: WaveformStore,
    config: ClampConfig,
    params: ClampParams,
}
impl ParameterController {
    pub fn new(period: Duration) -> Result<Self, ClampError> {
        let config = ClampConfig::default();
        let params = config.params();
        Ok(Self {
            store: WaveformStore::new(period)?,
            config,
            params,
        })
    }
    /// Apply `config` as a whole. If the waveform cannot be loaded nothing
    /// else is applied and the previous protocol stays in force.
    pub fn commit(&mut self, config: ClampConfig, period: Duration) -> Result<Commit, ClampError> {
        let params = config.params();
        let loaded = if config.has_file() {
            self.store.load(
                Path::new(&config.file),
                period,
                params.holding_current,
                params.wait_s,
            )
        } else {
            self.store
                .repad(period, params.holding_current, params.wait_s)
        };
        let waveform = match loaded {
            Ok(waveform) => waveform,
            Err(err) => {
                log::warn!("commit rejected: {err}");
                if err.is_load_failure() {
                    self.config.file = NO_FILE_LOADED.to_owned();
                }
                return Err(err);
            }
        };
        log::info!(
            "committed {} (Erev {} mV, gain {}, wait {} s, repeat {})",
            config.file,
            config.reversal_potential_mv,
            config.gain,
            config.wait_s,
            config.repeat
        );
        self.config = config;
        self.params = params;
        Ok(Commit { waveform, params })
    }
    /// Load a file picked interactively, keeping the committed parameters.
    pub fn browse(&mut self, path: &Path, period: Duration) -> Result<Commit, ClampError> {
        let mut config = self.config.clone();
        config.file = path.to_string_lossy().into_owned();
        self.commit(config, period)
    }
    /// Re-read the committed file for a new real-time period. If the file is
    /// gone the current samples are re-padded so timing still matches.
    pub fn change_period(&mut self, period: Duration) -> Result<Arc<Waveform>, ClampError> {
        let holding = self.params.holding_current;
        let wait_s = self.params.wait_s;
        match self.store.reload(period, holding, wait_s) {
            Ok(waveform) => Ok(waveform),
            Err(err) if err.is_load_failure() => {
                log::warn!("reload after period change failed, keeping samples: {err}");
                self.store.repad(period, holding, wait_s)
            }
            Err(err) => Err(err),
        }
    }
    /// Settings as they should be displayed.
    pub fn config(&self) -> &ClampConfig {
        &self.config
    }
    pub fn params(&self) -> &ClampParams {
        &self.params
    }
    pub fn waveform(&self) -> &Arc<Waveform> {
        self.store.current()
    }
    pub fn trial_length(&self) -> f64 {
        self.store.trial_length()
    }
    pub fn store(&self) -> &WaveformStore {
        &self.store
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    const SECOND: Duration = Duration::from_secs(1);
    fn trace(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
    fn config_for(file: &NamedTempFile) -> ClampConfig {
        ClampConfig {
            file: file.path().to_string_lossy().into_owned(),
            reversal_potential_mv: 0.0,
            gain: 1.0,
            wait_s: 1.0,
            holding_current: 0.0,
            repeat: 2,
        }
    }
    #[test]
    fn unit_conversion_at_the_boundary() {
        let config = ClampConfig {
            reversal_potential_mv: -80.0,
            holding_current: 0.5,
            ..ClampConfig::default()
        };
        let params = config.params();
        assert!((params.reversal_potential - -0.080).abs() < 1e-15);
        assert_eq!(params.holding_current, 0.5e9);
        let shown = ClampConfig::displayed(config.file.clone(), &params);
        assert!((shown.reversal_potential_mv - -80.0).abs() < 1e-9);
        assert!((shown.holding_current - 0.5).abs() < 1e-15);
    }
    #[test]
    fn defaults_match_plugin_start_up() {
        let config = ClampConfig::default();
        assert_eq!(config.file, NO_FILE_LOADED);
        assert!((config.reversal_potential_mv - -70.0).abs() < 1e-9);
        assert_eq!(config.gain, 1.0);
        assert_eq!(config.wait_s, 1.0);
        assert_eq!(config.repeat, 1);
        assert!(!config.has_file());
    }
    #[test]
    fn entry_parses_typed_fields() {
        let mut entry = ParameterEntry::default();
        entry.set(ParameterField::FileName, "trace.txt");
        entry.set(ParameterField::ReversalPotential, " -65 ");
        entry.set(ParameterField::Repeat, "3");
        let config = entry.parse().unwrap();
        assert_eq!(config.file, "trace.txt");
        assert_eq!(config.reversal_potential_mv, -65.0);
        assert_eq!(config.repeat, 3);
    }
    #[test]
    fn entry_rejects_bad_values() {
        let cases = [
            (ParameterField::Gain, "lots"),
            (ParameterField::WaitTime, "-1"),
            (ParameterField::Repeat, "1.5"),
            (ParameterField::Repeat, "-2"),
            (ParameterField::HoldingCurrent, "inf"),
        ];
        for (field, value) in cases {
            let mut entry = ParameterEntry::default();
            entry.set(field, value);
            match entry.parse() {
                Err(ClampError::Configuration { field: name, .. }) => {
                    assert_eq!(name, field.name())
                }
                other => panic!("{field:?}={value} gave {other:?}"),
            }
        }
    }
    #[test]
    fn field_names_round_trip() {
        for field in ParameterField::ALL {
            assert_eq!(ParameterField::from_name(field.name()), Some(field));
        }
        assert_eq!(ParameterField::from_name("Colour"), None);
    }
    #[test]
    fn commit_loads_and_reports_file() {
        let file = trace("0.1\n0.2\n0.3\n");
        let mut controller = ParameterController::new(SECOND).unwrap();
        let config = config_for(&file);
        let commit = controller.commit(config.clone(), SECOND).unwrap();
        assert_eq!(commit.waveform.samples(), &[0.1, 0.2, 0.3, 0.0]);
        assert_eq!(commit.params.repeat, 2);
        assert_eq!(controller.config().file, config.file);
        assert_eq!(controller.trial_length(), 3.0);
    }
    #[test]
    fn failed_commit_keeps_previous_protocol() {
        let file = trace("0.1\n0.2\n0.3\n");
        let mut controller = ParameterController::new(SECOND).unwrap();
        let good = controller.commit(config_for(&file), SECOND).unwrap();
        let mut bad = config_for(&file);
        bad.file = "/no/such/trace.txt".into();
        bad.gain = 40.0;
        let err = controller.commit(bad, SECOND).unwrap_err();
        assert!(err.is_load_failure());
        assert!(Arc::ptr_eq(controller.waveform(), &good.waveform));
        assert_eq!(controller.params().gain, 1.0);
        assert_eq!(controller.config().file, NO_FILE_LOADED);
    }
    #[test]
    fn huge_wait_is_rejected_without_touching_protocol() {
        let file = trace("0.1\n0.2\n0.3\n");
        let period = Duration::from_micros(100);
        let mut controller = ParameterController::new(period).unwrap();
        let good = controller.commit(config_for(&file), period).unwrap();
        let mut entry = ParameterEntry::from_config(controller.config());
        entry.set(ParameterField::WaitTime, "1e300");
        let config = entry.parse().unwrap();
        match controller.commit(config, period) {
            Err(ClampError::Configuration { field, .. }) => {
                assert_eq!(field, ParameterField::WaitTime.name())
            }
            other => panic!("unexpected commit result {other:?}"),
        }
        assert!(Arc::ptr_eq(controller.waveform(), &good.waveform));
        assert_eq!(controller.params().wait_s, 1.0);
        assert_eq!(controller.config().file, config_for(&file).file);
    }
    #[test]
    fn sentinel_path_repads_current_samples() {
        let file = trace("0.1\n0.2\n");
        let mut controller = ParameterController::new(SECOND).unwrap();
        controller.commit(config_for(&file), SECOND).unwrap();
        let mut config = controller.config().clone();
        config.file = NO_FILE_LOADED.into();
        config.wait_s = 3.0;
        let commit = controller.commit(config, SECOND).unwrap();
        assert_eq!(commit.waveform.trial(), &[0.1, 0.2]);
        assert_eq!(commit.waveform.padding_samples(), 3);
    }
    #[test]
    fn period_change_reloads_committed_file() {
        let file = trace("1\n1\n1\n1\n");
        let mut controller = ParameterController::new(SECOND).unwrap();
        controller.commit(config_for(&file), SECOND).unwrap();
        let waveform = controller.change_period(Duration::from_millis(500)).unwrap();
        assert_eq!(waveform.trial_length(), 2.0);
        assert_eq!(waveform.padding_samples(), 2);
        assert_eq!(controller.params().repeat, 2);
    }
    #[test]
    fn browse_keeps_committed_parameters() {
        let file = trace("0.5\n");
        let mut controller = ParameterController::new(SECOND).unwrap();
        let commit = controller.browse(file.path(), SECOND).unwrap();
        assert_eq!(commit.params, ClampParams::default());
        assert_eq!(controller.config().file, file.path().to_string_lossy());
    }
}
