use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use crate::clamp::controller::{
    ClampConfig, Commit, ParameterController, ParameterEntry, ParameterField, NO_FILE_LOADED,
};
use crate::clamp::executor::{ClampState, Executor};
use crate::clamp::raster::{Observers, RasterRange, SpikeEvent};
use crate::clamp::source::ChannelInputs;
use crate::clamp::waveform::Waveform;
use crate::clamp::ClampError;
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableKind {
    Input,
    Output,
    Parameter,
    State,
}
/// One entry of the channel and field table the host builds its UI from.
#[derive(Clone, Copy, Debug)]
pub struct Variable {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: VariableKind,
}
pub const VARIABLES: [Variable; 11] = [
    Variable {
        name: "Vm (V)",
        description: "Membrane potential",
        kind: VariableKind::Input,
    },
    Variable {
        name: "Spike State",
        description: "Spike detector output, 1 on a spike",
        kind: VariableKind::Input,
    },
    Variable {
        name: "Command",
        description: "Injected current",
        kind: VariableKind::Output,
    },
    Variable {
        name: "Length (s)",
        description: "Trial length, from the real-time period and the number of samples in the file",
        kind: VariableKind::State,
    },
    Variable {
        name: "File Name",
        description: "ASCII file with the conductance waveform in siemens",
        kind: VariableKind::Parameter,
    },
    Variable {
        name: "Reversal Potential (mV)",
        description: "Reversal potential of the artificial conductance",
        kind: VariableKind::Parameter,
    },
    Variable {
        name: "Gain",
        description: "Multiplier applied to the conductance",
        kind: VariableKind::Parameter,
    },
    Variable {
        name: "Wait Time (s)",
        description: "Rest between trials",
        kind: VariableKind::Parameter,
    },
    Variable {
        name: "Holding Current",
        description: "Value applied while waiting between trials",
        kind: VariableKind::Parameter,
    },
    Variable {
        name: "Repeat",
        description: "Number of trials",
        kind: VariableKind::Parameter,
    },
    Variable {
        name: "Time (s)",
        description: "Time since the protocol started",
        kind: VariableKind::State,
    },
];
/// Read-only values the host displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateField {
    TrialLength,
    Time,
}
impl StateField {
    pub fn name(self) -> &'static str {
        match self {
            StateField::TrialLength => "Length (s)",
            StateField::Time => "Time (s)",
        }
    }
}
/// Lifecycle notifications from the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Init,
    /// Commit the edited parameter fields.
    Modify,
    Pause,
    Unpause,
    /// The real-time period changed.
    Period(Duration),
}
/// Work for the real-time side, produced off the real-time thread.
#[derive(Clone, Debug)]
pub enum RuntimeCommand {
    /// New waveform and parameters; rewinds the trial clock.
    Install(Commit),
    /// Same protocol re-timed for a new period; progress is kept.
    Replace {
        waveform: Arc<Waveform>,
        period: Duration,
    },
    Pause,
    Unpause,
    Raster(bool),
}
/// Control half of the plugin. Owns everything that may block: file loads,
/// parsing, parameter fields.
pub struct ClampControl {
    controller: ParameterController,
    entry: ParameterEntry,
    period: Duration,
    raster: bool,
    ranges: Observers<RasterRange>,
}
impl ClampControl {
    pub fn new(period: Duration) -> Result<Self, ClampError> {
        let controller = ParameterController::new(period)?;
        let entry = ParameterEntry::from_config(controller.config());
        Ok(Self {
            controller,
            entry,
            period,
            raster: true,
            ranges: Observers::new(),
        })
    }
    /// Real-time half matching the current protocol, paused.
    pub fn runtime(&self) -> ClampRuntime {
        let mut executor = Executor::new(
            Arc::clone(self.controller.waveform()),
            *self.controller.params(),
        );
        executor.set_raster(self.raster);
        ClampRuntime::new(executor)
    }
    pub fn update(&mut self, event: HostEvent) -> Result<Option<RuntimeCommand>, ClampError> {
        match event {
            HostEvent::Init => {
                self.entry = ParameterEntry::from_config(self.controller.config());
                self.publish_range();
                Ok(None)
            }
            HostEvent::Modify => {
                let config = self.entry.parse()?;
                let commit = self.apply(|controller, period| controller.commit(config, period))?;
                Ok(Some(RuntimeCommand::Install(commit)))
            }
            HostEvent::Pause => {
                log::info!("protocol paused");
                Ok(Some(RuntimeCommand::Pause))
            }
            HostEvent::Unpause => {
                log::info!("starting protocol");
                Ok(Some(RuntimeCommand::Unpause))
            }
            HostEvent::Period(period) => {
                if period.is_zero() {
                    return Err(ClampError::InvalidPeriod);
                }
                log::info!("new real-time period: {:?}", period);
                let waveform = self.controller.change_period(period)?;
                self.period = period;
                self.publish_range();
                Ok(Some(RuntimeCommand::Replace { waveform, period }))
            }
        }
    }
    /// Load a file chosen by the user with the committed parameters.
    pub fn browse(&mut self, path: &Path) -> Result<RuntimeCommand, ClampError> {
        log::info!("loading new file: {:?}", path);
        let commit = self.apply(|controller, period| controller.browse(path, period))?;
        Ok(RuntimeCommand::Install(commit))
    }
    pub fn set_raster(&mut self, enabled: bool) -> RuntimeCommand {
        self.raster = enabled;
        RuntimeCommand::Raster(enabled)
    }
    /// The plot was cleared; send the axes again.
    pub fn clear_raster(&mut self) {
        self.publish_range();
    }
    pub fn parameter(&self, field: ParameterField) -> &str {
        self.entry.get(field)
    }
    /// Overwrite every parameter field; takes effect on the next `Modify`.
    pub fn set_config(&mut self, config: &ClampConfig) {
        self.entry = ParameterEntry::from_config(config);
    }
    pub fn set_parameter(&mut self, field: ParameterField, value: impl Into<String>) {
        self.entry.set(field, value);
    }
    pub fn trial_length(&self) -> f64 {
        self.controller.trial_length()
    }
    pub fn period(&self) -> Duration {
        self.period
    }
    pub fn raster(&self) -> bool {
        self.raster
    }
    pub fn range(&self) -> RasterRange {
        RasterRange::for_protocol(self.controller.trial_length(), self.controller.params().repeat)
    }
    pub fn controller(&self) -> &ParameterController {
        &self.controller
    }
    pub fn on_range_changed(&mut self, handler: impl FnMut(RasterRange) + Send + 'static) {
        self.ranges.subscribe(handler);
    }
    fn apply<F>(&mut self, load: F) -> Result<Commit, ClampError>
    where
        F: FnOnce(&mut ParameterController, Duration) -> Result<Commit, ClampError>,
    {
        match load(&mut self.controller, self.period) {
            Ok(commit) => {
                self.entry = ParameterEntry::from_config(self.controller.config());
                self.publish_range();
                Ok(commit)
            }
            Err(err) => {
                if err.is_load_failure() {
                    self.entry.set(ParameterField::FileName, NO_FILE_LOADED);
                }
                Err(err)
            }
        }
    }
    fn publish_range(&mut self) {
        let range = self.range();
        self.ranges.notify(range);
    }
}
/// Real-time half of the plugin. `execute` is called once per tick and never
/// blocks, allocates or fails.
pub struct ClampRuntime {
    executor: Executor,
    paused: bool,
    spikes: Observers<SpikeEvent>,
}
impl ClampRuntime {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            paused: true,
            spikes: Observers::new(),
        }
    }
    pub fn apply(&mut self, command: RuntimeCommand) {
        match command {
            RuntimeCommand::Install(commit) => {
                self.executor.install(commit.waveform, commit.params);
            }
            RuntimeCommand::Replace { waveform, .. } => self.executor.replace_waveform(waveform),
            RuntimeCommand::Pause => self.paused = true,
            RuntimeCommand::Unpause => {
                self.executor.reset();
                self.paused = false;
            }
            RuntimeCommand::Raster(enabled) => self.executor.set_raster(enabled),
        }
    }
    /// One tick. Returns the command current; zero while paused. Pauses
    /// itself once the last trial has been played.
    pub fn execute(&mut self, inputs: ChannelInputs) -> f64 {
        if self.paused {
            return 0.0;
        }
        let out = self
            .executor
            .step(inputs.membrane_potential, inputs.spiked());
        if let Some(spike) = out.spike {
            self.spikes.notify(spike);
        }
        if out.run_complete {
            self.paused = true;
        }
        out.command
    }
    pub fn is_paused(&self) -> bool {
        self.paused
    }
    pub fn state(&self) -> ClampState {
        self.executor.state()
    }
    pub fn executor(&self) -> &Executor {
        &self.executor
    }
    pub fn on_spike_event(&mut self, handler: impl FnMut(SpikeEvent) + Send + 'static) {
        self.spikes.subscribe(handler);
    }
}
/// Both halves in one place, for hosts that call control and real-time
/// entry points from a single thread.
pub struct DynamicClamp {
    control: ClampControl,
    runtime: ClampRuntime,
}
impl DynamicClamp {
    pub fn new(period: Duration) -> Result<Self, ClampError> {
        let control = ClampControl::new(period)?;
        let runtime = control.runtime();
        let mut clamp = Self { control, runtime };
        clamp.update(HostEvent::Init)?;
        Ok(clamp)
    }
    pub fn update(&mut self, event: HostEvent) -> Result<(), ClampError> {
        if let Some(command) = self.control.update(event)? {
            self.runtime.apply(command);
        }
        Ok(())
    }
    pub fn execute(&mut self, inputs: ChannelInputs) -> f64 {
        self.runtime.execute(inputs)
    }
    pub fn browse(&mut self, path: &Path) -> Result<(), ClampError> {
        let command = self.control.browse(path)?;
        self.runtime.apply(command);
        Ok(())
    }
    pub fn set_raster(&mut self, enabled: bool) {
        let command = self.control.set_raster(enabled);
        self.runtime.apply(command);
    }
    pub fn clear_raster(&mut self) {
        self.control.clear_raster();
    }
    pub fn parameter(&self, field: ParameterField) -> &str {
        self.control.parameter(field)
    }
    pub fn set_parameter(&mut self, field: ParameterField, value: impl Into<String>) {
        self.control.set_parameter(field, value);
    }
    pub fn set_config(&mut self, config: &ClampConfig) {
        self.control.set_config(config);
    }
    pub fn state(&self, field: StateField) -> f64 {
        match field {
            StateField::TrialLength => self.control.trial_length(),
            StateField::Time => self.runtime.state().elapsed_s,
        }
    }
    pub fn is_paused(&self) -> bool {
        self.runtime.is_paused()
    }
    pub fn on_spike_event(&mut self, handler: impl FnMut(SpikeEvent) + Send + 'static) {
        self.runtime.on_spike_event(handler);
    }
    pub fn on_range_changed(&mut self, handler: impl FnMut(RasterRange) + Send + 'static) {
        self.control.on_range_changed(handler);
    }
    pub fn control(&self) -> &ClampControl {
        &self.control
    }
    pub fn runtime(&self) -> &ClampRuntime {
        &self.runtime
    }
}
