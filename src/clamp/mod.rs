// Conductance replay core: waveform loading, trial timing, the per-tick step
// and the host-facing plugin surface.
pub mod clock;
pub mod controller;
pub mod error;
pub mod executor;
pub mod plugin;
pub mod raster;
pub mod source;
pub mod waveform;
// Re-exported so callers can stay at `crate::clamp::*`
pub use clock::{TickOutcome, TrialClock};
pub use controller::{
    ClampConfig, Commit, ParameterController, ParameterEntry, ParameterField, NO_FILE_LOADED,
};
pub use error::ClampError;
pub use executor::{ClampParams, ClampState, Executor, StepOutput};
pub use plugin::{
    ClampControl, ClampRuntime, DynamicClamp, HostEvent, RuntimeCommand, StateField, Variable,
    VariableKind, VARIABLES,
};
pub use raster::{Observers, RasterRange, SpikeEvent};
pub use source::{ChannelInputs, ClampIo, CommandLog, ManualIo};
pub use waveform::{
    padding_samples, read_samples, Waveform, WaveformStore, MAX_PADDING_SAMPLES,
};
