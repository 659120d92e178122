use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
/// Values on the two input channels for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelInputs {
    /// Membrane potential in volts.
    pub membrane_potential: f64,
    /// Spike detector state; `1.0` marks a spike on this tick.
    pub spike_state: f64,
}
impl ChannelInputs {
    pub fn new(membrane_potential: f64, spike_state: f64) -> Self {
        Self {
            membrane_potential,
            spike_state,
        }
    }
    pub fn spiked(&self) -> bool {
        self.spike_state == 1.0
    }
}
/// Host side of the loop: where inputs come from and the command goes to.
pub trait ClampIo {
    fn read_inputs(&mut self) -> ChannelInputs;
    fn write_command(&mut self, command: f64);
}
/// Commands written so far, shared with whoever inspects them.
pub type CommandLog = Arc<Mutex<Vec<f64>>>;
/// Scripted inputs, useful for tests and deterministic playback.
pub struct ManualIo {
    queue: VecDeque<ChannelInputs>,
    idle: ChannelInputs,
    commands: CommandLog,
}
impl ManualIo {
    /// Replays `inputs`, then holds `idle` forever.
    pub fn new(inputs: impl IntoIterator<Item = ChannelInputs>, idle: ChannelInputs) -> Self {
        Self {
            queue: inputs.into_iter().collect(),
            idle,
            commands: CommandLog::default(),
        }
    }
    pub fn commands(&self) -> CommandLog {
        Arc::clone(&self.commands)
    }
}
impl ClampIo for ManualIo {
    fn read_inputs(&mut self) -> ChannelInputs {
        self.queue.pop_front().unwrap_or(self.idle)
    }
    fn write_command(&mut self, command: f64) {
        if let Ok(mut log) = self.commands.lock() {
            log.push(command);
        }
    }
}
