use std::sync::Arc;
use crate::clamp::clock::TrialClock;
use crate::clamp::raster::SpikeEvent;
use crate::clamp::waveform::Waveform;
/// Protocol parameters in the units the real-time step works in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClampParams {
    /// Volts.
    pub reversal_potential: f64,
    pub gain: f64,
    /// Seconds between trials.
    pub wait_s: f64,
    /// Value padded after each trial (stored with the x1e9 field scale).
    pub holding_current: f64,
    pub repeat: u32,
}
impl Default for ClampParams {
    fn default() -> Self {
        Self {
            reversal_potential: -0.070,
            gain: 1.0,
            wait_s: 1.0,
            holding_current: 0.0,
            repeat: 1,
        }
    }
}
/// What one tick produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutput {
    /// Command current written to the output channel.
    pub command: f64,
    pub spike: Option<SpikeEvent>,
    /// The run is over and the host should stop stepping.
    pub run_complete: bool,
}
/// Read-only view of the replay progress.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClampState {
    pub elapsed_s: f64,
    pub tick_count: u64,
    pub trial_index: u32,
    pub sample_cursor: usize,
    pub complete: bool,
    /// Ticks whose cursor ran more than one sample past the padded waveform.
    pub overruns: u64,
}
/// Per-tick conductance replay.
///
/// `step` does no I/O and no allocation; everything it reads was prepared by
/// the control path and swapped in between ticks.
pub struct Executor {
    waveform: Arc<Waveform>,
    clock: TrialClock,
    params: ClampParams,
    raster: bool,
    overruns: u64,
}
impl Executor {
    pub fn new(waveform: Arc<Waveform>, params: ClampParams) -> Self {
        let clock = TrialClock::new(waveform.trial_length(), params.wait_s, params.repeat);
        Self {
            waveform,
            clock,
            params,
            raster: true,
            overruns: 0,
        }
    }
    /// Swap in a freshly committed waveform and parameters, then rewind.
    pub fn install(&mut self, waveform: Arc<Waveform>, params: ClampParams) {
        self.waveform = waveform;
        self.params = params;
        self.reset();
    }
    /// Swap in the same protocol padded for a new period. Trial progress is
    /// kept; trials from the current one on take the new length.
    pub fn replace_waveform(&mut self, waveform: Arc<Waveform>) {
        let counted_at = self.waveform.period_s();
        self.waveform = waveform;
        self.clock.retime(
            counted_at,
            self.waveform.trial_length(),
            self.params.wait_s,
        );
    }
    pub fn reset(&mut self) {
        self.clock.reset(
            self.waveform.trial_length(),
            self.params.wait_s,
            self.params.repeat,
        );
        self.overruns = 0;
    }
    pub fn set_raster(&mut self, enabled: bool) {
        self.raster = enabled;
    }
    pub fn raster(&self) -> bool {
        self.raster
    }
    pub fn step(&mut self, membrane_potential: f64, spiked: bool) -> StepOutput {
        if self.clock.is_complete() {
            return StepOutput {
                command: 0.0,
                spike: None,
                run_complete: true,
            };
        }
        let period_s = self.waveform.period_s();
        let spike = (self.raster && spiked).then(|| SpikeEvent {
            x: self.clock.trial_time(period_s),
            y: f64::from(self.clock.trial_index() + 1),
        });
        let cursor = self.clock.sample_cursor();
        // the boundary tick after the padding still belongs to the wait
        let sample = match self.waveform.get(cursor) {
            Some(conductance) => Some(conductance),
            None if cursor == self.waveform.len() => Some(self.params.holding_current),
            None => None,
        };
        let mut command = match sample {
            Some(conductance) => {
                -conductance * (membrane_potential - self.params.reversal_potential)
                    * self.params.gain
            }
            None => {
                self.overruns += 1;
                0.0
            }
        };
        self.clock.advance_cursor();
        let outcome = self.clock.tick(period_s);
        if outcome.complete {
            command = 0.0;
        }
        StepOutput {
            command,
            spike,
            run_complete: outcome.complete,
        }
    }
    pub fn state(&self) -> ClampState {
        ClampState {
            elapsed_s: self.clock.elapsed(self.waveform.period_s()),
            tick_count: self.clock.tick_count(),
            trial_index: self.clock.trial_index(),
            sample_cursor: self.clock.sample_cursor(),
            complete: self.clock.is_complete(),
            overruns: self.overruns,
        }
    }
    pub fn clock(&self) -> &TrialClock {
        &self.clock
    }
    pub fn params(&self) -> &ClampParams {
        &self.params
    }
    pub fn waveform(&self) -> &Arc<Waveform> {
        &self.waveform
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    fn executor(trial: Vec<f64>, period: Duration, params: ClampParams) -> Executor {
        let waveform =
            Waveform::padded(trial, period, params.holding_current, params.wait_s).unwrap();
        Executor::new(Arc::new(waveform), params)
    }
    fn scenario_params() -> ClampParams {
        ClampParams {
            reversal_potential: 0.0,
            gain: 1.0,
            wait_s: 1.0,
            holding_current: 0.0,
            repeat: 2,
        }
    }
    #[test]
    fn command_is_conductance_times_driving_force() {
        let params = ClampParams {
            reversal_potential: -0.070,
            gain: 2.5,
            wait_s: 0.0,
            holding_current: 0.0,
            repeat: 1,
        };
        let mut exec = executor(vec![3.0e-9, 3.0e-9], Duration::from_millis(1), params);
        let vm = -0.055;
        let out = exec.step(vm, false);
        assert_eq!(out.command, -3.0e-9 * (vm - -0.070) * 2.5);
        assert!(!out.run_complete);
    }
    #[test]
    fn replays_recorded_trial_then_stops() {
        let mut exec = executor(vec![0.1, 0.2, 0.3], Duration::from_secs(1), scenario_params());
        assert_eq!(exec.waveform().samples(), &[0.1, 0.2, 0.3, 0.0]);
        assert_eq!(exec.clock().total_trial_period(), 4.0);
        let vm = -1.0;
        let mut commands = Vec::new();
        for tick in 1..=9 {
            let out = exec.step(vm, false);
            commands.push(out.command);
            if tick == 5 {
                assert_eq!(exec.clock().trial_index(), 1);
                assert_eq!(exec.clock().sample_cursor(), 0);
            }
            assert_eq!(out.run_complete, tick == 9, "tick {tick}");
        }
        assert_eq!(&commands[..3], &[0.1, 0.2, 0.3]);
        assert_eq!(commands[8], 0.0);
        for _ in 0..5 {
            let out = exec.step(vm, true);
            assert_eq!(out.command, 0.0);
            assert!(out.run_complete);
            assert!(out.spike.is_none());
        }
    }
    #[test]
    fn boundary_tick_holds_instead_of_overrunning() {
        let params = ClampParams {
            holding_current: 0.5,
            repeat: 3,
            ..scenario_params()
        };
        let mut exec = executor(vec![0.1, 0.2, 0.3], Duration::from_secs(1), params);
        let commands: Vec<f64> = (0..12).map(|_| exec.step(-1.0, false).command).collect();
        // tick 5 reads one past the padding and replays the holding value
        assert_eq!(
            commands,
            vec![0.1, 0.2, 0.3, 0.5, 0.5, 0.1, 0.2, 0.3, 0.5, 0.1, 0.2, 0.3]
        );
        assert_eq!(exec.state().overruns, 0);
    }
    #[test]
    fn cursor_far_past_end_emits_zero() {
        let mut exec = executor(vec![0.1, 0.2, 0.3], Duration::from_secs(1), scenario_params());
        // a shorter buffer for the same trial timing
        let short = Waveform::padded(vec![0.1], Duration::from_secs(1), 0.0, 0.0).unwrap();
        exec.waveform = Arc::new(short);
        let commands: Vec<f64> = (0..4).map(|_| exec.step(-1.0, false).command).collect();
        assert_eq!(commands, vec![0.1, 0.0, 0.0, 0.0]);
        assert_eq!(exec.state().overruns, 2);
    }
    #[test]
    fn empty_waveform_is_silent() {
        let waveform = Waveform::empty(Duration::from_millis(1)).unwrap();
        let mut exec = Executor::new(Arc::new(waveform), ClampParams::default());
        for _ in 0..10 {
            assert_eq!(exec.step(-0.06, false).command, 0.0);
        }
    }
    #[test]
    fn spike_events_are_trial_relative() {
        let mut exec = executor(vec![0.1, 0.2, 0.3], Duration::from_secs(1), scenario_params());
        let first = exec.step(0.0, true).spike.unwrap();
        assert_eq!(first, SpikeEvent { x: 0.0, y: 1.0 });
        for _ in 0..5 {
            exec.step(0.0, false);
        }
        // elapsed 6 s, second trial started at 4 s
        let later = exec.step(0.0, true).spike.unwrap();
        assert_eq!(later, SpikeEvent { x: 2.0, y: 2.0 });
    }
    #[test]
    fn raster_toggle_suppresses_events() {
        let mut exec = executor(vec![0.1, 0.2], Duration::from_secs(1), scenario_params());
        exec.set_raster(false);
        assert!(exec.step(0.0, true).spike.is_none());
    }
    #[test]
    fn replacing_waveform_keeps_progress() {
        let mut exec = executor(vec![0.1; 10], Duration::from_secs(1), scenario_params());
        for _ in 0..3 {
            exec.step(0.0, false);
        }
        let slower = exec
            .waveform()
            .repadded(Duration::from_secs(2), 0.0, 1.0)
            .unwrap();
        exec.replace_waveform(Arc::new(slower));
        assert_eq!(exec.clock().tick_count(), 3);
        assert_eq!(exec.clock().sample_cursor(), 3);
        assert_eq!(exec.clock().total_trial_period(), 21.0);
        assert_eq!(exec.state().elapsed_s, 3.0);
        exec.step(0.0, false);
        assert_eq!(exec.state().elapsed_s, 5.0);
        exec.reset();
        assert_eq!(exec.clock().tick_count(), 0);
        assert_eq!(exec.clock().total_trial_period(), 21.0);
    }
}
