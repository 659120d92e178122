// src/engine.rs
use crate::clamp::{
    ClampControl, ClampError, ClampIo, ClampRuntime, ClampState, HostEvent, ParameterField,
    RuntimeCommand, SpikeEvent,
};
use crate::types::{EngineCommand, EngineMessage};
use std::path::Path;
use std::sync::mpsc::{channel, sync_channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub struct EngineOptions {
    /// Send a progress report every this many ticks (0 disables).
    pub report_every: u64,
    /// Spike events buffered for the raster; extra events are dropped.
    pub spike_queue: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            report_every: 1000,
            spike_queue: 1024,
        }
    }
}

/// Control-thread side of a running clamp.
///
/// Parameter commits and file loads run here; the real-time thread only
/// receives finished buffers and applies them between two ticks.
pub struct EngineHandle {
    control: ClampControl,
    tx_cmd: Sender<EngineCommand>,
    rx: Receiver<EngineMessage>,
    spikes: Receiver<SpikeEvent>,
    thread: Option<JoinHandle<()>>,
}

/// Start the real-time loop on its own thread. The clamp starts paused.
pub fn spawn<I>(control: ClampControl, io: I, options: EngineOptions) -> Result<EngineHandle, ClampError>
where
    I: ClampIo + Send + 'static,
{
    let (tx, rx) = channel();
    let (tx_cmd, rx_cmd) = channel();
    let (tx_spike, spikes) = sync_channel(options.spike_queue);

    let mut runtime = control.runtime();
    // bounded queue: never blocks the tick
    runtime.on_spike_event(move |event| {
        tx_spike.try_send(event).ok();
    });

    let period = control.period();
    let thread = thread::Builder::new()
        .name("dclamp-rt".to_owned())
        .spawn(move || run_loop(runtime, io, period, options, rx_cmd, tx))
        .map_err(ClampError::Spawn)?;

    Ok(EngineHandle {
        control,
        tx_cmd,
        rx,
        spikes,
        thread: Some(thread),
    })
}

fn run_loop<I: ClampIo>(
    mut runtime: ClampRuntime,
    mut io: I,
    mut period: Duration,
    options: EngineOptions,
    rx_cmd: Receiver<EngineCommand>,
    tx: Sender<EngineMessage>,
) {
    tx.send(EngineMessage::Log(format!("real-time loop started, period {period:?}"))).ok();
    let mut next_tick = Instant::now();

    loop {
        // 1. commands from the control thread, only between ticks
        loop {
            match rx_cmd.try_recv() {
                Ok(EngineCommand::Runtime(command)) => {
                    if let RuntimeCommand::Replace { period: new_period, .. } = &command {
                        period = *new_period;
                        tx.send(EngineMessage::Log(format!("period now {period:?}"))).ok();
                    }
                    let was_paused = runtime.is_paused();
                    runtime.apply(command);
                    if runtime.is_paused() != was_paused {
                        if runtime.is_paused() {
                            io.write_command(0.0);
                        }
                        tx.send(EngineMessage::Status { paused: runtime.is_paused() }).ok();
                    }
                }
                Ok(EngineCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                    io.write_command(0.0);
                    tx.send(EngineMessage::Stopped).ok();
                    return;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        // 2. one tick
        if !runtime.is_paused() {
            let command = runtime.execute(io.read_inputs());
            io.write_command(command);

            let state = runtime.state();
            if runtime.is_paused() {
                tx.send(EngineMessage::Status { paused: true }).ok();
                tx.send(EngineMessage::RunComplete(state)).ok();
            } else if options.report_every > 0 && state.tick_count % options.report_every == 0 {
                tx.send(EngineMessage::State(state)).ok();
            }
        }

        // 3. hold the period; after an overrun start counting from now
        next_tick += period;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else {
            next_tick = now;
        }
    }
}

impl EngineHandle {
    /// Dispatch a host event; anything the real-time side needs is queued.
    pub fn update(&mut self, event: HostEvent) -> Result<(), ClampError> {
        if let Some(command) = self.control.update(event)? {
            self.send(command)?;
        }
        Ok(())
    }

    pub fn browse(&mut self, path: &Path) -> Result<(), ClampError> {
        let command = self.control.browse(path)?;
        self.send(command)
    }

    pub fn set_raster(&mut self, enabled: bool) -> Result<(), ClampError> {
        let command = self.control.set_raster(enabled);
        self.send(command)
    }

    pub fn set_parameter(&mut self, field: ParameterField, value: impl Into<String>) {
        self.control.set_parameter(field, value);
    }

    pub fn control(&self) -> &ClampControl {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut ClampControl {
        &mut self.control
    }

    /// Messages received so far, without waiting.
    pub fn messages(&self) -> impl Iterator<Item = EngineMessage> + '_ {
        self.rx.try_iter()
    }

    /// Spike events received so far, without waiting.
    pub fn spikes(&self) -> impl Iterator<Item = SpikeEvent> + '_ {
        self.spikes.try_iter()
    }

    /// Block until the protocol finishes or `timeout` passes. Log lines
    /// received meanwhile are forwarded to the logger.
    pub fn wait_for_completion(&self, timeout: Duration) -> Result<Option<ClampState>, ClampError> {
        // no deadline when the timeout runs past what Instant can hold
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let message = match deadline {
                Some(deadline) => self
                    .rx
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match message {
                Ok(EngineMessage::RunComplete(state)) => return Ok(Some(state)),
                Ok(EngineMessage::Log(line)) => log::info!("{line}"),
                Ok(EngineMessage::State(state)) => log::debug!(
                    "trial {} tick {} ({:.3} s)",
                    state.trial_index,
                    state.tick_count,
                    state.elapsed_s
                ),
                Ok(EngineMessage::Status { paused }) => log::debug!("paused: {paused}"),
                Ok(EngineMessage::Stopped) | Err(RecvTimeoutError::Disconnected) => {
                    return Err(ClampError::EngineStopped)
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
            }
        }
    }

    pub fn shutdown(mut self) -> Result<(), ClampError> {
        self.stop()
    }

    fn send(&self, command: RuntimeCommand) -> Result<(), ClampError> {
        self.tx_cmd
            .send(EngineCommand::Runtime(command))
            .map_err(|_| ClampError::EngineStopped)
    }

    fn stop(&mut self) -> Result<(), ClampError> {
        if let Some(thread) = self.thread.take() {
            self.tx_cmd.send(EngineCommand::Shutdown).ok();
            thread.join().map_err(|_| ClampError::EngineStopped)?;
        }
        Ok(())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("real-time thread did not stop cleanly: {err}");
        }
    }
}
