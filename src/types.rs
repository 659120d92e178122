// src/types.rs
use crate::clamp::{ClampState, RuntimeCommand};

// Control thread -> real-time loop
#[derive(Clone, Debug)]
pub enum EngineCommand {
    Runtime(RuntimeCommand),
    Shutdown,
}

// Real-time loop -> control thread
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Status { paused: bool }, // pause state changed
    State(ClampState),       // periodic progress report
    RunComplete(ClampState), // last trial played, loop paused itself
    Stopped,
}
