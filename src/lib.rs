//! Dynamic clamp that replays a recorded conductance waveform.
//!
//! A waveform file holds one conductance sample (siemens) per real-time tick.
//! Every tick the clamp reads the membrane potential, looks up the next
//! sample and writes the command current
//! `-g * (Vm - Erev) * gain`. Trials are separated by a wait interval during
//! which the holding value is replayed; after the requested number of trials
//! the clamp outputs zero and pauses itself.
//!
//! [`clamp::DynamicClamp`] bundles everything for single-threaded hosts.
//! [`engine::spawn`] runs the real-time half on its own thread and keeps file
//! loading on the caller's thread.
//!
//! ```no_run
//! use std::time::Duration;
//! use dclamp::clamp::{ChannelInputs, DynamicClamp, HostEvent, ParameterField};
//!
//! let mut clamp = DynamicClamp::new(Duration::from_micros(100))?;
//! clamp.set_parameter(ParameterField::FileName, "trace.txt");
//! clamp.set_parameter(ParameterField::Repeat, "5");
//! clamp.update(HostEvent::Modify)?;
//! clamp.update(HostEvent::Unpause)?;
//! let command = clamp.execute(ChannelInputs::new(-0.065, 0.0));
//! # let _ = command;
//! # Ok::<(), dclamp::clamp::ClampError>(())
//! ```

pub mod cell;
pub mod clamp;
pub mod config;
pub mod engine;
pub mod types;
