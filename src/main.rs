// src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, SessionArgs};
use dclamp::cell::ModelCell;
use dclamp::clamp::{
    ClampControl, DynamicClamp, HostEvent, SpikeEvent, VariableKind, NO_FILE_LOADED, VARIABLES,
};
use dclamp::config::SessionConfig;
use dclamp::engine::{self, EngineOptions};
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(&args)?,
        Commands::Preview(args) => preview(&args)?,
        Commands::Variables => variables(),
    }

    Ok(())
}

fn session(args: &SessionArgs) -> Result<SessionConfig> {
    let mut session = match &args.config {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(file) = &args.file {
        session.clamp.file = file.to_string_lossy().into_owned();
    }
    if let Some(period_us) = args.period_us {
        session.period_us = period_us;
    }
    if let Some(mv) = args.reversal_mv {
        session.clamp.reversal_potential_mv = mv;
    }
    if let Some(gain) = args.gain {
        session.clamp.gain = gain;
    }
    if let Some(wait) = args.wait {
        session.clamp.wait_s = wait;
    }
    if let Some(holding) = args.holding {
        session.clamp.holding_current = holding;
    }
    if let Some(repeat) = args.repeat {
        session.clamp.repeat = repeat;
    }
    if args.no_raster {
        session.raster = false;
    }
    if args.seed.is_some() {
        session.seed = args.seed;
    }
    session.validate()?;
    if session.clamp.file == NO_FILE_LOADED {
        bail!("no waveform file given (use --file or a session file)");
    }
    Ok(session)
}

fn run(args: &SessionArgs) -> Result<()> {
    let session = session(args)?;
    let period = session.period();

    let mut control = ClampControl::new(period)?;
    control.on_range_changed(|range| {
        log::info!(
            "raster axes: x 0..{:.3} s, y 0..{}",
            range.x_max,
            range.y_max
        )
    });
    control.set_config(&session.clamp);

    let cell = ModelCell::new(period, session.seed);
    let options = EngineOptions {
        report_every: session.report_every,
        ..EngineOptions::default()
    };
    let mut engine = engine::spawn(control, cell, options)?;
    engine.set_raster(session.raster)?;
    engine
        .update(HostEvent::Modify)
        .with_context(|| format!("could not load {}", session.clamp.file))?;

    let trial_length = engine.control().trial_length();
    println!(
        "Loaded {}: trial {:.3} s, wait {:.3} s, {} trial(s) at {:?}",
        session.clamp.file, trial_length, session.clamp.wait_s, session.clamp.repeat, period
    );

    engine.update(HostEvent::Unpause)?;
    let budget = session
        .expected_duration(trial_length)
        .saturating_mul(2)
        .saturating_add(Duration::from_secs(1));
    let finished = engine.wait_for_completion(budget)?;

    let spikes: Vec<SpikeEvent> = engine.spikes().collect();
    for spike in &spikes {
        println!("spike trial {:>3}  t = {:.4} s", spike.y, spike.x);
    }
    match finished {
        Some(state) => {
            println!(
                "Protocol complete: {} trial(s), {} ticks, {} spike(s)",
                state.trial_index,
                state.tick_count,
                spikes.len()
            );
            if state.overruns > 0 {
                log::warn!("{} tick(s) ran past the end of the waveform", state.overruns);
            }
        }
        None => log::warn!("protocol still running after {:?}, stopping", budget),
    }

    engine.shutdown()?;
    Ok(())
}

fn preview(args: &SessionArgs) -> Result<()> {
    let session = session(args)?;
    let mut clamp = DynamicClamp::new(session.period())?;
    clamp.set_config(&session.clamp);
    clamp
        .update(HostEvent::Modify)
        .with_context(|| format!("could not load {}", session.clamp.file))?;

    for (time, value) in clamp.control().controller().waveform().preview() {
        println!("{time:.6}\t{value:e}");
    }
    Ok(())
}

fn variables() {
    for var in VARIABLES {
        let kind = match var.kind {
            VariableKind::Input => "input",
            VariableKind::Output => "output",
            VariableKind::Parameter => "parameter",
            VariableKind::State => "state",
        };
        println!("{:<10} {:<26} {}", kind, var.name, var.description);
    }
}
