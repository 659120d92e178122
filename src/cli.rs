use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dclamp",
    version,
    about = "Replay a recorded conductance waveform as a dynamic clamp",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the protocol against a model cell
    Run(SessionArgs),
    /// Print the padded waveform as `time value` rows
    Preview(SessionArgs),
    /// List the channels, parameters and states exposed to the host
    Variables,
}

/// Flags override values from `--config`.
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// JSON session file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Conductance waveform, one sample in siemens per tick
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Real-time period in microseconds
    #[arg(long)]
    pub period_us: Option<u64>,
    /// Reversal potential in millivolts
    #[arg(long, allow_hyphen_values = true)]
    pub reversal_mv: Option<f64>,
    #[arg(long)]
    pub gain: Option<f64>,
    /// Wait between trials in seconds
    #[arg(long)]
    pub wait: Option<f64>,
    /// Holding value replayed during the wait
    #[arg(long, allow_hyphen_values = true)]
    pub holding: Option<f64>,
    /// Number of trials
    #[arg(long)]
    pub repeat: Option<u32>,
    /// Do not report spike times
    #[arg(long)]
    pub no_raster: bool,
    /// Seed for the model cell noise
    #[arg(long)]
    pub seed: Option<u64>,
}
