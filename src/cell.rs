// src/cell.rs
use crate::clamp::{ChannelInputs, ClampIo};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

/// Leaky integrate-and-fire membrane standing in for a patched neuron.
///
/// The command written by the clamp is injected on the next tick, and the
/// cell reports its potential plus a spike flag the way a spike detector
/// would.
pub struct ModelCell {
    v: f64,
    rest: f64,
    threshold: f64,
    reset: f64,
    tau_s: f64,
    resistance: f64,
    noise: f64,
    period_s: f64,
    injected: f64,
    rng: StdRng,
}

impl ModelCell {
    pub fn new(period: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            v: -0.065,
            rest: -0.065,
            threshold: -0.050,
            reset: -0.070,
            tau_s: 0.020,
            resistance: 1.0e8,
            noise: 0.0005,
            period_s: period.as_secs_f64(),
            injected: 0.0,
            rng,
        }
    }

    pub fn with_noise(mut self, volts: f64) -> Self {
        self.noise = volts.max(0.0);
        self
    }

    pub fn potential(&self) -> f64 {
        self.v
    }
}

impl ClampIo for ModelCell {
    fn read_inputs(&mut self) -> ChannelInputs {
        let drive = -(self.v - self.rest) + self.resistance * self.injected;
        self.v += drive * self.period_s / self.tau_s;
        if self.noise > 0.0 {
            self.v += self.rng.gen_range(-self.noise..self.noise);
        }
        if self.v >= self.threshold {
            self.v = self.reset;
            return ChannelInputs::new(self.threshold, 1.0);
        }
        ChannelInputs::new(self.v, 0.0)
    }

    fn write_command(&mut self, command: f64) {
        self.injected = command;
    }
}
