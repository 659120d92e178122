/// Result of advancing the clock by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    /// A trial boundary was crossed on this tick.
    pub boundary: bool,
    /// All requested trials have been played.
    pub complete: bool,
}
/// Trial bookkeeping for the replay: ticks, trial index and the cursor into
/// the padded waveform.
///
/// Elapsed time is `tick_count * period` counted from an origin that only
/// moves when the protocol is re-timed for a new period.
#[derive(Clone, Debug, Default)]
pub struct TrialClock {
    tick_count: u64,
    sample_cursor: usize,
    trial_index: u32,
    total_trial_period: f64,
    repeat: u32,
    origin: Origin,
}
// Where the current timing took over: tick and time of the switch, and the
// trial it applies from together with that trial's start time.
#[derive(Clone, Copy, Debug, Default)]
struct Origin {
    tick: u64,
    time: f64,
    trial: u32,
    trial_start: f64,
}
impl TrialClock {
    pub fn new(trial_length: f64, wait_s: f64, repeat: u32) -> Self {
        let mut clock = Self::default();
        clock.reset(trial_length, wait_s, repeat);
        clock
    }
    /// Rewind to the first sample of the first trial.
    pub fn reset(&mut self, trial_length: f64, wait_s: f64, repeat: u32) {
        self.tick_count = 0;
        self.sample_cursor = 0;
        self.trial_index = 0;
        self.total_trial_period = trial_length + wait_s;
        self.repeat = repeat;
        self.origin = Origin::default();
    }
    /// Switch to a new trial length (the period changed) without losing
    /// progress. `period_s` is the period the ticks so far were counted at.
    /// The current trial is measured with the new length from its own start.
    pub fn retime(&mut self, period_s: f64, trial_length: f64, wait_s: f64) {
        self.origin = Origin {
            tick: self.tick_count,
            time: self.elapsed(period_s),
            trial: self.trial_index,
            trial_start: self.trial_start(),
        };
        self.total_trial_period = trial_length + wait_s;
    }
    /// Count one tick of `period_s` seconds and roll over to the next trial
    /// once the elapsed time passes the end of the current one.
    pub fn tick(&mut self, period_s: f64) -> TickOutcome {
        self.tick_count += 1;
        let trial_end = self.origin.trial_start
            + self.total_trial_period * f64::from(self.trial_index - self.origin.trial + 1);
        let boundary = self.elapsed(period_s) > trial_end;
        if boundary {
            self.trial_index += 1;
            self.sample_cursor = 0;
        }
        TickOutcome {
            boundary,
            complete: self.is_complete(),
        }
    }
    #[inline]
    pub fn advance_cursor(&mut self) {
        self.sample_cursor += 1;
    }
    pub fn is_complete(&self) -> bool {
        self.trial_index >= self.repeat
    }
    pub fn elapsed(&self, period_s: f64) -> f64 {
        self.origin.time + (self.tick_count - self.origin.tick) as f64 * period_s
    }
    /// Time since the start of the current trial.
    pub fn trial_time(&self, period_s: f64) -> f64 {
        self.elapsed(period_s) - self.trial_start()
    }
    fn trial_start(&self) -> f64 {
        self.origin.trial_start
            + self.total_trial_period * f64::from(self.trial_index - self.origin.trial)
    }
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
    pub fn sample_cursor(&self) -> usize {
        self.sample_cursor
    }
    pub fn trial_index(&self) -> u32 {
        self.trial_index
    }
    pub fn total_trial_period(&self) -> f64 {
        self.total_trial_period
    }
    pub fn repeat(&self) -> u32 {
        self.repeat
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn reset_clears_progress() {
        let mut clock = TrialClock::new(3.0, 1.0, 2);
        for _ in 0..6 {
            clock.advance_cursor();
            clock.tick(1.0);
        }
        assert_eq!(clock.trial_index(), 1);
        clock.reset(2.0, 0.5, 4);
        assert_eq!(clock.tick_count(), 0);
        assert_eq!(clock.sample_cursor(), 0);
        assert_eq!(clock.trial_index(), 0);
        assert_eq!(clock.total_trial_period(), 2.5);
        assert_eq!(clock.repeat(), 4);
    }
    #[test]
    fn boundary_is_strictly_after_trial_end() {
        let mut clock = TrialClock::new(3.0, 1.0, 2);
        for tick in 1..=4 {
            clock.advance_cursor();
            let outcome = clock.tick(1.0);
            assert!(!outcome.boundary, "tick {tick}");
        }
        clock.advance_cursor();
        let outcome = clock.tick(1.0);
        assert!(outcome.boundary);
        assert!(!outcome.complete);
        assert_eq!(clock.trial_index(), 1);
        assert_eq!(clock.sample_cursor(), 0);
    }
    #[test]
    fn one_increment_per_period_crossed() {
        let period = 0.25;
        let mut clock = TrialClock::new(1.5, 0.5, 100);
        let mut crossings = 0;
        for _ in 0..81 {
            clock.advance_cursor();
            if clock.tick(period).boundary {
                crossings += 1;
                assert_eq!(clock.sample_cursor(), 0);
            }
        }
        // 81 ticks = 20.25 s over a 2 s trial period
        assert_eq!(crossings, 10);
        assert_eq!(clock.trial_index(), 10);
    }
    #[test]
    fn retime_keeps_progress_and_stretches_trials() {
        let mut clock = TrialClock::new(3.0, 1.0, 3);
        for _ in 0..5 {
            clock.advance_cursor();
            clock.tick(1.0);
        }
        // trial 1 started at 4 s, now 5 s in
        assert_eq!(clock.trial_index(), 1);
        clock.retime(1.0, 6.0, 2.0);
        assert_eq!(clock.tick_count(), 5);
        assert_eq!(clock.elapsed(2.0), 5.0);
        assert_eq!(clock.trial_time(2.0), 1.0);
        // trial 1 now ends at 4 + 8 = 12 s, ticks are 2 s long
        let mut boundaries = Vec::new();
        for _ in 0..8 {
            clock.advance_cursor();
            if clock.tick(2.0).boundary {
                boundaries.push(clock.elapsed(2.0));
            }
        }
        assert_eq!(boundaries, vec![13.0, 21.0]);
        assert!(clock.is_complete());
    }
    #[test]
    fn zero_repeat_is_complete_immediately() {
        let clock = TrialClock::new(1.0, 1.0, 0);
        assert!(clock.is_complete());
    }
    #[test]
    fn trial_time_is_relative() {
        let mut clock = TrialClock::new(3.0, 1.0, 3);
        for _ in 0..6 {
            clock.tick(1.0);
        }
        assert_eq!(clock.trial_index(), 1);
        assert_eq!(clock.trial_time(1.0), 2.0);
    }
}
