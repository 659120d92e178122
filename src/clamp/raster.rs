/// A spike seen during a trial, in raster coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpikeEvent {
    /// Seconds since the start of the trial.
    pub x: f64,
    /// Trial number, starting at 1.
    pub y: f64,
}
/// Axis limits for the raster plot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterRange {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}
impl RasterRange {
    /// Rows for at least ten trials, more when the protocol repeats further.
    pub fn for_protocol(trial_length: f64, repeat: u32) -> Self {
        let y_max = if repeat > 10 {
            f64::from(repeat) + 1.0
        } else {
            11.0
        };
        Self {
            x_min: 0.0,
            x_max: trial_length,
            y_min: 0.0,
            y_max,
        }
    }
}
/// Callbacks registered by whoever draws the raster.
pub struct Observers<T> {
    handlers: Vec<Box<dyn FnMut(T) + Send>>,
}
impl<T: Copy> Observers<T> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
    pub fn subscribe(&mut self, handler: impl FnMut(T) + Send + 'static) {
        self.handlers.push(Box::new(handler));
    }
    pub fn notify(&mut self, value: T) {
        for handler in &mut self.handlers {
            handler(value);
        }
    }
    pub fn len(&self) -> usize {
        self.handlers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
impl<T: Copy> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}
