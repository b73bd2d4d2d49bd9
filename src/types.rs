// src/types.rs

/// One raw strap reading. `tick` counts fixed sampling intervals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub tick: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(tick: i64, value: f64) -> Self {
        Self { tick, value }
    }
}

// Direction of the mean series between the last two ticks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

/// Instantaneous rates produced when a cycle completes (breaths per minute).
///
/// In zero-crossing mode there is only one rate, so all three fields carry it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateEstimate {
    pub peak_rate: f64,
    pub valley_rate: f64,
    pub average_rate: f64,
}

impl RateEstimate {
    pub fn single(rate: f64) -> Self {
        Self {
            peak_rate: rate,
            valley_rate: rate,
            average_rate: rate,
        }
    }
}

/// A completed breath (or half breath) cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleUpdate {
    /// Tick the extremum was attributed to (one tick behind detection).
    pub tick: i64,
    pub estimate: RateEstimate,
    pub published_rate: f64,
}

/// Everything the engine derived from one post-warm-up sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessedTick {
    pub tick: i64,
    pub mean: f64,
    // only filled in zero-crossing mode
    pub std_dev: Option<f64>,
    pub cycle: Option<CycleUpdate>,
    pub published_rate: f64,
}
