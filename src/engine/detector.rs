use log::debug;

use crate::types::Direction;

/// Mean-series floor below which extremum detection stays idle.
///
/// Skips the near-zero start of the mean series. Tuned for this strap's
/// signal level; changing it changes every estimate downstream.
pub const MEAN_FLOOR: f64 = 1.0;

/// Ticks of the previous and current extremum of one kind (0 = not recorded).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtremaPair {
    pub previous: i64,
    pub current: i64,
}

impl ExtremaPair {
    pub fn record(&mut self, tick: i64) {
        self.previous = self.current;
        self.current = tick;
    }

    /// Tick distance between the two records, once both exist.
    pub fn span(&self) -> Option<i64> {
        (self.previous != 0).then(|| self.current - self.previous)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extremum {
    Peak(i64),
    Valley(i64),
}

/// Direction-reversal detector over the mean series.
#[derive(Clone, Debug)]
pub struct PeakValleyDetector {
    direction: Direction,
    skip_first: bool,
    peaks: ExtremaPair,
    valleys: ExtremaPair,
}

impl Default for PeakValleyDetector {
    fn default() -> Self {
        Self {
            direction: Direction::Falling,
            skip_first: true,
            peaks: ExtremaPair::default(),
            valleys: ExtremaPair::default(),
        }
    }
}

impl PeakValleyDetector {
    /// Compare `mean[-1]` with `mean[-2]` at `tick`.
    ///
    /// A reversal is attributed to `tick - 1`, the sample before the one that
    /// revealed it. The first reversal after start-up is swallowed.
    pub fn observe(&mut self, tick: i64, latest_mean: f64, previous_mean: f64) -> Option<Extremum> {
        if previous_mean <= MEAN_FLOOR {
            return None;
        }
        let rising = latest_mean > previous_mean;
        match (rising, self.direction) {
            (true, Direction::Rising) | (false, Direction::Falling) => None,
            (true, Direction::Falling) => {
                self.direction = Direction::Rising;
                if self.consume_skip() {
                    return None;
                }
                self.valleys.record(tick - 1);
                debug!("valley at tick {}", tick - 1);
                Some(Extremum::Valley(tick - 1))
            }
            (false, Direction::Rising) => {
                self.direction = Direction::Falling;
                if self.consume_skip() {
                    return None;
                }
                self.peaks.record(tick - 1);
                debug!("peak at tick {}", tick - 1);
                Some(Extremum::Peak(tick - 1))
            }
        }
    }

    fn consume_skip(&mut self) -> bool {
        std::mem::replace(&mut self.skip_first, false)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn skip_pending(&self) -> bool {
        self.skip_first
    }

    pub fn peaks(&self) -> &ExtremaPair {
        &self.peaks
    }

    pub fn valleys(&self) -> &ExtremaPair {
        &self.valleys
    }
}

/// Z-score detector: fires when a raw sample strays far from the mean series.
#[derive(Clone, Debug, Default)]
pub struct ZeroCrossingDetector {
    crossings: ExtremaPair,
    detected: bool,
}

impl ZeroCrossingDetector {
    /// Returns the tick of a new crossing. A crossing stays latched until a
    /// sample falls back within `threshold * std[-2]` of `mean[-2]`.
    pub fn observe(
        &mut self,
        tick: i64,
        raw: f64,
        previous_mean: f64,
        previous_std_dev: f64,
        threshold: f64,
    ) -> Option<i64> {
        if previous_mean <= MEAN_FLOOR {
            return None;
        }
        if (raw - previous_mean).abs() > threshold * previous_std_dev {
            if self.detected {
                return None;
            }
            self.detected = true;
            self.crossings.record(tick);
            debug!("crossing at tick {tick}");
            Some(tick)
        } else {
            self.detected = false;
            None
        }
    }

    pub fn crossings(&self) -> &ExtremaPair {
        &self.crossings
    }

    pub fn is_latched(&self) -> bool {
        self.detected
    }
}
