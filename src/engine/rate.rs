use log::debug;

use crate::config::EngineConfig;
use crate::engine::detector::ExtremaPair;
use crate::types::RateEstimate;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Outlier handling applied to every freshly computed rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateLimits {
    pub clamp_enabled: bool,
    pub max_delta_per_step: f64,
    pub absolute_min: f64,
    pub absolute_max: f64,
}

impl RateLimits {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            clamp_enabled: config.clamp_enabled,
            max_delta_per_step: config.max_delta_per_step,
            absolute_min: config.absolute_min,
            absolute_max: config.absolute_max,
        }
    }

    /// Delta clamp (when enabled) followed by the bounds check against `previous`.
    pub fn apply(&self, rate: f64, previous: f64) -> f64 {
        let rate = if self.clamp_enabled {
            clamp_delta(rate, previous, self.max_delta_per_step)
        } else {
            rate
        };
        clamp_bounds(rate, previous, self.absolute_min, self.absolute_max)
    }
}

/// Move at most `max_delta` away from `previous`, toward `rate`.
pub fn clamp_delta(rate: f64, previous: f64, max_delta: f64) -> f64 {
    if (rate - previous).abs() <= max_delta {
        return rate;
    }
    if rate > previous {
        previous + max_delta
    } else {
        previous - max_delta
    }
}

/// Out-of-range rates fall back to `previous`.
pub fn clamp_bounds(rate: f64, previous: f64, min: f64, max: f64) -> f64 {
    if rate < min || rate > max {
        previous
    } else {
        rate
    }
}

/// Breaths per minute for `span` ticks covering `cycles_per_span` of a breath.
fn rate_from_span(span: i64, tick_seconds: f64, cycles_per_span: f64) -> f64 {
    SECONDS_PER_MINUTE * cycles_per_span / (tick_seconds * span as f64)
}

// One kind of rate: the latest computed value and the last accepted one.
#[derive(Clone, Copy, Debug)]
struct RateTrack {
    latest: Option<f64>,
    previous: f64,
}

impl RateTrack {
    fn new(baseline: f64) -> Self {
        Self {
            latest: None,
            previous: baseline,
        }
    }

    fn settle(&mut self, limits: &RateLimits, label: &str) -> Option<f64> {
        let raw = self.latest?;
        let clamped = limits.apply(raw, self.previous);
        if clamped != raw {
            debug!("{label} rate {raw:.2} clamped to {clamped:.2}");
        }
        self.previous = clamped;
        self.latest = Some(clamped);
        Some(clamped)
    }
}

/// Rates for the peak/valley strategy.
///
/// Both kinds are recomputed from their records on every extremum; a cycle is
/// only produced once both kinds have two records.
#[derive(Clone, Debug)]
pub struct PeakValleyRates {
    limits: RateLimits,
    tick_seconds: f64,
    peak: RateTrack,
    valley: RateTrack,
}

impl PeakValleyRates {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            limits: RateLimits::from_config(config),
            tick_seconds: config.tick_seconds(),
            peak: RateTrack::new(config.baseline_rate),
            valley: RateTrack::new(config.baseline_rate),
        }
    }

    pub fn on_extremum(&mut self, peaks: &ExtremaPair, valleys: &ExtremaPair) -> Option<RateEstimate> {
        if let Some(span) = peaks.span() {
            self.peak.latest = Some(rate_from_span(span, self.tick_seconds, 1.0));
        }
        if let Some(span) = valleys.span() {
            self.valley.latest = Some(rate_from_span(span, self.tick_seconds, 1.0));
        }
        if self.peak.latest.is_none() || self.valley.latest.is_none() {
            return None;
        }
        let peak_rate = self.peak.settle(&self.limits, "peak")?;
        let valley_rate = self.valley.settle(&self.limits, "valley")?;
        Some(RateEstimate {
            peak_rate,
            valley_rate,
            average_rate: (peak_rate + valley_rate) / 2.0,
        })
    }

    pub fn previous_peak_rate(&self) -> f64 {
        self.peak.previous
    }

    pub fn previous_valley_rate(&self) -> f64 {
        self.valley.previous
    }
}

/// Rate for the zero-crossing strategy; a crossing pair spans half a breath.
#[derive(Clone, Debug)]
pub struct CrossingRate {
    limits: RateLimits,
    tick_seconds: f64,
    track: RateTrack,
}

impl CrossingRate {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            limits: RateLimits::from_config(config),
            tick_seconds: config.tick_seconds(),
            track: RateTrack::new(config.baseline_rate),
        }
    }

    pub fn on_crossing(&mut self, crossings: &ExtremaPair) -> Option<RateEstimate> {
        let span = crossings.span()?;
        self.track.latest = Some(rate_from_span(span, self.tick_seconds, 0.5));
        self.track
            .settle(&self.limits, "crossing")
            .map(RateEstimate::single)
    }

    pub fn previous_rate(&self) -> f64 {
        self.track.previous
    }
}
