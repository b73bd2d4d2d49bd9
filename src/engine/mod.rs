// src/engine/mod.rs
pub mod detector;
pub mod rate;
pub mod smoother;
pub mod window;

pub use detector::{Extremum, ExtremaPair, PeakValleyDetector, ZeroCrossingDetector, MEAN_FLOOR};
pub use rate::{clamp_bounds, clamp_delta, CrossingRate, PeakValleyRates, RateLimits};
pub use smoother::RateSmoother;
pub use window::SmoothingWindow;

use log::{debug, trace};

use crate::config::{DetectionMode, EngineConfig};
use crate::drivers::RespirationError;
use crate::types::{CycleUpdate, ProcessedTick, RateEstimate, Sample};

/// Detection strategy together with the state it owns.
#[derive(Clone, Debug)]
pub enum Strategy {
    PeakValley {
        detector: PeakValleyDetector,
        rates: PeakValleyRates,
    },
    ZeroCrossing {
        detector: ZeroCrossingDetector,
        rates: CrossingRate,
        threshold: f64,
    },
}

impl Strategy {
    fn for_config(config: &EngineConfig) -> Self {
        match config.mode {
            DetectionMode::PeakValley => Strategy::PeakValley {
                detector: PeakValleyDetector::default(),
                rates: PeakValleyRates::new(config),
            },
            DetectionMode::ZeroCrossing => Strategy::ZeroCrossing {
                detector: ZeroCrossingDetector::default(),
                rates: CrossingRate::new(config),
                threshold: config.z_threshold,
            },
        }
    }

    fn step(&mut self, tick: i64, raw: f64, window: &SmoothingWindow) -> Option<RateEstimate> {
        match self {
            Strategy::PeakValley { detector, rates } => {
                detector.observe(tick, window.latest_mean(), window.previous_mean())?;
                rates.on_extremum(detector.peaks(), detector.valleys())
            }
            Strategy::ZeroCrossing {
                detector,
                rates,
                threshold,
            } => {
                let std_dev = window.previous_std_dev().unwrap_or(0.0);
                detector.observe(tick, raw, window.previous_mean(), std_dev, *threshold)?;
                rates.on_crossing(detector.crossings())
            }
        }
    }

    pub fn mode(&self) -> DetectionMode {
        match self {
            Strategy::PeakValley { .. } => DetectionMode::PeakValley,
            Strategy::ZeroCrossing { .. } => DetectionMode::ZeroCrossing,
        }
    }
}

/// Streaming breaths-per-minute estimator for one strap.
///
/// Feed one sample per tick in tick order. Nothing is produced until the
/// smoothing window is full; afterwards every sample yields a [`ProcessedTick`]
/// and a [`CycleUpdate`] whenever a breath (or half breath) completes.
pub struct RespirationEngine {
    config: EngineConfig,
    window: SmoothingWindow,
    strategy: Strategy,
    smoother: RateSmoother,
    cycles: u64,
}

impl RespirationEngine {
    pub fn new(config: EngineConfig) -> Result<Self, RespirationError> {
        config.validate()?;
        let window = SmoothingWindow::new(
            config.window_size,
            config.influence,
            config.mode == DetectionMode::ZeroCrossing,
        );
        let strategy = Strategy::for_config(&config);
        let smoother = RateSmoother::new(config.smoothing_size, config.baseline_rate);
        Ok(Self {
            config,
            window,
            strategy,
            smoother,
            cycles: 0,
        })
    }

    pub fn submit(&mut self, tick: i64, value: f64) -> Option<ProcessedTick> {
        if !self.window.is_warm() {
            self.window.fill(value);
            trace!("warm-up tick {tick}: {}/{}", self.window.raw().len(), self.window.capacity());
            return None;
        }
        let mean = self.window.advance(value);
        trace!("tick {tick}: mean {mean:.3}");
        let cycle = self.strategy.step(tick, value, &self.window).map(|estimate| {
            let published_rate = self.smoother.push(estimate.average_rate);
            self.cycles += 1;
            debug!(
                "cycle {} at tick {}: {:.2} bpm (published {:.2})",
                self.cycles,
                tick - 1,
                estimate.average_rate,
                published_rate
            );
            CycleUpdate {
                tick: tick - 1,
                estimate,
                published_rate,
            }
        });
        Some(ProcessedTick {
            tick,
            mean,
            std_dev: self.window.latest_std_dev(),
            cycle,
            published_rate: self.smoother.published(),
        })
    }

    pub fn submit_sample(&mut self, sample: Sample) -> Option<ProcessedTick> {
        self.submit(sample.tick, sample.value)
    }

    /// Drop every window, record and rate, back to the freshly built state.
    pub fn reset(&mut self) {
        self.window.reset();
        self.strategy = Strategy::for_config(&self.config);
        self.smoother.reset();
        self.cycles = 0;
        debug!("engine reset");
    }

    pub fn published_rate(&self) -> f64 {
        self.smoother.published()
    }

    pub fn is_warm(&self) -> bool {
        self.window.is_warm()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn smoother(&self) -> &RateSmoother {
        &self.smoother
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::source::{SampleSource, SimulatedSource};

    fn square_config(mode: DetectionMode, clamp_enabled: bool) -> EngineConfig {
        EngineConfig {
            window_size: 4,
            influence: 1.0,
            sampling_rate_hz: 1.0,
            z_threshold: 1.0,
            clamp_enabled,
            mode,
            ..EngineConfig::default()
        }
    }

    /// Square wave with a half period of four ticks, ticks starting at 1.
    fn square_wave(low: f64, high: f64, len: usize) -> Vec<(i64, f64)> {
        (0..len)
            .map(|i| {
                let value = if (i / 4) % 2 == 0 { low } else { high };
                (i as i64 + 1, value)
            })
            .collect()
    }

    fn run(engine: &mut RespirationEngine, samples: &[(i64, f64)]) -> Vec<ProcessedTick> {
        samples
            .iter()
            .filter_map(|&(tick, value)| engine.submit(tick, value))
            .collect()
    }

    fn peaks_and_valleys(engine: &RespirationEngine) -> (ExtremaPair, ExtremaPair) {
        match engine.strategy() {
            Strategy::PeakValley { detector, .. } => (*detector.peaks(), *detector.valleys()),
            Strategy::ZeroCrossing { .. } => panic!("expected peak/valley strategy"),
        }
    }

    #[test]
    fn nothing_before_window_is_full() {
        let mut engine = RespirationEngine::new(EngineConfig::default()).unwrap();
        for tick in 1..20 {
            assert!(engine.submit(tick, 100.0 + tick as f64).is_none());
            assert_eq!(engine.published_rate(), 14.0);
        }
        assert!(engine.submit(20, 120.0).is_none());
        assert!(engine.is_warm());
        assert!(engine.submit(21, 121.0).is_some());
    }

    #[test]
    fn windows_keep_their_length() {
        let mut engine = RespirationEngine::new(EngineConfig::default()).unwrap();
        let mut source = SimulatedSource::new(15.0, 10.0, 30.0, 7);
        while let Ok(Some(sample)) = source.next_sample() {
            engine.submit_sample(sample);
            if engine.is_warm() {
                assert_eq!(engine.window().raw().len(), 20);
                assert_eq!(engine.window().means().len(), 20);
            }
        }
    }

    #[test]
    fn square_wave_scenario_records_lagged_peak() {
        let mut engine =
            RespirationEngine::new(square_config(DetectionMode::PeakValley, true)).unwrap();
        let samples = [1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0, 1.0, 1.0, 1.0, 1.0];
        let ticks: Vec<(i64, f64)> = samples
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as i64 + 1, v))
            .collect();
        let processed = run(&mut engine, &ticks);
        assert_eq!(processed.len(), 8);
        let means: Vec<f64> = processed.iter().map(|p| p.mean).collect();
        assert_eq!(means, vec![2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        // rising edge at tick 6 only consumes the start-up skip
        let (peaks, valleys) = peaks_and_valleys(&engine);
        assert_eq!(peaks, ExtremaPair { previous: 0, current: 8 });
        assert_eq!(valleys, ExtremaPair::default());
        assert!(processed.iter().all(|p| p.cycle.is_none()));
        assert_eq!(engine.published_rate(), 14.0);
    }

    #[test]
    fn square_wave_rates_derive_from_tick_distance() {
        let mut engine =
            RespirationEngine::new(square_config(DetectionMode::PeakValley, false)).unwrap();
        let processed = run(&mut engine, &square_wave(1.0, 5.0, 40));
        let cycles: Vec<CycleUpdate> = processed.iter().filter_map(|p| p.cycle).collect();
        // valley at 13 (after the floor guard), peaks at 8/16/24/32, valleys at 21/29/37
        let ticks: Vec<i64> = cycles.iter().map(|c| c.tick).collect();
        assert_eq!(ticks, vec![21, 24, 29, 32, 37]);
        // 8 ticks at 1 Hz between same-kind extrema -> 7.5 bpm
        for cycle in &cycles {
            assert!((cycle.estimate.peak_rate - 7.5).abs() < 1e-9);
            assert!((cycle.estimate.valley_rate - 7.5).abs() < 1e-9);
        }
        assert!((cycles[0].published_rate - (14.0 + 14.0 + 7.5) / 3.0).abs() < 1e-9);
        assert!((cycles[2].published_rate - 7.5).abs() < 1e-9);
    }

    #[test]
    fn square_wave_with_delta_clamp_steps_down() {
        let mut engine =
            RespirationEngine::new(square_config(DetectionMode::PeakValley, true)).unwrap();
        let processed = run(&mut engine, &square_wave(1.0, 5.0, 40));
        let cycles: Vec<CycleUpdate> = processed.iter().filter_map(|p| p.cycle).collect();
        let averages: Vec<f64> = cycles.iter().map(|c| c.estimate.average_rate).collect();
        assert_eq!(averages, vec![12.5, 11.0, 9.5, 8.0, 7.5]);
        let published: Vec<f64> = cycles.iter().map(|c| c.published_rate).collect();
        let expected = [13.5, 12.5, 11.0, 9.5, 25.0 / 3.0];
        for (got, want) in published.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
        assert_eq!(engine.published_rate(), *published.last().unwrap());
    }

    #[test]
    fn zero_crossing_square_wave() {
        let mut engine =
            RespirationEngine::new(square_config(DetectionMode::ZeroCrossing, false)).unwrap();
        let processed = run(&mut engine, &square_wave(10.0, 20.0, 20));
        assert!(processed.iter().all(|p| p.std_dev.is_some()));
        let cycles: Vec<CycleUpdate> = processed.iter().filter_map(|p| p.cycle).collect();
        let ticks: Vec<i64> = cycles.iter().map(|c| c.tick).collect();
        assert_eq!(ticks, vec![8, 12, 16]);
        let rates: Vec<f64> = cycles.iter().map(|c| c.estimate.average_rate).collect();
        assert_eq!(rates, vec![10.0, 7.5, 7.5]);
        let expected = [38.0 / 3.0, 10.5, 25.0 / 3.0];
        for (cycle, want) in cycles.iter().zip(expected) {
            assert!((cycle.published_rate - want).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_crossing_clamped_rates() {
        let mut engine =
            RespirationEngine::new(square_config(DetectionMode::ZeroCrossing, true)).unwrap();
        let processed = run(&mut engine, &square_wave(10.0, 20.0, 20));
        let rates: Vec<f64> = processed
            .iter()
            .filter_map(|p| p.cycle)
            .map(|c| c.estimate.average_rate)
            .collect();
        assert_eq!(rates, vec![12.5, 11.0, 9.5]);
    }

    #[test]
    fn sinusoid_converges_to_true_rate() {
        for bpm in [8.0, 12.0, 15.0, 20.0] {
            let mut engine = RespirationEngine::new(EngineConfig::default()).unwrap();
            let mut source = SimulatedSource::new(bpm, 10.0, 180.0, 42).with_noise(0.0);
            while let Some(sample) = source.next_sample().unwrap() {
                engine.submit_sample(sample);
            }
            assert!(engine.cycles() > 10);
            let published = engine.published_rate();
            assert!(
                (published - bpm).abs() <= 0.5,
                "expected ~{bpm} bpm, got {published}"
            );
        }
    }

    #[test]
    fn published_rate_is_mean_of_history() {
        let mut engine = RespirationEngine::new(EngineConfig::default()).unwrap();
        let mut source = SimulatedSource::new(10.0, 10.0, 60.0, 3);
        while let Some(sample) = source.next_sample().unwrap() {
            if let Some(p) = engine.submit_sample(sample) {
                let history = engine.smoother().history();
                assert_eq!(history.len(), 3);
                let mean = history.iter().sum::<f64>() / history.len() as f64;
                assert!((p.published_rate - mean).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn reset_clears_all_state() {
        let mut engine =
            RespirationEngine::new(square_config(DetectionMode::PeakValley, false)).unwrap();
        let first = run(&mut engine, &square_wave(1.0, 5.0, 40));
        assert!(engine.published_rate() < 14.0);
        engine.reset();
        assert!(!engine.is_warm());
        assert!(engine.window().raw().is_empty());
        assert!(engine.window().means().iter().all(|&m| m == 0.0));
        assert_eq!(engine.published_rate(), 14.0);
        assert_eq!(engine.cycles(), 0);
        let (peaks, valleys) = peaks_and_valleys(&engine);
        assert_eq!(peaks, ExtremaPair::default());
        assert_eq!(valleys, ExtremaPair::default());
        // a replay after reset matches a fresh engine exactly
        let second = run(&mut engine, &square_wave(1.0, 5.0, 40));
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            smoothing_size: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            RespirationEngine::new(config),
            Err(RespirationError::InvalidSmoothingSize)
        ));
    }
}
