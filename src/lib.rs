//! Streaming breaths-per-minute estimation for piezo respiration straps.
//!
//! Raw samples go through a blended smoothing window, an extremum detector
//! (peak/valley or zero-crossing), outlier clamping and a short moving
//! average. [`RespirationEngine`] is the pure computation; the [`drivers`]
//! module holds the sources, session logs and the pipeline that wires them up.
pub mod config;
pub mod drivers;
pub mod engine;
pub mod types;

pub use config::{DetectionMode, EngineConfig, Settings};
pub use drivers::{RespirationError, RespirationPipeline, SampleSource};
pub use engine::RespirationEngine;
pub use types::{CycleUpdate, Direction, ProcessedTick, RateEstimate, Sample};
