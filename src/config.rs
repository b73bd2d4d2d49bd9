// src/config.rs
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::drivers::RespirationError;

/// Which extremum strategy drives the rate calculation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Direction reversals of the mean series, one full breath per same-kind pair.
    #[default]
    PeakValley,
    /// Deviations beyond `z_threshold` standard deviations, half a breath per pair.
    ZeroCrossing,
}

/// Engine parameters. Fixed once the engine is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Weight of the newest raw value in the blended window slot.
    pub influence: f64,
    pub window_size: usize,
    pub smoothing_size: usize,
    /// Largest change allowed between two consecutive rates of the same kind.
    pub max_delta_per_step: f64,
    pub absolute_min: f64,
    pub absolute_max: f64,
    pub clamp_enabled: bool,
    pub sampling_rate_hz: f64,
    pub z_threshold: f64,
    /// Rate the smoothing history and the per-kind fallbacks start from.
    pub baseline_rate: f64,
    pub mode: DetectionMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        // 10 Hz strap, 2 s smoothing window
        Self {
            influence: 0.1,
            window_size: 20,
            smoothing_size: 3,
            max_delta_per_step: 1.5,
            absolute_min: 4.0,
            absolute_max: 25.0,
            clamp_enabled: true,
            sampling_rate_hz: 10.0,
            z_threshold: 6.0,
            baseline_rate: 14.0,
            mode: DetectionMode::PeakValley,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), RespirationError> {
        if !self.sampling_rate_hz.is_finite() || self.sampling_rate_hz <= 0.0 {
            return Err(RespirationError::InvalidSampleRate(self.sampling_rate_hz));
        }
        if self.window_size < 2 {
            return Err(RespirationError::InvalidWindowSize(self.window_size));
        }
        if self.smoothing_size == 0 {
            return Err(RespirationError::InvalidSmoothingSize);
        }
        if !(0.0..=1.0).contains(&self.influence) {
            return Err(RespirationError::InvalidInfluence(self.influence));
        }
        if !self.absolute_min.is_finite()
            || !self.absolute_max.is_finite()
            || self.absolute_min > self.absolute_max
        {
            return Err(RespirationError::InvalidRateBounds {
                min: self.absolute_min,
                max: self.absolute_max,
            });
        }
        if !self.max_delta_per_step.is_finite() || self.max_delta_per_step < 0.0 {
            return Err(RespirationError::InvalidMaxDelta(self.max_delta_per_step));
        }
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(RespirationError::InvalidZThreshold(self.z_threshold));
        }
        if !self.baseline_rate.is_finite() {
            return Err(RespirationError::InvalidBaselineRate(self.baseline_rate));
        }
        Ok(())
    }

    /// Seconds covered by one tick.
    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.sampling_rate_hz
    }

    pub fn from_json_str(text: &str) -> Result<Self, RespirationError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RespirationError> {
        let path = path.as_ref();
        let config = Self::from_json_str(&fs::read_to_string(path)?)?;
        info!("loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, RespirationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Values from the positional `settings.txt` used by the acquisition app.
///
/// One `label:value` pair per line, in this order: device address, whether to
/// use the live sensor, lowest valid rate, highest valid rate, clamp flag.
/// Labels are ignored; missing trailing lines leave the field unset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    pub device_address: Option<String>,
    pub use_live_sensor: Option<bool>,
    pub absolute_min: Option<f64>,
    pub absolute_max: Option<f64>,
    pub clamp_enabled: Option<bool>,
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self, RespirationError> {
        let mut settings = Settings::default();
        for (idx, line) in text.lines().enumerate().take(5) {
            let line_no = idx + 1;
            let value = line
                .split_once(':')
                .map(|(_, v)| v.trim())
                .ok_or_else(|| RespirationError::MalformedSettings {
                    line: line_no,
                    reason: "expected `label:value`".into(),
                })?;
            match idx {
                0 => settings.device_address = Some(value.replace('-', ":")),
                1 => settings.use_live_sensor = Some(parse_flag(value, line_no)?),
                2 => settings.absolute_min = Some(parse_rate(value, line_no)?),
                3 => settings.absolute_max = Some(parse_rate(value, line_no)?),
                _ => settings.clamp_enabled = Some(parse_flag(value, line_no)?),
            }
        }
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RespirationError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Overlay the settings on `config` and re-validate the result.
    pub fn apply_to(&self, config: &mut EngineConfig) -> Result<(), RespirationError> {
        if let Some(min) = self.absolute_min {
            config.absolute_min = min;
        }
        if let Some(max) = self.absolute_max {
            config.absolute_max = max;
        }
        if let Some(clamp) = self.clamp_enabled {
            config.clamp_enabled = clamp;
        }
        config.validate()
    }
}

fn parse_flag(value: &str, line: usize) -> Result<bool, RespirationError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(RespirationError::MalformedSettings {
            line,
            reason: format!("expected true/false, got `{other}`"),
        }),
    }
}

fn parse_rate(value: &str, line: usize) -> Result<f64, RespirationError> {
    let rate = value
        .parse::<f64>()
        .map_err(|e| RespirationError::MalformedSettings {
            line,
            reason: format!("`{value}` is not a number ({e})"),
        })?;
    if !rate.is_finite() {
        return Err(RespirationError::MalformedSettings {
            line,
            reason: format!("`{value}` is not a finite rate"),
        });
    }
    Ok(rate)
}
