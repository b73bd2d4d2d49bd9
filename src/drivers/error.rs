use thiserror::Error;
#[derive(Debug, Error)]
pub enum RespirationError {
    #[error("sampling rate must be a positive finite number, got {0}")]
    InvalidSampleRate(f64),
    #[error("window size must be at least 2, got {0}")]
    InvalidWindowSize(usize),
    #[error("smoothing size must be at least 1")]
    InvalidSmoothingSize,
    #[error("influence must lie in [0, 1], got {0}")]
    InvalidInfluence(f64),
    #[error("valid rate range must be finite and non-empty: min {min}, max {max}")]
    InvalidRateBounds { min: f64, max: f64 },
    #[error("max delta per step must be finite and non-negative, got {0}")]
    InvalidMaxDelta(f64),
    #[error("z threshold must be positive and finite, got {0}")]
    InvalidZThreshold(f64),
    #[error("baseline rate must be finite, got {0}")]
    InvalidBaselineRate(f64),
    #[error("malformed raw log line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
    #[error("malformed settings line {line}: {reason}")]
    MalformedSettings { line: usize, reason: String },
    #[error("participant number must be greater than zero")]
    InvalidParticipant,
    #[error("participant {0} is already registered")]
    DuplicateParticipant(u32),
    #[error("failed to parse engine config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
