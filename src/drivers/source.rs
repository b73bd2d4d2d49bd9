use std::collections::VecDeque;
use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::drivers::RespirationError;
use crate::types::Sample;
/// Trait representing something that yields strap samples in tick order.
pub trait SampleSource {
    fn next_sample(&mut self) -> Result<Option<Sample>, RespirationError>;
}
impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_sample(&mut self) -> Result<Option<Sample>, RespirationError> {
        (**self).next_sample()
    }
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Sample>,
}
impl ManualSource {
    pub fn new(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            queue: samples.into_iter().collect(),
        }
    }
    /// Consecutive ticks starting at `first_tick`.
    pub fn from_values(first_tick: i64, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| Sample::new(first_tick + i as i64, v)),
        )
    }
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}
impl SampleSource for ManualSource {
    fn next_sample(&mut self) -> Result<Option<Sample>, RespirationError> {
        Ok(self.queue.pop_front())
    }
}
/// Replays a raw log written by an earlier session.
///
/// Lines look like `elapsed,tick,value` with an optional trailing `*` marker;
/// older logs carry a date and a time column in front. The last two fields
/// before any marker are always tick and value.
pub struct ReplaySource<R: BufRead> {
    reader: R,
    line_no: usize,
    line: String,
}
impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RespirationError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}
impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            line: String::new(),
        }
    }
    pub fn lines_read(&self) -> usize {
        self.line_no
    }
}
impl<R: BufRead> SampleSource for ReplaySource<R> {
    fn next_sample(&mut self) -> Result<Option<Sample>, RespirationError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return parse_raw_line(trimmed, self.line_no).map(Some);
        }
    }
}
/// Parse one raw log line into a sample.
pub fn parse_raw_line(line: &str, line_no: usize) -> Result<Sample, RespirationError> {
    let malformed = |reason: String| RespirationError::MalformedLine {
        line: line_no,
        reason,
    };
    let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.last() == Some(&"*") {
        fields.pop();
    }
    if fields.len() < 2 {
        return Err(malformed(format!("expected at least 2 fields, got {}", fields.len())));
    }
    let value_field = fields[fields.len() - 1];
    let tick_field = fields[fields.len() - 2];
    let tick = tick_field
        .parse::<i64>()
        .map_err(|e| malformed(format!("bad tick `{tick_field}`: {e}")))?;
    let value = value_field
        .parse::<f64>()
        .map_err(|e| malformed(format!("bad value `{value_field}`: {e}")))?;
    if !value.is_finite() {
        warn!("line {line_no}: non-finite value `{value_field}`");
        return Err(malformed(format!("non-finite value `{value_field}`")));
    }
    Ok(Sample::new(tick, value))
}
/// Synthetic respiration strap: a sinusoid at a fixed breathing rate plus
/// uniform noise. Stands in for the live sensor.
pub struct SimulatedSource {
    breaths_per_minute: f64,
    sampling_rate_hz: f64,
    total_ticks: i64,
    next_tick: i64,
    baseline: f64,
    amplitude: f64,
    noise: f64,
    rng: StdRng,
}
impl SimulatedSource {
    pub fn new(breaths_per_minute: f64, sampling_rate_hz: f64, seconds: f64, seed: u64) -> Self {
        Self {
            breaths_per_minute,
            sampling_rate_hz,
            total_ticks: (seconds * sampling_rate_hz).round() as i64,
            next_tick: 1,
            // 8-bit strap resting around mid-scale
            baseline: 128.0,
            amplitude: 40.0,
            noise: 0.5,
            rng: StdRng::seed_from_u64(seed),
        }
    }
    pub fn with_shape(mut self, baseline: f64, amplitude: f64) -> Self {
        self.baseline = baseline;
        self.amplitude = amplitude;
        self
    }
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.abs();
        self
    }
    pub fn breaths_per_minute(&self) -> f64 {
        self.breaths_per_minute
    }
}
impl SampleSource for SimulatedSource {
    fn next_sample(&mut self) -> Result<Option<Sample>, RespirationError> {
        if self.next_tick > self.total_ticks {
            return Ok(None);
        }
        let tick = self.next_tick;
        self.next_tick += 1;
        let t = tick as f64 / self.sampling_rate_hz;
        let phase = 2.0 * PI * self.breaths_per_minute / 60.0 * t;
        let noise = if self.noise > 0.0 {
            self.rng.gen_range(-self.noise..=self.noise)
        } else {
            0.0
        };
        Ok(Some(Sample::new(
            tick,
            self.baseline + self.amplitude * phase.sin() + noise,
        )))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    #[test]
    fn manual_source_drains_in_order() {
        let mut source = ManualSource::from_values(5, [1.0, 2.0]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_sample().unwrap(), Some(Sample::new(5, 1.0)));
        assert_eq!(source.next_sample().unwrap(), Some(Sample::new(6, 2.0)));
        assert_eq!(source.next_sample().unwrap(), None);
    }
    #[test]
    fn replay_reads_both_log_layouts() {
        let log = "0.100,1,131.00\n\n0.200,2,133.50,*\n2023-05-01,10:00:00.300,3,129\n";
        let mut source = ReplaySource::new(Cursor::new(log));
        assert_eq!(source.next_sample().unwrap(), Some(Sample::new(1, 131.0)));
        assert_eq!(source.next_sample().unwrap(), Some(Sample::new(2, 133.5)));
        assert_eq!(source.next_sample().unwrap(), Some(Sample::new(3, 129.0)));
        assert_eq!(source.next_sample().unwrap(), None);
        assert_eq!(source.lines_read(), 4);
    }
    #[test]
    fn replay_reports_bad_line_number() {
        let log = "0.1,1,100\n0.2,two,100\n";
        let mut source = ReplaySource::new(Cursor::new(log));
        assert!(source.next_sample().unwrap().is_some());
        match source.next_sample() {
            Err(RespirationError::MalformedLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed line error, got {other:?}"),
        }
    }
    #[test]
    fn rejects_short_and_non_finite_lines() {
        assert!(parse_raw_line("42", 1).is_err());
        assert!(parse_raw_line("*", 1).is_err());
        assert!(parse_raw_line("0.1,1,NaN", 3).is_err());
    }
    #[test]
    fn simulated_source_is_deterministic() {
        let collect = |seed| {
            let mut source = SimulatedSource::new(12.0, 10.0, 3.0, seed);
            let mut out = Vec::new();
            while let Some(sample) = source.next_sample().unwrap() {
                out.push(sample);
            }
            out
        };
        let a = collect(9);
        assert_eq!(a.len(), 30);
        assert_eq!(a[0].tick, 1);
        assert_eq!(a.last().map(|s| s.tick), Some(30));
        assert_eq!(a, collect(9));
        assert!(a.iter().all(|s| (s.value - 128.0).abs() <= 40.5));
    }
    #[test]
    fn noise_free_simulation_follows_the_sinusoid() {
        let mut source = SimulatedSource::new(15.0, 10.0, 4.0, 0)
            .with_noise(0.0)
            .with_shape(50.0, 10.0);
        // quarter period of a 4 s breath is tick 10
        let samples: Vec<Sample> = std::iter::from_fn(|| source.next_sample().unwrap()).collect();
        assert!((samples[9].value - 60.0).abs() < 1e-9);
        assert!((samples[29].value - 40.0).abs() < 1e-9);
    }
}
