use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use log::info;
use crate::config::DetectionMode;
use crate::drivers::participants::participant_tag;
use crate::drivers::RespirationError;
use crate::types::{ProcessedTick, Sample};
const MARKER: &str = ",*";
/// The three line-oriented logs of one session: raw samples, the windowed
/// mean per tick, and one line per completed breath cycle.
pub struct SessionLogs<W: Write> {
    raw: W,
    average: W,
    processed: W,
    mode: DetectionMode,
    started_at: Instant,
    mark_raw: bool,
    mark_average: bool,
    // last cycle values, repeated on marker lines
    last_rate: f64,
    last_published: Option<f64>,
}
impl SessionLogs<BufWriter<File>> {
    /// Open (truncating) `RRraw_NNN.txt`, `RRavg_NNN.txt` and `RRprc_NNN.txt` in `dir`.
    pub fn create(
        dir: impl AsRef<Path>,
        participant: u32,
        mode: DetectionMode,
    ) -> Result<Self, RespirationError> {
        let dir = dir.as_ref();
        let tag = participant_tag(participant);
        let open = |prefix: &str| -> Result<BufWriter<File>, RespirationError> {
            Ok(BufWriter::new(File::create(
                dir.join(format!("{prefix}_{tag}.txt")),
            )?))
        };
        let logs = Self::new(open("RRraw")?, open("RRavg")?, open("RRprc")?, mode);
        info!("session logs for participant {tag} opened in {}", dir.display());
        Ok(logs)
    }
}
impl<W: Write> SessionLogs<W> {
    pub fn new(raw: W, average: W, processed: W, mode: DetectionMode) -> Self {
        Self {
            raw,
            average,
            processed,
            mode,
            started_at: Instant::now(),
            mark_raw: false,
            mark_average: false,
            last_rate: 0.0,
            last_published: None,
        }
    }
    /// Flag the next raw and average lines with a trailing `*`.
    pub fn mark(&mut self) {
        self.mark_raw = true;
        self.mark_average = true;
    }
    /// Forget the last cycle and any armed marker, for a fresh source.
    pub fn reset_cycle_state(&mut self) {
        self.mark_raw = false;
        self.mark_average = false;
        self.last_rate = 0.0;
        self.last_published = None;
    }
    pub fn write_raw(&mut self, sample: &Sample) -> Result<(), RespirationError> {
        let marker = take_marker(&mut self.mark_raw);
        writeln!(
            self.raw,
            "{:.3},{},{}{}",
            self.elapsed(),
            sample.tick,
            sample.value,
            marker
        )?;
        Ok(())
    }
    /// Average line for every processed tick, plus a processed line when a
    /// cycle completed.
    pub fn write_tick(&mut self, processed: &ProcessedTick) -> Result<(), RespirationError> {
        let elapsed = self.elapsed();
        let marker = take_marker(&mut self.mark_average);
        if !marker.is_empty() {
            // the processed series is irregular; repeat the last cycle so the marker shows up there too
            let published = self.last_published.unwrap_or(processed.published_rate);
            let line = self.cycle_line(elapsed, processed.tick - 1, self.last_rate, published);
            writeln!(self.processed, "{line}{MARKER}")?;
        }
        writeln!(
            self.average,
            "{:.3},{},{:.2}{}",
            elapsed, processed.tick, processed.mean, marker
        )?;
        if let Some(cycle) = processed.cycle {
            self.last_rate = cycle.estimate.average_rate;
            self.last_published = Some(cycle.published_rate);
            let line = self.cycle_line(
                elapsed,
                cycle.tick,
                cycle.estimate.average_rate,
                cycle.published_rate,
            );
            writeln!(self.processed, "{line}")?;
        }
        Ok(())
    }
    pub fn flush(&mut self) -> Result<(), RespirationError> {
        self.raw.flush()?;
        self.average.flush()?;
        self.processed.flush()?;
        Ok(())
    }
    /// Hand back the raw, average and processed writers.
    pub fn into_inner(self) -> (W, W, W) {
        (self.raw, self.average, self.processed)
    }
    fn cycle_line(&self, elapsed: f64, tick: i64, rate: f64, published: f64) -> String {
        match self.mode {
            DetectionMode::PeakValley => format!("{elapsed:.3},{tick},{rate:.1},{published:.1}"),
            DetectionMode::ZeroCrossing => format!("{elapsed:.3},{tick},{rate:.2},{published:.2}"),
        }
    }
    fn elapsed(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
fn take_marker(flag: &mut bool) -> &'static str {
    if std::mem::replace(flag, false) {
        MARKER
    } else {
        ""
    }
}
