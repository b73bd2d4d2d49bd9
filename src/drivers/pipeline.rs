use std::fs::File;
use std::io::{BufWriter, Write};
use log::{debug, info};
use crate::config::EngineConfig;
use crate::drivers::error::RespirationError;
use crate::drivers::recorder::SessionLogs;
use crate::drivers::source::SampleSource;
use crate::engine::RespirationEngine;
use crate::types::ProcessedTick;
/// Totals for a drained source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSummary {
    pub samples: u64,
    pub processed: u64,
    pub cycles: u64,
    pub published_rate: f64,
}
/// High level pipeline: pulls samples from one source, runs them through the
/// engine and mirrors everything into the session logs.
pub struct RespirationPipeline<S: SampleSource, W: Write = BufWriter<File>> {
    source: S,
    engine: RespirationEngine,
    logs: Option<SessionLogs<W>>,
    samples: u64,
    processed: u64,
}
impl<S: SampleSource, W: Write> RespirationPipeline<S, W> {
    pub fn new(source: S, config: EngineConfig) -> Result<Self, RespirationError> {
        Ok(Self {
            source,
            engine: RespirationEngine::new(config)?,
            logs: None,
            samples: 0,
            processed: 0,
        })
    }
    pub fn with_logs(mut self, logs: SessionLogs<W>) -> Self {
        self.logs = Some(logs);
        self
    }
    /// Pull and process one sample. The outer `None` means the source is
    /// exhausted; the inner one means the engine is still warming up.
    pub fn pump_once(&mut self) -> Result<Option<Option<ProcessedTick>>, RespirationError> {
        let Some(sample) = self.source.next_sample()? else {
            return Ok(None);
        };
        self.samples += 1;
        if let Some(logs) = self.logs.as_mut() {
            logs.write_raw(&sample)?;
        }
        let processed = self.engine.submit_sample(sample);
        if let Some(tick) = processed.as_ref() {
            self.processed += 1;
            if let Some(logs) = self.logs.as_mut() {
                logs.write_tick(tick)?;
            }
        }
        Ok(Some(processed))
    }
    /// Drain the source and flush the logs.
    pub fn run_to_end(&mut self) -> Result<SessionSummary, RespirationError> {
        info!("session started ({:?} mode)", self.engine.config().mode);
        while self.pump_once()?.is_some() {}
        if let Some(logs) = self.logs.as_mut() {
            logs.flush()?;
        }
        let summary = self.summary();
        info!(
            "session finished: {} samples, {} cycles, {:.2} bpm",
            summary.samples, summary.cycles, summary.published_rate
        );
        Ok(summary)
    }
    /// Flag the next logged lines with an event marker.
    pub fn mark(&mut self) {
        if let Some(logs) = self.logs.as_mut() {
            logs.mark();
            debug!("event marker armed");
        }
    }
    /// Swap the acquisition source. Engine state never carries over between sources.
    pub fn replace_source(&mut self, source: S) -> S {
        let previous = std::mem::replace(&mut self.source, source);
        self.engine.reset();
        if let Some(logs) = self.logs.as_mut() {
            logs.reset_cycle_state();
        }
        self.samples = 0;
        self.processed = 0;
        info!("acquisition source replaced, engine reset");
        previous
    }
    pub fn published_rate(&self) -> f64 {
        self.engine.published_rate()
    }
    pub fn engine(&self) -> &RespirationEngine {
        &self.engine
    }
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            samples: self.samples,
            processed: self.processed,
            cycles: self.engine.cycles(),
            published_rate: self.engine.published_rate(),
        }
    }
    /// Hand back the session logs (flushed).
    pub fn into_logs(mut self) -> Result<Option<SessionLogs<W>>, RespirationError> {
        if let Some(logs) = self.logs.as_mut() {
            logs.flush()?;
        }
        Ok(self.logs)
    }
}
