// src/main.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use breathrate::drivers::{
    ParticipantRegistry, ReplaySource, RespirationPipeline, SampleSource, SessionLogs,
    SessionSummary, SimulatedSource,
};
use breathrate::{DetectionMode, EngineConfig, Settings};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "breathrate", version, about = "Breaths-per-minute from a piezo respiration strap")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-run the estimator over a recorded raw log
    Replay {
        raw_log: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        logs: LogArgs,
    },
    /// Run the estimator on a synthetic strap signal
    Simulate {
        #[arg(long, default_value_t = 14.0)]
        bpm: f64,
        #[arg(long, default_value_t = 120.0)]
        seconds: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 0.5)]
        noise: f64,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        logs: LogArgs,
    },
    /// Add a participant number to the registry file
    Register { registry: PathBuf, participant: u32 },
    /// Print the default engine configuration as JSON
    PrintConfig,
}

#[derive(Args)]
struct EngineArgs {
    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Positional settings.txt (rate bounds, clamp flag)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Use zero-crossing detection instead of peak/valley
    #[arg(long)]
    zero_crossing: bool,
}

#[derive(Args)]
struct LogArgs {
    /// Directory for the raw/average/processed logs
    #[arg(long, requires = "participant")]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    participant: Option<u32>,
}

impl EngineArgs {
    fn resolve(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(path) = &self.settings {
            let settings = Settings::load(path)
                .with_context(|| format!("reading settings {}", path.display()))?;
            if settings.use_live_sensor == Some(true) {
                warn!("settings ask for the live sensor; this build only replays or simulates");
            }
            settings.apply_to(&mut config)?;
        }
        if self.zero_crossing {
            config.mode = DetectionMode::ZeroCrossing;
        }
        Ok(config)
    }
}

fn run_session<S: SampleSource>(
    source: S,
    config: EngineConfig,
    logs: &LogArgs,
) -> Result<SessionSummary> {
    let mode = config.mode;
    let mut pipeline = RespirationPipeline::new(source, config)?;
    if let (Some(dir), Some(participant)) = (&logs.out_dir, logs.participant) {
        let session_logs = SessionLogs::create(dir, participant, mode)
            .with_context(|| format!("creating logs in {}", dir.display()))?;
        pipeline = pipeline.with_logs(session_logs);
    }
    Ok(pipeline.run_to_end()?)
}

fn report(summary: &SessionSummary) {
    println!(
        "{} samples, {} cycles, respiration rate {:.2} bpm",
        summary.samples, summary.cycles, summary.published_rate
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Replay {
            raw_log,
            engine,
            logs,
        } => {
            let config = engine.resolve()?;
            let source = ReplaySource::open(&raw_log)
                .with_context(|| format!("opening raw log {}", raw_log.display()))?;
            info!("replaying {}", raw_log.display());
            report(&run_session(source, config, &logs)?);
        }
        Commands::Simulate {
            bpm,
            seconds,
            seed,
            noise,
            engine,
            logs,
        } => {
            let config = engine.resolve()?;
            let source =
                SimulatedSource::new(bpm, config.sampling_rate_hz, seconds, seed).with_noise(noise);
            info!("simulating {bpm} bpm for {seconds} s");
            report(&run_session(source, config, &logs)?);
        }
        Commands::Register {
            registry,
            participant,
        } => {
            let mut list = ParticipantRegistry::open(&registry)
                .with_context(|| format!("opening registry {}", registry.display()))?;
            list.register(participant)?;
            println!("registered participant {participant}");
        }
        Commands::PrintConfig => {
            println!("{}", EngineConfig::default().to_json_pretty()?);
        }
    }
    Ok(())
}
