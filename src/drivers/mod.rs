// src/drivers/mod.rs
// acquisition-side collaborators around the engine
pub mod error;
pub mod participants;
pub mod pipeline;
pub mod recorder;
pub mod source;
// re-exported for callers outside the driver layer
pub use error::RespirationError;
pub use participants::{participant_tag, ParticipantRegistry};
pub use pipeline::{RespirationPipeline, SessionSummary};
pub use recorder::SessionLogs;
pub use source::{parse_raw_line, ManualSource, ReplaySource, SampleSource, SimulatedSource};
