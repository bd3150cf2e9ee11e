//! Clipdeck engine: job service client, embed probing, artifact
//! persistence and effect execution.
mod embed;
mod engine;
mod persist;
mod service;
mod types;
mod wire;

pub use embed::{EmbedProbe, HttpEmbedProbe};
pub use engine::{ChannelEventSink, EngineHandle, EventSink};
pub use persist::{artifact_filename, ensure_output_dir, AtomicFileWriter, PersistError};
pub use service::{HttpJobService, JobService};
pub use types::{EngineEvent, ProbeOutcome, ServiceSettings, SetupError, DEFAULT_BASE_URL};
pub use wire::parse_timestamp;
