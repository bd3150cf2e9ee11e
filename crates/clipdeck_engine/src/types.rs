use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clipdeck_core::{
    ChannelHighlightsParams, Clip, Job, JobId, SelectionToken, ServiceError, ServiceHealth,
};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Root of the job service API; endpoint paths are appended to it.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_artifact_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_artifact_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Results reported by the engine. Each maps onto exactly one core `Msg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The poll schedule fired.
    PollDue,
    JobsListed(Result<Vec<Job>, ServiceError>),
    JobSubmitted(Result<JobId, ServiceError>),
    JobDeleted {
        job_id: JobId,
        result: Result<(), ServiceError>,
    },
    ClipsFetched {
        job_id: JobId,
        result: Result<Vec<Clip>, ServiceError>,
    },
    ArtifactSaved {
        job_id: JobId,
        result: Result<PathBuf, String>,
    },
    HealthChecked(Result<ServiceHealth, ServiceError>),
    PresetFetched {
        name: String,
        result: Result<ChannelHighlightsParams, ServiceError>,
    },
    EmbedLoaded {
        token: SelectionToken,
    },
    EmbedFailed {
        token: SelectionToken,
    },
    EmbedTimedOut {
        token: SelectionToken,
    },
}

/// Outcome of asking the embed provider for a clip's player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Loaded,
    Failed(String),
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Loaded => write!(f, "loaded"),
            ProbeOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Failures while constructing the engine or its HTTP clients.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid service url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("runtime: {0}")]
    Runtime(#[from] io::Error),
}
