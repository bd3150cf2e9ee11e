use std::time::Duration;

use crate::{JobId, JobParameters, SelectionToken};

/// Work the engine performs on behalf of `update`. Results come back as `Msg`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartPolling { interval: Duration },
    StopPolling,
    RefreshJobs,
    SubmitJob { parameters: JobParameters },
    DeleteJob { job_id: JobId },
    FetchClips { job_id: JobId },
    DownloadArtifact { job_id: JobId },
    CheckHealth,
    FetchPreset { name: String },
    /// Probe `embed_url` and report `EmbedTimedOut` if nothing arrives within `timeout`.
    BeginEmbedLoad {
        token: SelectionToken,
        embed_url: String,
        timeout: Duration,
    },
    /// Cancel both the probe and the timer of a selection.
    CancelEmbedLoad { token: SelectionToken },
}
