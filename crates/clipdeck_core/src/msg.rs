use std::path::PathBuf;

use crate::{
    ChannelHighlightsParams, Clip, Job, JobId, JobParameters, SelectionToken, ServiceError,
    ServiceHealth, SortKey,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The job view became visible: start polling.
    Mounted,
    /// The job view went away: stop polling and drop the player.
    Unmounted,
    /// Poll schedule fired.
    PollTick,
    /// User asked for a refresh (retry after a failed initial load).
    RefreshRequested,
    /// Engine result for a job list refresh.
    JobsRefreshed(Result<Vec<Job>, ServiceError>),
    /// User submitted a scrape request.
    SubmitRequested(JobParameters),
    /// Engine result for a submission.
    JobSubmitted(Result<JobId, ServiceError>),
    DeleteRequested {
        job_id: JobId,
    },
    JobDeleted {
        job_id: JobId,
        result: Result<(), ServiceError>,
    },
    DownloadRequested {
        job_id: JobId,
    },
    ArtifactSaved {
        job_id: JobId,
        result: Result<PathBuf, String>,
    },
    /// User opened the clip gallery of a job.
    ClipsRequested {
        job_id: JobId,
    },
    ClipsFetched {
        job_id: JobId,
        result: Result<Vec<Clip>, ServiceError>,
    },
    ClipsClosed,
    SearchChanged(String),
    GameFilterChanged(String),
    SortChanged(SortKey),
    /// User picked a clip from the open gallery.
    ClipSelected {
        clip_id: String,
    },
    ClipDeselected,
    /// The embed provider confirmed the load.
    EmbedLoaded {
        token: SelectionToken,
    },
    /// The embed provider refused or failed.
    EmbedFailed {
        token: SelectionToken,
    },
    /// The bounded wait for a load confirmation elapsed.
    EmbedTimedOut {
        token: SelectionToken,
    },
    /// Standalone health check; leaves polling and the job list alone.
    HealthRequested,
    HealthChecked(Result<ServiceHealth, ServiceError>),
    PresetRequested {
        name: String,
    },
    PresetFetched {
        name: String,
        result: Result<ChannelHighlightsParams, ServiceError>,
    },
}
