use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::view_model::AppViewModel;
use crate::{
    ChannelHighlightsParams, ClipBrowser, EmbedPlayer, JobId, JobTracker, ServiceError,
    DEFAULT_EMBED_TIMEOUT,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_interval: Duration,
    pub embed_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    InProgress,
    Saved(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceHealth {
    pub healthy: bool,
    /// `None` when the service did not report on its credentials.
    pub auth_valid: Option<bool>,
    pub message: Option<String>,
}

/// Everything the client knows. Each component owns its own slice and is
/// mutated only through its own operations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) timing: Timing,
    pub(crate) tracker: JobTracker,
    pub(crate) browser: ClipBrowser,
    pub(crate) player: EmbedPlayer,
    pub(crate) downloads: BTreeMap<JobId, DownloadState>,
    pub(crate) health: Option<Result<ServiceHealth, ServiceError>>,
    pub(crate) presets: BTreeMap<String, Result<ChannelHighlightsParams, ServiceError>>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timing(timing: Timing) -> Self {
        Self {
            timing,
            player: EmbedPlayer::new(timing.embed_timeout),
            ..Self::default()
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub fn browser(&self) -> &ClipBrowser {
        &self.browser
    }

    pub fn player(&self) -> &EmbedPlayer {
        &self.player
    }

    pub fn download(&self, job_id: JobId) -> Option<&DownloadState> {
        self.downloads.get(&job_id)
    }

    pub fn health(&self) -> Option<&Result<ServiceHealth, ServiceError>> {
        self.health.as_ref()
    }

    pub fn preset(&self, name: &str) -> Option<&Result<ChannelHighlightsParams, ServiceError>> {
        self.presets.get(name)
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::build(self, self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
