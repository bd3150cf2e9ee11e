use chrono::{DateTime, Utc};

use crate::{
    ActionNotice, AppState, Breakdown, Clip, ClipQuery, ClipsLoad, DownloadState, EmbedState,
    JobId, JobKind, JobState, LoadPhase, ServiceError, ServiceHealth,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub polling: bool,
    pub refreshing: bool,
    pub phase: LoadPhase,
    /// Set while the list shown is from before the last failed refresh.
    pub stale_error: Option<String>,
    pub job_count: usize,
    pub jobs: Vec<JobRowView>,
    pub notice: Option<ActionNotice>,
    pub last_submitted: Option<JobId>,
    pub clips: Option<ClipsPanelView>,
    pub player: PlayerView,
    pub health: Option<Result<ServiceHealth, ServiceError>>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub kind: JobKind,
    pub state: JobState,
    /// Only present while running.
    pub progress: Option<u8>,
    pub total_clips: Option<u64>,
    pub games: Option<usize>,
    pub channels: Option<usize>,
    pub error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub can_download: bool,
    pub download: Option<DownloadState>,
    pub deleting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipsPanelStatus {
    Loading,
    Failed { message: String },
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipsPanelView {
    pub job_id: JobId,
    pub status: ClipsPanelStatus,
    /// Clips actually fetched for the job.
    pub fetched: usize,
    /// Total reported by the job summary; may differ from `fetched`.
    pub summary_total: Option<u64>,
    pub shown: Vec<ClipCardView>,
    pub game_choices: Vec<String>,
    pub query: ClipQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipCardView {
    pub clip_id: String,
    pub title: String,
    pub broadcaster_name: String,
    pub game_name: String,
    pub views: String,
    pub duration: String,
    pub created_on: Option<String>,
    pub playback_url: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlayerView {
    #[default]
    Hidden,
    Loading {
        title: String,
        embed_url: String,
    },
    Playing {
        title: String,
        embed_url: String,
    },
    /// Link-out offered instead of the embed.
    Fallback {
        title: String,
        link: String,
    },
}

impl AppViewModel {
    pub(crate) fn build(state: &AppState, dirty: bool) -> Self {
        let tracker = state.tracker();
        let jobs: Vec<JobRowView> = tracker
            .jobs()
            .map(|job| {
                let (games, channels) = match job.summary.as_ref().map(|s| &s.breakdown) {
                    Some(Breakdown::Games(games)) => (Some(games.len()), None),
                    Some(Breakdown::Channels(channels)) => (None, Some(channels.len())),
                    _ => (None, None),
                };
                JobRowView {
                    job_id: job.id,
                    kind: job.kind(),
                    state: job.state,
                    progress: (job.state == JobState::Running).then_some(job.progress),
                    total_clips: job.summary.as_ref().map(|s| s.total_clips),
                    games,
                    channels,
                    error: job.error.clone(),
                    created_at: job.created_at,
                    completed_at: job.completed_at,
                    can_download: job.state == JobState::Completed,
                    download: state.download(job.id).cloned(),
                    deleting: tracker.is_deleting(job.id),
                }
            })
            .collect();

        Self {
            polling: tracker.is_polling(),
            refreshing: tracker.is_refreshing(),
            phase: tracker.phase().clone(),
            stale_error: tracker.stale_error().map(ToOwned::to_owned),
            job_count: jobs.len(),
            jobs,
            notice: tracker.notice().cloned(),
            last_submitted: tracker.last_submitted(),
            clips: clips_panel(state),
            player: player_view(state.player().state()),
            health: state.health().cloned(),
            dirty,
        }
    }
}

fn clips_panel(state: &AppState) -> Option<ClipsPanelView> {
    let browser = state.browser();
    let job_id = browser.open_job()?;
    let status = match browser.load() {
        ClipsLoad::Loading { .. } => ClipsPanelStatus::Loading,
        ClipsLoad::Failed { message, .. } => ClipsPanelStatus::Failed {
            message: message.clone(),
        },
        _ => ClipsPanelStatus::Loaded,
    };
    let selected_id = state
        .player()
        .state()
        .selection()
        .map(|selection| selection.clip_id.as_str());

    Some(ClipsPanelView {
        job_id,
        status,
        fetched: browser.clips().len(),
        summary_total: state
            .tracker()
            .job(job_id)
            .and_then(|job| job.summary.as_ref())
            .map(|summary| summary.total_clips),
        shown: browser
            .arranged()
            .into_iter()
            .map(|clip| clip_card(clip, selected_id == Some(clip.id.as_str())))
            .collect(),
        game_choices: browser.game_choices(),
        query: browser.query().clone(),
    })
}

fn clip_card(clip: &Clip, selected: bool) -> ClipCardView {
    ClipCardView {
        clip_id: clip.id.clone(),
        title: clip.title.clone(),
        broadcaster_name: clip.broadcaster_name.clone(),
        game_name: clip.game_name.clone(),
        views: format_views(clip.view_count),
        duration: format_duration(clip.duration_seconds),
        created_on: clip
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string()),
        playback_url: clip.playback_url.clone(),
        selected,
    }
}

fn player_view(state: &EmbedState) -> PlayerView {
    match state {
        EmbedState::Idle => PlayerView::Hidden,
        EmbedState::Loading(selection) => PlayerView::Loading {
            title: selection.title.clone(),
            embed_url: selection.embed_url.clone(),
        },
        EmbedState::Loaded(selection) => PlayerView::Playing {
            title: selection.title.clone(),
            embed_url: selection.embed_url.clone(),
        },
        EmbedState::Degraded {
            selection,
            fallback_url,
        } => PlayerView::Fallback {
            title: selection.title.clone(),
            link: fallback_url.clone(),
        },
    }
}

/// Compact view count: `999`, `1.5K`, `2.3M`.
pub fn format_views(views: u64) -> String {
    if views >= 1_000_000 {
        format!("{:.1}M", views as f64 / 1_000_000.0)
    } else if views >= 1_000 {
        format!("{:.1}K", views as f64 / 1_000.0)
    } else {
        views.to_string()
    }
}

/// `m:ss`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
