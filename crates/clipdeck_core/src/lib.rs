//! Clipdeck core: pure state machines for job tracking, clip browsing and
//! embed playback, plus the view-model helpers the front-ends render from.
mod clips;
mod effect;
mod embed;
mod error;
mod job;
mod msg;
mod state;
mod tracker;
mod update;
mod view_model;

pub use clips::{arrange, game_choices, Clip, ClipBrowser, ClipQuery, ClipsLoad, SortKey};
pub use effect::Effect;
pub use embed::{EmbedPlayer, EmbedState, Selection, SelectionToken, DEFAULT_EMBED_TIMEOUT};
pub use error::{ServiceError, ValidationError};
pub use job::{
    normalize_channels, Breakdown, ChannelHighlightsParams, Job, JobId, JobKind, JobParameters,
    JobState, JobSummary, TopClipsParams, CLIPS_PER_CHANNEL_RANGE, DAYS_BACK_RANGE,
    TOP_CLIPS_LIMIT_RANGE,
};
pub use msg::Msg;
pub use state::{AppState, DownloadState, ServiceHealth, Timing, DEFAULT_POLL_INTERVAL};
pub use tracker::{ActionNotice, JobTracker, LoadPhase};
pub use update::update;
pub use view_model::{
    format_duration, format_views, AppViewModel, ClipCardView, ClipsPanelStatus, ClipsPanelView,
    JobRowView, PlayerView,
};
