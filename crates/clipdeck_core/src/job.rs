use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};

use crate::ValidationError;

pub type JobId = u64;

pub const DAYS_BACK_RANGE: RangeInclusive<u32> = 1..=30;
pub const TOP_CLIPS_LIMIT_RANGE: RangeInclusive<u32> = 1..=500;
pub const CLIPS_PER_CHANNEL_RANGE: RangeInclusive<u32> = 1..=100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobKind {
    TopClips,
    ChannelHighlights,
}

impl JobKind {
    /// Name used by the job service (`job_type`).
    pub fn wire_name(self) -> &'static str {
        match self {
            JobKind::TopClips => "top_clips",
            JobKind::ChannelHighlights => "channel_highlights",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "top_clips" => Some(JobKind::TopClips),
            "channel_highlights" => Some(JobKind::ChannelHighlights),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobKind::TopClips => "Top Clips",
            JobKind::ChannelHighlights => "Channel Highlights",
        }
    }
}

/// Lifecycle of a job as reported by the service.
///
/// Transitions are never written by the client; they only arrive through
/// refresh results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn from_wire(status: &str) -> Option<Self> {
        match status {
            "pending" => Some(JobState::Pending),
            "running" => Some(JobState::Running),
            "completed" => Some(JobState::Completed),
            "failed" => Some(JobState::Failed),
            _ => None,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// True if moving from `self` to `next` follows the lifecycle
    /// (staying put counts as forward).
    pub fn can_advance_to(self, next: JobState) -> bool {
        match (self, next) {
            (a, b) if a == b => true,
            (JobState::Pending, _) => true,
            (JobState::Running, JobState::Completed | JobState::Failed) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopClipsParams {
    pub days_back: u32,
    pub limit: u32,
    pub english_only: bool,
    pub game_filter: Option<String>,
}

impl Default for TopClipsParams {
    fn default() -> Self {
        Self {
            days_back: 1,
            limit: 150,
            english_only: true,
            game_filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHighlightsParams {
    pub channels: Vec<String>,
    pub days_back: u32,
    pub clips_per_channel: u32,
}

impl Default for ChannelHighlightsParams {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            days_back: 7,
            clips_per_channel: 10,
        }
    }
}

/// Request shape of a job; the variant fixes the job's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobParameters {
    TopClips(TopClipsParams),
    ChannelHighlights(ChannelHighlightsParams),
}

impl JobParameters {
    pub fn kind(&self) -> JobKind {
        match self {
            JobParameters::TopClips(_) => JobKind::TopClips,
            JobParameters::ChannelHighlights(_) => JobKind::ChannelHighlights,
        }
    }

    pub fn days_back(&self) -> u32 {
        match self {
            JobParameters::TopClips(params) => params.days_back,
            JobParameters::ChannelHighlights(params) => params.days_back,
        }
    }

    /// Normalizes and checks the parameters before they are sent.
    pub fn validated(self) -> Result<Self, ValidationError> {
        check_range(self.days_back(), &DAYS_BACK_RANGE, ValidationError::DaysBackOutOfRange)?;
        match self {
            JobParameters::TopClips(mut params) => {
                check_range(
                    params.limit,
                    &TOP_CLIPS_LIMIT_RANGE,
                    ValidationError::LimitOutOfRange,
                )?;
                params.game_filter = params
                    .game_filter
                    .map(|game| game.trim().to_string())
                    .filter(|game| !game.is_empty());
                Ok(JobParameters::TopClips(params))
            }
            JobParameters::ChannelHighlights(mut params) => {
                check_range(
                    params.clips_per_channel,
                    &CLIPS_PER_CHANNEL_RANGE,
                    ValidationError::ClipsPerChannelOutOfRange,
                )?;
                params.channels = normalize_channels(&params.channels);
                if params.channels.is_empty() {
                    return Err(ValidationError::EmptyChannelList);
                }
                Ok(JobParameters::ChannelHighlights(params))
            }
        }
    }
}

fn check_range(
    value: u32,
    range: &RangeInclusive<u32>,
    err: fn(u32) -> ValidationError,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(err(value))
    }
}

/// Trims, lowercases and dedupes channel names, keeping first occurrences.
pub fn normalize_channels<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let name = name.as_ref().trim().to_lowercase();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Per-category counts attached to a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Breakdown {
    #[default]
    None,
    Games(BTreeMap<String, u64>),
    Channels(BTreeMap<String, u64>),
}

/// Aggregate counts reported by the service. Not reconciled with the
/// fetched clip list, which may be paginated differently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSummary {
    pub total_clips: u64,
    pub breakdown: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub parameters: JobParameters,
    pub state: JobState,
    pub progress: u8,
    pub summary: Option<JobSummary>,
    pub error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn kind(&self) -> JobKind {
        self.parameters.kind()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
