//! JSON shapes exchanged with the job service and their conversion into
//! core types.
//!
//! Decoding is lenient: a list entry that cannot be understood is skipped
//! with a warning instead of failing the whole response.
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use clipdeck_core::{
    Breakdown, ChannelHighlightsParams, Clip, Job, JobId, JobKind, JobParameters, JobState,
    JobSummary, ServiceHealth, TopClipsParams,
};
use engine_logging::engine_warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct TopClipsRequest<'a> {
    pub days_back: u32,
    pub limit: u32,
    pub english_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_filter: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChannelHighlightsRequest<'a> {
    pub channels: &'a [String],
    pub days_back: u32,
    pub clips_per_channel: u32,
}

/// Request path and body for a submission.
pub(crate) fn submit_request(parameters: &JobParameters) -> serde_json::Result<(&'static str, Vec<u8>)> {
    match parameters {
        JobParameters::TopClips(params) => {
            let body = serde_json::to_vec(&TopClipsRequest {
                days_back: params.days_back,
                limit: params.limit,
                english_only: params.english_only,
                game_filter: params.game_filter.as_deref(),
            })?;
            Ok(("top-clips", body))
        }
        JobParameters::ChannelHighlights(params) => {
            let body = serde_json::to_vec(&ChannelHighlightsRequest {
                channels: &params.channels,
                days_back: params.days_back,
                clips_per_channel: params.clips_per_channel,
            })?;
            Ok(("channel-highlights", body))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub job_id: JobId,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(bytes: &[u8]) -> Option<String> {
        let body: ErrorBody = serde_json::from_slice(bytes).ok()?;
        body.error.or(body.message)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobList {
    #[serde(default)]
    pub jobs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClipList {
    #[serde(default)]
    pub clips: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct JobConfig {
    days_back: Option<u32>,
    limit: Option<u32>,
    english_only: Option<bool>,
    game_filter: Option<String>,
    channels: Option<Vec<String>>,
    clips_per_channel: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct JobResult {
    total_clips: Option<u64>,
    game_breakdown: Option<BTreeMap<String, u64>>,
    channels: Option<BTreeMap<String, u64>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobRecord {
    id: JobId,
    job_type: String,
    config: Option<JobConfig>,
    status: String,
    progress: Option<f64>,
    result: Option<JobResult>,
    error: Option<String>,
    created_at: Option<String>,
    completed_at: Option<String>,
}

impl JobRecord {
    /// `None` when the record names a type or status this client does not know.
    pub fn into_job(self) -> Option<Job> {
        let Some(kind) = JobKind::from_wire(&self.job_type) else {
            engine_warn!("Skipping job {} with unknown type {:?}", self.id, self.job_type);
            return None;
        };
        let Some(state) = JobState::from_wire(&self.status) else {
            engine_warn!("Skipping job {} with unknown status {:?}", self.id, self.status);
            return None;
        };
        let config = self.config.unwrap_or_default();
        let parameters = match kind {
            JobKind::TopClips => {
                let defaults = TopClipsParams::default();
                JobParameters::TopClips(TopClipsParams {
                    days_back: config.days_back.unwrap_or(defaults.days_back),
                    limit: config.limit.unwrap_or(defaults.limit),
                    english_only: config.english_only.unwrap_or(defaults.english_only),
                    game_filter: config.game_filter.filter(|game| !game.is_empty()),
                })
            }
            JobKind::ChannelHighlights => {
                let defaults = ChannelHighlightsParams::default();
                JobParameters::ChannelHighlights(ChannelHighlightsParams {
                    channels: config.channels.unwrap_or_default(),
                    days_back: config.days_back.unwrap_or(defaults.days_back),
                    clips_per_channel: config
                        .clips_per_channel
                        .unwrap_or(defaults.clips_per_channel),
                })
            }
        };
        let summary = self.result.map(|result| JobSummary {
            total_clips: result.total_clips.unwrap_or(0),
            breakdown: match (result.game_breakdown, result.channels) {
                (Some(games), _) => Breakdown::Games(games),
                (None, Some(channels)) => Breakdown::Channels(channels),
                (None, None) => Breakdown::None,
            },
        });

        Some(Job {
            id: self.id,
            parameters,
            state,
            progress: self.progress.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8,
            summary,
            error: self.error.filter(|error| !error.is_empty()),
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            completed_at: self.completed_at.as_deref().and_then(parse_timestamp),
        })
    }
}

/// Decodes one list entry, logging and dropping anything malformed.
pub(crate) fn decode_job(value: Value) -> Option<Job> {
    match serde_json::from_value::<JobRecord>(value) {
        Ok(record) => record.into_job(),
        Err(err) => {
            engine_warn!("Skipping malformed job record: {}", err);
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClipRecord {
    id: String,
    url: Option<String>,
    embed_url: Option<String>,
    title: Option<String>,
    creator_name: Option<String>,
    broadcaster_name: Option<String>,
    game_name: Option<String>,
    view_count: Option<u64>,
    created_at: Option<String>,
    duration: Option<f64>,
    thumbnail_url: Option<String>,
}

impl From<ClipRecord> for Clip {
    fn from(record: ClipRecord) -> Self {
        Clip {
            id: record.id,
            title: record.title.unwrap_or_default(),
            creator_name: record.creator_name.unwrap_or_default(),
            broadcaster_name: record.broadcaster_name.unwrap_or_default(),
            game_name: record.game_name.unwrap_or_default(),
            view_count: record.view_count.unwrap_or(0),
            created_at: record.created_at.as_deref().and_then(parse_timestamp),
            duration_seconds: record.duration.unwrap_or(0.0).max(0.0).round() as u32,
            playback_url: record.url.unwrap_or_default(),
            embed_url: record.embed_url.unwrap_or_default(),
            thumbnail_url: record.thumbnail_url.unwrap_or_default(),
        }
    }
}

pub(crate) fn decode_clip(value: Value) -> Option<Clip> {
    match serde_json::from_value::<ClipRecord>(value) {
        Ok(record) => Some(record.into()),
        Err(err) => {
            engine_warn!("Skipping malformed clip record: {}", err);
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthRecord {
    status: String,
    auth_status: Option<String>,
    message: Option<String>,
}

impl From<HealthRecord> for ServiceHealth {
    fn from(record: HealthRecord) -> Self {
        ServiceHealth {
            healthy: record.status == "healthy",
            auth_valid: record.auth_status.map(|status| status == "valid"),
            message: record.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PresetConfig {
    #[serde(default)]
    channels: Vec<String>,
    days_back: Option<u32>,
    clips_per_channel: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PresetRecord {
    config: PresetConfig,
}

impl From<PresetRecord> for ChannelHighlightsParams {
    fn from(record: PresetRecord) -> Self {
        let defaults = ChannelHighlightsParams::default();
        ChannelHighlightsParams {
            channels: record.config.channels,
            days_back: record.config.days_back.unwrap_or(defaults.days_back),
            clips_per_channel: record
                .config
                .clips_per_channel
                .unwrap_or(defaults.clips_per_channel),
        }
    }
}

/// Accepts RFC 3339 and the service's offset-less ISO form (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
