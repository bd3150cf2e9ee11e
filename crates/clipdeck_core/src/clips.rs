use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::{JobId, ServiceError};

/// One scraped media item. Read-only once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Clip {
    pub id: String,
    pub title: String,
    pub creator_name: String,
    pub broadcaster_name: String,
    pub game_name: String,
    pub view_count: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
    pub playback_url: String,
    pub embed_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Views,
    Date,
    Duration,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Views => "views",
            SortKey::Date => "date",
            SortKey::Duration => "duration",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "views" => Ok(SortKey::Views),
            "date" => Ok(SortKey::Date),
            "duration" => Ok(SortKey::Duration),
            other => Err(format!(
                "unknown sort key {other:?} (expected views, date or duration)"
            )),
        }
    }
}

/// Search, filter and ordering applied to a clip list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipQuery {
    /// Case-insensitive substring over title, creator and broadcaster.
    pub search_text: String,
    /// Exact game name; empty means all games.
    pub game_filter: String,
    pub sort_key: SortKey,
}

impl ClipQuery {
    pub fn matches(&self, clip: &Clip) -> bool {
        let matches_search = self.search_text.is_empty() || {
            let needle = self.search_text.to_lowercase();
            [&clip.title, &clip.creator_name, &clip.broadcaster_name]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        };
        let matches_game = self.game_filter.is_empty() || clip.game_name == self.game_filter;
        matches_search && matches_game
    }
}

/// Filters and sorts `clips` for display. Ties keep their input order.
pub fn arrange<'a>(clips: &'a [Clip], query: &ClipQuery) -> Vec<&'a Clip> {
    let mut shown: Vec<&Clip> = clips.iter().filter(|clip| query.matches(clip)).collect();
    match query.sort_key {
        SortKey::Views => shown.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
        // `None < Some`, so clips without a date sink to the end.
        SortKey::Date => shown.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Duration => shown.sort_by(|a, b| b.duration_seconds.cmp(&a.duration_seconds)),
    }
    shown
}

/// Distinct game names in `clips`, sorted, for populating the game filter.
pub fn game_choices(clips: &[Clip]) -> Vec<String> {
    clips
        .iter()
        .map(|clip| clip.game_name.as_str())
        .filter(|game| !game.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClipsLoad {
    #[default]
    Idle,
    Loading { job_id: JobId },
    Loaded { job_id: JobId, clips: Vec<Clip> },
    Failed { job_id: JobId, message: String },
}

/// The clip list of one job plus the query the user has set on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipBrowser {
    load: ClipsLoad,
    query: ClipQuery,
}

impl ClipBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> &ClipsLoad {
        &self.load
    }

    pub fn query(&self) -> &ClipQuery {
        &self.query
    }

    pub fn open_job(&self) -> Option<JobId> {
        match &self.load {
            ClipsLoad::Idle => None,
            ClipsLoad::Loading { job_id }
            | ClipsLoad::Loaded { job_id, .. }
            | ClipsLoad::Failed { job_id, .. } => Some(*job_id),
        }
    }

    pub fn clips(&self) -> &[Clip] {
        match &self.load {
            ClipsLoad::Loaded { clips, .. } => clips,
            _ => &[],
        }
    }

    pub fn find_clip(&self, clip_id: &str) -> Option<&Clip> {
        self.clips().iter().find(|clip| clip.id == clip_id)
    }

    /// Starts loading `job_id`. Returns `false` if it is already loading.
    pub fn open(&mut self, job_id: JobId) -> bool {
        if self.load == (ClipsLoad::Loading { job_id }) {
            return false;
        }
        if self.open_job() != Some(job_id) {
            self.query.game_filter.clear();
        }
        self.load = ClipsLoad::Loading { job_id };
        true
    }

    /// Stores a fetch result; results for a job that is no longer open are dropped.
    pub fn apply_fetched(&mut self, job_id: JobId, result: Result<Vec<Clip>, ServiceError>) -> bool {
        if self.load != (ClipsLoad::Loading { job_id }) {
            return false;
        }
        self.load = match result {
            Ok(clips) => ClipsLoad::Loaded { job_id, clips },
            Err(err) => ClipsLoad::Failed {
                job_id,
                message: err.to_string(),
            },
        };
        true
    }

    pub fn close(&mut self) {
        self.load = ClipsLoad::Idle;
    }

    pub fn set_search(&mut self, text: String) {
        self.query.search_text = text;
    }

    pub fn set_game_filter(&mut self, game: String) {
        self.query.game_filter = game;
    }

    pub fn set_sort(&mut self, sort_key: SortKey) {
        self.query.sort_key = sort_key;
    }

    pub fn arranged(&self) -> Vec<&Clip> {
        arrange(self.clips(), &self.query)
    }

    pub fn game_choices(&self) -> Vec<String> {
        game_choices(self.clips())
    }
}
