//! Plain-text rendering of the view model.
use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use clipdeck_core::{
    ActionNotice, AppViewModel, ChannelHighlightsParams, ClipsPanelStatus, ClipsPanelView,
    DownloadState, JobRowView, JobState, LoadPhase, PlayerView, ServiceError, ServiceHealth,
};

pub fn jobs(view: &AppViewModel) -> String {
    let mut out = String::new();
    match &view.phase {
        LoadPhase::Initial => {
            out.push_str("Loading jobs...\n");
            return out;
        }
        LoadPhase::InitialFailed { message } => {
            let _ = writeln!(out, "Could not load jobs: {message}");
            out.push_str("Retrying on the next poll.\n");
            return out;
        }
        LoadPhase::Ready => {}
    }

    if let Some(stale) = &view.stale_error {
        let _ = writeln!(out, "(showing last known jobs; refresh failed: {stale})");
    }
    if view.jobs.is_empty() {
        out.push_str("No jobs yet.\n");
    } else {
        let _ = writeln!(
            out,
            "{:>5}  {:<18}  {:<10}  {:>6}  {:<16}  {}",
            "ID", "TYPE", "STATUS", "CLIPS", "CREATED", "DETAILS"
        );
        for row in &view.jobs {
            out.push_str(&job_row(row));
            out.push('\n');
        }
    }
    if let Some(notice) = &view.notice {
        out.push_str(&self::notice(notice));
        out.push('\n');
    }
    out
}

pub fn job_row(row: &JobRowView) -> String {
    let status = match row.progress {
        Some(progress) => format!("{} {progress}%", state_label(row.state)),
        None => state_label(row.state).to_string(),
    };
    let clips = row
        .total_clips
        .map(|total| total.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut details = Vec::new();
    if let Some(games) = row.games {
        details.push(format!("{games} games"));
    }
    if let Some(channels) = row.channels {
        details.push(format!("{channels} channels"));
    }
    if let Some(error) = &row.error {
        details.push(format!("error: {error}"));
    }
    match &row.download {
        Some(DownloadState::InProgress) => details.push("downloading".to_string()),
        Some(DownloadState::Saved(path)) => details.push(format!("saved to {}", path.display())),
        Some(DownloadState::Failed(message)) => details.push(format!("download failed: {message}")),
        None => {}
    }
    if row.deleting {
        details.push("deleting".to_string());
    }

    format!(
        "{:>5}  {:<18}  {:<10}  {:>6}  {:<16}  {}",
        row.job_id,
        row.kind.label(),
        status,
        clips,
        row.created_at.map(local_time).unwrap_or_default(),
        details.join(", ")
    )
}

pub fn notice(notice: &ActionNotice) -> String {
    match notice {
        ActionNotice::Submitted { job_id } => format!("Started job {job_id}."),
        ActionNotice::SubmitRejected { message } => format!("Submission rejected: {message}"),
        ActionNotice::Deleted { job_id } => format!("Deleted job {job_id}."),
        ActionNotice::DeleteFailed { job_id, message } => {
            format!("Could not delete job {job_id}: {message}")
        }
        ActionNotice::DownloadRejected { job_id, message } => {
            format!("Cannot download job {job_id}: {message}")
        }
    }
}

pub fn gallery(panel: &ClipsPanelView) -> String {
    let mut out = String::new();
    match &panel.status {
        ClipsPanelStatus::Loading => {
            let _ = writeln!(out, "Loading clips of job {}...", panel.job_id);
            return out;
        }
        ClipsPanelStatus::Failed { message } => {
            let _ = writeln!(out, "Could not load clips of job {}: {message}", panel.job_id);
            return out;
        }
        ClipsPanelStatus::Loaded => {}
    }

    let _ = write!(
        out,
        "Job {}: showing {} of {} fetched clips",
        panel.job_id,
        panel.shown.len(),
        panel.fetched
    );
    if let Some(total) = panel.summary_total {
        let _ = write!(out, " (job reported {total})");
    }
    let _ = writeln!(out, ", sorted by {}", panel.query.sort_key);
    if !panel.query.search_text.is_empty() {
        let _ = writeln!(out, "Search: {:?}", panel.query.search_text);
    }
    if !panel.query.game_filter.is_empty() {
        let _ = writeln!(out, "Game: {}", panel.query.game_filter);
    }
    if !panel.game_choices.is_empty() {
        let _ = writeln!(out, "Games: {}", panel.game_choices.join(", "));
    }
    for card in &panel.shown {
        let marker = if card.selected { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {:>7} views  {:>5}  {:<10}  {} | {} | {}",
            card.views,
            card.duration,
            card.created_on.as_deref().unwrap_or("-"),
            card.title,
            card.broadcaster_name,
            card.game_name
        );
        let _ = writeln!(out, "  id {}  {}", card.clip_id, card.playback_url);
    }
    out
}

pub fn player(view: &PlayerView) -> String {
    match view {
        PlayerView::Hidden => String::new(),
        PlayerView::Loading { title, embed_url } => {
            format!("Loading player for {title:?} from {embed_url}")
        }
        PlayerView::Playing { title, embed_url } => format!("Playing {title:?}: {embed_url}"),
        PlayerView::Fallback { title, link } => {
            format!("Player unavailable for {title:?}. Watch it at {link}")
        }
    }
}

pub fn health(result: &Result<ServiceHealth, ServiceError>) -> String {
    match result {
        Ok(health) => {
            let status = if health.healthy { "healthy" } else { "unhealthy" };
            let auth = match health.auth_valid {
                Some(true) => "credentials valid",
                Some(false) => "credentials invalid",
                None => "credentials unknown",
            };
            match &health.message {
                Some(message) => format!("Service {status}, {auth} ({message})"),
                None => format!("Service {status}, {auth}"),
            }
        }
        Err(err) => format!("Service check failed: {err}"),
    }
}

pub fn preset(name: &str, params: &ChannelHighlightsParams) -> String {
    format!(
        "Preset {name}: {} channels, {} days back, {} clips per channel\n  {}",
        params.channels.len(),
        params.days_back,
        params.clips_per_channel,
        params.channels.join(", ")
    )
}

fn state_label(state: JobState) -> &'static str {
    match state {
        JobState::Pending => "pending",
        JobState::Running => "running",
        JobState::Completed => "completed",
        JobState::Failed => "failed",
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipdeck_core::{ClipCardView, ClipQuery, JobKind};

    fn row(job_id: u64, state: JobState) -> JobRowView {
        JobRowView {
            job_id,
            kind: JobKind::TopClips,
            state,
            progress: (state == JobState::Running).then_some(40),
            total_clips: None,
            games: None,
            channels: None,
            error: None,
            created_at: None,
            completed_at: None,
            can_download: state == JobState::Completed,
            download: None,
            deleting: false,
        }
    }

    #[test]
    fn initial_failure_offers_retry() {
        let view = AppViewModel {
            phase: LoadPhase::InitialFailed {
                message: "service unavailable: connection refused".to_string(),
            },
            ..AppViewModel::default()
        };
        let text = jobs(&view);
        assert!(text.contains("Could not load jobs"));
        assert!(text.contains("Retrying"));
    }

    #[test]
    fn stale_list_is_marked() {
        let view = AppViewModel {
            phase: LoadPhase::Ready,
            stale_error: Some("service unavailable: 503".to_string()),
            jobs: vec![row(1, JobState::Running)],
            ..AppViewModel::default()
        };
        let text = jobs(&view);
        assert!(text.contains("refresh failed"));
        assert!(text.contains("running 40%"));
    }

    #[test]
    fn row_lists_summary_and_download() {
        let mut done = row(3, JobState::Completed);
        done.total_clips = Some(150);
        done.games = Some(12);
        done.download = Some(DownloadState::Saved("output/twitch_clips_3.xlsx".into()));
        let line = job_row(&done);
        assert!(line.contains("150"));
        assert!(line.contains("12 games"));
        assert!(line.contains("twitch_clips_3.xlsx"));
        assert!(!line.contains('%'));
    }

    #[test]
    fn empty_ready_list() {
        let view = AppViewModel {
            phase: LoadPhase::Ready,
            ..AppViewModel::default()
        };
        assert_eq!(jobs(&view), "No jobs yet.\n");
    }

    #[test]
    fn gallery_marks_selected_clip_and_counts() {
        let panel = ClipsPanelView {
            job_id: 1,
            status: ClipsPanelStatus::Loaded,
            fetched: 2,
            summary_total: Some(150),
            shown: vec![ClipCardView {
                clip_id: "a".to_string(),
                title: "ace".to_string(),
                broadcaster_name: "shroud".to_string(),
                game_name: "Valorant".to_string(),
                views: "1.5K".to_string(),
                duration: "0:30".to_string(),
                created_on: None,
                playback_url: "https://clips.example.com/a".to_string(),
                selected: true,
            }],
            game_choices: vec!["Valorant".to_string()],
            query: ClipQuery::default(),
        };
        let text = gallery(&panel);
        assert!(text.contains("showing 1 of 2 fetched clips (job reported 150)"));
        assert!(text.contains("> "));
        assert!(text.contains("1.5K"));
    }

    #[test]
    fn fallback_always_prints_link() {
        let text = player(&PlayerView::Fallback {
            title: "ace".to_string(),
            link: "https://clips.example.com/a".to_string(),
        });
        assert!(text.contains("https://clips.example.com/a"));
    }

    #[test]
    fn health_lines() {
        let healthy = Ok(ServiceHealth {
            healthy: true,
            auth_valid: Some(false),
            message: None,
        });
        assert_eq!(health(&healthy), "Service healthy, credentials invalid");
        let down = Err(ServiceError::Transient("connection refused".to_string()));
        assert!(health(&down).starts_with("Service check failed"));
    }
}
