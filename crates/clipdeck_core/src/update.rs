use crate::{ActionNotice, AppState, DownloadState, Effect, EmbedPlayer, JobId, JobState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Mounted => {
            let mut effects = Vec::with_capacity(3);
            if state.tracker.mount() {
                effects.push(Effect::StartPolling {
                    interval: state.timing.poll_interval,
                });
            }
            if state.tracker.begin_refresh() {
                effects.push(Effect::RefreshJobs);
            }
            effects.push(Effect::CheckHealth);
            state.mark_dirty();
            effects
        }
        Msg::Unmounted => {
            let mut effects = state.player.deselect();
            if state.tracker.unmount() {
                effects.push(Effect::StopPolling);
            }
            state.mark_dirty();
            effects
        }
        // A tick that was already queued when polling stopped.
        Msg::PollTick if !state.tracker.is_polling() => Vec::new(),
        Msg::PollTick | Msg::RefreshRequested => request_refresh(&mut state),
        Msg::JobsRefreshed(result) => {
            let listed = result.is_ok();
            let queued = state.tracker.apply_refresh(result);
            let mut effects = Vec::new();
            if queued && state.tracker.begin_refresh() {
                effects.push(Effect::RefreshJobs);
            }
            if listed {
                // The open gallery's job vanished from an authoritative list.
                if let Some(job_id) = state.browser.open_job() {
                    if state.tracker.job(job_id).is_none() {
                        effects.extend(close_gallery(&mut state));
                    }
                }
            }
            state.mark_dirty();
            effects
        }
        Msg::SubmitRequested(parameters) => {
            let effects = match state.tracker.begin_submit(parameters) {
                Ok(parameters) => vec![Effect::SubmitJob { parameters }],
                Err(_) => Vec::new(),
            };
            state.mark_dirty();
            effects
        }
        Msg::JobSubmitted(result) => {
            let accepted = result.is_ok();
            state.tracker.finish_submit(result);
            state.mark_dirty();
            // The outstanding refresh may predate the new job.
            if accepted && state.tracker.begin_or_queue_refresh() {
                vec![Effect::RefreshJobs]
            } else {
                Vec::new()
            }
        }
        Msg::DeleteRequested { job_id } => {
            if state.tracker.begin_delete(job_id) {
                state.mark_dirty();
                vec![Effect::DeleteJob { job_id }]
            } else {
                Vec::new()
            }
        }
        Msg::JobDeleted { job_id, result } => {
            let purged = match &result {
                Ok(()) => true,
                Err(err) => err.is_not_found(),
            };
            state.tracker.apply_delete(job_id, result);
            let mut effects = Vec::new();
            if purged {
                state.downloads.remove(&job_id);
                if state.browser.open_job() == Some(job_id) {
                    effects.extend(close_gallery(&mut state));
                }
            }
            state.mark_dirty();
            effects
        }
        Msg::DownloadRequested { job_id } => request_download(&mut state, job_id),
        // The job was deleted while its artifact was downloading.
        Msg::ArtifactSaved { job_id, .. } if state.tracker.job(job_id).is_none() => Vec::new(),
        Msg::ArtifactSaved { job_id, result } => {
            let download = match result {
                Ok(path) => DownloadState::Saved(path),
                Err(message) => DownloadState::Failed(message),
            };
            state.downloads.insert(job_id, download);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ClipsRequested { job_id } => {
            let mut effects = Vec::new();
            if state.browser.open_job() != Some(job_id) {
                effects.extend(state.player.deselect());
            }
            if state.browser.open(job_id) {
                effects.push(Effect::FetchClips { job_id });
            }
            state.mark_dirty();
            effects
        }
        Msg::ClipsFetched { job_id, result } => {
            if state.browser.apply_fetched(job_id, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ClipsClosed => {
            let effects = close_gallery(&mut state);
            state.mark_dirty();
            effects
        }
        Msg::SearchChanged(text) => {
            state.browser.set_search(text);
            state.mark_dirty();
            Vec::new()
        }
        Msg::GameFilterChanged(game) => {
            state.browser.set_game_filter(game);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SortChanged(sort_key) => {
            state.browser.set_sort(sort_key);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ClipSelected { clip_id } => {
            let clip = state.browser.find_clip(&clip_id).cloned();
            match clip {
                Some(clip) => {
                    let effects = state.player.select(&clip);
                    state.mark_dirty();
                    effects
                }
                None => Vec::new(),
            }
        }
        Msg::ClipDeselected => {
            let effects = state.player.deselect();
            state.mark_dirty();
            effects
        }
        Msg::EmbedLoaded { token } => embed_signal(&mut state, |player| player.on_loaded(token)),
        Msg::EmbedFailed { token } => embed_signal(&mut state, |player| player.on_failed(token)),
        Msg::EmbedTimedOut { token } => {
            embed_signal(&mut state, |player| player.on_timed_out(token))
        }
        Msg::HealthRequested => vec![Effect::CheckHealth],
        Msg::HealthChecked(result) => {
            state.health = Some(result);
            state.mark_dirty();
            Vec::new()
        }
        Msg::PresetRequested { name } => vec![Effect::FetchPreset { name }],
        Msg::PresetFetched { name, result } => {
            state.presets.insert(name, result);
            state.mark_dirty();
            Vec::new()
        }
    };

    (state, effects)
}

fn request_refresh(state: &mut AppState) -> Vec<Effect> {
    if state.tracker.begin_refresh() {
        state.mark_dirty();
        vec![Effect::RefreshJobs]
    } else {
        Vec::new()
    }
}

fn request_download(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    let rejection = match state.tracker.job(job_id).map(|job| job.state) {
        Some(JobState::Completed) => None,
        Some(_) => Some("job has not completed yet"),
        None => Some("job is unknown"),
    };
    if let Some(message) = rejection {
        state.tracker.set_notice(ActionNotice::DownloadRejected {
            job_id,
            message: message.to_string(),
        });
        state.mark_dirty();
        return Vec::new();
    }
    if state.downloads.get(&job_id) == Some(&DownloadState::InProgress) {
        return Vec::new();
    }
    state.downloads.insert(job_id, DownloadState::InProgress);
    state.mark_dirty();
    vec![Effect::DownloadArtifact { job_id }]
}

fn close_gallery(state: &mut AppState) -> Vec<Effect> {
    state.browser.close();
    state.player.deselect()
}

fn embed_signal(
    state: &mut AppState,
    signal: impl FnOnce(&mut EmbedPlayer) -> Vec<Effect>,
) -> Vec<Effect> {
    let effects = signal(&mut state.player);
    // An ignored (stale or late) signal leaves the player untouched.
    if !effects.is_empty() {
        state.mark_dirty();
    }
    effects
}
