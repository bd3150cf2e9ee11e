use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use clipdeck_core::{
    update, ActionNotice, AppState, ChannelHighlightsParams, ClipsLoad,
    DownloadState, Job, JobId, JobParameters, LoadPhase, Msg, SortKey, TopClipsParams,
};
use engine_logging::{engine_info, engine_warn};

use super::cli::{Cli, Command};
use super::config::AppConfig;
use super::effects::EffectRunner;
use super::{logging, ui};

/// Slack on top of the request timeout before a reply is considered lost.
const REPLY_MARGIN: Duration = Duration::from_secs(5);
/// Inbox wait while following a job with no deadline.
const IDLE_WAIT: Duration = Duration::from_secs(1);

pub fn run_app() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, config_problem) = match AppConfig::load(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    config.apply_overrides(cli.api.clone(), cli.output_dir.clone());
    logging::initialize(&config);
    if let Some(err) = config_problem {
        engine_warn!("{}; using default settings", err);
    }

    let mut driver = Driver::new(&config)?;
    let outcome = run_command(&mut driver, cli.command);
    driver.dispatch(Msg::Unmounted);
    outcome
}

fn run_command(driver: &mut Driver, command: Command) -> Result<()> {
    match command {
        Command::Jobs { watch, until_done } => list_jobs(driver, watch, until_done),
        Command::Top {
            days,
            limit,
            all_languages,
            game,
            wait,
        } => {
            let parameters = JobParameters::TopClips(TopClipsParams {
                days_back: days,
                limit,
                english_only: !all_languages,
                game_filter: game,
            });
            submit(driver, parameters, wait)
        }
        Command::Channels {
            names,
            days,
            per_channel,
            wait,
        } => {
            let parameters = JobParameters::ChannelHighlights(ChannelHighlightsParams {
                channels: names,
                days_back: days,
                clips_per_channel: per_channel,
            });
            submit(driver, parameters, wait)
        }
        Command::Preset { name, submit: send, wait } => preset(driver, &name, send, wait),
        Command::Delete { job_id } => delete(driver, job_id),
        Command::Clips {
            job_id,
            search,
            game,
            sort,
        } => {
            browse(driver, job_id, search, game, sort)?;
            println!("{}", gallery_text(driver));
            Ok(())
        }
        Command::Play { job_id, clip_id } => play(driver, job_id, clip_id),
        Command::Download { job_id } => download(driver, job_id),
        Command::Health => health(driver),
    }
}

/// Runs the update loop: every message goes through `update`, every effect
/// to the engine, every engine result back into the inbox.
struct Driver {
    state: AppState,
    msg_rx: mpsc::Receiver<Msg>,
    runner: EffectRunner,
    reply_wait: Duration,
    embed_wait: Duration,
    /// Reprint the job table whenever it changes.
    live: bool,
    last_table: String,
}

impl Driver {
    fn new(config: &AppConfig) -> Result<Self> {
        let (msg_tx, msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(config, msg_tx).context("starting engine")?;
        let timing = config.timing();
        Ok(Self {
            state: AppState::with_timing(timing),
            msg_rx,
            runner,
            reply_wait: config.request_timeout() + REPLY_MARGIN,
            embed_wait: timing.embed_timeout + REPLY_MARGIN,
            live: false,
            last_table: String::new(),
        })
    }

    fn state(&self) -> &AppState {
        &self.state
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() && self.live {
            let table = ui::render::jobs(&state.view());
            if table != self.last_table {
                print!("{table}");
                self.last_table = table;
            }
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Feeds engine results through `update` until `done` holds.
    fn run_until(
        &mut self,
        limit: Option<Duration>,
        done: impl Fn(&AppState) -> bool,
    ) -> Result<()> {
        let deadline = limit.map(|limit| Instant::now() + limit);
        while !done(&self.state) {
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        bail!("timed out waiting for the job service");
                    }
                    deadline - now
                }
                None => IDLE_WAIT,
            };
            match self.msg_rx.recv_timeout(wait) {
                Ok(msg) => self.dispatch(msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => bail!("engine stopped unexpectedly"),
            }
        }
        Ok(())
    }

    /// Mounts the job view and waits for the first job list.
    fn load_jobs(&mut self) -> Result<()> {
        self.dispatch(Msg::Mounted);
        let wait = self.reply_wait;
        self.run_until(Some(wait), |state| {
            *state.tracker().phase() != LoadPhase::Initial
        })?;
        if let LoadPhase::InitialFailed { message } = self.state.tracker().phase() {
            bail!("could not load jobs: {message}");
        }
        Ok(())
    }

    fn known_job(&self, job_id: JobId) -> Result<&Job> {
        self.state
            .tracker()
            .job(job_id)
            .ok_or_else(|| anyhow!("job {job_id} is not known to the service"))
    }
}

fn list_jobs(driver: &mut Driver, watch: bool, until_done: bool) -> Result<()> {
    if !watch {
        driver.load_jobs()?;
        print!("{}", ui::render::jobs(&driver.state().view()));
        return Ok(());
    }

    driver.live = true;
    driver.dispatch(Msg::Mounted);
    driver.run_until(None, |state| {
        until_done
            && *state.tracker().phase() == LoadPhase::Ready
            && state.tracker().all_terminal()
    })
}

fn submit(driver: &mut Driver, parameters: JobParameters, wait: bool) -> Result<()> {
    engine_info!("Submitting {} job", parameters.kind().label());
    driver.dispatch(Msg::Mounted);
    driver.dispatch(Msg::SubmitRequested(parameters));
    let reply_wait = driver.reply_wait;
    driver.run_until(Some(reply_wait), |state| !state.tracker().is_submitting())?;

    let job_id = match driver.state().tracker().notice() {
        Some(ActionNotice::Submitted { job_id }) => *job_id,
        Some(ActionNotice::SubmitRejected { message }) => bail!("submission rejected: {message}"),
        _ => bail!("submission produced no answer"),
    };
    println!("Started job {job_id}.");
    if !wait {
        return Ok(());
    }

    driver.live = true;
    driver.run_until(None, |state| {
        state.tracker().job(job_id).is_some_and(Job::is_terminal)
    })?;
    driver.live = false;
    let job = driver.known_job(job_id)?;
    match &job.error {
        Some(error) => bail!("job {job_id} failed: {error}"),
        None => Ok(()),
    }
}

fn preset(driver: &mut Driver, name: &str, send: bool, wait: bool) -> Result<()> {
    driver.dispatch(Msg::PresetRequested {
        name: name.to_string(),
    });
    let reply_wait = driver.reply_wait;
    driver.run_until(Some(reply_wait), |state| state.preset(name).is_some())?;

    let params = match driver.state().preset(name) {
        Some(Ok(params)) => params.clone(),
        Some(Err(err)) => bail!("could not fetch preset {name}: {err}"),
        None => bail!("preset {name} produced no answer"),
    };
    println!("{}", ui::render::preset(name, &params));
    if send {
        submit(driver, JobParameters::ChannelHighlights(params), wait)?;
    }
    Ok(())
}

fn delete(driver: &mut Driver, job_id: JobId) -> Result<()> {
    driver.load_jobs()?;
    driver.dispatch(Msg::DeleteRequested { job_id });
    let reply_wait = driver.reply_wait;
    driver.run_until(Some(reply_wait), |state| {
        !state.tracker().is_deleting(job_id)
    })?;

    match driver.state().tracker().notice() {
        Some(notice @ ActionNotice::Deleted { .. }) => {
            println!("{}", ui::render::notice(notice));
            Ok(())
        }
        Some(notice) => bail!("{}", ui::render::notice(notice)),
        None => bail!("delete of job {job_id} produced no answer"),
    }
}

/// Opens the gallery of `job_id` with the given query and waits for its clips.
fn browse(
    driver: &mut Driver,
    job_id: JobId,
    search: Option<String>,
    game: Option<String>,
    sort: SortKey,
) -> Result<()> {
    driver.load_jobs()?;
    let job = driver.known_job(job_id)?;
    if !job.is_terminal() {
        bail!("job {job_id} is still {}", job.state.wire_name());
    }

    driver.dispatch(Msg::ClipsRequested { job_id });
    if let Some(search) = search {
        driver.dispatch(Msg::SearchChanged(search));
    }
    if let Some(game) = game {
        driver.dispatch(Msg::GameFilterChanged(game));
    }
    driver.dispatch(Msg::SortChanged(sort));

    let reply_wait = driver.reply_wait;
    driver.run_until(Some(reply_wait), |state| {
        !matches!(state.browser().load(), ClipsLoad::Loading { .. })
    })?;
    if let ClipsLoad::Failed { message, .. } = driver.state().browser().load() {
        bail!("could not load clips of job {job_id}: {message}");
    }
    Ok(())
}

fn gallery_text(driver: &Driver) -> String {
    driver
        .state()
        .view()
        .clips
        .map(|panel| ui::render::gallery(&panel))
        .unwrap_or_default()
}

fn play(driver: &mut Driver, job_id: JobId, clip_id: String) -> Result<()> {
    browse(driver, job_id, None, None, SortKey::default())?;
    if driver.state().browser().find_clip(&clip_id).is_none() {
        bail!("job {job_id} has no clip {clip_id}");
    }

    driver.dispatch(Msg::ClipSelected { clip_id });
    let embed_wait = driver.embed_wait;
    driver.run_until(Some(embed_wait), |state| {
        state.player().state().is_terminal()
    })?;
    println!("{}", ui::render::player(&driver.state().view().player));
    driver.dispatch(Msg::ClipDeselected);
    Ok(())
}

fn download(driver: &mut Driver, job_id: JobId) -> Result<()> {
    driver.load_jobs()?;
    driver.dispatch(Msg::DownloadRequested { job_id });
    if let Some(ActionNotice::DownloadRejected { message, .. }) = driver.state().tracker().notice()
    {
        bail!("cannot download job {job_id}: {message}");
    }

    let reply_wait = driver.reply_wait;
    driver.run_until(Some(reply_wait), |state| {
        !matches!(state.download(job_id), Some(DownloadState::InProgress))
    })?;
    match driver.state().download(job_id) {
        Some(DownloadState::Saved(path)) => {
            println!("Saved {}", display_path(path));
            Ok(())
        }
        Some(DownloadState::Failed(message)) => bail!("download of job {job_id} failed: {message}"),
        _ => bail!("download of job {job_id} produced no answer"),
    }
}

fn health(driver: &mut Driver) -> Result<()> {
    driver.dispatch(Msg::HealthRequested);
    let reply_wait = driver.reply_wait;
    driver.run_until(Some(reply_wait), |state| state.health().is_some())?;

    let Some(result) = driver.state().health() else {
        bail!("health check produced no answer");
    };
    let text = ui::render::health(result);
    if !matches!(result, Ok(health) if health.healthy) {
        bail!("{text}");
    }
    println!("{text}");
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
