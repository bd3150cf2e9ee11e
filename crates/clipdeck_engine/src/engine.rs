use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clipdeck_core::{JobId, JobParameters, SelectionToken};
use engine_logging::{engine_debug, engine_info, engine_warn};
use tokio::runtime::Runtime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{
    AtomicFileWriter, EmbedProbe, EngineEvent, HttpEmbedProbe, HttpJobService, JobService,
    ProbeOutcome, ServiceSettings, SetupError,
};

/// Shortest poll period the schedule accepts.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long shutdown waits for in-flight requests.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Receives engine results. Called from runtime worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    RefreshJobs,
    Submit {
        parameters: JobParameters,
    },
    Delete {
        job_id: JobId,
    },
    FetchClips {
        job_id: JobId,
    },
    Download {
        job_id: JobId,
    },
    CheckHealth,
    FetchPreset {
        name: String,
    },
    StartPolling {
        interval: Duration,
    },
    StopPolling,
    BeginEmbedLoad {
        token: SelectionToken,
        embed_url: String,
        timeout: Duration,
    },
    CancelEmbedLoad {
        token: SelectionToken,
    },
    Shutdown,
}

/// Owns a background thread running the tokio runtime. Every call only
/// queues a command; results arrive through the `EventSink`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    worker: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Engine talking HTTP to the service in `settings`, saving artifacts under `output_dir`.
    pub fn new(
        settings: &ServiceSettings,
        output_dir: PathBuf,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, SetupError> {
        let service = Arc::new(HttpJobService::new(settings)?);
        let probe = Arc::new(HttpEmbedProbe::new(settings)?);
        Self::with_parts(service, probe, AtomicFileWriter::new(output_dir), sink)
    }

    pub fn with_parts(
        service: Arc<dyn JobService>,
        probe: Arc<dyn EmbedProbe>,
        writer: AtomicFileWriter,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, SetupError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("clipdeck-engine")
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let mut worker = Worker {
            runtime,
            service,
            probe,
            writer: Arc::new(writer),
            sink,
            poll: None,
            embeds: HashMap::new(),
        };

        let handle = thread::Builder::new()
            .name("clipdeck-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    if !worker.handle(command) {
                        break;
                    }
                }
                worker.shutdown();
            })?;

        Ok(Self {
            cmd_tx,
            worker: Some(handle),
        })
    }

    pub fn refresh_jobs(&self) {
        self.send(EngineCommand::RefreshJobs);
    }

    pub fn submit(&self, parameters: JobParameters) {
        self.send(EngineCommand::Submit { parameters });
    }

    pub fn delete(&self, job_id: JobId) {
        self.send(EngineCommand::Delete { job_id });
    }

    pub fn fetch_clips(&self, job_id: JobId) {
        self.send(EngineCommand::FetchClips { job_id });
    }

    pub fn download(&self, job_id: JobId) {
        self.send(EngineCommand::Download { job_id });
    }

    pub fn check_health(&self) {
        self.send(EngineCommand::CheckHealth);
    }

    pub fn fetch_preset(&self, name: impl Into<String>) {
        self.send(EngineCommand::FetchPreset { name: name.into() });
    }

    /// Emits `PollDue` every `interval` until stopped. Restarting replaces
    /// the previous schedule.
    pub fn start_polling(&self, interval: Duration) {
        self.send(EngineCommand::StartPolling { interval });
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    /// Probes `embed_url` and reports exactly one of loaded, failed or timed
    /// out for `token`, unless cancelled first.
    pub fn begin_embed_load(
        &self,
        token: SelectionToken,
        embed_url: impl Into<String>,
        timeout: Duration,
    ) {
        self.send(EngineCommand::BeginEmbedLoad {
            token,
            embed_url: embed_url.into(),
            timeout,
        });
    }

    pub fn cancel_embed_load(&self, token: SelectionToken) {
        self.send(EngineCommand::CancelEmbedLoad { token });
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

struct Worker {
    runtime: Runtime,
    service: Arc<dyn JobService>,
    probe: Arc<dyn EmbedProbe>,
    writer: Arc<AtomicFileWriter>,
    sink: Arc<dyn EventSink>,
    poll: Option<CancellationToken>,
    embeds: HashMap<SelectionToken, CancellationToken>,
}

impl Worker {
    /// Returns `false` once the engine should stop.
    fn handle(&mut self, command: EngineCommand) -> bool {
        let service = self.service.clone();
        let sink = self.sink.clone();
        match command {
            EngineCommand::RefreshJobs => {
                self.runtime.spawn(async move {
                    let result = service.list_jobs().await;
                    if let Ok(jobs) = &result {
                        engine_debug!("Listed {} jobs", jobs.len());
                    }
                    sink.emit(EngineEvent::JobsListed(result));
                });
            }
            EngineCommand::Submit { parameters } => {
                self.runtime.spawn(async move {
                    let result = service.submit(&parameters).await;
                    match &result {
                        Ok(job_id) => {
                            engine_info!("Submitted {} job {}", parameters.kind().wire_name(), job_id)
                        }
                        Err(err) => engine_warn!("Submission failed: {}", err),
                    }
                    sink.emit(EngineEvent::JobSubmitted(result));
                });
            }
            EngineCommand::Delete { job_id } => {
                self.runtime.spawn(async move {
                    let result = service.delete_job(job_id).await;
                    sink.emit(EngineEvent::JobDeleted { job_id, result });
                });
            }
            EngineCommand::FetchClips { job_id } => {
                self.runtime.spawn(async move {
                    let result = service.fetch_clips(job_id).await;
                    sink.emit(EngineEvent::ClipsFetched { job_id, result });
                });
            }
            EngineCommand::Download { job_id } => {
                let writer = self.writer.clone();
                self.runtime.spawn(async move {
                    let result = download(service.as_ref(), writer, job_id).await;
                    match &result {
                        Ok(path) => engine_info!("Saved artifact of job {} to {:?}", job_id, path),
                        Err(err) => engine_warn!("Download of job {} failed: {}", job_id, err),
                    }
                    sink.emit(EngineEvent::ArtifactSaved { job_id, result });
                });
            }
            EngineCommand::CheckHealth => {
                self.runtime.spawn(async move {
                    sink.emit(EngineEvent::HealthChecked(service.health().await));
                });
            }
            EngineCommand::FetchPreset { name } => {
                self.runtime.spawn(async move {
                    let result = service.preset(&name).await;
                    sink.emit(EngineEvent::PresetFetched { name, result });
                });
            }
            EngineCommand::StartPolling { interval } => self.start_polling(interval),
            EngineCommand::StopPolling => {
                if let Some(cancel) = self.poll.take() {
                    cancel.cancel();
                    engine_info!("Polling stopped");
                }
            }
            EngineCommand::BeginEmbedLoad {
                token,
                embed_url,
                timeout,
            } => self.begin_embed_load(token, embed_url, timeout),
            EngineCommand::CancelEmbedLoad { token } => {
                if let Some(cancel) = self.embeds.remove(&token) {
                    cancel.cancel();
                }
            }
            EngineCommand::Shutdown => return false,
        }
        true
    }

    fn start_polling(&mut self, interval: Duration) {
        if let Some(previous) = self.poll.take() {
            previous.cancel();
        }
        let interval = interval.max(MIN_POLL_INTERVAL);
        let cancel = CancellationToken::new();
        self.poll = Some(cancel.clone());
        let sink = self.sink.clone();
        engine_info!("Polling every {:?}", interval);

        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the caller has already refreshed.
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => sink.emit(EngineEvent::PollDue),
                }
            }
        });
    }

    fn begin_embed_load(&mut self, token: SelectionToken, embed_url: String, timeout: Duration) {
        let cancel = CancellationToken::new();
        if let Some(previous) = self.embeds.insert(token, cancel.clone()) {
            previous.cancel();
        }
        let probe = self.probe.clone();
        let sink = self.sink.clone();

        self.runtime.spawn(async move {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                outcome = probe.probe(&embed_url) => match outcome {
                    ProbeOutcome::Loaded => EngineEvent::EmbedLoaded { token },
                    ProbeOutcome::Failed(reason) => {
                        engine_warn!("Embed {} failed: {}", token, reason);
                        EngineEvent::EmbedFailed { token }
                    }
                },
                _ = tokio::time::sleep(timeout) => {
                    engine_info!("Embed {} timed out after {:?}", token, timeout);
                    EngineEvent::EmbedTimedOut { token }
                }
            };
            if !cancel.is_cancelled() {
                sink.emit(event);
            }
        });
    }

    fn shutdown(mut self) {
        if let Some(cancel) = self.poll.take() {
            cancel.cancel();
        }
        for (_, cancel) in self.embeds.drain() {
            cancel.cancel();
        }
        self.runtime.shutdown_timeout(SHUTDOWN_GRACE);
    }
}

async fn download(
    service: &dyn JobService,
    writer: Arc<AtomicFileWriter>,
    job_id: JobId,
) -> Result<PathBuf, String> {
    let artifact = service
        .download_artifact(job_id)
        .await
        .map_err(|err| err.to_string())?;
    tokio::task::spawn_blocking(move || writer.write_artifact(job_id, &artifact))
        .await
        .map_err(|err| err.to_string())?
        .map_err(|err| err.to_string())
}
