use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use clipdeck_core::{
    ChannelHighlightsParams, Clip, Job, JobId, JobParameters, JobState, ServiceError,
    ServiceHealth, TopClipsParams,
};
use clipdeck_engine::{
    artifact_filename, AtomicFileWriter, ChannelEventSink, EmbedProbe, EngineEvent, EngineHandle,
    JobService, ProbeOutcome,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(5);

struct StubService {
    jobs: Vec<Job>,
    deleted: Mutex<Vec<JobId>>,
}

impl StubService {
    fn new(jobs: Vec<Job>) -> Self {
        Self {
            jobs,
            deleted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl JobService for StubService {
    async fn submit(&self, _parameters: &JobParameters) -> Result<JobId, ServiceError> {
        Ok(99)
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ServiceError> {
        Ok(self.jobs.clone())
    }

    async fn get_job(&self, job_id: JobId) -> Result<Job, ServiceError> {
        self.jobs
            .iter()
            .find(|job| job.id == job_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound("Job not found".to_string()))
    }

    async fn delete_job(&self, job_id: JobId) -> Result<(), ServiceError> {
        let mut deleted = self.deleted.lock().unwrap();
        if deleted.contains(&job_id) {
            return Err(ServiceError::NotFound("Job not found".to_string()));
        }
        deleted.push(job_id);
        Ok(())
    }

    async fn fetch_clips(&self, _job_id: JobId) -> Result<Vec<Clip>, ServiceError> {
        Ok(vec![Clip {
            id: "a".to_string(),
            ..Clip::default()
        }])
    }

    async fn download_artifact(&self, _job_id: JobId) -> Result<Bytes, ServiceError> {
        Ok(Bytes::from_static(b"sheet"))
    }

    async fn health(&self) -> Result<ServiceHealth, ServiceError> {
        Ok(ServiceHealth {
            healthy: true,
            auth_valid: Some(true),
            message: None,
        })
    }

    async fn preset(&self, _name: &str) -> Result<ChannelHighlightsParams, ServiceError> {
        Err(ServiceError::Transient("unknown preset".to_string()))
    }
}

/// Answers with a fixed outcome after `delay`; `None` never answers.
struct ScriptedProbe {
    outcome: Option<ProbeOutcome>,
    delay: Duration,
}

#[async_trait]
impl EmbedProbe for ScriptedProbe {
    async fn probe(&self, _embed_url: &str) -> ProbeOutcome {
        tokio::time::sleep(self.delay).await;
        match &self.outcome {
            Some(outcome) => outcome.clone(),
            None => std::future::pending().await,
        }
    }
}

fn job(id: JobId) -> Job {
    Job {
        id,
        parameters: JobParameters::TopClips(TopClipsParams::default()),
        state: JobState::Completed,
        progress: 100,
        summary: None,
        error: None,
        created_at: None,
        completed_at: None,
    }
}

fn engine_with(
    probe: ScriptedProbe,
    dir: &TempDir,
) -> (EngineHandle, mpsc::Receiver<EngineEvent>) {
    engine_logging::initialize_for_tests();
    let (tx, rx) = mpsc::channel();
    let engine = EngineHandle::with_parts(
        Arc::new(StubService::new(vec![job(1), job(2)])),
        Arc::new(probe),
        AtomicFileWriter::new(dir.path().to_path_buf()),
        Arc::new(ChannelEventSink::new(tx)),
    )
    .expect("engine");
    (engine, rx)
}

fn silent_probe() -> ScriptedProbe {
    ScriptedProbe {
        outcome: None,
        delay: Duration::ZERO,
    }
}

#[test]
fn refresh_reports_listed_jobs() {
    let dir = TempDir::new().unwrap();
    let (engine, rx) = engine_with(silent_probe(), &dir);

    engine.refresh_jobs();
    match rx.recv_timeout(WAIT).unwrap() {
        EngineEvent::JobsListed(Ok(jobs)) => {
            assert_eq!(jobs.iter().map(|job| job.id).collect::<Vec<_>>(), vec![1, 2])
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn second_delete_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let (engine, rx) = engine_with(silent_probe(), &dir);

    engine.delete(1);
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::JobDeleted {
            job_id: 1,
            result: Ok(())
        }
    );
    engine.delete(1);
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::JobDeleted {
            job_id: 1,
            result: Err(ServiceError::NotFound("Job not found".to_string()))
        }
    );
}

#[test]
fn download_saves_artifact_under_job_name() {
    let dir = TempDir::new().unwrap();
    let (engine, rx) = engine_with(silent_probe(), &dir);

    engine.download(2);
    let expected = dir.path().join(artifact_filename(2));
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::ArtifactSaved {
            job_id: 2,
            result: Ok(expected.clone())
        }
    );
    assert_eq!(std::fs::read(expected).unwrap(), b"sheet");
}

#[test]
fn polling_ticks_until_stopped() {
    let dir = TempDir::new().unwrap();
    let (engine, rx) = engine_with(silent_probe(), &dir);

    engine.start_polling(Duration::from_millis(20));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), EngineEvent::PollDue);
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), EngineEvent::PollDue);

    engine.stop_polling();
    // Drain anything that was already in flight, then expect silence.
    std::thread::sleep(Duration::from_millis(50));
    while rx.try_recv().is_ok() {}
    assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
}

#[test]
fn embed_load_reports_loaded_before_timeout() {
    let dir = TempDir::new().unwrap();
    let probe = ScriptedProbe {
        outcome: Some(ProbeOutcome::Loaded),
        delay: Duration::ZERO,
    };
    let (engine, rx) = engine_with(probe, &dir);

    engine.begin_embed_load(7, "https://embed.example.com/?clip=a", Duration::from_secs(5));
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::EmbedLoaded { token: 7 }
    );
}

#[test]
fn embed_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let probe = ScriptedProbe {
        outcome: Some(ProbeOutcome::Failed("refused".to_string())),
        delay: Duration::ZERO,
    };
    let (engine, rx) = engine_with(probe, &dir);

    engine.begin_embed_load(3, "https://embed.example.com/?clip=a", Duration::from_secs(5));
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::EmbedFailed { token: 3 }
    );
}

#[test]
fn silent_embed_times_out_exactly_once() {
    let dir = TempDir::new().unwrap();
    let (engine, rx) = engine_with(silent_probe(), &dir);

    engine.begin_embed_load(1, "https://embed.example.com/?clip=a", Duration::from_millis(30));
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::EmbedTimedOut { token: 1 }
    );
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn cancelled_embed_reports_nothing() {
    let dir = TempDir::new().unwrap();
    let probe = ScriptedProbe {
        outcome: Some(ProbeOutcome::Loaded),
        delay: Duration::from_millis(100),
    };
    let (engine, rx) = engine_with(probe, &dir);

    engine.begin_embed_load(4, "https://embed.example.com/?clip=a", Duration::from_millis(100));
    engine.cancel_embed_load(4);
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
}

#[test]
fn health_and_preset_results_are_forwarded() {
    let dir = TempDir::new().unwrap();
    let (engine, rx) = engine_with(silent_probe(), &dir);

    engine.check_health();
    match rx.recv_timeout(WAIT).unwrap() {
        EngineEvent::HealthChecked(Ok(health)) => assert!(health.healthy),
        other => panic!("unexpected event {other:?}"),
    }

    engine.fetch_preset("nope");
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::PresetFetched {
            name: "nope".to_string(),
            result: Err(ServiceError::Transient("unknown preset".to_string()))
        }
    );
}
